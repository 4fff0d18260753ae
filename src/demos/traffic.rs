//! A traffic light with a queue of waiting cars.
//!
//! Every action here is an inline [`SideEffect`]: the reducer describes the
//! timer or follow-up it wants, and [`RunSideEffects`](crate::core::RunSideEffects)
//! executes it.

use crate::builder::{BuildError, OrchestratorBuilder};
use crate::core::{Effect, SideEffect, State, StateExt};
use crate::named_variants;
use crate::orchestrator::Orchestrator;
use std::fmt;
use std::time::Duration;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Light {
    Red,
    Green,
    Yellow,
}

impl Light {
    pub fn next(self) -> Self {
        match self {
            Self::Red => Self::Green,
            Self::Green => Self::Yellow,
            Self::Yellow => Self::Red,
        }
    }

    /// How long the light stays on.
    pub fn duration(self) -> Duration {
        match self {
            Self::Red => Duration::from_secs(3),
            Self::Green => Duration::from_secs(2),
            Self::Yellow => Duration::from_secs(1),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Red => "Red",
            Self::Green => "Green",
            Self::Yellow => "Yellow",
        }
    }
}

impl fmt::Display for Light {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct TrafficState {
    pub light: Light,
    pub cycling: bool,
    pub waiting: u32,
    pub passed: u32,
}

impl Default for TrafficState {
    fn default() -> Self {
        Self {
            light: Light::Red,
            cycling: false,
            waiting: 0,
            passed: 0,
        }
    }
}

impl State for TrafficState {
    fn name(&self) -> &str {
        self.light.as_str()
    }
}

#[derive(Clone, Debug)]
pub enum TrafficIntent {
    /// Begin cycling through the lights.
    Start,
    CarArrived,
    SwitchTo(Light),
    CarsPassed(u32),
}

named_variants! {
    Intent for TrafficIntent { Start, CarArrived, SwitchTo, CarsPassed }
}

pub type TrafficEffect = Effect<TrafficState, SideEffect<TrafficIntent>>;

pub fn reduce(state: &TrafficState, intent: TrafficIntent) -> TrafficEffect {
    match intent {
        TrafficIntent::Start if !state.cycling => TrafficState {
            cycling: true,
            ..state.clone()
        }
        .with(schedule_switch(state.light)),
        TrafficIntent::Start => state.clone().state_only(),
        TrafficIntent::CarArrived if state.light == Light::Green => TrafficState {
            passed: state.passed + 1,
            ..state.clone()
        }
        .state_only(),
        TrafficIntent::CarArrived => TrafficState {
            waiting: state.waiting + 1,
            ..state.clone()
        }
        .state_only(),
        TrafficIntent::SwitchTo(light) => {
            let effect = TrafficState {
                light,
                ..state.clone()
            }
            .with(schedule_switch(light));
            if light == Light::Green && state.waiting > 0 {
                effect + SideEffect::emit("let_through", TrafficIntent::CarsPassed(state.waiting))
            } else {
                effect
            }
        }
        TrafficIntent::CarsPassed(cars) if state.light == Light::Green => {
            let cars = cars.min(state.waiting);
            TrafficState {
                waiting: state.waiting - cars,
                passed: state.passed + cars,
                ..state.clone()
            }
            .state_only()
        }
        TrafficIntent::CarsPassed(_) => state.clone().state_only(),
    }
}

/// Switch to the light after `current` once `current` has been on long enough.
fn schedule_switch(current: Light) -> SideEffect<TrafficIntent> {
    SideEffect::fire("schedule_switch", move |ctx| {
        let intents = ctx.intents().clone();
        ctx.spawn_in_scope(async move {
            tokio::time::sleep(current.duration()).await;
            intents.offer(TrafficIntent::SwitchTo(current.next()));
        });
    })
}

/// Stopped traffic light, red and empty.
pub fn traffic_light(
) -> Result<Orchestrator<TrafficState, TrafficIntent, SideEffect<TrafficIntent>>, BuildError> {
    OrchestratorBuilder::new()
        .name("traffic-light")
        .initial(TrafficState::default())
        .reducer(reduce)
        .run_side_effects()
        .build()
}
