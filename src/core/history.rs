//! Bounded journal of applied state transitions.
//!
//! The state holder records one entry per state change when a capacity is
//! configured. Entries are immutable values; the oldest ones are evicted once
//! the journal is full.

use super::state::State;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::VecDeque;
use std::time::Duration;

/// Record of a single applied transition.
///
/// # Example
///
/// ```rust
/// use knot::core::{State, StateTransition};
/// use chrono::Utc;
///
/// #[derive(Clone, PartialEq, Debug)]
/// enum Phase { Idle, Busy }
///
/// impl State for Phase {
///     fn name(&self) -> &str {
///         match self {
///             Self::Idle => "Idle",
///             Self::Busy => "Busy",
///         }
///     }
/// }
///
/// let transition = StateTransition {
///     from: Phase::Idle,
///     to: Phase::Busy,
///     cause: "Start".to_string(),
///     timestamp: Utc::now(),
///     sequence: 1,
/// };
/// assert_eq!(transition.to.name(), "Busy");
/// ```
#[derive(Clone, Debug, Serialize)]
pub struct StateTransition<S> {
    /// The state being transitioned from
    pub from: S,
    /// The state being transitioned to
    pub to: S,
    /// Name of the intent that caused the change
    pub cause: String,
    /// When the transition was applied
    pub timestamp: DateTime<Utc>,
    /// Monotonic per-holder sequence number, starting at 1
    pub sequence: u64,
}

/// Ordered, bounded history of state transitions.
///
/// # Example
///
/// ```rust
/// use knot::core::{State, StateHistory, StateTransition};
/// use chrono::Utc;
///
/// #[derive(Clone, PartialEq, Debug)]
/// enum Step { A, B, C }
///
/// impl State for Step {
///     fn name(&self) -> &str {
///         match self {
///             Self::A => "A",
///             Self::B => "B",
///             Self::C => "C",
///         }
///     }
/// }
///
/// let mut history = StateHistory::with_capacity(8);
/// history.record(StateTransition {
///     from: Step::A,
///     to: Step::B,
///     cause: "Next".to_string(),
///     timestamp: Utc::now(),
///     sequence: 1,
/// });
/// history.record(StateTransition {
///     from: Step::B,
///     to: Step::C,
///     cause: "Next".to_string(),
///     timestamp: Utc::now(),
///     sequence: 2,
/// });
///
/// let path = history.get_path();
/// assert_eq!(path, vec![&Step::A, &Step::B, &Step::C]);
/// ```
#[derive(Clone, Debug, Serialize)]
pub struct StateHistory<S> {
    capacity: usize,
    transitions: VecDeque<StateTransition<S>>,
}

impl<S: State> StateHistory<S> {
    /// Create an empty history keeping at most `capacity` transitions.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity,
            transitions: VecDeque::with_capacity(capacity.min(64)),
        }
    }

    /// Append a transition, evicting the oldest one when full.
    ///
    /// A zero-capacity history records nothing.
    pub fn record(&mut self, transition: StateTransition<S>) {
        if self.capacity == 0 {
            return;
        }
        if self.transitions.len() == self.capacity {
            self.transitions.pop_front();
        }
        self.transitions.push_back(transition);
    }

    /// Get the path of states traversed.
    ///
    /// Returns the `from` state of the oldest retained transition, then the
    /// `to` state of each transition in order.
    pub fn get_path(&self) -> Vec<&S> {
        let mut path = Vec::new();
        if let Some(first) = self.transitions.front() {
            path.push(&first.from);
        }
        for transition in &self.transitions {
            path.push(&transition.to);
        }
        path
    }

    /// Time between the oldest and newest retained transitions.
    ///
    /// Returns `None` if there are no transitions.
    pub fn duration(&self) -> Option<Duration> {
        if let (Some(first), Some(last)) = (self.transitions.front(), self.transitions.back()) {
            last.timestamp
                .signed_duration_since(first.timestamp)
                .to_std()
                .ok()
        } else {
            None
        }
    }

    /// Retained transitions, oldest first.
    pub fn transitions(&self) -> impl ExactSizeIterator<Item = &StateTransition<S>> {
        self.transitions.iter()
    }

    pub fn len(&self) -> usize {
        self.transitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transitions.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
