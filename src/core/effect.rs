//! The reducer's output: a next state plus the ordered actions it requests.

use super::state::State;
use std::ops::Add;

/// Next state and requested side effects for one reduced intent.
///
/// `Effect` is a value, not an accumulator: every combinator consumes the
/// effect and returns a new one, so reducers stay trivially testable.
///
/// # Example
///
/// ```rust
/// use knot::core::{Effect, State, StateExt};
///
/// #[derive(Clone, PartialEq, Debug)]
/// enum Light { Red, Green }
///
/// impl State for Light {
///     fn name(&self) -> &str {
///         match self {
///             Self::Red => "Red",
///             Self::Green => "Green",
///         }
///     }
/// }
///
/// let unchanged: Effect<Light, &str> = Light::Red.state_only();
/// assert!(unchanged.actions.is_empty());
///
/// let effect = Light::Green.with("start_timer") + "notify";
/// assert_eq!(effect.state, Light::Green);
/// assert_eq!(effect.actions, vec!["start_timer", "notify"]);
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct Effect<S, A> {
    /// The state that replaces the current one
    pub state: S,
    /// Actions to enqueue, in order
    pub actions: Vec<A>,
}

impl<S, A> Effect<S, A> {
    /// An effect with an explicit action list.
    pub fn new(state: S, actions: Vec<A>) -> Self {
        Self { state, actions }
    }

    /// An effect that only sets the state and requests nothing.
    pub fn state_only(state: S) -> Self {
        Self {
            state,
            actions: Vec::new(),
        }
    }

    /// Append one action.
    pub fn and(mut self, action: A) -> Self {
        self.actions.push(action);
        self
    }

    /// Append several actions, preserving their order.
    pub fn and_all<I>(mut self, actions: I) -> Self
    where
        I: IntoIterator<Item = A>,
    {
        self.actions.extend(actions);
        self
    }

    /// Split into the state and the action list.
    pub fn into_parts(self) -> (S, Vec<A>) {
        (self.state, self.actions)
    }
}

impl<S, A> Add<A> for Effect<S, A> {
    type Output = Effect<S, A>;

    fn add(self, action: A) -> Self::Output {
        self.and(action)
    }
}

/// Effect constructors available on every state.
pub trait StateExt: State {
    /// `Effect::state_only(self)`
    fn state_only<A>(self) -> Effect<Self, A> {
        Effect::state_only(self)
    }

    /// The state plus a first action; chain more with `+` or `and`.
    fn with<A>(self, action: A) -> Effect<Self, A> {
        Effect::state_only(self).and(action)
    }
}

impl<S: State> StateExt for S {}
