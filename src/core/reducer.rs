//! The pure transition function.

use super::effect::Effect;

/// Pure function computing the next state and requested actions.
///
/// Reducers must be total over the intents they receive: combinations that do
/// not apply return `state.clone().state_only()`. Domain failures belong in
/// the returned state or in an action, never in a panic.
///
/// Every `Fn(&S, I) -> Effect<S, A>` is a reducer, so plain functions work:
///
/// ```rust
/// use knot::core::{Effect, Reducer, State, StateExt};
///
/// #[derive(Clone, PartialEq, Debug)]
/// struct Count(u32);
///
/// impl State for Count {
///     fn name(&self) -> &str { "Count" }
/// }
///
/// fn reduce(state: &Count, step: u32) -> Effect<Count, ()> {
///     Count(state.0 + step).state_only()
/// }
///
/// assert_eq!(reduce.reduce(&Count(1), 2).state, Count(3));
/// ```
pub trait Reducer<S, I, A>: Send + Sync + 'static {
    /// Reduce one intent against the current state.
    fn reduce(&self, state: &S, intent: I) -> Effect<S, A>;
}

impl<S, I, A, F> Reducer<S, I, A> for F
where
    F: Fn(&S, I) -> Effect<S, A> + Send + Sync + 'static,
{
    fn reduce(&self, state: &S, intent: I) -> Effect<S, A> {
        self(state, intent)
    }
}
