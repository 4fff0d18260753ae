//! Core contracts of the unidirectional data flow.
//!
//! This module contains the pure side of a knot:
//! - `State`, `Intent` and `Action` value traits
//! - The `Effect` composition algebra returned by reducers
//! - The `Reducer` trait
//! - The `Performer` trait, which is the effectful shell around the reducer
//! - A bounded transition journal
//!
//! Reducers never touch shared state; all change is expressed through the
//! returned `Effect` and applied by the orchestrator's intent lane.

mod effect;
mod history;
mod performer;
mod reducer;
mod state;

pub use effect::{Effect, StateExt};
pub use history::{StateHistory, StateTransition};
pub use performer::{
    performer_fn, FnPerformer, PerformContext, PerformError, PerformResult, Performer,
    RunSideEffects, SideEffect,
};
pub use reducer::Reducer;
pub use state::{Action, Intent, State};
