//! Build errors for the orchestrator builder.

use crate::config::ConfigViolation;
use thiserror::Error;

/// Errors that can occur when building an orchestrator.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("Initial state not specified. Call .initial(state) before .build()")]
    MissingInitialState,

    #[error("Reducer not specified. Call .reducer(reducer)")]
    MissingReducer,

    #[error("Performer not specified. Call .performer(performer) or .run_side_effects()")]
    MissingPerformer,

    #[error("Invalid configuration: {0:?}")]
    InvalidConfig(Vec<ConfigViolation>),
}
