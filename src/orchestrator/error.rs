//! Orchestrator error and fault types.

use std::fmt;
use thiserror::Error;

/// The two processing loops of an orchestrator.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Lane {
    Intent,
    Action,
}

impl Lane {
    pub fn as_str(&self) -> &'static str {
        match self {
            Lane::Intent => "intent",
            Lane::Action => "action",
        }
    }
}

impl fmt::Display for Lane {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A lane terminated by a programming failure.
///
/// Either the reducer or the performer panicked, or the performer returned
/// an error it should have translated into an intent. Faults are sticky.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LaneFault {
    pub lane: Lane,
    pub reason: String,
}

impl fmt::Display for LaneFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} lane failed: {}", self.lane, self.reason)
    }
}

/// Errors returned by orchestrator lifecycle operations.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error("No tokio runtime available: {0}")]
    NoRuntime(#[from] tokio::runtime::TryCurrentError),

    #[error("Orchestrator '{name}' is faulted: {fault}")]
    Faulted { name: String, fault: LaneFault },

    #[error("Cannot start orchestrator '{name}' in a cancelled scope")]
    ScopeCancelled { name: String },
}
