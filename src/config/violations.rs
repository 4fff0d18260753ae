//! Configuration violations and load errors.

use thiserror::Error;

/// A single rule broken by an [`OrchestratorConfig`](super::OrchestratorConfig).
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ConfigViolation {
    #[error("Orchestrator name must not be empty")]
    EmptyName,

    #[error("Orchestrator name is {len} characters long (max: {max})")]
    NameTooLong { len: usize, max: usize },

    #[error("Orchestrator name contains whitespace or control characters")]
    InvalidNameCharacters,

    #[error("History capacity {capacity} exceeds maximum ({max})")]
    HistoryTooLarge { capacity: usize, max: usize },
}

/// Errors from loading a configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to parse configuration: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid configuration: {}", join(.0))]
    Invalid(Vec<ConfigViolation>),
}

fn join(violations: &[ConfigViolation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
