//! Builder API for ergonomic orchestrator construction.
//!
//! This module provides a fluent builder and a naming macro for creating
//! orchestrators with minimal boilerplate while maintaining type safety.

pub mod error;
pub mod macros;
pub mod orchestrator;

pub use error::BuildError;
pub use orchestrator::OrchestratorBuilder;
