//! Builder for constructing orchestrators.

use crate::builder::error::BuildError;
use crate::config::OrchestratorConfig;
use crate::core::{Action, Intent, Performer, Reducer, RunSideEffects, SideEffect, State};
use crate::orchestrator::Orchestrator;
use stillwater::validation::Validation;

/// Builder for constructing orchestrators with a fluent API.
pub struct OrchestratorBuilder<S: State, I: Intent, A: Action> {
    initial: Option<S>,
    reducer: Option<Box<dyn Reducer<S, I, A>>>,
    performer: Option<Box<dyn Performer<A, I>>>,
    config: OrchestratorConfig,
}

impl<S: State, I: Intent, A: Action> OrchestratorBuilder<S, I, A> {
    /// Create a new builder.
    pub fn new() -> Self {
        Self {
            initial: None,
            reducer: None,
            performer: None,
            config: OrchestratorConfig::default(),
        }
    }

    /// Set the initial state (required).
    pub fn initial(mut self, state: S) -> Self {
        self.initial = Some(state);
        self
    }

    /// Set the reducer (required).
    pub fn reducer<R: Reducer<S, I, A>>(mut self, reducer: R) -> Self {
        self.reducer = Some(Box::new(reducer));
        self
    }

    /// Set the performer (required).
    pub fn performer<P: Performer<A, I>>(mut self, performer: P) -> Self {
        self.performer = Some(Box::new(performer));
        self
    }

    /// Replace the whole configuration.
    pub fn config(mut self, config: OrchestratorConfig) -> Self {
        self.config = config;
        self
    }

    /// Name used in logs and errors.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.config.name = name.into();
        self
    }

    /// Keep the last `capacity` transitions in the journal.
    pub fn history(mut self, capacity: usize) -> Self {
        self.config.history_capacity = capacity;
        self
    }

    /// Build the orchestrator, stopped.
    /// Returns an error if required parts are missing or the config is invalid.
    pub fn build(self) -> Result<Orchestrator<S, I, A>, BuildError> {
        let initial = self.initial.ok_or(BuildError::MissingInitialState)?;
        let reducer = self.reducer.ok_or(BuildError::MissingReducer)?;
        let performer = self.performer.ok_or(BuildError::MissingPerformer)?;

        if let Validation::Failure(violations) = self.config.validate() {
            return Err(BuildError::InvalidConfig(
                violations.iter().cloned().collect(),
            ));
        }

        Ok(Orchestrator::from_parts(
            initial,
            reducer,
            performer,
            &self.config,
        ))
    }
}

impl<S: State, I: Intent> OrchestratorBuilder<S, I, SideEffect<I>> {
    /// Execute inline side effects directly.
    pub fn run_side_effects(self) -> Self {
        self.performer(RunSideEffects)
    }
}

impl<S: State, I: Intent, A: Action> Default for OrchestratorBuilder<S, I, A> {
    fn default() -> Self {
        Self::new()
    }
}
