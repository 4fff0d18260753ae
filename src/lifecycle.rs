//! Lifecycle adapter: host activity signals to matched `start`/`stop` pairs.
//!
//! A host (a UI screen, a connection handler, a job) is active for some
//! periods and inactive for others. A [`LifecycleObserver`] forwards those
//! periods to anything that can be started in a [`Scope`] and stopped again.

use crate::core::{Action, Intent, State};
use crate::orchestrator::{Orchestrator, OrchestratorError, Scope};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Something that can be started in a scope and stopped again.
pub trait LifecycleSwitch: Send + Sync {
    fn start(&self, scope: &Scope) -> Result<(), OrchestratorError>;
    fn stop(&self);
}

impl<S: State, I: Intent, A: Action> LifecycleSwitch for Orchestrator<S, I, A> {
    fn start(&self, scope: &Scope) -> Result<(), OrchestratorError> {
        Orchestrator::start(self, scope)
    }

    fn stop(&self) {
        Orchestrator::stop(self)
    }
}

impl<T: LifecycleSwitch + ?Sized> LifecycleSwitch for Arc<T> {
    fn start(&self, scope: &Scope) -> Result<(), OrchestratorError> {
        (**self).start(scope)
    }

    fn stop(&self) {
        (**self).stop()
    }
}

/// Host activity signals.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LifecycleSignal {
    Resumed,
    Paused,
    Destroyed,
}

/// Forwards lifecycle signals to a [`LifecycleSwitch`].
///
/// Starts and stops are always matched: a second `Resumed` without a
/// `Paused` in between is ignored, and so is a `Paused` while inactive.
/// `Destroyed` stops the switch and cancels the observer's scope; every
/// signal after it is ignored.
pub struct LifecycleObserver<T: LifecycleSwitch> {
    switch: T,
    scope: Scope,
    active: bool,
}

impl<T: LifecycleSwitch> LifecycleObserver<T> {
    pub fn new(switch: T, scope: Scope) -> Self {
        Self {
            switch,
            scope,
            active: false,
        }
    }

    pub fn on_signal(&mut self, signal: LifecycleSignal) -> Result<(), OrchestratorError> {
        if self.scope.is_cancelled() {
            debug!(?signal, "scope destroyed, signal ignored");
            return Ok(());
        }

        match signal {
            LifecycleSignal::Resumed if !self.active => {
                self.switch.start(&self.scope)?;
                self.active = true;
            }
            LifecycleSignal::Paused if self.active => {
                self.switch.stop();
                self.active = false;
            }
            LifecycleSignal::Destroyed => {
                if self.active {
                    self.switch.stop();
                    self.active = false;
                }
                self.scope.cancel();
            }
            _ => debug!(?signal, active = self.active, "signal does not change activity"),
        }
        Ok(())
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn switch(&self) -> &T {
        &self.switch
    }

    /// Apply signals until the sender side closes, then stop.
    ///
    /// A failed start is logged and leaves the observer inactive; the next
    /// `Resumed` retries.
    pub async fn follow(mut self, mut signals: mpsc::Receiver<LifecycleSignal>) -> T {
        while let Some(signal) = signals.recv().await {
            if let Err(err) = self.on_signal(signal) {
                warn!(?signal, error = %err, "lifecycle start failed");
            }
        }
        if self.active {
            self.switch.stop();
        }
        self.switch
    }
}
