//! The orchestrator: two lanes wiring a reducer to a performer.
//!
//! ```text
//! offer_intent ──→ intent queue ──→ [intent lane] ──→ Reducer ──→ StateHolder
//!                       ↑                                │
//!                       │                             actions
//!                       │                                ↓
//!                 follow-up intent ←── Performer ←── [action lane] ←── action queue
//! ```
//!
//! The intent lane never waits on a performer, and a burst of intents never
//! blocks the action lane. Within a lane, processing is strictly sequential,
//! so reducer calls never overlap and neither do performer calls.

mod error;
mod intents;
mod lanes;
mod scope;

pub use error::{Lane, LaneFault, OrchestratorError};
pub use intents::IntentSender;
pub use scope::Scope;

use crate::config::OrchestratorConfig;
use crate::core::{Action, Intent, Performer, Reducer, State, StateHistory};
use crate::holder::{StateHolder, StateObserver};
use lanes::Shared;
use std::any::Any;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::{mpsc, watch, Mutex};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn, Instrument};
use uuid::Uuid;

/// A running instance of one state machine.
///
/// # Example
///
/// ```rust
/// use knot::core::{performer_fn, Effect, Action, Intent, PerformContext, State, StateExt};
/// use knot::orchestrator::{Orchestrator, Scope};
///
/// #[derive(Clone, PartialEq, Debug)]
/// struct Count(u32);
/// impl State for Count {
///     fn name(&self) -> &str { "Count" }
/// }
///
/// #[derive(Debug)]
/// enum CountIntent { Add(u32), Added }
/// impl Intent for CountIntent {
///     fn name(&self) -> &str { "CountIntent" }
/// }
///
/// #[derive(Debug)]
/// struct Log;
/// impl Action for Log {
///     fn name(&self) -> &str { "Log" }
/// }
///
/// fn reduce(state: &Count, intent: CountIntent) -> Effect<Count, Log> {
///     match intent {
///         CountIntent::Add(n) => Count(state.0 + n).with(Log),
///         CountIntent::Added => state.clone().state_only(),
///     }
/// }
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let performer = performer_fn(|_: Log, _: PerformContext<CountIntent>| async {
///     Ok(Some(CountIntent::Added))
/// });
/// let knot = Orchestrator::new(Count(0), reduce, performer);
/// let scope = Scope::current().unwrap();
/// knot.start(&scope).unwrap();
///
/// let mut observer = knot.observe();
/// knot.offer_intent(CountIntent::Add(2));
/// assert_eq!(observer.wait_for(|c| c.0 == 2).await, Some(Count(2)));
/// knot.stop();
/// # }
/// ```
pub struct Orchestrator<S: State, I: Intent, A: Action> {
    shared: Arc<Shared<S, I, A>>,
    running: parking_lot::Mutex<Option<CancellationToken>>,
}

impl<S: State, I: Intent, A: Action> Orchestrator<S, I, A> {
    /// Create a stopped orchestrator with the default configuration.
    pub fn new<R, P>(initial: S, reducer: R, performer: P) -> Self
    where
        R: Reducer<S, I, A>,
        P: Performer<A, I>,
    {
        Self::from_parts(
            initial,
            Box::new(reducer),
            Box::new(performer),
            &OrchestratorConfig::default(),
        )
    }

    pub(crate) fn from_parts(
        initial: S,
        reducer: Box<dyn Reducer<S, I, A>>,
        performer: Box<dyn Performer<A, I>>,
        config: &OrchestratorConfig,
    ) -> Self {
        let (intents_tx, intents_rx) = mpsc::unbounded_channel();
        let (actions_tx, actions_rx) = mpsc::unbounded_channel();
        let (fault, _) = watch::channel(None);

        let shared = Shared {
            id: Uuid::new_v4(),
            name: config.name.clone(),
            holder: StateHolder::with_history(initial, config.history_capacity),
            reducer,
            performer,
            intents: IntentSender::new(intents_tx),
            intents_rx: Mutex::new(intents_rx),
            actions_tx,
            actions_rx: Mutex::new(actions_rx),
            fault,
        };

        Self {
            shared: Arc::new(shared),
            running: parking_lot::Mutex::new(None),
        }
    }

    /// Launch the intent and action lanes in `scope`.
    ///
    /// Any previously running lane pair is cancelled first, so at most one
    /// pair consumes the queues at a time. Intents buffered while stopped are
    /// processed once the lanes are running.
    pub fn start(&self, scope: &Scope) -> Result<(), OrchestratorError> {
        if let Some(fault) = self.fault() {
            warn!(orchestrator = %self.shared.id, name = %self.shared.name, %fault, "refusing to start faulted orchestrator");
            return Err(OrchestratorError::Faulted {
                name: self.shared.name.clone(),
                fault,
            });
        }
        if scope.is_cancelled() {
            return Err(OrchestratorError::ScopeCancelled {
                name: self.shared.name.clone(),
            });
        }

        let mut running = self.running.lock();
        if let Some(previous) = running.take() {
            previous.cancel();
        }

        let token = scope.token().child_token();
        let handle = scope.handle().clone();
        self.launch(
            Lane::Intent,
            &handle,
            lanes::intent_lane(Arc::clone(&self.shared), token.clone()),
        );
        self.launch(
            Lane::Action,
            &handle,
            lanes::action_lane(Arc::clone(&self.shared), token.clone(), scope.clone()),
        );
        *running = Some(token);

        info!(orchestrator = %self.shared.id, name = %self.shared.name, "lanes started");
        Ok(())
    }

    /// Cancel both lanes. In-flight performer work is dropped at its next
    /// suspension point. Calling this while stopped does nothing.
    pub fn stop(&self) {
        if let Some(token) = self.running.lock().take() {
            token.cancel();
            info!(orchestrator = %self.shared.id, name = %self.shared.name, "lanes stopped");
        }
    }

    /// Enqueue an intent without blocking.
    ///
    /// Intents offered while stopped are buffered, not dropped.
    pub fn offer_intent(&self, intent: I) {
        if !self.is_running() {
            tracing::trace!(intent = %intent.name(), "buffering intent while stopped");
        }
        self.shared.intents.offer(intent);
    }

    /// Cloneable handle for offering intents from elsewhere.
    pub fn intents(&self) -> IntentSender<I> {
        self.shared.intents.clone()
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> S {
        self.shared.holder.snapshot()
    }

    /// Subscribe to state changes; the observer starts with the current value.
    pub fn observe(&self) -> StateObserver<S> {
        self.shared.holder.subscribe()
    }

    /// Transition journal; empty unless a history capacity was configured.
    pub fn history(&self) -> StateHistory<S> {
        self.shared.holder.history()
    }

    /// Whether both lanes are live. A faulted instance is never running.
    pub fn is_running(&self) -> bool {
        let started = self
            .running
            .lock()
            .as_ref()
            .is_some_and(|token| !token.is_cancelled());
        started && self.shared.fault.borrow().is_none()
    }

    /// The first lane fault, if any lane has died.
    pub fn fault(&self) -> Option<LaneFault> {
        self.shared.fault.borrow().clone()
    }

    /// Watch for lane faults.
    pub fn faults(&self) -> watch::Receiver<Option<LaneFault>> {
        self.shared.fault.subscribe()
    }

    pub fn id(&self) -> Uuid {
        self.shared.id
    }

    pub fn name(&self) -> &str {
        &self.shared.name
    }

    /// Spawn a lane and a supervisor that turns its failure into a fault.
    fn launch<F, E>(&self, lane: Lane, handle: &Handle, task: F)
    where
        F: Future<Output = Result<(), E>> + Send + 'static,
        E: fmt::Display + Send + 'static,
    {
        let span = tracing::info_span!(
            "lane",
            orchestrator = %self.shared.id,
            name = %self.shared.name,
            lane = lane.as_str(),
        );
        let task = handle.spawn(task.instrument(span));
        let shared = Arc::clone(&self.shared);

        handle.spawn(async move {
            let reason = match task.await {
                Ok(Ok(())) => return,
                Ok(Err(err)) => err.to_string(),
                Err(err) if err.is_panic() => panic_reason(err.into_panic()),
                Err(_) => return,
            };
            let fault = LaneFault { lane, reason };
            error!(orchestrator = %shared.id, name = %shared.name, %fault, "lane terminated");
            shared.record_fault(fault);
        });
    }
}

impl<S: State, I: Intent, A: Action> Drop for Orchestrator<S, I, A> {
    fn drop(&mut self) {
        if let Some(token) = self.running.get_mut().take() {
            token.cancel();
        }
    }
}

impl<S: State, I: Intent, A: Action> fmt::Debug for Orchestrator<S, I, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Orchestrator")
            .field("id", &self.shared.id)
            .field("name", &self.shared.name)
            .field("running", &self.is_running())
            .finish()
    }
}

fn panic_reason(payload: Box<dyn Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        format!("panicked: {message}")
    } else if let Some(message) = payload.downcast_ref::<String>() {
        format!("panicked: {message}")
    } else {
        "panicked".to_string()
    }
}
