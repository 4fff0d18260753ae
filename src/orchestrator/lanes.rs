//! The intent lane and the action lane.
//!
//! Each lane is a single sequential loop over its queue. The two lanes run
//! concurrently with each other.

use super::error::LaneFault;
use super::intents::IntentSender;
use super::scope::Scope;
use crate::core::{Action, Intent, PerformContext, PerformError, Performer, Reducer, State};
use crate::holder::StateHolder;
use std::convert::Infallible;
use std::sync::Arc;
use tokio::sync::{mpsc, watch, Mutex};
use tokio_util::sync::CancellationToken;
use tracing::debug;
use uuid::Uuid;

/// Everything the lanes and the public handle share.
pub(crate) struct Shared<S: State, I: Intent, A: Action> {
    pub(crate) id: Uuid,
    pub(crate) name: String,
    pub(crate) holder: StateHolder<S>,
    pub(crate) reducer: Box<dyn Reducer<S, I, A>>,
    pub(crate) performer: Box<dyn Performer<A, I>>,
    pub(crate) intents: IntentSender<I>,
    // A lane holds the receiver lock for its whole life, so a lane pair that
    // has not yet observed cancellation never consumes alongside its successor.
    pub(crate) intents_rx: Mutex<mpsc::UnboundedReceiver<I>>,
    pub(crate) actions_tx: mpsc::UnboundedSender<A>,
    pub(crate) actions_rx: Mutex<mpsc::UnboundedReceiver<A>>,
    pub(crate) fault: watch::Sender<Option<LaneFault>>,
}

impl<S: State, I: Intent, A: Action> Shared<S, I, A> {
    /// Reduce one intent and enqueue the resulting actions in order.
    fn process_intent(&self, intent: I) {
        let cause = intent.name().to_string();
        debug!(intent = %cause, "reducing intent");

        let mut actions = Vec::new();
        let changed = self.holder.change_state_by(&cause, |state| {
            let (next, requested) = self.reducer.reduce(state, intent).into_parts();
            actions = requested;
            next
        });
        if changed {
            let state = self.holder.snapshot();
            debug!(intent = %cause, state = %state.name(), "state changed");
        }

        for action in actions {
            debug!(action = %action.name(), "enqueueing action");
            if self.actions_tx.send(action).is_err() {
                tracing::trace!("action queue closed");
            }
        }
    }

    /// Keep the first fault only; later ones are consequences.
    pub(crate) fn record_fault(&self, fault: LaneFault) {
        self.fault.send_if_modified(|slot| {
            if slot.is_none() {
                *slot = Some(fault);
                true
            } else {
                false
            }
        });
    }
}

pub(crate) async fn intent_lane<S, I, A>(
    shared: Arc<Shared<S, I, A>>,
    token: CancellationToken,
) -> Result<(), Infallible>
where
    S: State,
    I: Intent,
    A: Action,
{
    let mut intents = tokio::select! {
        biased;
        _ = token.cancelled() => return Ok(()),
        guard = shared.intents_rx.lock() => guard,
    };
    debug!("intent lane running");

    loop {
        let intent = tokio::select! {
            biased;
            _ = token.cancelled() => break,
            next = intents.recv() => match next {
                Some(intent) => intent,
                None => break,
            },
        };
        shared.process_intent(intent);
    }

    debug!("intent lane stopped");
    Ok(())
}

pub(crate) async fn action_lane<S, I, A>(
    shared: Arc<Shared<S, I, A>>,
    token: CancellationToken,
    scope: Scope,
) -> Result<(), PerformError>
where
    S: State,
    I: Intent,
    A: Action,
{
    let mut actions = tokio::select! {
        biased;
        _ = token.cancelled() => return Ok(()),
        guard = shared.actions_rx.lock() => guard,
    };
    let ctx = PerformContext::new(shared.intents.clone(), scope, token.clone());
    debug!("action lane running");

    loop {
        let action = tokio::select! {
            biased;
            _ = token.cancelled() => break,
            next = actions.recv() => match next {
                Some(action) => action,
                None => break,
            },
        };

        let name = action.name().to_string();
        debug!(action = %name, "performing action");
        let outcome = tokio::select! {
            biased;
            _ = token.cancelled() => {
                debug!(action = %name, "action cancelled");
                break;
            }
            outcome = shared.performer.perform(action, &ctx) => outcome,
        };

        match outcome {
            Ok(Some(intent)) => {
                debug!(action = %name, intent = %intent.name(), "follow-up intent");
                shared.intents.offer(intent);
            }
            Ok(None) => {}
            Err(err) => {
                tracing::error!(action = %name, error = %err, "performer failed");
                return Err(err);
            }
        }
    }

    debug!("action lane stopped");
    Ok(())
}
