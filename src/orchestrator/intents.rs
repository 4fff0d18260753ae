//! Write handle onto an orchestrator's intent queue.

use tokio::sync::mpsc;

/// Cloneable, non-blocking handle for offering intents.
///
/// Offering never fails because of capacity. Intents offered while the
/// orchestrator is stopped stay buffered until the next `start`.
pub struct IntentSender<I> {
    tx: mpsc::UnboundedSender<I>,
}

impl<I> IntentSender<I> {
    pub(crate) fn new(tx: mpsc::UnboundedSender<I>) -> Self {
        Self { tx }
    }

    /// Enqueue an intent.
    pub fn offer(&self, intent: I) {
        if self.tx.send(intent).is_err() {
            tracing::trace!("intent queue closed, intent discarded");
        }
    }

    /// `false` once the owning orchestrator has been dropped.
    pub fn is_connected(&self) -> bool {
        !self.tx.is_closed()
    }
}

impl<I> Clone for IntentSender<I> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
        }
    }
}
