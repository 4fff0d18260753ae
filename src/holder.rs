//! The single owner of the current state.
//!
//! Publication is a conflating broadcast built on `tokio::sync::watch`: a slow
//! observer sees the latest value, never a backlog.

use crate::core::{State, StateHistory, StateTransition};
use chrono::Utc;
use parking_lot::Mutex;
use tokio::sync::watch;

/// Holds one state value and publishes it to observers.
///
/// [`StateHolder::change_state`] is the only way to change the value. It is
/// not meant to be called from two places at once; inside an orchestrator
/// only the intent lane calls it.
pub struct StateHolder<S: State> {
    tx: watch::Sender<S>,
    journal: Mutex<Journal<S>>,
}

struct Journal<S> {
    history: StateHistory<S>,
    sequence: u64,
}

impl<S: State> StateHolder<S> {
    pub fn new(initial: S) -> Self {
        Self::with_history(initial, 0)
    }

    /// Holder that also keeps the last `capacity` transitions.
    pub fn with_history(initial: S, capacity: usize) -> Self {
        let (tx, _rx) = watch::channel(initial);
        Self {
            tx,
            journal: Mutex::new(Journal {
                history: StateHistory::with_capacity(capacity),
                sequence: 0,
            }),
        }
    }

    /// Synchronous read of the current value.
    pub fn snapshot(&self) -> S {
        self.tx.borrow().clone()
    }

    /// Replace the state with `transform(current)`.
    ///
    /// Observers are only notified when the new value differs from the
    /// current one. Returns whether the state changed.
    pub fn change_state<F>(&self, transform: F) -> bool
    where
        F: FnOnce(&S) -> S,
    {
        self.change_state_by("changeState", transform)
    }

    pub(crate) fn change_state_by<F>(&self, cause: &str, transform: F) -> bool
    where
        F: FnOnce(&S) -> S,
    {
        // The transform runs outside the channel lock so a panicking
        // reducer cannot leave the channel half-updated.
        let current = self.snapshot();
        let next = transform(&current);
        if next == current {
            return false;
        }

        let mut journal = self.journal.lock();
        if journal.history.capacity() > 0 {
            journal.sequence += 1;
            let sequence = journal.sequence;
            journal.history.record(StateTransition {
                from: current,
                to: next.clone(),
                cause: cause.to_string(),
                timestamp: Utc::now(),
                sequence,
            });
        }
        self.tx.send_replace(next);
        true
    }

    /// Subscribe; the observer first yields the current value.
    pub fn subscribe(&self) -> StateObserver<S> {
        StateObserver::new(self.tx.subscribe())
    }

    /// Copy of the transition journal.
    pub fn history(&self) -> StateHistory<S> {
        self.journal.lock().history.clone()
    }
}

/// Read side of a conflating broadcast.
///
/// The first call to [`StateObserver::next`] returns the value current at that
/// moment; later calls wait for the next published value. Values published
/// while the observer is not polling are conflated to the latest one.
pub struct StateObserver<S> {
    rx: watch::Receiver<S>,
    primed: bool,
}

impl<S: Clone> StateObserver<S> {
    pub(crate) fn new(rx: watch::Receiver<S>) -> Self {
        Self { rx, primed: false }
    }

    /// Current value without waiting.
    pub fn current(&self) -> S {
        self.rx.borrow().clone()
    }

    /// Next value, or `None` once the publisher is gone.
    pub async fn next(&mut self) -> Option<S> {
        if !self.primed {
            self.primed = true;
            return Some(self.rx.borrow_and_update().clone());
        }
        self.rx.changed().await.ok()?;
        Some(self.rx.borrow_and_update().clone())
    }

    /// Wait until a published value satisfies `predicate`.
    pub async fn wait_for<P>(&mut self, mut predicate: P) -> Option<S>
    where
        P: FnMut(&S) -> bool,
    {
        loop {
            let value = self.next().await?;
            if predicate(&value) {
                return Some(value);
            }
        }
    }
}

impl<S> Clone for StateObserver<S> {
    fn clone(&self) -> Self {
        Self {
            rx: self.rx.clone(),
            primed: false,
        }
    }
}
