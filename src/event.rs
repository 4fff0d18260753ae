//! Single-delivery notifications on top of a conflating broadcast.
//!
//! A state broadcast replays its latest value to every new subscriber. That is
//! right for state and wrong for commands such as "play this trailer": an
//! [`Event`] hands its payload out exactly once, whoever asks first.

use crate::holder::StateObserver;
use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;
use tokio::sync::watch;

/// A payload that can be taken once.
///
/// Clones share the same slot, so taking through any clone empties all of
/// them.
///
/// ```rust
/// use knot::event::Event;
///
/// let event = Event::new("play");
/// let late_subscriber = event.clone();
///
/// assert_eq!(event.take(), Some("play"));
/// assert_eq!(event.take(), None);
/// assert_eq!(late_subscriber.take(), None);
/// ```
pub struct Event<T> {
    slot: Arc<Mutex<Option<T>>>,
}

impl<T> Event<T> {
    pub fn new(content: T) -> Self {
        Self {
            slot: Arc::new(Mutex::new(Some(content))),
        }
    }

    /// Returns the content and prevents its use again.
    pub fn take(&self) -> Option<T> {
        self.slot.lock().take()
    }

    pub fn is_handled(&self) -> bool {
        self.slot.lock().is_none()
    }
}

impl<T> Clone for Event<T> {
    fn clone(&self) -> Self {
        Self {
            slot: Arc::clone(&self.slot),
        }
    }
}

impl<T> PartialEq for Event<T> {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.slot, &other.slot)
    }
}

impl<T: fmt::Debug> fmt::Debug for Event<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Event")
            .field("content", &*self.slot.lock())
            .finish()
    }
}

/// Broadcast channel of single-delivery events.
///
/// Works as an event transmitter for performers: `send` never blocks and
/// never fails, and an event is delivered to at most one observer.
pub struct EventChannel<T> {
    tx: watch::Sender<Option<Event<T>>>,
}

impl<T> EventChannel<T> {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(None);
        Self { tx }
    }

    /// Publish a new event, replacing any unread one.
    pub fn send(&self, payload: T) {
        self.tx.send_replace(Some(Event::new(payload)));
    }

    pub fn subscribe(&self) -> EventObserver<T> {
        EventObserver {
            inner: StateObserver::new(self.tx.subscribe()),
        }
    }
}

impl<T> Default for EventChannel<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Observer that yields only events nobody has taken yet.
pub struct EventObserver<T> {
    inner: StateObserver<Option<Event<T>>>,
}

impl<T> EventObserver<T> {
    /// Wait for the next unhandled event and take it.
    ///
    /// Returns `None` once the channel is dropped.
    pub async fn next_event(&mut self) -> Option<T> {
        loop {
            let latest = self.inner.next().await?;
            if let Some(payload) = latest.and_then(|event| event.take()) {
                return Some(payload);
            }
        }
    }
}
