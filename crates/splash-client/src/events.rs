//! Typed session events.
//!
//! The session pushes its state changes out through an [`EventBus`]
//! rather than requiring callers to poll. Delivery is synchronous and
//! in publish order; observers run on whatever task published the
//! event (usually the session's reader task), so they should be quick.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use splash_protocol::{GameState, Identity};

/// Something observable happened to the session.
#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// The websocket is up and the session is joining the room.
    ConnectionOpened,
    /// The connection ended, explicitly or not.
    ConnectionClosed,
    /// The transport reported an error before closing.
    ConnectionError(String),
    /// The relay assigned (or re-confirmed) our seat.
    SeatAssigned(usize),
    /// The live roster changed.
    RosterUpdated(Vec<Identity>),
    /// An authoritative snapshot arrived.
    StateUpdated(GameState),
}

/// Handle returned by [`EventBus::subscribe`]; pass it back to
/// [`EventBus::unsubscribe`] to stop receiving events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Observer = Arc<dyn Fn(&SessionEvent) + Send + Sync>;

/// A list of observers notified of every session event.
///
/// Observers are invoked in subscription order. A panicking observer
/// is caught and skipped — one broken listener never silences the
/// rest.
#[derive(Default)]
pub struct EventBus {
    observers: Mutex<Vec<(SubscriptionId, Observer)>>,
    next_id: AtomicU64,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an observer and returns its unsubscribe handle.
    pub fn subscribe<F>(&self, observer: F) -> SubscriptionId
    where
        F: Fn(&SessionEvent) + Send + Sync + 'static,
    {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.observers
            .lock()
            .expect("event bus lock poisoned")
            .push((id, Arc::new(observer)));
        id
    }

    /// Removes an observer. Returns `false` if the id was not
    /// subscribed (already removed, or never valid).
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut observers = self.observers.lock().expect("event bus lock poisoned");
        let before = observers.len();
        observers.retain(|(sub, _)| *sub != id);
        observers.len() != before
    }

    /// Delivers an event to every observer, in subscription order.
    ///
    /// The observer list is snapshotted first, so an observer may
    /// subscribe or unsubscribe from inside its callback without
    /// deadlocking.
    pub fn publish(&self, event: &SessionEvent) {
        let snapshot: Vec<Observer> = self
            .observers
            .lock()
            .expect("event bus lock poisoned")
            .iter()
            .map(|(_, obs)| Arc::clone(obs))
            .collect();

        for observer in snapshot {
            if catch_unwind(AssertUnwindSafe(|| observer(event))).is_err() {
                tracing::warn!("session event observer panicked, skipping");
            }
        }
    }
}
