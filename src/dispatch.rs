//! Event classification and typed fan-out.
//!
//! The [`EventDispatcher`] turns each reassembled frame into a typed
//! [`Event`] and invokes every observer registered for that event's kind.
//!
//! # Registry discipline
//!
//! Observers live in a per-kind registry behind a read/write lock.
//! Dispatch snapshots the observer list under the read lock and invokes
//! the callbacks after releasing it, so registering or unregistering an
//! observer concurrently with an in-flight dispatch can never tear the
//! iteration, and a callback may itself register further observers.

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;
use std::sync::Weak;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use tracing::trace;

use crate::error::Result;
use crate::protocol::{Event, EventKind};

// ============================================================================
// Types
// ============================================================================

/// Observer callback, invoked with each event of the registered kind.
type ObserverFn = dyn Fn(&Event) + Send + Sync;

/// One registry entry.
struct RegisteredObserver {
    id: u64,
    callback: Arc<ObserverFn>,
}

/// Shared registry state.
struct Registry {
    observers: RwLock<FxHashMap<EventKind, Vec<RegisteredObserver>>>,
    next_id: AtomicU64,
}

impl Registry {
    fn remove(&self, kind: EventKind, id: u64) {
        let mut observers = self.observers.write();
        if let Some(entries) = observers.get_mut(&kind) {
            entries.retain(|entry| entry.id != id);
        }
    }
}

// ============================================================================
// EventDispatcher
// ============================================================================

/// Classifies frames and fans them out to per-kind observers.
///
/// Cheap to clone; clones share one registry.
#[derive(Clone)]
pub struct EventDispatcher {
    registry: Arc<Registry>,
}

impl Default for EventDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl EventDispatcher {
    /// Creates a dispatcher with an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            registry: Arc::new(Registry {
                observers: RwLock::new(FxHashMap::default()),
                next_id: AtomicU64::new(0),
            }),
        }
    }

    /// Registers an observer for one event kind.
    ///
    /// The observer is invoked from the read-loop task for every event of
    /// `kind` until the returned [`Subscription`] is dropped.
    pub fn observe<F>(&self, kind: EventKind, callback: F) -> Subscription
    where
        F: Fn(&Event) + Send + Sync + 'static,
    {
        let id = self.registry.next_id.fetch_add(1, Ordering::Relaxed);

        self.registry
            .observers
            .write()
            .entry(kind)
            .or_default()
            .push(RegisteredObserver {
                id,
                callback: Arc::new(callback),
            });

        Subscription {
            registry: Arc::downgrade(&self.registry),
            kind,
            id,
            detached: false,
        }
    }

    /// Returns the number of observers currently registered for a kind.
    #[must_use]
    pub fn observer_count(&self, kind: EventKind) -> usize {
        self.registry
            .observers
            .read()
            .get(&kind)
            .map_or(0, Vec::len)
    }

    /// Classifies one frame and notifies the observers of its kind.
    ///
    /// Observers run in registration order, after the registry lock has
    /// been released.
    ///
    /// # Errors
    ///
    /// - [`crate::Error::UnknownEvent`] if the event tag is unrecognised
    /// - [`crate::Error::Json`] if the frame or its payload is malformed
    ///
    /// Both are recoverable: the frame is dropped and later frames
    /// dispatch normally.
    pub fn dispatch(&self, frame: &str) -> Result<()> {
        let event = Event::from_json(frame)?;
        let kind = event.kind();

        let snapshot: Vec<Arc<ObserverFn>> = self
            .registry
            .observers
            .read()
            .get(&kind)
            .map(|entries| entries.iter().map(|entry| Arc::clone(&entry.callback)).collect())
            .unwrap_or_default();

        trace!(%kind, observers = snapshot.len(), "dispatching event");
        for callback in snapshot {
            callback(&event);
        }

        Ok(())
    }
}

// ============================================================================
// Subscription
// ============================================================================

/// Handle to a registered observer.
///
/// Dropping the subscription unregisters the observer; [`Subscription::detach`]
/// keeps it registered for the lifetime of the dispatcher instead.
#[must_use = "dropping a subscription unregisters its observer"]
pub struct Subscription {
    registry: Weak<Registry>,
    kind: EventKind,
    id: u64,
    detached: bool,
}

impl Subscription {
    /// Leaves the observer registered for the dispatcher's lifetime.
    pub fn detach(mut self) {
        self.detached = true;
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if self.detached {
            return;
        }
        if let Some(registry) = self.registry.upgrade() {
            registry.remove(self.kind, self.id);
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("kind", &self.kind)
            .field("id", &self.id)
            .field("detached", &self.detached)
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::atomic::AtomicUsize;

    const KEY_DOWN: &str = r#"{
        "event": "keyDown",
        "action": "com.example.counter.increment",
        "context": "A1",
        "device": "DEV1",
        "payload": {"settings": {}, "coordinates": {"column": 0, "row": 0}}
    }"#;

    fn counting_observer(dispatcher: &EventDispatcher, kind: EventKind) -> (Subscription, Arc<AtomicUsize>) {
        let count = Arc::new(AtomicUsize::new(0));
        let observed = Arc::clone(&count);
        let subscription = dispatcher.observe(kind, move |_| {
            observed.fetch_add(1, Ordering::SeqCst);
        });
        (subscription, count)
    }

    #[test]
    fn test_dispatch_invokes_only_matching_kind() {
        let dispatcher = EventDispatcher::new();
        let (_down, down_count) = counting_observer(&dispatcher, EventKind::KeyDown);
        let (_up, up_count) = counting_observer(&dispatcher, EventKind::KeyUp);

        dispatcher.dispatch(KEY_DOWN).expect("dispatch");

        assert_eq!(down_count.load(Ordering::SeqCst), 1);
        assert_eq!(up_count.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_multiple_observers_all_fire() {
        let dispatcher = EventDispatcher::new();
        let (_first, first_count) = counting_observer(&dispatcher, EventKind::KeyDown);
        let (_second, second_count) = counting_observer(&dispatcher, EventKind::KeyDown);

        dispatcher.dispatch(KEY_DOWN).expect("dispatch");

        assert_eq!(first_count.load(Ordering::SeqCst), 1);
        assert_eq!(second_count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_unknown_tag_fires_nothing() {
        let dispatcher = EventDispatcher::new();
        let (_sub, count) = counting_observer(&dispatcher, EventKind::KeyDown);

        let err = dispatcher
            .dispatch(r#"{"event": "deviceDidExplode"}"#)
            .unwrap_err();

        assert!(err.is_recoverable());
        assert_eq!(count.load(Ordering::SeqCst), 0);

        // Later frames still dispatch.
        dispatcher.dispatch(KEY_DOWN).expect("dispatch");
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_malformed_frame_fires_nothing() {
        let dispatcher = EventDispatcher::new();
        let (_sub, count) = counting_observer(&dispatcher, EventKind::KeyDown);

        let err = dispatcher.dispatch("not json").unwrap_err();
        assert!(err.is_recoverable());
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_dropping_subscription_unregisters() {
        let dispatcher = EventDispatcher::new();
        let (subscription, count) = counting_observer(&dispatcher, EventKind::KeyDown);
        assert_eq!(dispatcher.observer_count(EventKind::KeyDown), 1);

        drop(subscription);
        assert_eq!(dispatcher.observer_count(EventKind::KeyDown), 0);

        dispatcher.dispatch(KEY_DOWN).expect("dispatch");
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_detached_subscription_survives_drop() {
        let dispatcher = EventDispatcher::new();
        let (subscription, count) = counting_observer(&dispatcher, EventKind::KeyDown);

        subscription.detach();
        assert_eq!(dispatcher.observer_count(EventKind::KeyDown), 1);

        dispatcher.dispatch(KEY_DOWN).expect("dispatch");
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_observer_may_register_during_dispatch() {
        let dispatcher = EventDispatcher::new();
        let registered = Arc::new(AtomicUsize::new(0));

        let inner_dispatcher = dispatcher.clone();
        let inner_registered = Arc::clone(&registered);
        let subscription = dispatcher.observe(EventKind::KeyDown, move |_| {
            // Registration while a dispatch is in flight must not deadlock.
            let count = Arc::clone(&inner_registered);
            inner_dispatcher
                .observe(EventKind::KeyUp, move |_| {
                    count.fetch_add(1, Ordering::SeqCst);
                })
                .detach();
        });

        dispatcher.dispatch(KEY_DOWN).expect("dispatch");
        assert_eq!(dispatcher.observer_count(EventKind::KeyUp), 1);
        drop(subscription);
    }

    #[test]
    fn test_unregistering_mid_snapshot_is_safe() {
        // An observer removed after the snapshot is taken still sees the
        // event already in flight, but never a later one.
        let dispatcher = EventDispatcher::new();
        let (subscription, count) = counting_observer(&dispatcher, EventKind::KeyDown);

        dispatcher.dispatch(KEY_DOWN).expect("dispatch");
        drop(subscription);
        dispatcher.dispatch(KEY_DOWN).expect("dispatch");

        assert_eq!(count.load(Ordering::SeqCst), 1);
    }
}
