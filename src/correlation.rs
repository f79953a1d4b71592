//! Request/response correlation over the push protocol.
//!
//! The host never answers a command directly; results arrive as ordinary
//! events some time later. [`await_event`] synthesizes an awaitable call
//! from that: register a transient observer for the expected event kind,
//! send the command, resolve with the first event matching the predicate.
//!
//! # Exactly-once resolution
//!
//! A [`ResponseSlot`] owns the pending call's completion. Its resolved
//! flag is a single atomic swap, so a race between an arriving event and
//! anything else that settles the call yields exactly one observable
//! outcome; the loser is a silent no-op. Cancellation is cooperative:
//! dropping the pending future drops the observer's subscription, so no
//! observer ever outlives its caller.

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;
use tokio::sync::oneshot;
use tracing::trace;

use crate::dispatch::EventDispatcher;
use crate::error::{Error, Result};
use crate::protocol::{Event, EventKind};
use crate::transport::Socket;

// ============================================================================
// ResponseSlot
// ============================================================================

/// Single-resolution completion slot for one pending call.
pub struct ResponseSlot<T> {
    resolved: AtomicBool,
    sender: Mutex<Option<oneshot::Sender<T>>>,
}

impl<T> ResponseSlot<T> {
    /// Creates a slot and the receiver its resolution is delivered on.
    #[must_use]
    pub fn channel() -> (Arc<Self>, oneshot::Receiver<T>) {
        let (sender, receiver) = oneshot::channel();
        let slot = Arc::new(Self {
            resolved: AtomicBool::new(false),
            sender: Mutex::new(Some(sender)),
        });
        (slot, receiver)
    }

    /// Resolves the slot with `value` if it is still pending.
    ///
    /// The first caller wins; every later call is a no-op returning
    /// `false`. The winning transition is a single atomic swap.
    pub fn try_resolve(&self, value: T) -> bool {
        if self.resolved.swap(true, Ordering::AcqRel) {
            return false;
        }

        match self.sender.lock().take() {
            // A dropped receiver means the caller cancelled; still resolved.
            Some(sender) => sender.send(value).is_ok(),
            None => false,
        }
    }

    /// Returns `true` once the slot has been settled.
    #[inline]
    #[must_use]
    pub fn is_resolved(&self) -> bool {
        self.resolved.load(Ordering::Acquire)
    }
}

// ============================================================================
// await_event
// ============================================================================

/// Sends `command` and waits for the first `kind` event matching `context`.
///
/// With `context = None` any event of the kind matches; otherwise only an
/// event scoped to that exact context resolves the call. Non-matching
/// events are ignored and the observer stays registered.
///
/// Dropping the returned future cancels the call and unregisters the
/// observer; a matching event arriving afterwards is a silent no-op.
///
/// # Errors
///
/// - [`Error::Operation`] / [`Error::WebSocket`] if the send fails
/// - [`Error::ConnectionClosed`] if the session ends before a matching
///   event arrives
pub async fn await_event(
    socket: &Arc<Socket>,
    dispatcher: &EventDispatcher,
    kind: EventKind,
    context: Option<String>,
    command: String,
) -> Result<Event> {
    let (slot, receiver) = ResponseSlot::channel();

    // Register before sending so an immediate answer cannot be missed.
    let _subscription = dispatcher.observe(kind, {
        let slot = Arc::clone(&slot);
        move |event: &Event| {
            let matched = match context.as_deref() {
                Some(context) => event.context() == Some(context),
                None => true,
            };
            if matched && slot.try_resolve(event.clone()) {
                trace!(%kind, "pending call resolved");
            }
        }
    });

    socket.send(command).await?;

    tokio::select! {
        // Prefer a resolution that raced the close.
        biased;
        event = receiver => event.map_err(|_| Error::ConnectionClosed),
        _ = socket.wait_for_close() => Err(Error::ConnectionClosed),
    }
}

// ============================================================================
// Tests
// ============================================================================
