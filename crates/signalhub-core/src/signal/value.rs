//! Scalar signals — [`ValueSignal`] and its numeric specialization
//! [`NumberSignal`].

use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::broadcast;

use crate::config::SignalConfig;
use crate::event::{SignalId, StateEvent, StateOperation};
use crate::signal::stream::{into_json_stream, EventStream, JsonEventStream};
use crate::signal::{decode_event, Signal, SignalError};

// ---------------------------------------------------------------------------
// ValueSignal
// ---------------------------------------------------------------------------

/// A generic compare-and-swap register.
///
/// Holds one optional value of type `T`. SET unconditionally replaces it;
/// REPLACE compares the current value against the caller's expectation
/// using value equality and rejects on mismatch — the rejected event is
/// still broadcast (with `accepted == false`) so callers detect conflicts
/// without an exception. This is the engine's sole optimistic-concurrency
/// primitive; higher-level conflict resolution is expressed in terms of it.
///
/// # Thread Safety
///
/// State lives behind a `Mutex` and the broadcast send happens while the
/// lock is held, so submits on one signal apply in a total order, submits
/// on different signals never contend, and `subscribe` is linearizable
/// with concurrent submits.
pub struct ValueSignal<T> {
    /// Durable identity.
    id: SignalId,
    /// Current value. `None` models an explicit null.
    state: Mutex<Option<T>>,
    /// Per-signal multicast channel.
    sender: broadcast::Sender<StateEvent<T>>,
}

impl<T: Clone + PartialEq + Send + 'static> ValueSignal<T> {
    /// Creates a signal with no value (a null register).
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(None, SignalConfig::default())
    }

    /// Creates a signal holding the given value, where `None` is an
    /// explicit, observable null.
    #[must_use]
    pub fn with_value(value: Option<T>) -> Self {
        Self::with_config(value, SignalConfig::default())
    }

    /// Creates a signal with an explicit channel configuration.
    #[must_use]
    pub fn with_config(value: Option<T>, config: SignalConfig) -> Self {
        let (sender, _) = broadcast::channel(config.channel_capacity);
        Self {
            id: SignalId::next(),
            state: Mutex::new(value),
            sender,
        }
    }

    /// The signal's durable identity.
    #[must_use]
    pub fn id(&self) -> SignalId {
        self.id
    }

    /// Returns the current value.
    #[must_use]
    pub fn value(&self) -> Option<T> {
        self.state.lock().clone()
    }

    /// Registers a new observer; the first delivered item is a snapshot of
    /// the current value.
    pub fn subscribe(&self) -> EventStream<StateEvent<T>> {
        let state = self.state.lock();
        let receiver = self.sender.subscribe();
        let snapshot = StateEvent::snapshot(self.id.to_string(), state.clone());
        EventStream::new(snapshot, receiver)
    }

    /// Applies one SET or REPLACE event and broadcasts the outcome.
    ///
    /// # Errors
    ///
    /// Returns [`SignalError::UnsupportedOperation`] for a snapshot
    /// submission; state is untouched and nothing is broadcast.
    pub fn submit(&self, mut event: StateEvent<T>) -> Result<(), SignalError> {
        let mut state = self.state.lock();
        match &event.operation {
            StateOperation::Set { value } => {
                *state = value.clone();
                event.accepted = true;
            }
            StateOperation::Replace { value, expected } => {
                if *state == *expected {
                    *state = value.clone();
                    event.accepted = true;
                } else {
                    event.accepted = false;
                }
            }
            StateOperation::Snapshot { .. } => {
                return Err(SignalError::UnsupportedOperation(format!(
                    "snapshot events are emitted by the signal, not submitted to it (event id `{}`)",
                    event.id
                )));
            }
        }
        // Send while holding the lock so subscribers observe events in
        // application order. No subscribers is fine.
        let _ = self.sender.send(event);
        Ok(())
    }
}

impl<T: Clone + PartialEq + Send + 'static> Default for ValueSignal<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> std::fmt::Debug for ValueSignal<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ValueSignal")
            .field("id", &self.id)
            .finish_non_exhaustive()
    }
}

impl<T> Signal for ValueSignal<T>
where
    T: Clone + PartialEq + Send + Serialize + DeserializeOwned + 'static,
{
    fn id(&self) -> SignalId {
        self.id
    }

    fn subscribe_json(&self) -> JsonEventStream {
        into_json_stream(self.subscribe())
    }

    fn submit_json(&self, event: serde_json::Value) -> Result<(), SignalError> {
        let event: StateEvent<T> = decode_event(&event, &["set", "replace", "snapshot"])?;
        self.submit(event)
    }
}

// ---------------------------------------------------------------------------
// NumberSignal
// ---------------------------------------------------------------------------

/// A [`ValueSignal<f64>`] defaulting to `0.0`.
///
/// An explicit null stays distinct from zero: `with_value(None)` yields a
/// signal whose current value is `None`.
///
/// REPLACE uses IEEE 754 equality (`f64`'s `PartialEq`), so an `expected`
/// of NaN never matches and a compare-and-swap against a NaN current value
/// is always rejected. Callers needing to move off a NaN state use SET.
pub struct NumberSignal {
    inner: ValueSignal<f64>,
}

impl NumberSignal {
    /// Creates a signal with the default value `0.0`.
    #[must_use]
    pub fn new() -> Self {
        Self::with_value(Some(0.0))
    }

    /// Creates a signal holding the given value; `None` is honored as an
    /// explicit null.
    #[must_use]
    pub fn with_value(value: Option<f64>) -> Self {
        Self {
            inner: ValueSignal::with_value(value),
        }
    }

    /// Creates a signal with an explicit channel configuration.
    #[must_use]
    pub fn with_config(value: Option<f64>, config: SignalConfig) -> Self {
        Self {
            inner: ValueSignal::with_config(value, config),
        }
    }

    /// The signal's durable identity.
    #[must_use]
    pub fn id(&self) -> SignalId {
        self.inner.id()
    }

    /// Returns the current value.
    #[must_use]
    pub fn value(&self) -> Option<f64> {
        self.inner.value()
    }

    /// Registers a new observer; the first delivered item is a snapshot of
    /// the current value.
    pub fn subscribe(&self) -> EventStream<StateEvent<f64>> {
        self.inner.subscribe()
    }

    /// Applies one SET or REPLACE event and broadcasts the outcome.
    ///
    /// # Errors
    ///
    /// Returns [`SignalError::UnsupportedOperation`] for a snapshot
    /// submission.
    pub fn submit(&self, event: StateEvent<f64>) -> Result<(), SignalError> {
        self.inner.submit(event)
    }
}

impl Default for NumberSignal {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for NumberSignal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NumberSignal")
            .field("id", &self.id())
            .finish_non_exhaustive()
    }
}

impl Signal for NumberSignal {
    fn id(&self) -> SignalId {
        self.inner.id()
    }

    fn subscribe_json(&self) -> JsonEventStream {
        self.inner.subscribe_json()
    }

    fn submit_json(&self, event: serde_json::Value) -> Result<(), SignalError> {
        self.inner.submit_json(event)
    }
}

// ===========================================================================
// Tests
// ===========================================================================
