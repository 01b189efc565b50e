//! Signal abstractions — shared mutable state with snapshot-first
//! subscriptions.
//!
//! A signal is one unit of server-owned shared state: a durable identity,
//! the state itself, and a multicast notification channel. Mutations enter
//! through a single `submit` entry point that serializes writers on that
//! signal while leaving unrelated signals fully parallel; every accepted or
//! rejected mutation is broadcast to all current subscribers as a complete,
//! internally consistent snapshot.
//!
//! ## Concrete shapes
//!
//! - [`ValueSignal<T>`] — generic compare-and-swap register
//! - [`NumberSignal`] — numeric specialization defaulting to `0.0`
//! - [`ListSignal<T>`] — ordered, identity-addressed collection
//!
//! The [`Signal`] trait is the type-erased surface the registry and
//! transport consume: submit and subscribe speak `serde_json::Value`, since
//! events cross the process boundary as JSON.

mod list;
mod stream;
mod value;

pub use list::ListSignal;
pub use stream::{EventStream, JsonEventStream};
pub use value::{NumberSignal, ValueSignal};

use serde::de::DeserializeOwned;

use crate::event::SignalId;

// ---------------------------------------------------------------------------
// SignalError
// ---------------------------------------------------------------------------

/// Protocol violations raised by signal operations.
///
/// These are programming/protocol errors, fatal to the call and never
/// silently ignored. A rejected REPLACE is **not** an error — it is a
/// normal outcome delivered to subscribers as a not-accepted event.
#[derive(Debug, thiserror::Error)]
pub enum SignalError {
    /// The event names an operation this signal cannot apply.
    #[error("unsupported operation: {0}")]
    UnsupportedOperation(String),
    /// The event payload does not decode as this signal's event type.
    #[error("malformed event payload: {0}")]
    MalformedEvent(String),
}

// ---------------------------------------------------------------------------
// Signal
// ---------------------------------------------------------------------------

/// Type-erased signal surface.
///
/// Signals of any element type are multiplexed behind this trait by the
/// registry; the transport layer feeds inbound client events to
/// [`submit_json`](Signal::submit_json) and pipes
/// [`subscribe_json`](Signal::subscribe_json) back to the client.
pub trait Signal: Send + Sync + std::fmt::Debug {
    /// The signal's durable identity, assigned once at construction.
    fn id(&self) -> SignalId;

    /// Registers a new observer.
    ///
    /// The first delivered item is a snapshot event representing current
    /// state, captured indivisibly with respect to concurrent submits: a
    /// subscriber never misses a mutation that happened-before this call
    /// returned and never sees a transient mid-mutation state.
    fn subscribe_json(&self) -> JsonEventStream;

    /// Applies exactly one event, then broadcasts the outcome to every
    /// current subscriber.
    ///
    /// # Errors
    ///
    /// Returns [`SignalError`] for unknown or unsupported event shapes;
    /// state is left untouched and nothing is broadcast.
    fn submit_json(&self, event: serde_json::Value) -> Result<(), SignalError>;
}

/// Decodes an inbound JSON event, classifying failures.
///
/// An unknown `type` discriminator is an unsupported operation whose
/// message identifies the offending payload; a known discriminator whose
/// body fails to decode is a malformed event.
pub(crate) fn decode_event<E: DeserializeOwned>(
    payload: &serde_json::Value,
    known_types: &[&str],
) -> Result<E, SignalError> {
    let kind = payload
        .get("type")
        .and_then(serde_json::Value::as_str)
        .ok_or_else(|| {
            SignalError::MalformedEvent(format!("missing `type` discriminator in {payload}"))
        })?;
    if !known_types.contains(&kind) {
        return Err(SignalError::UnsupportedOperation(format!(
            "unknown event type `{kind}` in payload {payload}"
        )));
    }
    serde_json::from_value(payload.clone())
        .map_err(|err| SignalError::MalformedEvent(format!("invalid `{kind}` event: {err}")))
}
