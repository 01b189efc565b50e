//! Snapshot-first event streams.
//!
//! [`EventStream`] wraps the broadcast channel of one signal in an async
//! `Stream` whose **first** item is the full-state snapshot captured at
//! subscription time, followed by every event broadcast after it. The
//! snapshot and the receiver are paired while holding the signal's state
//! lock, so a subscriber never misses a mutation that completed before its
//! subscribe call returned and never observes a torn intermediate state.
//!
//! # Implementation Note
//!
//! Uses [`BroadcastStream`](tokio_stream::wrappers::BroadcastStream)
//! internally for correct async wakeup semantics. A naive manual
//! `poll_next` with `try_recv` + `cx.waker().wake_by_ref()` busy-spins at
//! 100% CPU; `BroadcastStream` only wakes the task when new data is
//! actually available.

use std::pin::Pin;
use std::task::{Context, Poll};

use serde::Serialize;
use tokio::sync::broadcast;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::{Stream, StreamExt};

// ---------------------------------------------------------------------------
// EventStream
// ---------------------------------------------------------------------------

/// Async stream of one subscriber's view of a signal.
///
/// Yields the subscription-time snapshot first, then every subsequent
/// broadcast. Lagged events are silently skipped (with a `tracing::debug!`
/// log); the stream terminates when the signal is dropped.
///
/// All fields are `Unpin` (including `BroadcastStream`), so the struct is
/// `Unpin` and works directly with `tokio::select!` without explicit
/// pinning.
pub struct EventStream<E> {
    /// Snapshot captured at subscription time, delivered first. Boxed so
    /// the stream stays `Unpin` for any event type.
    snapshot: Option<Box<E>>,
    /// Inner `BroadcastStream` that handles proper async wakeup.
    inner: BroadcastStream<E>,
    /// Whether the stream has terminated.
    terminated: bool,
}

impl<E: Clone + Send + 'static> EventStream<E> {
    /// Pairs a snapshot with the broadcast receiver created alongside it.
    pub(crate) fn new(snapshot: E, receiver: broadcast::Receiver<E>) -> Self {
        Self {
            snapshot: Some(Box::new(snapshot)),
            inner: BroadcastStream::new(receiver),
            terminated: false,
        }
    }

    /// Returns `true` if the stream has terminated.
    #[must_use]
    pub fn is_terminated(&self) -> bool {
        self.terminated
    }
}

impl<E: Clone + Send + 'static> Stream for EventStream<E> {
    type Item = E;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();

        if this.terminated {
            return Poll::Ready(None);
        }

        if let Some(snapshot) = this.snapshot.take() {
            return Poll::Ready(Some(*snapshot));
        }

        // Delegate to BroadcastStream, looping on lag errors.
        loop {
            match Pin::new(&mut this.inner).poll_next(cx) {
                Poll::Ready(Some(Ok(event))) => return Poll::Ready(Some(event)),
                Poll::Ready(Some(Err(BroadcastStreamRecvError::Lagged(missed)))) => {
                    tracing::debug!(missed, "signal subscriber lagged, skipping missed events");
                }
                Poll::Ready(None) => {
                    this.terminated = true;
                    return Poll::Ready(None);
                }
                Poll::Pending => return Poll::Pending,
            }
        }
    }
}

// ---------------------------------------------------------------------------
// JsonEventStream
// ---------------------------------------------------------------------------

/// Type-erased event stream carrying events as JSON values.
///
/// This is what the registry and transport layer consume: signals of any
/// element type are multiplexed behind [`Signal`](crate::signal::Signal),
/// whose `subscribe_json` returns this.
pub type JsonEventStream = Pin<Box<dyn Stream<Item = serde_json::Value> + Send>>;

/// Erases a typed [`EventStream`] into a [`JsonEventStream`].
pub(crate) fn into_json_stream<E>(stream: EventStream<E>) -> JsonEventStream
where
    E: Clone + Send + Serialize + 'static,
{
    Box::pin(stream.filter_map(|event| match serde_json::to_value(&event) {
        Ok(json) => Some(json),
        Err(err) => {
            tracing::error!(error = %err, "dropping signal event that failed to serialize");
            None
        }
    }))
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_snapshot_delivered_first() {
        let (tx, rx) = broadcast::channel(8);
        let mut stream = EventStream::new(0i64, rx);

        tx.send(1).unwrap();
        tx.send(2).unwrap();

        assert_eq!(stream.next().await, Some(0));
        assert_eq!(stream.next().await, Some(1));
        assert_eq!(stream.next().await, Some(2));
    }

    #[tokio::test]
    async fn test_stream_terminates_when_sender_dropped() {
        let (tx, rx) = broadcast::channel(8);
        let mut stream = EventStream::new(0i64, rx);
        drop(tx);

        assert_eq!(stream.next().await, Some(0));
        assert_eq!(stream.next().await, None);
        assert!(stream.is_terminated());
    }

    #[tokio::test]
    async fn test_lagged_subscriber_skips_missed_events() {
        let (tx, rx) = broadcast::channel(2);
        let mut stream = EventStream::new(0i64, rx);

        for i in 1..=5 {
            tx.send(i).unwrap();
        }

        assert_eq!(stream.next().await, Some(0));
        // Only the last two events survive the capacity-2 buffer.
        assert_eq!(stream.next().await, Some(4));
        assert_eq!(stream.next().await, Some(5));
    }

    #[tokio::test]
    async fn test_json_stream_maps_events() {
        let (tx, rx) = broadcast::channel(8);
        let stream = EventStream::new("snap".to_string(), rx);
        let mut json = into_json_stream(stream);

        tx.send("next".to_string()).unwrap();

        assert_eq!(json.next().await, Some(serde_json::json!("snap")));
        assert_eq!(json.next().await, Some(serde_json::json!("next")));
    }
}
