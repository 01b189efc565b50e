//! # SignalHub Core
//!
//! Server-side signal synchronization engine: shared mutable state that
//! many independent observers watch as a live, consistent view while it is
//! mutated through optimistic-concurrency operations.
//!
//! This crate provides:
//! - **Event model**: SET / REPLACE for scalars, INSERT / REMOVE for
//!   ordered collections — pure data with a JSON wire contract
//! - **Signals**: [`ValueSignal`] (CAS register), [`NumberSignal`]
//!   (numeric, non-null default), [`ListSignal`] (identity-addressed
//!   doubly linked collection)
//! - **Registry**: [`SignalsRegistry`], multiplexing many short-lived
//!   client subscriptions onto long-lived signals
//!
//! ## Design Principles
//!
//! 1. **Single writer per signal** — submits on one signal apply in a
//!    total order; different signals never contend
//! 2. **Snapshot-first subscription** — a new subscriber's first item is
//!    the current state, captured atomically with respect to submits
//! 3. **Full snapshots, never diffs** — every broadcast is a complete,
//!    self-consistent view
//! 4. **Per-signal multicast** — each signal owns its own broadcast
//!    channel; there is no global event bus to contend on
//!
//! ## Example
//!
//! ```rust,ignore
//! use signalhub_core::{StateEvent, ValueSignal};
//! use tokio_stream::StreamExt;
//!
//! let signal = ValueSignal::with_value(Some(0i64));
//! let mut stream = signal.subscribe();
//!
//! signal.submit(StateEvent::replace("req-1", Some(1), Some(0)))?;
//!
//! let snapshot = stream.next().await.unwrap(); // current state first
//! let change = stream.next().await.unwrap();   // then the accepted CAS
//! ```

#![deny(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod event;
pub mod registry;
pub mod signal;

pub use config::SignalConfig;
pub use event::{
    EntryId, InsertPosition, ListEntry, ListOperation, ListStateEvent, SignalId, StateEvent,
    StateOperation,
};
pub use registry::SignalsRegistry;
pub use signal::{
    EventStream, JsonEventStream, ListSignal, NumberSignal, Signal, SignalError, ValueSignal,
};

/// Result type for signal operations.
pub type Result<T> = std::result::Result<T, SignalError>;
