//! Event model for the signal synchronization engine.
//!
//! Pure data plus its serde contract — no behavior lives here. Events are
//! the wire model: a client submits a mutation request as a JSON object and
//! every subscriber receives the echoed event (with its outcome) as a full,
//! self-consistent snapshot of the signal.
//!
//! ## Types
//!
//! - [`SignalId`] / [`EntryId`] — durable identities for signals and list
//!   entries
//! - [`StateEvent`] + [`StateOperation`] — scalar signal mutations
//!   (SET / REPLACE) and snapshots
//! - [`ListStateEvent`] + [`ListOperation`] — ordered-collection mutations
//!   (INSERT / REMOVE) and snapshots
//! - [`ListEntry`] — one identity-addressed link in a list signal's chain

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// SignalId
// ---------------------------------------------------------------------------

/// Process-unique signal identity.
///
/// Assigned once at signal construction from a process-wide monotonic
/// counter and never reassigned. Distinct from the ephemeral client
/// subscription ids the registry multiplexes onto a signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SignalId(pub u64);

impl SignalId {
    /// Allocates the next process-unique id.
    pub(crate) fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for SignalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "signal-{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// EntryId
// ---------------------------------------------------------------------------

/// Stable identity of one list entry.
///
/// Assigned at insertion from the owning list's monotonic counter and never
/// reused, so a client can reference "the entry I inserted" across
/// broadcasts regardless of how the chain is spliced afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntryId(pub u64);

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "entry-{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// StateOperation — scalar signal commands
// ---------------------------------------------------------------------------

/// Command discriminator for scalar signals.
///
/// A closed tagged union: the vocabulary is intentionally small and fixed,
/// and every signal matches on it exhaustively. `None` values model an
/// explicit null, which is distinct from "no value supplied".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub enum StateOperation<T> {
    /// Unconditionally replace the current value. Always accepted.
    Set {
        /// The new value.
        #[serde(default)]
        value: Option<T>,
    },
    /// Compare-and-swap: replace only if the current value equals
    /// `expected`. The engine's sole optimistic-concurrency primitive.
    Replace {
        /// The new value to install on a successful compare.
        #[serde(default)]
        value: Option<T>,
        /// The value the caller believes is current.
        #[serde(default)]
        expected: Option<T>,
    },
    /// Full-state snapshot, emitted by the signal as the first item of
    /// every subscription. Never submitted by callers.
    Snapshot {
        /// The current value.
        #[serde(default)]
        value: Option<T>,
    },
}

// ---------------------------------------------------------------------------
// StateEvent
// ---------------------------------------------------------------------------

/// One mutation request (or its echoed outcome) for a scalar signal.
///
/// The `id` is an opaque caller-supplied correlation id; after `submit` the
/// same event is broadcast to every subscriber with `accepted` reporting
/// whether the mutation was applied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateEvent<T> {
    /// Caller-supplied correlation id. Opaque to the engine.
    pub id: String,
    /// The requested command.
    #[serde(flatten)]
    pub operation: StateOperation<T>,
    /// Outcome of the mutation, filled in by the signal before broadcast.
    /// A rejected REPLACE is still delivered with `accepted == false`.
    #[serde(default)]
    pub accepted: bool,
}

impl<T> StateEvent<T> {
    /// Builds a SET request.
    pub fn set(id: impl Into<String>, value: Option<T>) -> Self {
        Self {
            id: id.into(),
            operation: StateOperation::Set { value },
            accepted: false,
        }
    }

    /// Builds a REPLACE (compare-and-swap) request.
    pub fn replace(id: impl Into<String>, value: Option<T>, expected: Option<T>) -> Self {
        Self {
            id: id.into(),
            operation: StateOperation::Replace { value, expected },
            accepted: false,
        }
    }

    /// Builds the snapshot event delivered first to a new subscriber.
    pub(crate) fn snapshot(id: impl Into<String>, value: Option<T>) -> Self {
        Self {
            id: id.into(),
            operation: StateOperation::Snapshot { value },
            accepted: true,
        }
    }
}

// ---------------------------------------------------------------------------
// ListEntry
// ---------------------------------------------------------------------------

/// One identity-addressed link in a list signal's doubly linked chain.
///
/// Links reference stable [`EntryId`]s rather than positions: removal and
/// future reordering never renumber other entries. Exactly one live entry
/// has `previous == None` (the head) and exactly one has `next == None`
/// (the tail), unless the list is empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListEntry<T> {
    /// Stable identity, assigned at insertion, never reused.
    pub id: EntryId,
    /// Predecessor id, or `None` for the head.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous: Option<EntryId>,
    /// Successor id, or `None` for the tail.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next: Option<EntryId>,
    /// The entry's value.
    pub value: T,
}

// ---------------------------------------------------------------------------
// InsertPosition
// ---------------------------------------------------------------------------

/// Where an INSERT places its new entry.
///
/// Only [`Last`](InsertPosition::Last) is currently implemented; the others
/// fail fast with an unsupported-operation error rather than silently
/// guessing a semantics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InsertPosition {
    /// Before the current head.
    First,
    /// After the current tail.
    Last,
    /// Before a named entry.
    Before,
    /// After a named entry.
    After,
}

impl fmt::Display for InsertPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::First => "first",
            Self::Last => "last",
            Self::Before => "before",
            Self::After => "after",
        };
        f.write_str(name)
    }
}

// ---------------------------------------------------------------------------
// ListOperation — list signal commands
// ---------------------------------------------------------------------------

/// Command discriminator for list signals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ListOperation<T> {
    /// Insert one new entry; the signal assigns its identity and repairs
    /// the neighboring links.
    Insert {
        /// The new entry's value.
        value: T,
        /// Where to place the entry.
        position: InsertPosition,
    },
    /// Remove the entry with the given id, splicing its neighbors together.
    /// Matched by id only.
    Remove {
        /// Identity of the entry to delete.
        entry: EntryId,
    },
    /// Full-state snapshot, emitted by the signal as the first item of
    /// every subscription. Never submitted by callers.
    Snapshot,
}

// ---------------------------------------------------------------------------
// ListStateEvent
// ---------------------------------------------------------------------------

/// One mutation request (or its echoed outcome) for a list signal.
///
/// Every broadcast carries the **entire** current entry set in `entries`
/// (chain order, head first) — never a diff. Subscribers reconstruct order
/// by walking `previous`/`next` from the unique null-`previous` head.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct ListStateEvent<T> {
    /// Caller-supplied correlation id. Opaque to the engine.
    pub id: String,
    /// The requested command.
    #[serde(flatten)]
    pub operation: ListOperation<T>,
    /// Full entry set after the operation, filled in by the signal before
    /// broadcast. Empty on inbound requests.
    #[serde(default)]
    pub entries: Vec<ListEntry<T>>,
    /// Outcome of the mutation, filled in by the signal before broadcast.
    #[serde(default)]
    pub accepted: bool,
}

impl<T> ListStateEvent<T> {
    /// Builds an INSERT request for the given position.
    pub fn insert(id: impl Into<String>, value: T, position: InsertPosition) -> Self {
        Self {
            id: id.into(),
            operation: ListOperation::Insert { value, position },
            entries: Vec::new(),
            accepted: false,
        }
    }

    /// Builds an INSERT request appending after the current tail.
    pub fn insert_last(id: impl Into<String>, value: T) -> Self {
        Self::insert(id, value, InsertPosition::Last)
    }

    /// Builds a REMOVE request for the entry with the given id.
    pub fn remove(id: impl Into<String>, entry: EntryId) -> Self {
        Self {
            id: id.into(),
            operation: ListOperation::Remove { entry },
            entries: Vec::new(),
            accepted: false,
        }
    }

    /// Builds the snapshot event delivered first to a new subscriber.
    pub(crate) fn snapshot(id: impl Into<String>, entries: Vec<ListEntry<T>>) -> Self {
        Self {
            id: id.into(),
            operation: ListOperation::Snapshot,
            entries,
            accepted: true,
        }
    }
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    // --- Identity tests ---

    #[test]
    fn test_signal_id_display() {
        assert_eq!(SignalId(7).to_string(), "signal-7");
        assert_eq!(EntryId(3).to_string(), "entry-3");
    }

    #[test]
    fn test_signal_id_unique_and_monotonic() {
        let a = SignalId::next();
        let b = SignalId::next();
        assert_ne!(a, b);
        assert!(b.0 > a.0);
    }

    // --- StateEvent wire shape tests ---

    #[test]
    fn test_set_event_wire_shape() {
        let event = StateEvent::set("req-1", Some(42i64));
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(
            json,
            json!({ "id": "req-1", "type": "set", "value": 42, "accepted": false })
        );
    }

    #[test]
    fn test_replace_event_roundtrip() {
        let event = StateEvent::replace("req-2", Some("new".to_string()), Some("old".to_string()));
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "replace");
        assert_eq!(json["expected"], "old");
        let back: StateEvent<String> = serde_json::from_value(json).unwrap();
        assert_eq!(back, event);
    }

    #[test]
    fn test_set_event_null_value() {
        let event: StateEvent<i64> = serde_json::from_value(json!({
            "id": "req-3", "type": "set", "value": null
        }))
        .unwrap();
        assert_eq!(event.operation, StateOperation::Set { value: None });
        assert!(!event.accepted);
    }

    // --- ListStateEvent wire shape tests ---

    #[test]
    fn test_insert_event_wire_shape() {
        let event = ListStateEvent::insert_last("req-4", "hello".to_string());
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "insert");
        assert_eq!(json["position"], "last");
        assert_eq!(json["value"], "hello");
    }

    #[test]
    fn test_remove_event_roundtrip() {
        let event: ListStateEvent<String> = ListStateEvent::remove("req-5", EntryId(9));
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "remove");
        assert_eq!(json["entry"], 9);
        let back: ListStateEvent<String> = serde_json::from_value(json).unwrap();
        assert_eq!(back, event);
    }

    #[test]
    fn test_list_entry_omits_unset_links() {
        let entry = ListEntry {
            id: EntryId(1),
            previous: None,
            next: None,
            value: 5i64,
        };
        let json = serde_json::to_value(&entry).unwrap();
        assert!(json.get("previous").is_none());
        assert!(json.get("next").is_none());
    }

    #[test]
    fn test_snapshot_event_carries_entries() {
        let entries = vec![
            ListEntry {
                id: EntryId(1),
                previous: None,
                next: Some(EntryId(2)),
                value: 10i64,
            },
            ListEntry {
                id: EntryId(2),
                previous: Some(EntryId(1)),
                next: None,
                value: 20i64,
            },
        ];
        let event = ListStateEvent::snapshot("signal-1", entries.clone());
        let json = serde_json::to_value(&event).unwrap();
        let back: ListStateEvent<i64> = serde_json::from_value(json).unwrap();
        assert_eq!(back.entries, entries);
        assert!(back.accepted);
    }
}
