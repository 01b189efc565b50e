//! Ordered, identity-addressed collection signal.

use fxhash::FxHashMap;
use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::broadcast;

use crate::config::SignalConfig;
use crate::event::{EntryId, InsertPosition, ListEntry, ListOperation, ListStateEvent, SignalId};
use crate::signal::stream::{into_json_stream, EventStream, JsonEventStream};
use crate::signal::{decode_event, Signal, SignalError};

// ---------------------------------------------------------------------------
// ListState — arena with explicit links
// ---------------------------------------------------------------------------

/// The chain itself: a map from id to entry plus head/tail pointers.
///
/// An arena-with-explicit-links rather than an owning-pointer chain, so
/// lookup-by-id stays O(1) while entry identity survives every mutation.
struct ListState<T> {
    entries: FxHashMap<EntryId, ListEntry<T>>,
    head: Option<EntryId>,
    tail: Option<EntryId>,
    /// Next identity to assign. Monotonic; ids are never reused.
    next_entry_id: u64,
}

impl<T: Clone> ListState<T> {
    fn new() -> Self {
        Self {
            entries: FxHashMap::default(),
            head: None,
            tail: None,
            next_entry_id: 1,
        }
    }

    /// Appends a new entry after the current tail, repairing the old
    /// tail's `next` link and the new entry's `previous` link.
    fn push_last(&mut self, value: T) -> EntryId {
        let id = EntryId(self.next_entry_id);
        self.next_entry_id += 1;

        let entry = ListEntry {
            id,
            previous: self.tail,
            next: None,
            value,
        };
        match self.tail {
            Some(tail) => {
                if let Some(old_tail) = self.entries.get_mut(&tail) {
                    old_tail.next = Some(id);
                }
            }
            None => self.head = Some(id),
        }
        self.tail = Some(id);
        self.entries.insert(id, entry);
        id
    }

    /// Removes the entry with the given id, splicing its neighbors
    /// together. Returns `false` if no such entry exists.
    fn remove(&mut self, id: EntryId) -> bool {
        let Some(entry) = self.entries.remove(&id) else {
            return false;
        };
        match entry.previous {
            Some(previous) => {
                if let Some(predecessor) = self.entries.get_mut(&previous) {
                    predecessor.next = entry.next;
                }
            }
            None => self.head = entry.next,
        }
        match entry.next {
            Some(next) => {
                if let Some(successor) = self.entries.get_mut(&next) {
                    successor.previous = entry.previous;
                }
            }
            None => self.tail = entry.previous,
        }
        true
    }

    /// Walks the chain head-to-tail and clones every entry.
    fn in_order(&self) -> Vec<ListEntry<T>> {
        let mut ordered = Vec::with_capacity(self.entries.len());
        let mut cursor = self.head;
        while let Some(id) = cursor {
            match self.entries.get(&id) {
                Some(entry) => {
                    cursor = entry.next;
                    ordered.push(entry.clone());
                }
                None => {
                    debug_assert!(false, "dangling link to {id}");
                    break;
                }
            }
        }
        ordered
    }
}

// ---------------------------------------------------------------------------
// ListSignal
// ---------------------------------------------------------------------------

/// An ordered collection of identity-addressed entries.
///
/// INSERT at `last` appends and is accepted unconditionally; the other
/// insert positions fail fast with an unsupported-operation error (a
/// deliberate, narrow current capability — not something to silently work
/// around). REMOVE splices by id and treats an unknown id as a logical
/// no-op that still broadcasts. Every accepted operation broadcasts the
/// **entire** current entry set, never a diff.
///
/// # Thread Safety
///
/// Same discipline as [`ValueSignal`](crate::signal::ValueSignal): state
/// behind a `Mutex`, broadcast send under the lock, so no observer ever
/// sees a half-spliced chain.
pub struct ListSignal<T> {
    /// Durable identity.
    id: SignalId,
    /// The chain.
    state: Mutex<ListState<T>>,
    /// Per-signal multicast channel.
    sender: broadcast::Sender<ListStateEvent<T>>,
}

impl<T> std::fmt::Debug for ListSignal<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListSignal")
            .field("id", &self.id)
            .finish_non_exhaustive()
    }
}

impl<T: Clone + Send + 'static> ListSignal<T> {
    /// Creates an empty list signal.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(SignalConfig::default())
    }

    /// Creates an empty list signal with an explicit channel configuration.
    #[must_use]
    pub fn with_config(config: SignalConfig) -> Self {
        let (sender, _) = broadcast::channel(config.channel_capacity);
        Self {
            id: SignalId::next(),
            state: Mutex::new(ListState::new()),
            sender,
        }
    }

    /// The signal's durable identity.
    #[must_use]
    pub fn id(&self) -> SignalId {
        self.id
    }

    /// Returns every live entry in chain order, head first.
    #[must_use]
    pub fn entries(&self) -> Vec<ListEntry<T>> {
        self.state.lock().in_order()
    }

    /// Returns the number of live entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.state.lock().entries.len()
    }

    /// Returns `true` if the list holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.state.lock().entries.is_empty()
    }

    /// Registers a new observer; the first delivered item is a snapshot of
    /// the full entry set.
    pub fn subscribe(&self) -> EventStream<ListStateEvent<T>> {
        let state = self.state.lock();
        let receiver = self.sender.subscribe();
        let snapshot = ListStateEvent::snapshot(self.id.to_string(), state.in_order());
        EventStream::new(snapshot, receiver)
    }

    /// Applies one INSERT or REMOVE event and broadcasts the full entry
    /// set to every subscriber.
    ///
    /// # Errors
    ///
    /// Returns [`SignalError::UnsupportedOperation`] for insert positions
    /// other than `last` and for snapshot submissions; state is untouched
    /// and nothing is broadcast.
    pub fn submit(&self, mut event: ListStateEvent<T>) -> Result<(), SignalError> {
        let mut state = self.state.lock();
        match &event.operation {
            ListOperation::Insert { value, position } => {
                if *position != InsertPosition::Last {
                    return Err(SignalError::UnsupportedOperation(format!(
                        "insert position `{position}` is not supported, only `last` (event id `{}`)",
                        event.id
                    )));
                }
                state.push_last(value.clone());
                event.accepted = true;
            }
            ListOperation::Remove { entry } => {
                // An unknown id is a logical no-op; the snapshot below is
                // still broadcast so subscribers stay consistent.
                state.remove(*entry);
                event.accepted = true;
            }
            ListOperation::Snapshot => {
                return Err(SignalError::UnsupportedOperation(format!(
                    "snapshot events are emitted by the signal, not submitted to it (event id `{}`)",
                    event.id
                )));
            }
        }
        event.entries = state.in_order();
        let _ = self.sender.send(event);
        Ok(())
    }
}

impl<T: Clone + Send + 'static> Default for ListSignal<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Signal for ListSignal<T>
where
    T: Clone + Send + Serialize + DeserializeOwned + 'static,
{
    fn id(&self) -> SignalId {
        self.id
    }

    fn subscribe_json(&self) -> JsonEventStream {
        into_json_stream(self.subscribe())
    }

    fn submit_json(&self, event: serde_json::Value) -> Result<(), SignalError> {
        let event: ListStateEvent<T> = decode_event(&event, &["insert", "remove", "snapshot"])?;
        self.submit(event)
    }
}

// ===========================================================================
// Tests
// ===========================================================================
