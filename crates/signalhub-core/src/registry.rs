//! Process-wide signal registry.
//!
//! Multiplexes many short-lived client subscription ids onto a smaller set
//! of long-lived signals: several clients may observe the same signal, each
//! client id binds to at most one signal at a time, and a signal stays
//! alive until it is fully unregistered. The registry is an explicit,
//! constructible component — its lifetime is owned by whatever composes
//! the endpoint layer, never a hidden singleton.
//!
//! # Thread Safety
//!
//! One `RwLock` guards the three indices together, so `register` /
//! `unregister` of the same id are mutually exclusive while reads (`get`,
//! `contains`, counts) proceed concurrently with each other.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use parking_lot::RwLock;

use crate::event::SignalId;
use crate::signal::Signal;

// ---------------------------------------------------------------------------
// SignalsRegistry
// ---------------------------------------------------------------------------

/// Bidirectional mapping between client subscription ids and signals.
///
/// Three indices provide O(1) lookups:
/// - primary: [`SignalId`] → signal (first writer wins on identity)
/// - by client: client subscription id → [`SignalId`]
/// - reverse: [`SignalId`] → set of client subscription ids (for full
///   teardown)
pub struct SignalsRegistry {
    inner: RwLock<RegistryInner>,
}

#[derive(Default)]
struct RegistryInner {
    signals: HashMap<SignalId, Arc<dyn Signal>>,
    signal_by_client: HashMap<String, SignalId>,
    clients_by_signal: HashMap<SignalId, HashSet<String>>,
}

impl SignalsRegistry {
    /// Creates a new empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(RegistryInner::default()),
        }
    }

    /// Binds a client subscription id to a signal.
    ///
    /// If a signal with the same identity is already registered (possibly
    /// under other client ids), it is **not** re-inserted — only the new
    /// client mapping is added, so the first registration wins on signal
    /// identity while shared subscriptions are unlimited. A client id that
    /// was bound to a different signal is first unbound from it; a client
    /// id maps to at most one signal at a time.
    pub fn register(&self, client_subscription_id: impl Into<String>, signal: Arc<dyn Signal>) {
        let client_id = client_subscription_id.into();
        let signal_id = signal.id();
        let mut inner = self.inner.write();

        if let Some(previous) = inner
            .signal_by_client
            .insert(client_id.clone(), signal_id)
        {
            if previous != signal_id {
                if let Some(clients) = inner.clients_by_signal.get_mut(&previous) {
                    clients.remove(&client_id);
                }
            }
        }
        inner.signals.entry(signal_id).or_insert(signal);
        inner
            .clients_by_signal
            .entry(signal_id)
            .or_default()
            .insert(client_id.clone());

        tracing::debug!(%signal_id, client = %client_id, "registered client subscription");
    }

    /// Looks up the signal bound to a client subscription id.
    ///
    /// Absence is a normal outcome (e.g. a race with concurrent
    /// unregistration), never an error.
    #[must_use]
    pub fn get(&self, client_subscription_id: &str) -> Option<Arc<dyn Signal>> {
        let inner = self.inner.read();
        let signal_id = inner.signal_by_client.get(client_subscription_id)?;
        inner.signals.get(signal_id).cloned()
    }

    /// Looks up a signal by its durable identity.
    #[must_use]
    pub fn get_by_signal_id(&self, signal_id: SignalId) -> Option<Arc<dyn Signal>> {
        self.inner.read().signals.get(&signal_id).cloned()
    }

    /// Returns `true` if the client subscription id is bound.
    #[must_use]
    pub fn contains(&self, client_subscription_id: &str) -> bool {
        self.inner
            .read()
            .signal_by_client
            .contains_key(client_subscription_id)
    }

    /// Returns `true` if no signals are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.read().signals.is_empty()
    }

    /// Returns the number of distinct registered signals.
    #[must_use]
    pub fn signal_count(&self) -> usize {
        self.inner.read().signals.len()
    }

    /// Returns the number of client subscription mappings, which is at
    /// least [`signal_count`](Self::signal_count).
    #[must_use]
    pub fn client_subscription_count(&self) -> usize {
        self.inner.read().signal_by_client.len()
    }

    /// Returns every client subscription id bound to a signal.
    #[must_use]
    pub fn client_ids_for(&self, signal_id: SignalId) -> HashSet<String> {
        self.inner
            .read()
            .clients_by_signal
            .get(&signal_id)
            .cloned()
            .unwrap_or_default()
    }

    /// Removes a signal and **every** client mapping pointing to it —
    /// full teardown. After this the signal is eligible for collection.
    pub fn unregister(&self, signal_id: SignalId) {
        let mut inner = self.inner.write();
        inner.signals.remove(&signal_id);
        if let Some(clients) = inner.clients_by_signal.remove(&signal_id) {
            for client_id in &clients {
                inner.signal_by_client.remove(client_id);
            }
            tracing::debug!(
                %signal_id,
                clients = clients.len(),
                "unregistered signal and its client subscriptions"
            );
        }
    }

    /// Removes only one client's binding — partial teardown. The signal
    /// and any other client bindings to it remain intact. Used when a
    /// single browser tab disconnects while others still observe the same
    /// signal.
    pub fn remove_client_mapping(&self, client_subscription_id: &str) {
        let mut inner = self.inner.write();
        if let Some(signal_id) = inner.signal_by_client.remove(client_subscription_id) {
            if let Some(clients) = inner.clients_by_signal.get_mut(&signal_id) {
                clients.remove(client_subscription_id);
            }
            tracing::debug!(%signal_id, client = client_subscription_id, "removed client subscription");
        }
    }
}

impl Default for SignalsRegistry {
    fn default() -> Self {
        Self::new()
    }
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signal::ValueSignal;

    fn make_signal() -> Arc<dyn Signal> {
        Arc::new(ValueSignal::<i64>::new())
    }

    // --- Register tests ---

    #[test]
    fn test_register_and_get() {
        let registry = SignalsRegistry::new();
        let signal = make_signal();
        registry.register("client-1", Arc::clone(&signal));

        let found = registry.get("client-1").unwrap();
        assert_eq!(found.id(), signal.id());
        assert!(registry.contains("client-1"));
        assert!(!registry.is_empty());
    }

    #[test]
    fn test_shared_subscription_counts() {
        let registry = SignalsRegistry::new();
        let signal = make_signal();
        registry.register("client-1", Arc::clone(&signal));
        registry.register("client-2", Arc::clone(&signal));

        assert_eq!(registry.signal_count(), 1);
        assert_eq!(registry.client_subscription_count(), 2);

        let clients = registry.client_ids_for(signal.id());
        assert!(clients.contains("client-1"));
        assert!(clients.contains("client-2"));
    }

    #[test]
    fn test_first_registration_wins_on_signal_identity() {
        let registry = SignalsRegistry::new();
        let signal = make_signal();
        registry.register("client-1", Arc::clone(&signal));
        registry.register("client-2", Arc::clone(&signal));

        // Both client ids resolve to the same underlying instance.
        let a = registry.get("client-1").unwrap();
        let b = registry.get("client-2").unwrap();
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn test_client_id_rebinds_to_at_most_one_signal() {
        let registry = SignalsRegistry::new();
        let first = make_signal();
        let second = make_signal();
        registry.register("client-1", Arc::clone(&first));
        registry.register("client-1", Arc::clone(&second));

        assert_eq!(registry.get("client-1").unwrap().id(), second.id());
        assert!(registry.client_ids_for(first.id()).is_empty());
        assert_eq!(registry.client_subscription_count(), 1);
    }

    // --- Lookup tests ---

    #[test]
    fn test_get_unknown_client_is_none() {
        let registry = SignalsRegistry::new();
        assert!(registry.get("missing").is_none());
        assert!(!registry.contains("missing"));
    }

    #[test]
    fn test_get_by_signal_id() {
        let registry = SignalsRegistry::new();
        let signal = make_signal();
        registry.register("client-1", Arc::clone(&signal));

        assert!(registry.get_by_signal_id(signal.id()).is_some());
        assert!(registry.get_by_signal_id(SignalId(u64::MAX)).is_none());
    }

    // --- Teardown tests ---

    #[test]
    fn test_unregister_removes_all_client_mappings() {
        let registry = SignalsRegistry::new();
        let signal = make_signal();
        registry.register("client-1", Arc::clone(&signal));
        registry.register("client-2", Arc::clone(&signal));

        registry.unregister(signal.id());

        assert!(registry.is_empty());
        assert_eq!(registry.client_subscription_count(), 0);
        assert!(registry.get("client-1").is_none());
        assert!(registry.get("client-2").is_none());
    }

    #[test]
    fn test_remove_client_mapping_is_partial() {
        let registry = SignalsRegistry::new();
        let signal = make_signal();
        registry.register("client-1", Arc::clone(&signal));
        registry.register("client-2", Arc::clone(&signal));

        registry.remove_client_mapping("client-1");

        assert!(registry.get("client-1").is_none());
        assert!(registry.get("client-2").is_some());
        assert_eq!(registry.signal_count(), 1);
        assert_eq!(registry.client_subscription_count(), 1);
    }

    #[test]
    fn test_remove_unknown_client_mapping_is_noop() {
        let registry = SignalsRegistry::new();
        registry.remove_client_mapping("missing");
        assert!(registry.is_empty());
    }

    #[test]
    fn test_unregister_unknown_signal_is_noop() {
        let registry = SignalsRegistry::new();
        registry.unregister(SignalId(u64::MAX));
        assert!(registry.is_empty());
    }
}
