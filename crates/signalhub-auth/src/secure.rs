//! Authorization-gated signal registry.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use signalhub_core::{Signal, SignalsRegistry};

use crate::access::{EndpointAccessChecker, Principal};

// ---------------------------------------------------------------------------
// AuthError
// ---------------------------------------------------------------------------

/// Authorization failure for a signal operation.
///
/// The two variants are distinguished by authentication status, not by the
/// rule that denied access: an unauthenticated caller may succeed after
/// logging in, an authenticated-but-not-permitted caller will not.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// The caller is not authenticated and access requires it.
    #[error("unauthorized to access {endpoint}.{method}: {reason}")]
    Unauthorized {
        /// Endpoint class name.
        endpoint: String,
        /// Endpoint method name.
        method: String,
        /// Denial reason from the access checker.
        reason: String,
    },
    /// The caller is authenticated but lacks the required permission.
    #[error("access to {endpoint}.{method} is forbidden: {reason}")]
    Forbidden {
        /// Endpoint class name.
        endpoint: String,
        /// Endpoint method name.
        method: String,
        /// Denial reason from the access checker.
        reason: String,
    },
}

#[derive(Debug, Clone)]
struct EndpointMethod {
    endpoint: String,
    method: String,
}

// ---------------------------------------------------------------------------
// SecureSignalsRegistry
// ---------------------------------------------------------------------------

/// A [`SignalsRegistry`] wrapper that gates every access on the endpoint
/// method that originally produced the signal.
///
/// Registration remembers the `(endpoint, method)` pair per client
/// subscription id; later `get` calls **re-run** the same authorization
/// check against it — access is never cached as "once granted, always
/// granted", so a call after permissions were revoked fails exactly like a
/// first call would.
pub struct SecureSignalsRegistry {
    checker: Arc<dyn EndpointAccessChecker>,
    registry: Arc<SignalsRegistry>,
    /// Client subscription id → endpoint method that produced its signal.
    methods: RwLock<HashMap<String, EndpointMethod>>,
}

impl SecureSignalsRegistry {
    /// Creates a secure registry over the given inner registry and
    /// access checker.
    #[must_use]
    pub fn new(checker: Arc<dyn EndpointAccessChecker>, registry: Arc<SignalsRegistry>) -> Self {
        Self {
            checker,
            registry,
            methods: RwLock::new(HashMap::new()),
        }
    }

    /// Authorizes the caller for `endpoint.method`, then obtains the
    /// signal from `signal_supplier` and registers it under the client
    /// subscription id.
    ///
    /// The supplier — the endpoint method invocation — runs only after the
    /// access check passes.
    ///
    /// # Errors
    ///
    /// [`AuthError::Unauthorized`] when the caller is unauthenticated and
    /// access requires authentication; [`AuthError::Forbidden`] when the
    /// caller is authenticated but lacks the required permission.
    pub fn register<F>(
        &self,
        client_subscription_id: impl Into<String>,
        endpoint: &str,
        method: &str,
        principal: Option<&Principal>,
        signal_supplier: F,
    ) -> Result<Arc<dyn Signal>, AuthError>
    where
        F: FnOnce() -> Arc<dyn Signal>,
    {
        self.check(endpoint, method, principal)?;

        let client_id = client_subscription_id.into();
        let signal = signal_supplier();
        self.registry.register(client_id.clone(), Arc::clone(&signal));
        self.methods.write().insert(
            client_id,
            EndpointMethod {
                endpoint: endpoint.to_owned(),
                method: method.to_owned(),
            },
        );
        Ok(signal)
    }

    /// Looks up the signal bound to a client subscription id, re-running
    /// the authorization check recorded at registration.
    ///
    /// An unknown client id yields `Ok(None)` — "subscription gone" is a
    /// normal outcome, not an error.
    ///
    /// # Errors
    ///
    /// Same taxonomy as [`register`](Self::register), evaluated against
    /// the caller's **current** authentication and permissions.
    pub fn get(
        &self,
        client_subscription_id: &str,
        principal: Option<&Principal>,
    ) -> Result<Option<Arc<dyn Signal>>, AuthError> {
        let Some(endpoint_method) = self.methods.read().get(client_subscription_id).cloned()
        else {
            return Ok(None);
        };
        self.check(
            &endpoint_method.endpoint,
            &endpoint_method.method,
            principal,
        )?;
        Ok(self.registry.get(client_subscription_id))
    }

    /// Removes one client's binding — partial teardown. The underlying
    /// signal and any other client bindings remain intact. Unsubscribing
    /// is always permitted; no authorization is required.
    pub fn unsubscribe(&self, client_subscription_id: &str) {
        self.methods.write().remove(client_subscription_id);
        self.registry.remove_client_mapping(client_subscription_id);
    }

    fn check(
        &self,
        endpoint: &str,
        method: &str,
        principal: Option<&Principal>,
    ) -> Result<(), AuthError> {
        let Some(reason) = self.checker.check_access(endpoint, method, principal) else {
            return Ok(());
        };
        tracing::warn!(
            endpoint,
            method,
            authenticated = principal.is_some(),
            %reason,
            "denied access to signal endpoint method"
        );
        Err(match principal {
            None => AuthError::Unauthorized {
                endpoint: endpoint.to_owned(),
                method: method.to_owned(),
                reason,
            },
            Some(_) => AuthError::Forbidden {
                endpoint: endpoint.to_owned(),
                method: method.to_owned(),
                reason,
            },
        })
    }
}

// ===========================================================================
// Tests
// ===========================================================================
