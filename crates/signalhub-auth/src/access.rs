//! Endpoint access-control collaborators.
//!
//! The secure registry asks one question on every access: "may the current
//! caller invoke `endpoint.method`?" The [`EndpointAccessChecker`] trait is
//! that boundary; [`AccessRules`] is a deny-by-default implementation keyed
//! by endpoint method.

use std::collections::{HashMap, HashSet};

// ---------------------------------------------------------------------------
// Principal
// ---------------------------------------------------------------------------

/// An authenticated caller and the roles it holds.
///
/// Operations take `Option<&Principal>`: `None` means the caller is not
/// authenticated at all, which determines whether a denial is reported as
/// unauthorized (log in and retry) or forbidden (retrying will not help).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    name: String,
    roles: HashSet<String>,
}

impl Principal {
    /// Creates a principal with no roles.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            roles: HashSet::new(),
        }
    }

    /// Creates a principal holding the given roles.
    pub fn with_roles<I, R>(name: impl Into<String>, roles: I) -> Self
    where
        I: IntoIterator<Item = R>,
        R: Into<String>,
    {
        Self {
            name: name.into(),
            roles: roles.into_iter().map(Into::into).collect(),
        }
    }

    /// The principal's name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns `true` if the principal holds the named role.
    #[must_use]
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.contains(role)
    }
}

// ---------------------------------------------------------------------------
// EndpointAccessChecker
// ---------------------------------------------------------------------------

/// Authorization boundary replayed on every signal access.
///
/// Implementations must be cheap enough to call per access: the secure
/// registry never caches a grant for the lifetime of a subscription.
pub trait EndpointAccessChecker: Send + Sync {
    /// Returns a denial reason, or `None` when access is granted.
    fn check_access(
        &self,
        endpoint: &str,
        method: &str,
        principal: Option<&Principal>,
    ) -> Option<String>;
}

// ---------------------------------------------------------------------------
// AccessRules
// ---------------------------------------------------------------------------

/// Per-method access rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessRule {
    /// Anyone may call, authenticated or not.
    AllowAnonymous,
    /// Any authenticated principal may call.
    RequireAuthenticated,
    /// Only principals holding one of the named roles may call.
    RequireRole(Vec<String>),
}

/// Deny-by-default rule table keyed by `endpoint.method`.
///
/// A method with no rule is denied for every caller; this mirrors
/// annotation-driven endpoint security where unannotated methods are not
/// exposed.
#[derive(Debug, Default)]
pub struct AccessRules {
    rules: HashMap<String, AccessRule>,
}

impl AccessRules {
    /// Creates an empty (deny-everything) rule table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a rule for `endpoint.method`, builder style.
    #[must_use]
    pub fn with_rule(mut self, endpoint: &str, method: &str, rule: AccessRule) -> Self {
        self.rules.insert(Self::key(endpoint, method), rule);
        self
    }

    fn key(endpoint: &str, method: &str) -> String {
        format!("{endpoint}.{method}")
    }
}

impl EndpointAccessChecker for AccessRules {
    fn check_access(
        &self,
        endpoint: &str,
        method: &str,
        principal: Option<&Principal>,
    ) -> Option<String> {
        let key = Self::key(endpoint, method);
        match self.rules.get(&key) {
            None => Some(format!("no access rule for {key}")),
            Some(AccessRule::AllowAnonymous) => None,
            Some(AccessRule::RequireAuthenticated) => match principal {
                Some(_) => None,
                None => Some(format!("{key} requires an authenticated caller")),
            },
            Some(AccessRule::RequireRole(roles)) => match principal {
                None => Some(format!("{key} requires an authenticated caller")),
                Some(principal) if roles.iter().any(|role| principal.has_role(role)) => None,
                Some(_) => Some(format!("{key} requires one of the roles {roles:?}")),
            },
        }
    }
}

// ===========================================================================
// Tests
// ===========================================================================
