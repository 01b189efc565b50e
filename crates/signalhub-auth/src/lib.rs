//! # SignalHub Authentication & Authorization
//!
//! The security layer over [`signalhub_core`]: per-call authorization for
//! signal subscriptions tied to the endpoint method that produced each
//! signal.
//!
//! - [`access`] — principals, the [`EndpointAccessChecker`] boundary, and
//!   the deny-by-default [`AccessRules`] table
//! - [`secure`] — [`SecureSignalsRegistry`], which re-evaluates access on
//!   **every** lookup rather than caching a grant at registration time

#![deny(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod access;
pub mod secure;

pub use access::{AccessRule, AccessRules, EndpointAccessChecker, Principal};
pub use secure::{AuthError, SecureSignalsRegistry};
