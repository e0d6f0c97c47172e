//! Event authentication.
//!
//! Authenticators are looked up by the credential type a trigger node
//! declares. Each one is a pure check over the resolved credential fields and
//! the raw request; credential resolution and timeouts live in [`gate`].

pub mod gate;

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};

use hookrelay_types::credential::CredentialData;
use hookrelay_types::inbound::InboundEvent;

pub use gate::{AuthGate, AuthStatus, AuthTarget};

/// Why an event was refused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RejectReason {
    MissingHeader(&'static str),
    InvalidTimestamp,
    TimestampOutOfWindow { skew_secs: i64 },
    SignatureMismatch,
    CredentialUnavailable,
    Timeout,
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectReason::MissingHeader(name) => write!(f, "missing header {name}"),
            RejectReason::InvalidTimestamp => write!(f, "invalid request timestamp"),
            RejectReason::TimestampOutOfWindow { skew_secs } => {
                write!(f, "request timestamp skewed by {skew_secs}s")
            }
            RejectReason::SignatureMismatch => write!(f, "signature mismatch"),
            RejectReason::CredentialUnavailable => write!(f, "credential unavailable"),
            RejectReason::Timeout => write!(f, "credential resolution timed out"),
        }
    }
}

/// Result of a single authenticator check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthOutcome {
    Allowed,
    Rejected(RejectReason),
    /// The credential carries nothing to verify against.
    NotApplicable,
}

/// A check of an inbound event against resolved credentials.
///
/// Implementations must not perform IO.
pub trait Authenticator: Send + Sync {
    /// Credential type this authenticator verifies (e.g. `slackApi`).
    fn credential_type(&self) -> &str;

    fn verify(
        &self,
        credentials: &CredentialData,
        event: &InboundEvent,
        now: DateTime<Utc>,
    ) -> AuthOutcome;
}

/// Authenticators keyed by credential type.
#[derive(Default, Clone)]
pub struct AuthenticatorSet {
    by_type: HashMap<String, Arc<dyn Authenticator>>,
}

impl AuthenticatorSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an authenticator under its credential type, replacing any
    /// previous one for the same type.
    pub fn with<A: Authenticator + 'static>(mut self, authenticator: A) -> Self {
        self.insert(Arc::new(authenticator));
        self
    }

    pub fn insert(&mut self, authenticator: Arc<dyn Authenticator>) {
        self.by_type
            .insert(authenticator.credential_type().to_string(), authenticator);
    }

    pub fn get(&self, credential_type: &str) -> Option<&Arc<dyn Authenticator>> {
        self.by_type.get(credential_type)
    }

    pub fn len(&self) -> usize {
        self.by_type.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_type.is_empty()
    }
}

impl fmt::Debug for AuthenticatorSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthenticatorSet")
            .field("types", &self.by_type.keys().collect::<Vec<_>>())
            .finish()
    }
}
