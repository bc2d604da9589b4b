//! Challenge record: one validation attempt within an authorization.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

/// A challenge shared between the store and the handlers validating it.
pub type SharedChallenge = Arc<RwLock<Challenge>>;

/// Validation method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChallengeType {
    /// Token served over plain HTTP.
    #[serde(rename = "http-01")]
    Http01,
    /// Token published as a DNS TXT record.
    #[serde(rename = "dns-01")]
    Dns01,
    /// Token presented in a TLS-ALPN handshake.
    #[serde(rename = "tls-alpn-01")]
    TlsAlpn01,
}

/// Challenge lifecycle state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChallengeStatus {
    /// Waiting for the client to respond.
    #[default]
    Pending,
    /// Validation in flight.
    Processing,
    /// Validation succeeded.
    Valid,
    /// Validation failed.
    Invalid,
}

/// One verification attempt for an [`Authorization`](crate::Authorization).
#[derive(Debug, Clone, PartialEq, Eq, bon::Builder)]
pub struct Challenge {
    #[builder(into)]
    id: String,

    /// Owning authorization.
    #[builder(into)]
    pub authorization_id: String,

    /// Validation method.
    pub challenge_type: ChallengeType,

    /// Token the client must provision.
    #[builder(into)]
    pub token: String,

    /// Lifecycle state.
    #[builder(default)]
    pub status: ChallengeStatus,

    /// When validation succeeded.
    pub validated: Option<DateTime<Utc>>,

    /// Problem detail recorded on failure.
    pub error: Option<String>,
}

impl Challenge {
    /// The challenge ID.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Wraps the challenge in a lockable shared cell.
    #[must_use]
    pub fn into_shared(self) -> SharedChallenge {
        Arc::new(RwLock::new(self))
    }
}
