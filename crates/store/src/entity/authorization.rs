//! Authorization record: proof of control over one identifier.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::entity::SharedChallenge;

/// An authorization shared between the store, its orders and handlers.
pub type SharedAuthorization = Arc<RwLock<Authorization>>;

/// Authorization lifecycle state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthorizationStatus {
    /// No challenge has succeeded yet.
    #[default]
    Pending,
    /// A challenge succeeded.
    Valid,
    /// A challenge failed.
    Invalid,
    /// Deactivated by the client.
    Deactivated,
    /// Expired before being used.
    Expired,
    /// Revoked by the server.
    Revoked,
}

/// Authorization for a single identifier, referencing its challenges.
#[derive(Debug, Clone, bon::Builder)]
pub struct Authorization {
    #[builder(into)]
    id: String,

    /// Identifier being authorized (for example a DNS name).
    #[builder(into)]
    pub identifier: String,

    /// Lifecycle state.
    #[builder(default)]
    pub status: AuthorizationStatus,

    /// After this instant the authorization can no longer be used.
    pub expires: DateTime<Utc>,

    /// Challenges offered for this authorization.
    #[builder(default)]
    pub challenges: Vec<SharedChallenge>,
}

impl Authorization {
    /// The authorization ID.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Whether the authorization has passed its expiry at `now`.
    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires <= now
    }

    /// Wraps the authorization in a lockable shared cell.
    #[must_use]
    pub fn into_shared(self) -> SharedAuthorization {
        Arc::new(RwLock::new(self))
    }
}
