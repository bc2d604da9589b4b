//! ACME account record.

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Account lifecycle state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountStatus {
    /// Usable account.
    #[default]
    Valid,
    /// Deactivated by its holder.
    Deactivated,
    /// Revoked by the server.
    Revoked,
}

/// A registered ACME account.
///
/// The ID is derived from the account's public key with
/// [`Account::id_for_key`]. The store refuses accounts without a key.
///
/// # Example
///
/// ```
/// use acme_testbed_store::Account;
///
/// let key = b"account-public-key".to_vec();
/// let account = Account::builder()
///     .id(Account::id_for_key(&key))
///     .public_key(key)
///     .contacts(vec!["mailto:admin@example.com".to_owned()])
///     .build();
///
/// assert_eq!(account.id().len(), 64);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, bon::Builder)]
#[serde(deny_unknown_fields)]
pub struct Account {
    #[builder(into)]
    id: String,

    /// DER-encoded public key the account signs requests with.
    #[builder(into)]
    pub public_key: Option<Bytes>,

    /// Contact URLs (`mailto:` and friends).
    #[builder(default)]
    #[serde(default)]
    pub contacts: Vec<String>,

    /// Lifecycle state.
    #[builder(default)]
    #[serde(default)]
    pub status: AccountStatus,

    /// When the account was registered.
    #[builder(default = Utc::now())]
    pub created_at: DateTime<Utc>,
}

impl Account {
    /// Derives the account ID for a public key: lowercase hex of its SHA-256.
    #[must_use]
    pub fn id_for_key(public_key: &[u8]) -> String {
        hex::encode(Sha256::digest(public_key))
    }

    /// The account ID.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }
}
