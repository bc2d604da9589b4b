//! Issued certificate record.

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A certificate issued for an order.
///
/// The DER bytes double as the certificate's content identity for
/// [`get_certificate_by_der`](crate::EntityStore::get_certificate_by_der).
/// The store does not parse or validate them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, bon::Builder)]
#[serde(deny_unknown_fields)]
pub struct Certificate {
    #[builder(into)]
    id: String,

    /// Raw DER encoding of the leaf certificate.
    #[builder(into)]
    pub der: Bytes,

    /// DER-encoded issuer chain, leaf-adjacent first.
    #[builder(default)]
    #[serde(default)]
    pub chain: Vec<Bytes>,

    /// Account that finalized the order.
    #[builder(into)]
    pub account_id: String,

    /// When the certificate was issued.
    #[builder(default = Utc::now())]
    pub issued_at: DateTime<Utc>,
}

impl Certificate {
    /// The certificate ID.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }
}
