//! Order record and its derived status.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::entity::{Certificate, SharedAuthorization};

/// An order shared between the store and the handlers finalizing it.
pub type SharedOrder = Arc<RwLock<Order>>;

/// Order state, recomputed by the store on every read.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    /// Some authorization still needs a successful challenge.
    #[default]
    Pending,
    /// All authorizations are valid; awaiting finalization.
    Ready,
    /// Finalization began; certificate not issued yet.
    Processing,
    /// Certificate issued.
    Valid,
    /// An authorization failed or the order recorded an error.
    Invalid,
    /// The order passed its expiry before a certificate was issued.
    Expired,
}

/// A certificate order.
///
/// [`status`](Self::status) is not authoritative. It is overwritten by
/// [`get_order_by_id`](crate::EntityStore::get_order_by_id) each time the order
/// is read through the store.
#[derive(Debug, Clone, bon::Builder)]
pub struct Order {
    #[builder(into)]
    id: String,

    /// Account that created the order.
    #[builder(into)]
    pub account_id: String,

    /// Identifiers the certificate will cover.
    #[builder(default)]
    pub identifiers: Vec<String>,

    /// One authorization per identifier.
    #[builder(default)]
    pub authorizations: Vec<SharedAuthorization>,

    /// After this instant the order can no longer be finalized.
    pub expires: DateTime<Utc>,

    /// Last derived status.
    #[builder(default)]
    pub status: OrderStatus,

    /// Set once the client submitted its CSR.
    #[builder(default)]
    pub began_processing: bool,

    /// Issued certificate, once available.
    pub certificate: Option<Arc<Certificate>>,

    /// Problem detail recorded when finalization failed.
    pub error: Option<String>,
}

impl Order {
    /// The order ID.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Wraps the order in a lockable shared cell.
    #[must_use]
    pub fn into_shared(self) -> SharedOrder {
        Arc::new(RwLock::new(self))
    }
}
