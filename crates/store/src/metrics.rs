//! Operation counters for the entity store.
//!
//! Counters are plain relaxed atomics: they are for observability only and
//! never gate store behavior.
//!
//! # Examples
//!
//! ```
//! use acme_testbed_store::{EntityKind, StoreError, StoreMetrics};
//!
//! let metrics = StoreMetrics::new();
//! metrics.record_add();
//! metrics.record_error(&StoreError::empty_identifier(EntityKind::Order));
//!
//! let snapshot = metrics.snapshot();
//! assert_eq!(snapshot.add_count, 1);
//! assert_eq!(snapshot.error_empty_identifier, 1);
//! ```

use std::sync::atomic::{AtomicU64, Ordering};

use crate::error::StoreError;

/// Point-in-time copy of [`StoreMetrics`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, bon::Builder)]
pub struct StoreMetricsSnapshot {
    // Operation counts
    /// Successful inserts across all collections.
    #[builder(default)]
    pub add_count: u64,
    /// ID lookups that found an entity.
    #[builder(default)]
    pub lookup_hits: u64,
    /// ID lookups that found nothing.
    #[builder(default)]
    pub lookup_misses: u64,
    /// Successful account replacements.
    #[builder(default)]
    pub update_count: u64,
    /// Order status recomputations written back on read.
    #[builder(default)]
    pub status_recompute_count: u64,
    /// Linear DER scans performed.
    #[builder(default)]
    pub der_scan_count: u64,
    /// Certificates examined across all DER scans.
    #[builder(default)]
    pub der_scan_examined: u64,
    /// Revocation calls that removed a certificate.
    #[builder(default)]
    pub revoke_count: u64,

    // Error counts by category
    /// `EmptyIdentifier` errors.
    #[builder(default)]
    pub error_empty_identifier: u64,
    /// `MissingRequiredField` errors.
    #[builder(default)]
    pub error_missing_field: u64,
    /// `AlreadyExists` errors.
    #[builder(default)]
    pub error_already_exists: u64,
    /// `NotFound` errors.
    #[builder(default)]
    pub error_not_found: u64,
}

impl StoreMetricsSnapshot {
    /// Total number of errors returned to callers.
    #[must_use]
    pub fn total_errors(&self) -> u64 {
        self.error_empty_identifier
            + self.error_missing_field
            + self.error_already_exists
            + self.error_not_found
    }

    /// Fraction of ID lookups that found an entity, or `0.0` with no lookups.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn hit_rate(&self) -> f64 {
        let total = self.lookup_hits + self.lookup_misses;
        if total == 0 { 0.0 } else { self.lookup_hits as f64 / total as f64 }
    }
}

/// Lock-free counters updated by every store operation.
#[derive(Debug, Default)]
pub struct StoreMetrics {
    add_count: AtomicU64,
    lookup_hits: AtomicU64,
    lookup_misses: AtomicU64,
    update_count: AtomicU64,
    status_recompute_count: AtomicU64,
    der_scan_count: AtomicU64,
    der_scan_examined: AtomicU64,
    revoke_count: AtomicU64,
    error_empty_identifier: AtomicU64,
    error_missing_field: AtomicU64,
    error_already_exists: AtomicU64,
    error_not_found: AtomicU64,
}

impl StoreMetrics {
    /// Creates zeroed counters.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a successful insert.
    pub fn record_add(&self) {
        self.add_count.fetch_add(1, Ordering::Relaxed);
    }

    /// Records an ID lookup and whether it found something.
    pub fn record_lookup(&self, hit: bool) {
        let counter = if hit { &self.lookup_hits } else { &self.lookup_misses };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a successful account replacement.
    pub fn record_update(&self) {
        self.update_count.fetch_add(1, Ordering::Relaxed);
    }

    /// Records an order status write-back.
    pub fn record_status_recompute(&self) {
        self.status_recompute_count.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a DER scan that examined `examined` certificates.
    pub fn record_der_scan(&self, examined: usize) {
        self.der_scan_count.fetch_add(1, Ordering::Relaxed);
        self.der_scan_examined.fetch_add(examined as u64, Ordering::Relaxed);
    }

    /// Records a revocation that removed a certificate.
    pub fn record_revoke(&self) {
        self.revoke_count.fetch_add(1, Ordering::Relaxed);
    }

    /// Records an error returned to a caller.
    pub fn record_error(&self, err: &StoreError) {
        let counter = match err {
            StoreError::EmptyIdentifier { .. } => &self.error_empty_identifier,
            StoreError::MissingRequiredField { .. } => &self.error_missing_field,
            StoreError::AlreadyExists { .. } => &self.error_already_exists,
            StoreError::NotFound { .. } => &self.error_not_found,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Copies the current counter values.
    #[must_use]
    pub fn snapshot(&self) -> StoreMetricsSnapshot {
        StoreMetricsSnapshot {
            add_count: self.add_count.load(Ordering::Relaxed),
            lookup_hits: self.lookup_hits.load(Ordering::Relaxed),
            lookup_misses: self.lookup_misses.load(Ordering::Relaxed),
            update_count: self.update_count.load(Ordering::Relaxed),
            status_recompute_count: self.status_recompute_count.load(Ordering::Relaxed),
            der_scan_count: self.der_scan_count.load(Ordering::Relaxed),
            der_scan_examined: self.der_scan_examined.load(Ordering::Relaxed),
            revoke_count: self.revoke_count.load(Ordering::Relaxed),
            error_empty_identifier: self.error_empty_identifier.load(Ordering::Relaxed),
            error_missing_field: self.error_missing_field.load(Ordering::Relaxed),
            error_already_exists: self.error_already_exists.load(Ordering::Relaxed),
            error_not_found: self.error_not_found.load(Ordering::Relaxed),
        }
    }
}
