//! Store error types and result alias.
//!
//! Every error produced by [`EntityStore`](crate::EntityStore) is a local,
//! synchronous validation failure caused by the caller. None of them are
//! transient, so none of them should be retried.
//!
//! # Error Types
//!
//! - [`StoreError::EmptyIdentifier`] - The entity has an empty ID
//! - [`StoreError::MissingRequiredField`] - A mandatory field (the account public key) is unset
//! - [`StoreError::AlreadyExists`] - An entity with the same ID is already stored
//! - [`StoreError::NotFound`] - An update targeted an entity that is not stored
//!
//! # Mapping to Protocol Responses
//!
//! | Variant                | Typical response  |
//! |------------------------|-------------------|
//! | `EmptyIdentifier`      | `malformed`       |
//! | `MissingRequiredField` | `malformed`       |
//! | `AlreadyExists`        | conflict          |
//! | `NotFound`             | not found         |
//!
//! # Example
//!
//! ```
//! use acme_testbed_store::{EntityKind, StoreError, StoreResult};
//!
//! fn lookup(id: &str) -> StoreResult<()> {
//!     Err(StoreError::not_found(EntityKind::Account, id))
//! }
//!
//! let err = lookup("abc").unwrap_err();
//! assert!(!err.is_retryable());
//! ```

use std::fmt;

use thiserror::Error;

/// Result type alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// The five entity collections held by the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    /// An ACME account.
    Account,
    /// A certificate order.
    Order,
    /// An identifier authorization.
    Authorization,
    /// A single validation attempt.
    Challenge,
    /// An issued certificate.
    Certificate,
}

impl EntityKind {
    /// Returns the lowercase name used in log fields and error messages.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Account => "account",
            Self::Order => "order",
            Self::Authorization => "authorization",
            Self::Challenge => "challenge",
            Self::Certificate => "certificate",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors returned by mutating store operations.
///
/// Lookups never fail: absence is reported as `None`.
///
/// # Non-exhaustive
///
/// New variants may be added in minor releases. Downstream match expressions
/// must include a wildcard arm.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum StoreError {
    /// The entity was handed to the store with an empty ID.
    #[error("{kind} must have a non-empty ID to be added to the store")]
    EmptyIdentifier {
        /// Collection the entity was destined for.
        kind: EntityKind,
    },

    /// A field the store requires before insertion is unset.
    #[error("{kind} is missing required field {field}")]
    MissingRequiredField {
        /// Collection the entity was destined for.
        kind: EntityKind,
        /// Name of the missing field.
        field: &'static str,
    },

    /// An entity with the same ID is already stored.
    ///
    /// The stored entity is left untouched.
    #[error("{kind} {id:?} already exists")]
    AlreadyExists {
        /// Collection that rejected the insert.
        kind: EntityKind,
        /// The conflicting ID.
        id: String,
    },

    /// An update targeted an ID that is not stored.
    #[error("{kind} with ID {id:?} does not exist")]
    NotFound {
        /// Collection that was searched.
        kind: EntityKind,
        /// The missing ID.
        id: String,
    },
}

impl StoreError {
    /// Creates a new `EmptyIdentifier` error.
    #[must_use]
    pub fn empty_identifier(kind: EntityKind) -> Self {
        Self::EmptyIdentifier { kind }
    }

    /// Creates a new `MissingRequiredField` error.
    #[must_use]
    pub fn missing_field(kind: EntityKind, field: &'static str) -> Self {
        Self::MissingRequiredField { kind, field }
    }

    /// Creates a new `AlreadyExists` error.
    #[must_use]
    pub fn already_exists(kind: EntityKind, id: impl Into<String>) -> Self {
        Self::AlreadyExists { kind, id: id.into() }
    }

    /// Creates a new `NotFound` error.
    #[must_use]
    pub fn not_found(kind: EntityKind, id: impl Into<String>) -> Self {
        Self::NotFound { kind, id: id.into() }
    }

    /// Returns the collection the failed operation targeted.
    #[must_use]
    pub fn kind(&self) -> EntityKind {
        match self {
            Self::EmptyIdentifier { kind }
            | Self::MissingRequiredField { kind, .. }
            | Self::AlreadyExists { kind, .. }
            | Self::NotFound { kind, .. } => *kind,
        }
    }

    /// Whether retrying the same call could succeed.
    ///
    /// Always `false`: the store has no external dependency that can fail
    /// independently, so every error reflects caller misuse.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        false
    }
}

/// Raised by an [`OrderStatusPolicy`](crate::OrderStatusPolicy) when an order
/// is structurally invalid.
///
/// Reaching one of these through the store indicates a programming error in
/// the caller, so [`EntityStore::get_order_by_id`](crate::EntityStore::get_order_by_id)
/// treats it as fatal.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum OrderStatusError {
    /// The order has no pending or failed authorizations, yet the number of
    /// valid ones does not cover its identifiers.
    #[error(
        "order {order_id:?} has {valid} valid authorizations for {identifiers} identifiers \
         and no pending, deactivated or invalid authorizations"
    )]
    AuthorizationMismatch {
        /// The malformed order.
        order_id: String,
        /// Number of valid authorizations found.
        valid: usize,
        /// Number of identifiers the order requested.
        identifiers: usize,
    },
}

/// Errors from validating a [`StoreConfig`](crate::StoreConfig).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum ConfigError {
    /// A numeric field is below its minimum.
    #[error("{field} must be at least {min}, got {value}")]
    BelowMinimum {
        /// The offending field.
        field: &'static str,
        /// Minimum accepted value.
        min: usize,
        /// The rejected value.
        value: usize,
    },
}
