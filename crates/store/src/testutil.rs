//! Shared test utilities for exercising the entity store.
//!
//! This module provides entity factories, a fake-clock store constructor, and
//! assertion macros for [`StoreResult`](crate::StoreResult) values. It is
//! feature-gated behind `testutil` to keep it out of production builds.
//!
//! # Usage
//!
//! In integration tests, enable the feature in `Cargo.toml`:
//!
//! ```toml
//! [dev-dependencies]
//! acme-testbed-store = { path = "../store", features = ["testutil"] }
//! ```
//!
//! Then import helpers:
//!
//! ```no_run
//! // Requires the `testutil` feature to be enabled.
//! use acme_testbed_store::testutil::{make_account, store_with_fake_clock};
//! ```

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};

use crate::{
    clock::FakeClock,
    entity::{
        Account, Authorization, AuthorizationStatus, Certificate, Challenge, ChallengeType, Order,
        SharedAuthorization, SharedChallenge, SharedOrder,
    },
    store::EntityStore,
};

/// Instant every [`store_with_fake_clock`] clock starts at.
pub const T0: DateTime<Utc> = DateTime::<Utc>::UNIX_EPOCH;

/// Create a deterministic public key for index `idx`.
#[must_use]
pub fn make_key(idx: usize) -> Vec<u8> {
    format!("test-public-key:{idx:06}").into_bytes()
}

/// Create an account whose ID is derived from [`make_key`]`(idx)`.
#[must_use]
pub fn make_account(idx: usize) -> Account {
    let key = make_key(idx);
    Account::builder()
        .id(Account::id_for_key(&key))
        .public_key(key)
        .contacts(vec![format!("mailto:user{idx}@example.com")])
        .created_at(T0)
        .build()
}

/// Create a pending authorization for `{id}.example.com` expiring at `expires`.
#[must_use]
pub fn make_authorization(id: &str, expires: DateTime<Utc>) -> SharedAuthorization {
    Authorization::builder()
        .id(id)
        .identifier(format!("{id}.example.com"))
        .status(AuthorizationStatus::Pending)
        .expires(expires)
        .build()
        .into_shared()
}

/// Create a pending http-01 challenge belonging to `authorization_id`.
#[must_use]
pub fn make_challenge(id: &str, authorization_id: &str) -> SharedChallenge {
    Challenge::builder()
        .id(id)
        .authorization_id(authorization_id)
        .challenge_type(ChallengeType::Http01)
        .token(format!("token-{id}"))
        .build()
        .into_shared()
}

/// Create an order covering one identifier per authorization.
#[must_use]
pub fn make_order(
    id: &str,
    expires: DateTime<Utc>,
    authorizations: Vec<SharedAuthorization>,
) -> SharedOrder {
    let identifiers = authorizations.iter().map(|authz| authz.read().identifier.clone()).collect();
    Order::builder()
        .id(id)
        .account_id("test-account")
        .identifiers(identifiers)
        .authorizations(authorizations)
        .expires(expires)
        .build()
        .into_shared()
}

/// Create a certificate with the given DER bytes.
#[must_use]
pub fn make_certificate(id: &str, der: impl Into<bytes::Bytes>) -> Arc<Certificate> {
    Arc::new(
        Certificate::builder().id(id).der(der).account_id("test-account").issued_at(T0).build(),
    )
}

/// Create a store whose clock is a [`FakeClock`] frozen at [`T0`].
///
/// Returns the store and a handle to its clock.
#[must_use]
pub fn store_with_fake_clock() -> (EntityStore, FakeClock) {
    let clock = FakeClock::new(T0);
    let store = EntityStore::builder().clock(Arc::new(clock.clone())).build();
    (store, clock)
}

/// Returns `T0 + hours`.
#[must_use]
pub fn hours(hours: i64) -> DateTime<Utc> {
    T0 + Duration::hours(hours)
}

/// Assert that a [`StoreResult`](crate::StoreResult) is a
/// [`StoreError::AlreadyExists`](crate::StoreError::AlreadyExists).
///
/// # Examples
///
/// ```no_run
/// // Requires the `testutil` feature to be enabled.
/// use acme_testbed_store::{EntityKind, StoreError, StoreResult, assert_already_exists};
///
/// let result: StoreResult<usize> = Err(StoreError::already_exists(EntityKind::Order, "o1"));
/// assert_already_exists!(result);
/// ```
#[macro_export]
macro_rules! assert_already_exists {
    ($result:expr) => {
        assert!(
            matches!($result, Err($crate::error::StoreError::AlreadyExists { .. })),
            "expected StoreError::AlreadyExists, got: {:?}",
            $result,
        );
    };
    ($result:expr, $msg:expr) => {
        assert!(
            matches!($result, Err($crate::error::StoreError::AlreadyExists { .. })),
            "{}: expected StoreError::AlreadyExists, got: {:?}",
            $msg,
            $result,
        );
    };
}

/// Assert that a [`StoreResult`](crate::StoreResult) is a
/// [`StoreError::EmptyIdentifier`](crate::StoreError::EmptyIdentifier).
#[macro_export]
macro_rules! assert_empty_identifier {
    ($result:expr) => {
        assert!(
            matches!($result, Err($crate::error::StoreError::EmptyIdentifier { .. })),
            "expected StoreError::EmptyIdentifier, got: {:?}",
            $result,
        );
    };
}

/// Assert that a [`StoreResult`](crate::StoreResult) is a
/// [`StoreError::MissingRequiredField`](crate::StoreError::MissingRequiredField).
#[macro_export]
macro_rules! assert_missing_field {
    ($result:expr) => {
        assert!(
            matches!($result, Err($crate::error::StoreError::MissingRequiredField { .. })),
            "expected StoreError::MissingRequiredField, got: {:?}",
            $result,
        );
    };
}

/// Assert that a [`StoreResult`](crate::StoreResult) is a
/// [`StoreError::NotFound`](crate::StoreError::NotFound).
#[macro_export]
macro_rules! assert_not_found {
    ($result:expr) => {
        assert!(
            matches!($result, Err($crate::error::StoreError::NotFound { .. })),
            "expected StoreError::NotFound, got: {:?}",
            $result,
        );
    };
}
