//! In-memory entity store for the ACME test server.
//!
//! The test server keeps every account, order, authorization, challenge and
//! certificate it issues in memory. This crate is that memory: a single
//! [`EntityStore`] that protocol handlers read and write through. It holds no
//! sockets, files or background tasks.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                 Protocol handlers (external)                │
//! │   new-account │ new-order │ challenge │ finalize │ revoke   │
//! ├─────────────────────────────────────────────────────────────┤
//! │                        EntityStore                          │
//! │      add_* / get_*_by_id / update_account_by_id /           │
//! │      get_certificate_by_der / revoke_certificate            │
//! ├──────────────────────────────┬──────────────────────────────┤
//! │  Clock (injected)            │  OrderStatusPolicy (injected)│
//! │  SystemClock │ FakeClock     │  AcmeOrderStatus │ closures  │
//! └──────────────────────────────┴──────────────────────────────┘
//! ```
//!
//! # Quick Start
//!
//! ```
//! use std::sync::Arc;
//!
//! use acme_testbed_store::{Account, EntityStore, FakeClock, Order, OrderStatus};
//! use chrono::{DateTime, Duration};
//!
//! let clock = FakeClock::new(DateTime::UNIX_EPOCH);
//! let store = EntityStore::builder().clock(Arc::new(clock.clone())).build();
//!
//! let key = b"account-key".to_vec();
//! let account = Account::builder().id(Account::id_for_key(&key)).public_key(key).build();
//! store.add_account(account)?;
//!
//! let order = Order::builder()
//!     .id("order-1")
//!     .account_id("acct")
//!     .expires(DateTime::UNIX_EPOCH + Duration::hours(1))
//!     .build();
//! store.add_order(order.into_shared())?;
//!
//! clock.advance(Duration::hours(2));
//! let order = store.get_order_by_id("order-1").expect("order was added");
//! assert_eq!(order.read().status, OrderStatus::Expired);
//! # Ok::<(), acme_testbed_store::StoreError>(())
//! ```
//!
//! # Error Handling
//!
//! Mutating operations return [`StoreResult<T>`]. Every [`StoreError`] is a
//! non-retryable validation failure; lookups return `Option` and never fail.
//! The only fatal path is a malformed order reaching
//! [`EntityStore::get_order_by_id`], which panics.
//!
//! # Feature Flags
//!
//! - **`testutil`**: Enables the `testutil` module with entity factories and assertion macros.
//!   Enable this in `[dev-dependencies]` for integration tests.

#![deny(unsafe_code)]

pub mod clock;
pub mod config;
pub mod entity;
pub mod error;
pub mod metrics;
pub mod status;
pub mod store;
#[cfg(any(test, feature = "testutil"))]
pub mod testutil;

pub use clock::{Clock, FakeClock, SystemClock};
pub use config::{DEFAULT_DER_SCAN_WARN_THRESHOLD, StoreConfig};
pub use entity::{
    Account, AccountStatus, Authorization, AuthorizationStatus, Certificate, Challenge,
    ChallengeStatus, ChallengeType, Order, OrderStatus, SharedAuthorization, SharedChallenge,
    SharedOrder,
};
pub use error::{ConfigError, EntityKind, OrderStatusError, StoreError, StoreResult};
pub use metrics::{StoreMetrics, StoreMetricsSnapshot};
pub use status::{AcmeOrderStatus, OrderStatusPolicy};
pub use store::{EntityStore, StoreStats};
