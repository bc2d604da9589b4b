//! Entity records held by the store.
//!
//! The store keeps shared references to these records and never copies
//! them. Records fall into two groups:
//!
//! - **Replace-only**: [`Account`] and [`Certificate`] are stored as `Arc<T>`. An account changes
//!   only by replacing it wholesale through
//!   [`update_account_by_id`](crate::EntityStore::update_account_by_id); certificates never change.
//! - **Mutable cells**: [`Order`], [`Authorization`] and [`Challenge`] are stored as
//!   `Arc<RwLock<T>>` ([`SharedOrder`], [`SharedAuthorization`], [`SharedChallenge`]). Protocol
//!   handlers update them in place through the lock; the store only writes the derived
//!   [`Order::status`].
//!
//! Every record's ID is private and fixed at construction, so it stays
//! stable for as long as the record is stored.

mod account;
mod authorization;
mod certificate;
mod challenge;
mod order;

pub use account::{Account, AccountStatus};
pub use authorization::{Authorization, AuthorizationStatus, SharedAuthorization};
pub use certificate::Certificate;
pub use challenge::{Challenge, ChallengeStatus, ChallengeType, SharedChallenge};
pub use order::{Order, OrderStatus, SharedOrder};
