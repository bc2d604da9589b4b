//! The in-memory entity store.
//!
//! # Locking Contract
//!
//! The store is a lock guarding a table of independently lockable cells:
//!
//! ```text
//! ┌──────────────── store lock (RwLock<Collections>) ────────────────┐
//! │ accounts        id ──► Arc<Account>                              │
//! │ orders          id ──► Arc<RwLock<Order>>          ◄── cell lock │
//! │ authorizations  id ──► Arc<RwLock<Authorization>>  ◄── cell lock │
//! │ challenges      id ──► Arc<RwLock<Challenge>>      ◄── cell lock │
//! │ certificates    id ──► Arc<Certificate>                          │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! - Lookups (`get_*`, the DER scan) hold the store lock shared.
//! - Inserts, account replacement and revocation hold it exclusively.
//! - [`EntityStore::get_order_by_id`] additionally takes the order's cell lock while the store lock
//!   is held shared. Cell locks are always acquired after the store lock and never while waiting
//!   for it, so a caller holding a cell lock must not call back into the store.
//! - No operation spans more than one entity. Inserting an order and its authorizations are
//!   separate calls; callers handle partial completion.

use std::{
    collections::{HashMap, hash_map::Entry},
    fmt,
    sync::Arc,
};

use parking_lot::{RwLock, RwLockUpgradableReadGuard};

use crate::{
    clock::{Clock, SystemClock},
    config::StoreConfig,
    entity::{Account, Certificate, SharedAuthorization, SharedChallenge, SharedOrder},
    error::{EntityKind, StoreError, StoreResult},
    metrics::StoreMetrics,
    status::{AcmeOrderStatus, OrderStatusPolicy},
};

/// Current size of each collection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreStats {
    /// Stored accounts.
    pub accounts: usize,
    /// Stored orders.
    pub orders: usize,
    /// Stored authorizations.
    pub authorizations: usize,
    /// Stored challenges.
    pub challenges: usize,
    /// Stored certificates.
    pub certificates: usize,
}

#[derive(Default)]
struct Collections {
    accounts: HashMap<String, Arc<Account>>,
    orders: HashMap<String, SharedOrder>,
    authorizations: HashMap<String, SharedAuthorization>,
    challenges: HashMap<String, SharedChallenge>,
    certificates: HashMap<String, Arc<Certificate>>,
}

impl Collections {
    fn with_capacity(capacity: usize) -> Self {
        Self {
            accounts: HashMap::with_capacity(capacity),
            orders: HashMap::with_capacity(capacity),
            authorizations: HashMap::with_capacity(capacity),
            challenges: HashMap::with_capacity(capacity),
            certificates: HashMap::with_capacity(capacity),
        }
    }
}

/// Inserts `value` under `id` unless the ID is empty or taken.
///
/// Returns the collection size after the insert.
fn insert_unique<T>(
    map: &mut HashMap<String, T>,
    kind: EntityKind,
    id: &str,
    value: T,
) -> StoreResult<usize> {
    if id.is_empty() {
        return Err(StoreError::empty_identifier(kind));
    }
    match map.entry(id.to_owned()) {
        Entry::Occupied(_) => Err(StoreError::already_exists(kind, id)),
        Entry::Vacant(entry) => {
            entry.insert(value);
            Ok(map.len())
        },
    }
}

/// Thread-safe, identifier-keyed store for accounts, orders, authorizations,
/// challenges and certificates.
///
/// Construct one per server with [`EntityStore::builder`] and hand clones to
/// every collaborator. Clones are cheap and share the same collections.
/// Nothing is persisted: all state is dropped with the last clone.
///
/// # Example
///
/// ```
/// use acme_testbed_store::{Account, EntityStore};
///
/// let store = EntityStore::builder().build();
///
/// let account = Account::builder().id("acct-1").public_key(b"key".to_vec()).build();
/// assert_eq!(store.add_account(account)?, 1);
///
/// assert!(store.get_account_by_id("acct-1").is_some());
/// assert!(store.get_account_by_id("acct-2").is_none());
/// # Ok::<(), acme_testbed_store::StoreError>(())
/// ```
#[derive(Clone)]
pub struct EntityStore {
    collections: Arc<RwLock<Collections>>,
    clock: Arc<dyn Clock>,
    order_status: Arc<dyn OrderStatusPolicy>,
    metrics: Arc<StoreMetrics>,
    config: StoreConfig,
}

#[bon::bon]
impl EntityStore {
    /// Creates an empty store.
    ///
    /// # Arguments
    ///
    /// * `config` - Tuning knobs (default: [`StoreConfig::default`]).
    /// * `clock` - Time source for order status derivation (default: [`SystemClock`]).
    /// * `order_status` - Order status policy (default: [`AcmeOrderStatus`]).
    #[builder]
    pub fn new(
        #[builder(default)] config: StoreConfig,
        #[builder(default = Arc::new(SystemClock) as Arc<dyn Clock>)] clock: Arc<dyn Clock>,
        #[builder(default = Arc::new(AcmeOrderStatus) as Arc<dyn OrderStatusPolicy>)]
        order_status: Arc<dyn OrderStatusPolicy>,
    ) -> Self {
        Self {
            collections: Arc::new(RwLock::new(Collections::with_capacity(config.capacity_hint()))),
            clock,
            order_status,
            metrics: Arc::new(StoreMetrics::new()),
            config,
        }
    }
}

impl EntityStore {
    /// Records the outcome of an insert in the metrics.
    fn track(&self, result: StoreResult<usize>) -> StoreResult<usize> {
        match &result {
            Ok(_) => self.metrics.record_add(),
            Err(err) => self.metrics.record_error(err),
        }
        result
    }

    /// Records a lookup outcome and passes it through.
    fn track_lookup<T>(&self, found: Option<T>) -> Option<T> {
        self.metrics.record_lookup(found.is_some());
        found
    }

    /// Operation counters.
    #[must_use]
    pub fn metrics(&self) -> &StoreMetrics {
        &self.metrics
    }

    /// The clock used for derived state.
    #[must_use]
    pub fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    /// Current collection sizes.
    #[must_use]
    pub fn stats(&self) -> StoreStats {
        let collections = self.collections.read();
        StoreStats {
            accounts: collections.accounts.len(),
            orders: collections.orders.len(),
            authorizations: collections.authorizations.len(),
            challenges: collections.challenges.len(),
            certificates: collections.certificates.len(),
        }
    }

    // ---------------------------------------------------------------------
    // Accounts
    // ---------------------------------------------------------------------

    /// Stores a new account and returns the number of stored accounts.
    ///
    /// # Errors
    ///
    /// Checked in this order:
    /// - [`StoreError::EmptyIdentifier`] if the account ID is empty
    /// - [`StoreError::MissingRequiredField`] if no public key is set
    /// - [`StoreError::AlreadyExists`] if the ID is taken; the stored account is kept
    #[tracing::instrument(skip(self, account), fields(id = tracing::field::Empty))]
    pub fn add_account(&self, account: impl Into<Arc<Account>>) -> StoreResult<usize> {
        let account = account.into();
        tracing::Span::current().record("id", account.id());

        let result = if account.id().is_empty() {
            Err(StoreError::empty_identifier(EntityKind::Account))
        } else if account.public_key.is_none() {
            Err(StoreError::missing_field(EntityKind::Account, "public_key"))
        } else {
            let id = account.id().to_owned();
            let mut collections = self.collections.write();
            insert_unique(&mut collections.accounts, EntityKind::Account, &id, account)
        };
        self.track(result)
    }

    /// Looks up an account.
    #[tracing::instrument(skip(self))]
    pub fn get_account_by_id(&self, id: &str) -> Option<Arc<Account>> {
        let found = self.collections.read().accounts.get(id).cloned();
        self.track_lookup(found)
    }

    /// Replaces a stored account wholesale.
    ///
    /// The new value is stored under `id` as given; no fields are merged.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if no account is stored under `id`.
    /// Nothing is inserted in that case.
    #[tracing::instrument(skip(self, account))]
    pub fn update_account_by_id(
        &self,
        id: &str,
        account: impl Into<Arc<Account>>,
    ) -> StoreResult<()> {
        let mut collections = self.collections.write();
        match collections.accounts.get_mut(id) {
            Some(slot) => {
                *slot = account.into();
                self.metrics.record_update();
                Ok(())
            },
            None => {
                let err = StoreError::not_found(EntityKind::Account, id);
                self.metrics.record_error(&err);
                Err(err)
            },
        }
    }

    // ---------------------------------------------------------------------
    // Orders
    // ---------------------------------------------------------------------

    /// Stores a new order and returns the number of stored orders.
    ///
    /// The order's authorizations are not inserted; add them separately.
    ///
    /// # Errors
    ///
    /// - [`StoreError::EmptyIdentifier`] if the order ID is empty
    /// - [`StoreError::AlreadyExists`] if the ID is taken
    #[tracing::instrument(skip(self, order), fields(id = tracing::field::Empty))]
    pub fn add_order(&self, order: SharedOrder) -> StoreResult<usize> {
        let id = order.read().id().to_owned();
        tracing::Span::current().record("id", id.as_str());

        let mut collections = self.collections.write();
        let result = insert_unique(&mut collections.orders, EntityKind::Order, &id, order);
        drop(collections);
        self.track(result)
    }

    /// Looks up an order, refreshing its derived status.
    ///
    /// Under the shared store lock, the order's cell lock is taken as an
    /// upgradable read, the configured [`OrderStatusPolicy`] computes the
    /// status against the store's clock, and the lock is upgraded to write
    /// the result into [`Order::status`](crate::Order::status). The recomputed
    /// status therefore persists after the read. Reads of different orders
    /// run in parallel; status write-backs to one order serialize.
    ///
    /// # Panics
    ///
    /// Panics if the policy reports the order as structurally invalid. Such
    /// an order can only exist through caller misuse elsewhere, so the read
    /// cannot continue.
    #[allow(clippy::panic)]
    #[tracing::instrument(skip(self))]
    pub fn get_order_by_id(&self, id: &str) -> Option<SharedOrder> {
        let collections = self.collections.read();
        let order = self.track_lookup(collections.orders.get(id))?;

        let guard = order.upgradable_read();
        let status = match self.order_status.compute(&guard, self.clock.as_ref()) {
            Ok(status) => status,
            Err(err) => {
                tracing::error!(order_id = id, error = %err, "order status computation failed");
                panic!("order {id:?} violates store invariants: {err}");
            },
        };

        let mut guard = RwLockUpgradableReadGuard::upgrade(guard);
        if guard.status != status {
            tracing::debug!(order_id = id, from = ?guard.status, to = ?status, "order status changed");
        }
        guard.status = status;
        drop(guard);
        self.metrics.record_status_recompute();

        Some(Arc::clone(order))
    }

    // ---------------------------------------------------------------------
    // Authorizations
    // ---------------------------------------------------------------------

    /// Stores a new authorization and returns the number stored.
    ///
    /// # Errors
    ///
    /// - [`StoreError::EmptyIdentifier`] if the authorization ID is empty
    /// - [`StoreError::AlreadyExists`] if the ID is taken
    #[tracing::instrument(skip(self, authz), fields(id = tracing::field::Empty))]
    pub fn add_authorization(&self, authz: SharedAuthorization) -> StoreResult<usize> {
        let id = authz.read().id().to_owned();
        tracing::Span::current().record("id", id.as_str());

        let mut collections = self.collections.write();
        let result =
            insert_unique(&mut collections.authorizations, EntityKind::Authorization, &id, authz);
        drop(collections);
        self.track(result)
    }

    /// Looks up an authorization.
    #[tracing::instrument(skip(self))]
    pub fn get_authorization_by_id(&self, id: &str) -> Option<SharedAuthorization> {
        let found = self.collections.read().authorizations.get(id).cloned();
        self.track_lookup(found)
    }

    // ---------------------------------------------------------------------
    // Challenges
    // ---------------------------------------------------------------------

    /// Stores a new challenge and returns the number stored.
    ///
    /// # Errors
    ///
    /// - [`StoreError::EmptyIdentifier`] if the challenge ID is empty
    /// - [`StoreError::AlreadyExists`] if the ID is taken
    #[tracing::instrument(skip(self, challenge), fields(id = tracing::field::Empty))]
    pub fn add_challenge(&self, challenge: SharedChallenge) -> StoreResult<usize> {
        let id = challenge.read().id().to_owned();
        tracing::Span::current().record("id", id.as_str());

        let mut collections = self.collections.write();
        let result =
            insert_unique(&mut collections.challenges, EntityKind::Challenge, &id, challenge);
        drop(collections);
        self.track(result)
    }

    /// Looks up a challenge.
    #[tracing::instrument(skip(self))]
    pub fn get_challenge_by_id(&self, id: &str) -> Option<SharedChallenge> {
        let found = self.collections.read().challenges.get(id).cloned();
        self.track_lookup(found)
    }

    // ---------------------------------------------------------------------
    // Certificates
    // ---------------------------------------------------------------------

    /// Stores a new certificate and returns the number stored.
    ///
    /// # Errors
    ///
    /// - [`StoreError::EmptyIdentifier`] if the certificate ID is empty
    /// - [`StoreError::AlreadyExists`] if the ID is taken
    #[tracing::instrument(skip(self, cert), fields(id = tracing::field::Empty))]
    pub fn add_certificate(&self, cert: impl Into<Arc<Certificate>>) -> StoreResult<usize> {
        let cert = cert.into();
        tracing::Span::current().record("id", cert.id());

        let id = cert.id().to_owned();
        let mut collections = self.collections.write();
        let result =
            insert_unique(&mut collections.certificates, EntityKind::Certificate, &id, cert);
        drop(collections);
        self.track(result)
    }

    /// Looks up a certificate by ID.
    #[tracing::instrument(skip(self))]
    pub fn get_certificate_by_id(&self, id: &str) -> Option<Arc<Certificate>> {
        let found = self.collections.read().certificates.get(id).cloned();
        self.track_lookup(found)
    }

    /// Finds the certificate whose DER encoding equals `der` byte for byte.
    ///
    /// # Performance
    ///
    /// This is a linear scan over every stored certificate under the shared
    /// store lock: O(n) in the number of certificates, and writers wait for
    /// it to finish. It exists for the rare reverse lookup done by
    /// revocation requests and is not meant for hot paths. Scans that
    /// examine more than
    /// [`der_scan_warn_threshold`](StoreConfig::der_scan_warn_threshold)
    /// certificates log a warning.
    #[tracing::instrument(skip(self, der), fields(der_len = der.len()))]
    pub fn get_certificate_by_der(&self, der: &[u8]) -> Option<Arc<Certificate>> {
        let collections = self.collections.read();

        let mut examined = 0usize;
        let found = collections
            .certificates
            .values()
            .find(|cert| {
                examined += 1;
                cert.der.as_ref() == der
            })
            .cloned();
        drop(collections);

        self.metrics.record_der_scan(examined);
        if examined > self.config.der_scan_warn_threshold() {
            tracing::warn!(
                examined,
                threshold = self.config.der_scan_warn_threshold(),
                "certificate DER scan exceeded threshold"
            );
        }
        found
    }

    /// Removes a certificate by its ID.
    ///
    /// Idempotent: revoking a certificate that is not stored does nothing.
    /// The certificate is deleted, not archived; the removed entry is
    /// returned so callers can keep their own revocation records.
    #[tracing::instrument(skip(self, cert), fields(id = cert.id()))]
    pub fn revoke_certificate(&self, cert: &Certificate) -> Option<Arc<Certificate>> {
        let removed = self.collections.write().certificates.remove(cert.id());
        if removed.is_some() {
            self.metrics.record_revoke();
            tracing::debug!("certificate revoked");
        }
        removed
    }
}

impl Default for EntityStore {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl fmt::Debug for EntityStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntityStore")
            .field("stats", &self.stats())
            .field("clock", &self.clock)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use chrono::Duration;
    use proptest::prelude::*;

    use super::*;
    use crate::{
        assert_already_exists, assert_empty_identifier, assert_missing_field, assert_not_found,
        entity::{Authorization, AuthorizationStatus, Challenge, ChallengeType, Order, OrderStatus},
        error::OrderStatusError,
        testutil::{
            T0, hours, make_account, make_authorization, make_certificate, make_challenge,
            make_order, store_with_fake_clock,
        },
    };

    // -----------------------------------------------------------------------
    // Accounts
    // -----------------------------------------------------------------------

    #[test]
    fn add_and_get_account() {
        let store = EntityStore::default();
        let account = Arc::new(make_account(1));

        assert_eq!(store.add_account(Arc::clone(&account)).unwrap(), 1);

        let stored = store.get_account_by_id(account.id()).expect("account should exist");
        assert!(Arc::ptr_eq(&stored, &account));
        assert_eq!(*stored, *account);
    }

    #[test]
    fn add_account_returns_collection_size() {
        let store = EntityStore::default();
        for i in 0..5 {
            assert_eq!(store.add_account(make_account(i)).unwrap(), i + 1);
        }
        assert_eq!(store.stats().accounts, 5);
    }

    #[test]
    fn add_account_with_empty_id_fails() {
        let store = EntityStore::default();
        let account = Account::builder().id("").public_key(b"key".to_vec()).build();

        let result = store.add_account(account);
        assert_empty_identifier!(result);
        assert_eq!(store.stats().accounts, 0);
    }

    #[test]
    fn empty_id_checked_before_key() {
        let store = EntityStore::default();
        let account = Account::builder().id("").build();

        let result = store.add_account(account);
        assert_empty_identifier!(result);
    }

    #[test]
    fn add_account_without_key_fails() {
        let store = EntityStore::default();
        let account = Account::builder().id("acct-1").build();

        let result = store.add_account(account);
        assert_missing_field!(result);
        assert_eq!(
            result.unwrap_err(),
            StoreError::missing_field(EntityKind::Account, "public_key")
        );
        assert!(store.get_account_by_id("acct-1").is_none());
    }

    #[test]
    fn duplicate_account_keeps_first() {
        let store = EntityStore::default();
        let first = Arc::new(make_account(1));
        let mut second = make_account(1);
        second.contacts = vec!["mailto:other@example.com".into()];

        store.add_account(Arc::clone(&first)).unwrap();
        let result = store.add_account(second);
        assert_already_exists!(result);

        let stored = store.get_account_by_id(first.id()).unwrap();
        assert!(Arc::ptr_eq(&stored, &first));
        assert_eq!(store.stats().accounts, 1);
    }

    #[test]
    fn get_missing_account_is_none() {
        let store = EntityStore::default();
        assert!(store.get_account_by_id("nope").is_none());
        assert!(store.get_account_by_id("").is_none());
    }

    #[test]
    fn update_account_replaces_wholesale() {
        let store = EntityStore::default();
        let original = make_account(1);
        let id = original.id().to_owned();
        store.add_account(original).unwrap();

        let replacement = Account::builder()
            .id(id.as_str())
            .public_key(b"rotated-key".to_vec())
            .status(crate::entity::AccountStatus::Deactivated)
            .created_at(T0)
            .build();
        store.update_account_by_id(&id, replacement.clone()).unwrap();

        let stored = store.get_account_by_id(&id).unwrap();
        assert_eq!(*stored, replacement);
        assert!(stored.contacts.is_empty(), "fields are replaced, not merged");
    }

    #[test]
    fn update_unknown_account_fails_without_insert() {
        let store = EntityStore::default();

        let result = store.update_account_by_id("ghost", make_account(1));
        assert_not_found!(result);
        assert_eq!(result.unwrap_err(), StoreError::not_found(EntityKind::Account, "ghost"));
        assert!(store.get_account_by_id("ghost").is_none());
        assert_eq!(store.stats().accounts, 0);
    }

    // -----------------------------------------------------------------------
    // Orders
    // -----------------------------------------------------------------------

    #[test]
    fn add_and_get_order() {
        let (store, _clock) = store_with_fake_clock();
        let order = make_order("order-1", hours(1), vec![make_authorization("a", hours(24))]);

        assert_eq!(store.add_order(Arc::clone(&order)).unwrap(), 1);

        let stored = store.get_order_by_id("order-1").unwrap();
        assert!(Arc::ptr_eq(&stored, &order));
    }

    #[test]
    fn order_id_rules() {
        let (store, _clock) = store_with_fake_clock();

        let result = store.add_order(make_order("", hours(1), Vec::new()));
        assert_empty_identifier!(result);

        store.add_order(make_order("o1", hours(1), Vec::new())).unwrap();
        let result = store.add_order(make_order("o1", hours(5), Vec::new()));
        assert_already_exists!(result);

        assert_eq!(store.get_order_by_id("o1").unwrap().read().expires, hours(1));
    }

    #[test]
    fn get_missing_order_is_none() {
        let (store, _clock) = store_with_fake_clock();
        assert!(store.get_order_by_id("missing").is_none());
    }

    #[test]
    fn order_status_is_persisted_on_read() {
        let (store, clock) = store_with_fake_clock();
        let order = make_order("o1", hours(1), vec![make_authorization("a", hours(24))]);
        store.add_order(Arc::clone(&order)).unwrap();

        clock.advance(Duration::hours(2));
        assert_eq!(order.read().status, OrderStatus::Pending, "no recompute before a read");

        store.get_order_by_id("o1").unwrap();
        assert_eq!(order.read().status, OrderStatus::Expired);

        // The written status survives even if time moves back.
        clock.set(T0);
        assert_eq!(order.read().status, OrderStatus::Expired);
    }

    #[test]
    fn order_status_tracks_authorization_changes() {
        let (store, _clock) = store_with_fake_clock();
        let authz = make_authorization("a", hours(24));
        store.add_authorization(Arc::clone(&authz)).unwrap();
        store.add_order(make_order("o1", hours(1), vec![Arc::clone(&authz)])).unwrap();

        assert_eq!(store.get_order_by_id("o1").unwrap().read().status, OrderStatus::Pending);

        authz.write().status = AuthorizationStatus::Valid;
        assert_eq!(store.get_order_by_id("o1").unwrap().read().status, OrderStatus::Ready);

        store.get_order_by_id("o1").unwrap().write().began_processing = true;
        assert_eq!(store.get_order_by_id("o1").unwrap().read().status, OrderStatus::Processing);
    }

    #[test]
    fn custom_policy_is_used() {
        let policy = |order: &Order, _: &dyn Clock| -> Result<OrderStatus, OrderStatusError> {
            if order.identifiers.is_empty() { Ok(OrderStatus::Invalid) } else { Ok(OrderStatus::Ready) }
        };
        let store = EntityStore::builder().order_status(Arc::new(policy)).build();
        store.add_order(make_order("o1", hours(1), Vec::new())).unwrap();

        assert_eq!(store.get_order_by_id("o1").unwrap().read().status, OrderStatus::Invalid);
    }

    #[test]
    #[should_panic(expected = "violates store invariants")]
    fn malformed_order_read_panics() {
        let (store, _clock) = store_with_fake_clock();
        let order = Order::builder()
            .id("broken")
            .account_id("acct")
            .identifiers(vec!["a.example.com".into(), "b.example.com".into()])
            .expires(hours(1))
            .build()
            .into_shared();
        store.add_order(order).unwrap();

        let _ = store.get_order_by_id("broken");
    }

    #[test]
    fn store_stays_usable_after_status_panic() {
        let (store, _clock) = store_with_fake_clock();
        let broken = Order::builder()
            .id("broken")
            .account_id("acct")
            .identifiers(vec!["a.example.com".into()])
            .expires(hours(1))
            .build()
            .into_shared();
        store.add_order(broken).unwrap();

        let reader = store.clone();
        let outcome = std::thread::spawn(move || reader.get_order_by_id("broken")).join();
        assert!(outcome.is_err(), "reading a malformed order should panic");

        // parking_lot locks do not poison; the store is still writable.
        assert_eq!(store.add_account(make_account(1)).unwrap(), 1);
    }

    // -----------------------------------------------------------------------
    // Authorizations and challenges
    // -----------------------------------------------------------------------

    #[test]
    fn add_and_get_authorization() {
        let store = EntityStore::default();
        let authz = make_authorization("authz-1", hours(24));

        assert_eq!(store.add_authorization(Arc::clone(&authz)).unwrap(), 1);
        let stored = store.get_authorization_by_id("authz-1").unwrap();
        assert!(Arc::ptr_eq(&stored, &authz));

        let result = store.add_authorization(make_authorization("authz-1", hours(48)));
        assert_already_exists!(result);
        assert_eq!(stored.read().expires, hours(24));

        let empty = Authorization::builder().id("").identifier("x").expires(hours(1)).build();
        let result = store.add_authorization(empty.into_shared());
        assert_empty_identifier!(result);

        assert!(store.get_authorization_by_id("authz-2").is_none());
    }

    #[test]
    fn add_and_get_challenge() {
        let store = EntityStore::default();
        let chal = make_challenge("chal-1", "authz-1");

        assert_eq!(store.add_challenge(Arc::clone(&chal)).unwrap(), 1);
        let stored = store.get_challenge_by_id("chal-1").unwrap();
        assert!(Arc::ptr_eq(&stored, &chal));

        let result = store.add_challenge(make_challenge("chal-1", "authz-2"));
        assert_already_exists!(result);
        assert_eq!(stored.read().authorization_id, "authz-1");

        let empty = Challenge::builder()
            .id("")
            .authorization_id("authz-1")
            .challenge_type(ChallengeType::Dns01)
            .token("t")
            .build();
        let result = store.add_challenge(empty.into_shared());
        assert_empty_identifier!(result);

        assert!(store.get_challenge_by_id("chal-2").is_none());
    }

    #[test]
    fn in_place_mutation_is_visible_through_store() {
        let store = EntityStore::default();
        let chal = make_challenge("chal-1", "authz-1");
        store.add_challenge(Arc::clone(&chal)).unwrap();

        chal.write().status = crate::entity::ChallengeStatus::Valid;
        assert_eq!(
            store.get_challenge_by_id("chal-1").unwrap().read().status,
            crate::entity::ChallengeStatus::Valid
        );
    }

    // -----------------------------------------------------------------------
    // Certificates
    // -----------------------------------------------------------------------

    #[test]
    fn add_and_get_certificate() {
        let store = EntityStore::default();
        let cert = make_certificate("cert-1", vec![0x30u8, 0x82, 0x01]);

        assert_eq!(store.add_certificate(Arc::clone(&cert)).unwrap(), 1);
        let stored = store.get_certificate_by_id("cert-1").unwrap();
        assert!(Arc::ptr_eq(&stored, &cert));

        let result = store.add_certificate(make_certificate("cert-1", vec![0xFFu8]));
        assert_already_exists!(result);
        assert_eq!(store.get_certificate_by_id("cert-1").unwrap().der.as_ref(), &[0x30, 0x82, 0x01]);

        let result = store.add_certificate(make_certificate("", vec![0x01u8]));
        assert_empty_identifier!(result);
    }

    #[test]
    fn der_lookup_requires_exact_match() {
        let store = EntityStore::default();
        store.add_certificate(make_certificate("cert-1", vec![1u8, 2, 3, 4])).unwrap();
        store.add_certificate(make_certificate("cert-2", vec![9u8, 9])).unwrap();

        let found = store.get_certificate_by_der(&[1, 2, 3, 4]).unwrap();
        assert_eq!(found.id(), "cert-1");

        assert!(store.get_certificate_by_der(&[1, 2, 3]).is_none(), "prefix must not match");
        assert!(store.get_certificate_by_der(&[2, 3, 4]).is_none(), "suffix must not match");
        assert!(store.get_certificate_by_der(&[1, 2, 3, 4, 5]).is_none());
        assert!(store.get_certificate_by_der(&[]).is_none());
    }

    #[test]
    fn der_scan_is_counted() {
        let store = EntityStore::default();
        for i in 0..4u8 {
            store.add_certificate(make_certificate(&format!("cert-{i}"), vec![i])).unwrap();
        }

        assert!(store.get_certificate_by_der(&[42]).is_none());
        let snapshot = store.metrics().snapshot();
        assert_eq!(snapshot.der_scan_count, 1);
        assert_eq!(snapshot.der_scan_examined, 4, "a miss examines every certificate");
    }

    #[test]
    fn revoke_is_idempotent() {
        let store = EntityStore::default();
        let cert = make_certificate("cert-1", vec![7u8, 7, 7]);
        store.add_certificate(Arc::clone(&cert)).unwrap();

        let removed = store.revoke_certificate(&cert).unwrap();
        assert!(Arc::ptr_eq(&removed, &cert));
        assert!(store.get_certificate_by_id("cert-1").is_none());
        assert!(store.get_certificate_by_der(&[7, 7, 7]).is_none());

        assert!(store.revoke_certificate(&cert).is_none());
        assert!(store.revoke_certificate(&make_certificate("never-added", vec![1u8])).is_none());
        assert_eq!(store.stats().certificates, 0);
        assert_eq!(store.metrics().snapshot().revoke_count, 1);
    }

    #[test]
    fn revoked_id_can_be_reused() {
        let store = EntityStore::default();
        let cert = make_certificate("cert-1", vec![1u8]);
        store.add_certificate(Arc::clone(&cert)).unwrap();
        store.revoke_certificate(&cert);

        assert_eq!(store.add_certificate(make_certificate("cert-1", vec![2u8])).unwrap(), 1);
    }

    // -----------------------------------------------------------------------
    // Store-wide
    // -----------------------------------------------------------------------

    #[test]
    fn collections_are_independent() {
        let store = EntityStore::default();
        store.add_authorization(make_authorization("shared-id", hours(1))).unwrap();
        store.add_challenge(make_challenge("shared-id", "shared-id")).unwrap();
        store.add_certificate(make_certificate("shared-id", vec![1u8])).unwrap();

        assert_eq!(
            store.stats(),
            StoreStats { accounts: 0, orders: 0, authorizations: 1, challenges: 1, certificates: 1 }
        );
    }

    #[test]
    fn clones_share_state() {
        let store = EntityStore::default();
        let clone = store.clone();

        store.add_account(make_account(1)).unwrap();
        assert_eq!(clone.stats().accounts, 1);
        assert_eq!(clone.metrics().snapshot().add_count, 1);
    }

    #[test]
    fn metrics_track_outcomes() {
        let store = EntityStore::default();
        store.add_account(make_account(1)).unwrap();
        let _ = store.add_account(make_account(1));
        let _ = store.update_account_by_id("ghost", make_account(2));
        store.get_account_by_id(&Account::id_for_key(&crate::testutil::make_key(1))).unwrap();
        let _ = store.get_account_by_id("ghost");

        let snapshot = store.metrics().snapshot();
        assert_eq!(snapshot.add_count, 1);
        assert_eq!(snapshot.error_already_exists, 1);
        assert_eq!(snapshot.error_not_found, 1);
        assert_eq!(snapshot.lookup_hits, 1);
        assert_eq!(snapshot.lookup_misses, 1);
    }

    #[test]
    fn capacity_hint_is_accepted() {
        let config = StoreConfig::builder().capacity_hint(128).build().unwrap();
        let store = EntityStore::builder().config(config).build();
        store.add_account(make_account(1)).unwrap();
        assert_eq!(store.stats().accounts, 1);
    }

    proptest! {
        /// A DER lookup finds exactly the certificate stored with those bytes
        /// and nothing for any other byte string.
        #[test]
        fn der_lookup_matches_only_stored_bytes(
            ders in proptest::collection::hash_set(proptest::collection::vec(any::<u8>(), 1..32), 1..20),
            probe in proptest::collection::vec(any::<u8>(), 0..32),
        ) {
            let store = EntityStore::default();
            let ders: Vec<Vec<u8>> = ders.into_iter().collect();
            for (i, der) in ders.iter().enumerate() {
                store.add_certificate(make_certificate(&format!("cert-{i}"), der.clone())).unwrap();
            }

            for der in &ders {
                let found = store.get_certificate_by_der(der).unwrap();
                prop_assert_eq!(found.der.as_ref(), der.as_slice());
            }

            let found = store.get_certificate_by_der(&probe);
            prop_assert_eq!(found.is_some(), ders.contains(&probe));
        }
    }
}
