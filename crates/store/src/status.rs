//! Order status derivation.
//!
//! An order's status is never stored authoritatively. The store asks an
//! [`OrderStatusPolicy`] to derive it from the order's own state and the
//! current time whenever the order is read.
//!
//! # Default Rules
//!
//! [`AcmeOrderStatus`] evaluates, in order:
//!
//! ```text
//! error recorded ──────────────────────────► invalid
//! certificate issued ──────────────────────► valid
//! now >= expires ──────────────────────────► expired
//! any authz invalid/deactivated/revoked/
//!   expired (by status or by time) ────────► invalid
//! any authz pending ───────────────────────► pending
//! valid authz count != identifier count ───► error (malformed order)
//! began processing ────────────────────────► processing
//! otherwise ───────────────────────────────► ready
//! ```

use crate::{
    clock::Clock,
    entity::{AuthorizationStatus, Order, OrderStatus},
    error::OrderStatusError,
};

/// Derives an order's status from its state and the clock.
///
/// Implementations must be pure and cheap: they run inside the store's read
/// path while the store lock is held shared and the order lock is held for
/// reading. They may take read locks on the order's authorizations but must
/// never call back into the store.
///
/// Any `Fn(&Order, &dyn Clock) -> Result<OrderStatus, OrderStatusError>`
/// closure is a policy:
///
/// ```
/// use acme_testbed_store::{Clock, Order, OrderStatus, OrderStatusError, OrderStatusPolicy};
///
/// let expiry_only = |order: &Order, clock: &dyn Clock| -> Result<OrderStatus, OrderStatusError> {
///     if clock.now() >= order.expires { Ok(OrderStatus::Expired) } else { Ok(OrderStatus::Pending) }
/// };
/// # fn assert_policy<P: OrderStatusPolicy>(_: &P) {}
/// # assert_policy(&expiry_only);
/// ```
pub trait OrderStatusPolicy: Send + Sync {
    /// Computes the status `order` should have at `clock.now()`.
    ///
    /// # Errors
    ///
    /// Returns [`OrderStatusError`] when the order is structurally invalid.
    fn compute(&self, order: &Order, clock: &dyn Clock) -> Result<OrderStatus, OrderStatusError>;
}

impl<F> OrderStatusPolicy for F
where
    F: Fn(&Order, &dyn Clock) -> Result<OrderStatus, OrderStatusError> + Send + Sync,
{
    fn compute(&self, order: &Order, clock: &dyn Clock) -> Result<OrderStatus, OrderStatusError> {
        self(order, clock)
    }
}

/// The ACME order state machine, extended with clock-driven expiry.
#[derive(Debug, Clone, Copy, Default)]
pub struct AcmeOrderStatus;

impl OrderStatusPolicy for AcmeOrderStatus {
    fn compute(&self, order: &Order, clock: &dyn Clock) -> Result<OrderStatus, OrderStatusError> {
        if order.error.is_some() {
            return Ok(OrderStatus::Invalid);
        }
        if order.certificate.is_some() {
            return Ok(OrderStatus::Valid);
        }

        let now = clock.now();
        if order.expires <= now {
            return Ok(OrderStatus::Expired);
        }

        let mut pending = 0usize;
        let mut valid = 0usize;
        for authz in &order.authorizations {
            let authz = authz.read();
            if authz.is_expired_at(now) {
                return Ok(OrderStatus::Invalid);
            }
            match authz.status {
                AuthorizationStatus::Pending => pending += 1,
                AuthorizationStatus::Valid => valid += 1,
                AuthorizationStatus::Invalid
                | AuthorizationStatus::Deactivated
                | AuthorizationStatus::Expired
                | AuthorizationStatus::Revoked => return Ok(OrderStatus::Invalid),
            }
        }

        if pending > 0 {
            return Ok(OrderStatus::Pending);
        }

        if valid != order.identifiers.len() {
            return Err(OrderStatusError::AuthorizationMismatch {
                order_id: order.id().to_owned(),
                valid,
                identifiers: order.identifiers.len(),
            });
        }

        if order.began_processing { Ok(OrderStatus::Processing) } else { Ok(OrderStatus::Ready) }
    }
}
