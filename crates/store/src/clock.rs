//! Time source used for derived entity state.
//!
//! The store never reads the wall clock directly. Order status derivation
//! asks the injected [`Clock`] instead, which lets tests drive expiry with a
//! [`FakeClock`].

use std::{fmt, sync::Arc};

use chrono::{DateTime, Duration, Utc};
use parking_lot::RwLock;

/// Source of "now" for time-dependent derived state.
pub trait Clock: Send + Sync + fmt::Debug {
    /// Returns the current time.
    fn now(&self) -> DateTime<Utc>;
}

/// Production clock backed by the system time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Manually driven clock for deterministic tests.
///
/// Clones share the same reading, so a test can keep one handle and pass
/// another to the store.
///
/// # Example
///
/// ```
/// use acme_testbed_store::{Clock, FakeClock};
/// use chrono::{DateTime, Duration};
///
/// let clock = FakeClock::new(DateTime::UNIX_EPOCH);
/// clock.advance(Duration::hours(2));
/// assert_eq!(clock.now(), DateTime::UNIX_EPOCH + Duration::hours(2));
/// ```
#[derive(Debug, Clone)]
pub struct FakeClock {
    now: Arc<RwLock<DateTime<Utc>>>,
}

impl FakeClock {
    /// Creates a clock frozen at `now`.
    #[must_use]
    pub fn new(now: DateTime<Utc>) -> Self {
        Self { now: Arc::new(RwLock::new(now)) }
    }

    /// Moves the clock forward (or backward, for a negative duration).
    pub fn advance(&self, by: Duration) {
        let mut now = self.now.write();
        *now += by;
    }

    /// Jumps the clock to `now`.
    pub fn set(&self, now: DateTime<Utc>) {
        *self.now.write() = now;
    }
}

impl Default for FakeClock {
    fn default() -> Self {
        Self::new(DateTime::UNIX_EPOCH)
    }
}

impl Clock for FakeClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.read()
    }
}
