//! Store configuration.
//!
//! # Example
//!
//! ```
//! use acme_testbed_store::StoreConfig;
//!
//! let config = StoreConfig::builder().capacity_hint(256).der_scan_warn_threshold(1_000).build()?;
//! assert_eq!(config.capacity_hint(), 256);
//! # Ok::<(), acme_testbed_store::ConfigError>(())
//! ```

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Default number of certificates a DER scan may examine before warning.
pub const DEFAULT_DER_SCAN_WARN_THRESHOLD: usize = 10_000;

/// Tuning knobs for [`EntityStore`](crate::EntityStore).
///
/// Deserialized configs are not validated by serde; pass them through
/// [`validate`](Self::validate) before use.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StoreConfig {
    /// Capacity pre-allocated for each collection.
    #[serde(default)]
    pub(crate) capacity_hint: usize,

    /// DER scans over more certificates than this log a warning.
    #[serde(default = "default_der_scan_warn_threshold")]
    pub(crate) der_scan_warn_threshold: usize,
}

fn default_der_scan_warn_threshold() -> usize {
    DEFAULT_DER_SCAN_WARN_THRESHOLD
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self { capacity_hint: 0, der_scan_warn_threshold: DEFAULT_DER_SCAN_WARN_THRESHOLD }
    }
}

#[bon::bon]
impl StoreConfig {
    /// Creates a validated configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::BelowMinimum`] if `der_scan_warn_threshold` is zero.
    #[builder]
    pub fn new(
        #[builder(default)] capacity_hint: usize,
        #[builder(default = DEFAULT_DER_SCAN_WARN_THRESHOLD)] der_scan_warn_threshold: usize,
    ) -> Result<Self, ConfigError> {
        let config = Self { capacity_hint, der_scan_warn_threshold };
        config.validate()?;
        Ok(config)
    }

    /// Checks field bounds.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::BelowMinimum`] if `der_scan_warn_threshold` is zero.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.der_scan_warn_threshold == 0 {
            return Err(ConfigError::BelowMinimum {
                field: "der_scan_warn_threshold",
                min: 1,
                value: 0,
            });
        }
        Ok(())
    }

    /// Capacity pre-allocated for each collection.
    #[must_use]
    pub fn capacity_hint(&self) -> usize {
        self.capacity_hint
    }

    /// Number of certificates a DER scan may examine before warning.
    #[must_use]
    pub fn der_scan_warn_threshold(&self) -> usize {
        self.der_scan_warn_threshold
    }
}
