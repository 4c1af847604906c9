//! Storage pricing used to turn bytes into a monthly cost.

use derive_builder::Builder;
use serde::{Deserialize, Serialize};

use storewise_core::StorageClass;

/// Bytes in one billing gigabyte (GiB).
pub const BYTES_PER_GIB: f64 = 1024.0 * 1024.0 * 1024.0;

/// Default standard-tier price in dollars per GiB-month.
pub const DEFAULT_STANDARD_PRICE: f64 = 0.023;

/// Default archive-tier price in dollars per GiB-month.
pub const DEFAULT_ARCHIVE_PRICE: f64 = 0.004;

/// Maps an amount of stored data to a monthly cost.
///
/// Implementations must be monotonically non-decreasing in `bytes` and
/// never return a negative amount.
pub trait PricingModel {
    /// Monthly cost of keeping `bytes` in `class`.
    fn monthly_cost(&self, class: StorageClass, bytes: u64) -> f64;

    /// Monthly saving from deleting `bytes` stored in the standard tier.
    fn deletion_savings(&self, bytes: u64) -> f64 {
        self.monthly_cost(StorageClass::Standard, bytes)
    }

    /// Monthly saving from moving `bytes` from the standard to the archive tier.
    fn archive_savings(&self, bytes: u64) -> f64 {
        let diff = self.monthly_cost(StorageClass::Standard, bytes)
            - self.monthly_cost(StorageClass::Archive, bytes);
        diff.max(0.0)
    }
}

impl<P: PricingModel + ?Sized> PricingModel for &P {
    fn monthly_cost(&self, class: StorageClass, bytes: u64) -> f64 {
        (**self).monthly_cost(class, bytes)
    }
}

/// Flat per-GiB price for each storage tier.
#[derive(Debug, Clone, Copy, PartialEq, Builder, Serialize, Deserialize)]
#[builder(build_fn(validate = "Self::validate"))]
#[serde(rename_all = "camelCase")]
pub struct TieredPricing {
    /// Dollars per GiB-month in the standard tier.
    #[builder(default = "DEFAULT_STANDARD_PRICE")]
    pub standard_per_gib: f64,

    /// Dollars per GiB-month in the archive tier.
    #[builder(default = "DEFAULT_ARCHIVE_PRICE")]
    pub archive_per_gib: f64,
}

impl TieredPricingBuilder {
    fn validate(&self) -> Result<(), String> {
        for (label, price) in [
            ("standard", self.standard_per_gib),
            ("archive", self.archive_per_gib),
        ] {
            if let Some(price) = price.filter(|p| !(p.is_finite() && *p >= 0.0)) {
                return Err(format!("{label} price must be a non-negative number, got {price}"));
            }
        }
        Ok(())
    }
}

impl TieredPricing {
    /// Create a new pricing builder.
    pub fn builder() -> TieredPricingBuilder {
        TieredPricingBuilder::default()
    }

    /// Price per GiB-month for one tier.
    pub fn rate(&self, class: StorageClass) -> f64 {
        match class {
            StorageClass::Standard => self.standard_per_gib,
            StorageClass::Archive => self.archive_per_gib,
        }
    }
}

impl Default for TieredPricing {
    fn default() -> Self {
        Self {
            standard_per_gib: DEFAULT_STANDARD_PRICE,
            archive_per_gib: DEFAULT_ARCHIVE_PRICE,
        }
    }
}

impl PricingModel for TieredPricing {
    fn monthly_cost(&self, class: StorageClass, bytes: u64) -> f64 {
        bytes as f64 / BYTES_PER_GIB * self.rate(class)
    }
}
