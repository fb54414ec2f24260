//! Proration of the first billing period

use rust_decimal::Decimal;

use core_kernel::Ratio;
use domain_catalog::{Product, ResolvedPeriod};

/// Charges `base * numerator / denominator`
pub fn prorate(base: Decimal, ratio: Ratio) -> Decimal {
    ratio.apply(base)
}

/// Decides which ratio applies to a resolved period
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ProrationPolicy {
    disabled: bool,
}

impl ProrationPolicy {
    pub fn for_product(product: &Product) -> Self {
        Self {
            disabled: product.disable_pro_rating,
        }
    }

    /// Policy charging every period in full
    pub fn disabled() -> Self {
        Self { disabled: true }
    }

    pub fn ratio_for(&self, period: &ResolvedPeriod) -> Ratio {
        if self.disabled {
            Ratio::FULL
        } else {
            period.ratio
        }
    }
}
