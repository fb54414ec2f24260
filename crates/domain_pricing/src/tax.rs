//! Tax computation
//!
//! Inclusive taxes are embedded in the price: the tax share of a gross price
//! `p` at rate `r` is `p * r / (100 + r)`. Exclusive taxes are added on top
//! of the price.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use core_kernel::{round_tax_amount, Percentage, TaxId};
use domain_catalog::{Tax, TaxCategory};

/// Result of taxing a price
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxBreakdown {
    /// Tax portion, six decimal places
    pub tax_amount: Decimal,
    /// Price without tax, six decimal places
    pub net_amount: Decimal,
    /// Price the customer pays
    pub gross_amount: Decimal,
}

/// Computes the tax on a (possibly discounted) price
pub fn compute_tax(price: Decimal, percentage: Percentage, category: TaxCategory) -> TaxBreakdown {
    let rate = percentage.value();
    match category {
        TaxCategory::Inclusive => {
            let tax = if rate.is_zero() {
                Decimal::ZERO
            } else {
                price * rate / (dec!(100) + rate)
            };
            TaxBreakdown {
                tax_amount: round_tax_amount(tax),
                net_amount: round_tax_amount(price - tax),
                gross_amount: price,
            }
        }
        TaxCategory::Exclusive => {
            let tax = percentage.of(price);
            TaxBreakdown {
                tax_amount: round_tax_amount(tax),
                net_amount: price,
                gross_amount: price + tax,
            }
        }
    }
}

/// Tax recorded on one bill line
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxLine {
    pub tax_id: TaxId,
    pub percentage: Percentage,
    pub category: TaxCategory,
    pub tax_amount: Decimal,
}

impl TaxLine {
    /// Taxes a price and returns the line with its breakdown
    pub fn compute(tax: &Tax, price: Decimal) -> (Self, TaxBreakdown) {
        let breakdown = compute_tax(price, tax.percentage, tax.category);
        let line = Self {
            tax_id: tax.id,
            percentage: tax.percentage,
            category: tax.category,
            tax_amount: breakdown.tax_amount,
        };
        (line, breakdown)
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use core_kernel::amounts_match;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn inclusive_parts_sum_to_price(price_cents in 0i64..10_000_000, rate in 0u32..50) {
            let price = Decimal::new(price_cents, 2);
            let breakdown = compute_tax(price, Percentage::new(Decimal::from(rate)).unwrap(), TaxCategory::Inclusive);
            prop_assert!(amounts_match(breakdown.tax_amount + breakdown.net_amount, price));
        }

        #[test]
        fn exclusive_gross_is_price_plus_tax(price_cents in 0i64..10_000_000, rate in 0u32..50) {
            let price = Decimal::new(price_cents, 2);
            let breakdown = compute_tax(price, Percentage::new(Decimal::from(rate)).unwrap(), TaxCategory::Exclusive);
            prop_assert!(amounts_match(breakdown.gross_amount, price + breakdown.tax_amount));
        }
    }
}
