//! Discount resolution and application
//!
//! A discount is applied to the prorated price before tax. Fixed amounts are
//! defined per full period, so they are prorated by the same ratio as the
//! price and then capped so the price never goes negative.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use core_kernel::{DiscountId, LocationId, Percentage, ProductId, Ratio, StudentId};
use domain_catalog::{Catalog, Discount, DiscountAmount, DiscountType, UserDiscountTag};
use crate::error::PricingError;

/// Discount applied to one bill line
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscountLine {
    pub discount_id: DiscountId,
    pub discount_type: DiscountType,
    pub amount: DiscountAmount,
    /// Amount subtracted from the line price
    pub discount_amount: Decimal,
}

/// Returns the discount amount for a price
///
/// # Arguments
///
/// * `price` - The prorated line price
/// * `amount` - The discount definition
/// * `ratio` - The ratio used to prorate the line
pub fn apply_discount(price: Decimal, amount: &DiscountAmount, ratio: Ratio) -> Decimal {
    if price <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    let raw = match amount {
        DiscountAmount::FixedAmount(value) => ratio.apply(*value),
        DiscountAmount::Percentage(value) => match Percentage::new(*value) {
            Ok(pct) => pct.of(price),
            Err(_) => Decimal::ZERO,
        },
    };
    raw.max(Decimal::ZERO).min(price)
}

/// Who is ordering what, and when
#[derive(Debug, Clone, Copy)]
pub struct DiscountQuery<'a> {
    pub product_id: ProductId,
    pub student_id: StudentId,
    pub location_id: LocationId,
    pub order_date: NaiveDate,
    /// Discount chosen on the order item
    pub explicit: Option<DiscountId>,
    /// Whether the student counts as enrolled in the organization
    pub student_enrolled: bool,
    pub tags: &'a [UserDiscountTag],
}

/// Picks the discount that applies to an order item
#[derive(Debug, Clone, Copy)]
pub struct DiscountResolver<'a> {
    catalog: &'a Catalog,
}

impl<'a> DiscountResolver<'a> {
    pub fn new(catalog: &'a Catalog) -> Self {
        Self { catalog }
    }

    /// Resolves the discount for an order item
    ///
    /// An explicit discount wins and must be available on the order date.
    /// Without one, an org-level discount is taken from the student's single
    /// active discount tag, provided the student is enrolled. Tag discounts
    /// never stack with an explicit discount.
    ///
    /// # Errors
    ///
    /// * `DiscountNotFound` - the explicit discount is unknown
    /// * `DiscountNotAvailable` - the explicit discount is archived or out of its window
    /// * `DiscountNotApplicable` - the product does not accept the discount
    /// * `MultipleDiscountTags` - several tag discounts are active at once
    pub fn resolve(&self, query: &DiscountQuery<'_>) -> Result<Option<&'a Discount>, PricingError> {
        if let Some(discount_id) = query.explicit {
            let discount = self.catalog.discount(&discount_id)?;
            if !discount.is_available_on(query.order_date) {
                return Err(PricingError::DiscountNotAvailable {
                    discount_id,
                    date: query.order_date,
                });
            }
            if !self.catalog.is_discount_allowed(&query.product_id, &discount_id) {
                return Err(PricingError::DiscountNotApplicable {
                    discount_id,
                    product_id: query.product_id,
                });
            }
            return Ok(Some(discount));
        }

        if !query.student_enrolled {
            return Ok(None);
        }

        let mut active = query
            .tags
            .iter()
            .filter(|tag| tag.student_id == query.student_id && tag.location_id == query.location_id)
            .filter(|tag| tag.discount_type.is_org_level() && tag.is_active_on(query.order_date))
            .filter_map(|tag| self.catalog.discount(&tag.discount_id).ok())
            .filter(|discount| discount.is_available_on(query.order_date));

        let Some(first) = active.next() else {
            return Ok(None);
        };
        if active.any(|other| other.id != first.id) {
            return Err(PricingError::MultipleDiscountTags {
                student_id: query.student_id,
            });
        }

        debug!(
            student_id = %query.student_id,
            discount_id = %first.id,
            discount_type = ?first.discount_type,
            "Applying org-level discount from tag"
        );
        Ok(Some(first))
    }
}

impl DiscountLine {
    /// Builds the line for a discount applied to a prorated price
    pub fn new(discount: &Discount, price: Decimal, ratio: Ratio) -> Self {
        Self {
            discount_id: discount.id,
            discount_type: discount.discount_type,
            amount: discount.amount,
            discount_amount: apply_discount(price, &discount.amount, ratio),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_fixed_amount_capped_at_price() {
        let amount = DiscountAmount::FixedAmount(dec!(500));
        assert_eq!(apply_discount(dec!(300), &amount, Ratio::FULL), dec!(300));
    }

    #[test]
    fn test_fixed_amount_prorated() {
        let amount = DiscountAmount::FixedAmount(dec!(10));
        assert_eq!(apply_discount(dec!(150), &amount, Ratio::new(1, 2).unwrap()), dec!(5));
    }

    #[test]
    fn test_percentage_of_price() {
        let amount = DiscountAmount::Percentage(dec!(10));
        assert_eq!(apply_discount(dec!(300), &amount, Ratio::FULL), dec!(30));
    }

    #[test]
    fn test_zero_price_has_no_discount() {
        let amount = DiscountAmount::FixedAmount(dec!(10));
        assert_eq!(apply_discount(Decimal::ZERO, &amount, Ratio::FULL), Decimal::ZERO);
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn fixed_discount_never_exceeds_price(
            price_cents in 0i64..1_000_000,
            discount_cents in 0i64..2_000_000,
        ) {
            let price = Decimal::new(price_cents, 2);
            let amount = DiscountAmount::FixedAmount(Decimal::new(discount_cents, 2));
            let discount = apply_discount(price, &amount, Ratio::FULL);
            prop_assert!(discount <= price);
            prop_assert!(price - discount >= Decimal::ZERO);
        }
    }
}
