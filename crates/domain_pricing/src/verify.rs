//! Verification of client-submitted billing items
//!
//! Clients send the billing items they displayed to the user. Before an order
//! is accepted every submitted item must match a computed line, within one
//! cent, and no computed line may be missing.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};

use core_kernel::{amounts_match, BillingSchedulePeriodId, ProductId};
use crate::error::PricingError;

/// Monetary fields of a billing item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BillingAmounts {
    pub product_id: ProductId,
    pub period_id: Option<BillingSchedulePeriodId>,
    pub price: Decimal,
    pub discount_amount: Option<Decimal>,
    pub tax_amount: Option<Decimal>,
    pub final_price: Decimal,
    pub adjustment_price: Option<Decimal>,
}

type ItemKey = (ProductId, Option<BillingSchedulePeriodId>);

impl BillingAmounts {
    fn key(&self) -> ItemKey {
        (self.product_id, self.period_id)
    }
}

fn check(
    product_id: ProductId,
    expected: Decimal,
    actual: Decimal,
    err: fn(ProductId, Decimal, Decimal) -> PricingError,
) -> Result<(), PricingError> {
    if amounts_match(expected, actual) {
        Ok(())
    } else {
        Err(err(product_id, expected, actual))
    }
}

/// Checks submitted billing items against the computed ones
///
/// Items are paired by product and billing period, in submission order when
/// a key repeats. Each submitted item answers at most one computed line. The
/// first mismatch is returned.
pub fn verify_billing_items(
    expected: &[BillingAmounts],
    submitted: &[BillingAmounts],
) -> Result<(), PricingError> {
    let mut by_key: HashMap<ItemKey, VecDeque<&BillingAmounts>> = HashMap::new();
    for item in submitted {
        by_key.entry(item.key()).or_default().push_back(item);
    }

    for want in expected {
        let product_id = want.product_id;
        let got = by_key
            .get_mut(&want.key())
            .and_then(VecDeque::pop_front)
            .ok_or(PricingError::MissingBillingItem {
                product_id,
                period_id: want.period_id,
            })?;

        check(product_id, want.price, got.price, |product_id, expected, actual| {
            PricingError::IncorrectProductPrice { product_id, expected, actual }
        })?;
        check(
            product_id,
            want.discount_amount.unwrap_or_default(),
            got.discount_amount.unwrap_or_default(),
            |product_id, expected, actual| PricingError::IncorrectDiscountAmount {
                product_id,
                expected,
                actual,
            },
        )?;
        check(
            product_id,
            want.tax_amount.unwrap_or_default(),
            got.tax_amount.unwrap_or_default(),
            |product_id, expected, actual| PricingError::IncorrectTaxAmount {
                product_id,
                expected,
                actual,
            },
        )?;
        check(product_id, want.final_price, got.final_price, |product_id, expected, actual| {
            PricingError::IncorrectFinalPrice { product_id, expected, actual }
        })?;

        if let Some(expected_adjustment) = want.adjustment_price {
            let actual = got
                .adjustment_price
                .ok_or(PricingError::MissingAdjustmentPrice { product_id })?;
            check(product_id, expected_adjustment, actual, |product_id, expected, actual| {
                PricingError::IncorrectAdjustmentPrice { product_id, expected, actual }
            })?;
        }
    }

    if let Some(extra) = submitted
        .iter()
        .find(|item| by_key.get(&item.key()).is_some_and(|left| !left.is_empty()))
    {
        return Err(PricingError::UnexpectedBillingItem {
            product_id: extra.product_id,
            period_id: extra.period_id,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn item(product_id: ProductId, final_price: Decimal) -> BillingAmounts {
        BillingAmounts {
            product_id,
            period_id: None,
            price: dec!(100),
            discount_amount: None,
            tax_amount: Some(dec!(16.666667)),
            final_price,
            adjustment_price: None,
        }
    }

    #[test]
    fn test_matching_items_pass() {
        let product = ProductId::new();
        assert!(verify_billing_items(&[item(product, dec!(100))], &[item(product, dec!(100.001))]).is_ok());
    }

    #[test]
    fn test_incorrect_final_price() {
        let product = ProductId::new();
        let err = verify_billing_items(&[item(product, dec!(100))], &[item(product, dec!(90))]).unwrap_err();
        assert!(matches!(err, PricingError::IncorrectFinalPrice { .. }));
        assert!(err.to_string().contains(&product.to_string()));
    }

    #[test]
    fn test_missing_and_unexpected() {
        let product = ProductId::new();
        let other = ProductId::new();
        assert!(matches!(
            verify_billing_items(&[item(product, dec!(100))], &[]),
            Err(PricingError::MissingBillingItem { .. })
        ));
        assert!(matches!(
            verify_billing_items(&[item(product, dec!(100))], &[item(product, dec!(100)), item(other, dec!(5))]),
            Err(PricingError::UnexpectedBillingItem { product_id, .. }) if product_id == other
        ));
    }

    #[test]
    fn test_missing_adjustment() {
        let product = ProductId::new();
        let mut want = item(product, dec!(100));
        want.adjustment_price = Some(dec!(-20));
        assert!(matches!(
            verify_billing_items(&[want], &[item(product, dec!(100))]),
            Err(PricingError::MissingAdjustmentPrice { .. })
        ));
    }

    #[test]
    fn test_duplicate_submission_is_unexpected() {
        let product = ProductId::new();
        let err = verify_billing_items(
            &[item(product, dec!(100))],
            &[item(product, dec!(100)), item(product, dec!(0))],
        )
        .unwrap_err();
        assert!(matches!(err, PricingError::UnexpectedBillingItem { product_id, .. } if product_id == product));
    }

    #[test]
    fn test_repeated_lines_pair_in_order() {
        let product = ProductId::new();
        let expected = [item(product, dec!(100)), item(product, dec!(40))];
        assert!(verify_billing_items(&expected, &[item(product, dec!(100)), item(product, dec!(40))]).is_ok());
        assert!(matches!(
            verify_billing_items(&expected, &[item(product, dec!(100))]),
            Err(PricingError::MissingBillingItem { .. })
        ));
    }
}
