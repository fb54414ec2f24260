//! Property-Based Test Generators
//!
//! Provides proptest strategies for generating random test data
//! that maintains domain invariants.

use chrono::{Duration, NaiveDate};
use proptest::prelude::*;
use rust_decimal::Decimal;

use core_kernel::{CourseId, Percentage, Ratio};
use domain_catalog::{DiscountAmount, TaxCategory};
use domain_order::CourseItem;

/// Strategy for prices with two decimal places, 0.00 to 10,000.00
pub fn price_strategy() -> impl Strategy<Value = Decimal> {
    (0i64..1_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

/// Strategy for proration ratios no greater than one
pub fn ratio_strategy() -> impl Strategy<Value = Ratio> {
    (1u32..=31u32)
        .prop_flat_map(|den| (0u32..=den, Just(den)))
        .prop_filter_map("valid ratio", |(num, den)| Ratio::new(num, den).ok())
}

/// Strategy for percentages from 0% to 100% with two decimal places
pub fn percentage_strategy() -> impl Strategy<Value = Percentage> {
    (0i64..=10_000i64).prop_filter_map("valid percentage", |n| Percentage::new(Decimal::new(n, 2)).ok())
}

pub fn tax_category_strategy() -> impl Strategy<Value = TaxCategory> {
    prop_oneof![Just(TaxCategory::Inclusive), Just(TaxCategory::Exclusive)]
}

/// Strategy for discount amounts, fixed or percentage
pub fn discount_amount_strategy() -> impl Strategy<Value = DiscountAmount> {
    prop_oneof![
        (0i64..50_000i64).prop_map(|cents| DiscountAmount::FixedAmount(Decimal::new(cents, 2))),
        (0i64..=10_000i64).prop_map(|n| DiscountAmount::Percentage(Decimal::new(n, 2))),
    ]
}

/// Strategy for dates in 2024
pub fn date_2024_strategy() -> impl Strategy<Value = NaiveDate> {
    (0i64..366i64).prop_filter_map("date in 2024", |offset| {
        NaiveDate::from_ymd_opt(2024, 1, 1).map(|start| start + Duration::days(offset))
    })
}

/// Strategy for slot-based course selections with distinct courses
pub fn slot_courses_strategy(max_courses: usize, max_slot: u32) -> impl Strategy<Value = Vec<CourseItem>> {
    prop::collection::vec(1u32..=max_slot, 1..=max_courses).prop_map(|slots| {
        slots
            .into_iter()
            .enumerate()
            .map(|(i, slot)| CourseItem::with_slot(CourseId::new(), format!("Course {}", i + 1), slot))
            .collect()
    })
}

#[cfg(test)]
mod proptests {
    use super::*;
    use domain_catalog::QuantityType;
    use domain_pricing::{apply_discount, compute_tax, prorate, quantity_from_courses};

    proptest! {
        #[test]
        fn prorated_price_never_exceeds_base(price in price_strategy(), ratio in ratio_strategy()) {
            let prorated = prorate(price, ratio);
            prop_assert!(prorated <= price);
            prop_assert!(prorated >= Decimal::ZERO);
        }

        #[test]
        fn discount_never_exceeds_price(
            price in price_strategy(),
            amount in discount_amount_strategy(),
            ratio in ratio_strategy(),
        ) {
            let discount = apply_discount(price, &amount, ratio);
            prop_assert!(discount <= price);
            prop_assert!(discount >= Decimal::ZERO);
        }

        #[test]
        fn inclusive_tax_splits_price(price in price_strategy(), pct in percentage_strategy()) {
            let breakdown = compute_tax(price, pct, TaxCategory::Inclusive);
            let recombined = breakdown.net_amount + breakdown.tax_amount;
            prop_assert!((recombined - price).abs() <= Decimal::new(1, 5));
        }

        #[test]
        fn tax_is_never_negative(
            price in price_strategy(),
            pct in percentage_strategy(),
            category in tax_category_strategy(),
        ) {
            let breakdown = compute_tax(price, pct, category);
            prop_assert!(breakdown.tax_amount >= Decimal::ZERO);
            prop_assert!(breakdown.net_amount <= breakdown.gross_amount);
        }

        #[test]
        fn generated_dates_are_in_2024(date in date_2024_strategy()) {
            prop_assert_eq!(chrono::Datelike::year(&date), 2024);
        }

        #[test]
        fn slot_quantity_is_sum_of_slots(courses in slot_courses_strategy(3, 4)) {
            let expected: u32 = courses.iter().filter_map(|c| c.slot).sum();
            let quantity = quantity_from_courses(QuantityType::SlotPerWeek, courses.iter().map(CourseItem::quantity));
            prop_assert_eq!(quantity, expected);
        }
    }
}
