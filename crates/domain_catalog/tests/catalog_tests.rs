//! Tests for catalog lookups and billing schedule resolution

use chrono::NaiveDate;
use core_kernel::{BillingScheduleId, CourseId, DiscountId, Percentage, ProductId, Ratio, TaxId};
use domain_catalog::*;
use rust_decimal_macros::dec;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Four monthly periods, each with a half-month ratio for late starts
fn term_schedule(id: BillingScheduleId) -> BillingSchedule {
    let months = [(1, 31), (2, 29), (3, 31), (4, 30)];
    let periods = months
        .iter()
        .map(|(m, last)| {
            let start = date(2024, *m, 1);
            let end = date(2024, *m, *last);
            BillingSchedulePeriod::new(format!("2024-{m:02}"), start, end, start)
                .unwrap()
                .with_ratio(BillingRatio::new(start, date(2024, *m, 15), 1, 1).unwrap())
                .unwrap()
                .with_ratio(BillingRatio::new(date(2024, *m, 16), end, 1, 2).unwrap())
                .unwrap()
        })
        .collect();
    BillingSchedule::new(id, "Term 2024", periods).unwrap()
}

mod schedule_resolution_tests {
    use super::*;

    #[test]
    fn test_catalog_resolves_through_schedule() {
        let schedule_id = BillingScheduleId::new();
        let mut catalog = Catalog::new();
        catalog.insert_schedule(term_schedule(schedule_id));

        let resolved = catalog.resolve_periods(&schedule_id, date(2024, 2, 20)).unwrap();
        assert_eq!(resolved.len(), 3);
        assert_eq!(resolved[0].period.name, "2024-02");
        assert_eq!(resolved[0].ratio, Ratio::new(1, 2).unwrap());
        assert!(resolved[0].prorated);
    }

    #[test]
    fn test_first_half_ratio_is_full() {
        let schedule = term_schedule(BillingScheduleId::new());
        let resolved = schedule.resolve_periods(date(2024, 3, 10)).unwrap();
        assert_eq!(resolved[0].ratio, Ratio::FULL);
        assert!(!resolved[0].prorated);
    }

    #[test]
    fn test_archived_schedule_not_found() {
        let schedule_id = BillingScheduleId::new();
        let mut catalog = Catalog::new();
        catalog.insert_schedule(term_schedule(schedule_id).archived());

        let err = catalog.resolve_periods(&schedule_id, date(2024, 1, 1)).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_resolution_is_idempotent() {
        let schedule = term_schedule(BillingScheduleId::new());
        let first = schedule.resolve_periods(date(2024, 1, 20)).unwrap();
        let second = schedule.resolve_periods(date(2024, 1, 20)).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_periods_from_includes_containing_period() {
        let schedule = term_schedule(BillingScheduleId::new());
        let names: Vec<_> = schedule.periods_from(date(2024, 3, 31)).map(|p| p.name.clone()).collect();
        assert_eq!(names, vec!["2024-03", "2024-04"]);
    }
}

mod lookup_tests {
    use super::*;

    #[test]
    fn test_tax_lookup() {
        let tax_id = TaxId::new();
        let mut catalog = Catalog::new();
        catalog.insert_tax(Tax::new(tax_id, "VAT", Percentage::new(dec!(20)).unwrap(), TaxCategory::Inclusive));

        assert_eq!(catalog.tax(&tax_id).unwrap().category, TaxCategory::Inclusive);
        assert!(matches!(catalog.tax(&TaxId::new()), Err(CatalogError::TaxNotFound(_))));
    }

    #[test]
    fn test_discount_lookup() {
        let discount_id = DiscountId::new();
        let mut catalog = Catalog::new();
        catalog.insert_discount(Discount::new(
            discount_id,
            "Ten off",
            DiscountType::Regular,
            DiscountAmount::FixedAmount(dec!(10)),
        ));

        assert_eq!(catalog.discount(&discount_id).unwrap().amount.value(), dec!(10));
        assert!(catalog.discount(&DiscountId::new()).is_err());
    }

    #[test]
    fn test_package_lookup() {
        let product_id = ProductId::new();
        let course = CourseId::new();
        let mut catalog = Catalog::new();
        catalog.insert_product(Product::new(
            product_id,
            "Weekly lessons",
            ProductKind::Package(PackageType::SlotBased),
        ));
        catalog.insert_package(Package::new(product_id, 3).with_course(PackageCourse::new(course, 4, 1)));

        let package = catalog.package(&product_id).unwrap();
        assert_eq!(package.course(&course).unwrap().max_slots_per_course, 4);
        assert!(matches!(
            catalog.package(&ProductId::new()),
            Err(CatalogError::PackageNotFound(_))
        ));
    }

    #[test]
    fn test_merge_combines_snapshots() {
        let first_id = ProductId::new();
        let second_id = ProductId::new();
        let mut first = Catalog::new();
        first.insert_product(Product::new(first_id, "A", ProductKind::Fee(Cadence::OneTime)));
        first.insert_price(ProductPrice::new(first_id, dec!(10)));

        let mut second = Catalog::new();
        second.insert_product(Product::new(second_id, "B", ProductKind::Material(Cadence::OneTime)));
        second.insert_price(ProductPrice::new(second_id, dec!(20)));

        first.merge(second);
        assert!(first.product(&second_id).is_ok());
        assert_eq!(first.prices().len(), 2);
    }
}
