//! Named Test Scenarios
//!
//! Each scenario is a small, fully priced catalog plus the ids a test needs
//! to place orders against it. `OrderHarness` wires an `OrderService` to the
//! in-memory store with a recording publisher and a fixed clock.

use chrono::NaiveDate;
use rust_decimal_macros::dec;
use std::sync::Arc;

use core_kernel::{
    BillingScheduleId, CourseId, DiscountId, FixedClock, LocationId, ProductId, StudentId, TaxId,
};
use domain_catalog::{
    Cadence, Catalog, DiscountAmount, DiscountType, Package, PackageCourse, PackageType, Product,
    ProductKind, TaxCategory,
};
use domain_order::adapters::{InMemoryOrderStore, RecordingPublisher};
use domain_order::{CourseItem, CreateOrderRequest, OrderService, OrderType, StudentProduct, StudentProductLabel};
use domain_pricing::{BillLine, BillingCalculator, BillingRequest};

use crate::builders::{CatalogBuilder, CreateOrderRequestBuilder, OrderItemBuilder};
use crate::fixtures::{NameFixtures, TERM_MONTHS};

/// A frequency-based package and a one-time registration fee
///
/// - package: 100 per weekly slot, at most 2 courses, billed monthly from
///   January to March 2024 with 1/1 and 1/2 ratios
/// - math (mandatory, up to 3 slots) and art (up to 2 slots)
/// - 20% inclusive tax on the package
/// - a fixed 10 regular discount
/// - fee: 50, one-time, untaxed
#[derive(Debug, Clone)]
pub struct PackageScenario {
    pub catalog: Catalog,
    pub schedule_id: BillingScheduleId,
    pub tax_id: TaxId,
    pub package_id: ProductId,
    pub fee_id: ProductId,
    pub discount_id: DiscountId,
    pub math: CourseId,
    pub art: CourseId,
    pub student_id: StudentId,
    pub location_id: LocationId,
}

impl PackageScenario {
    pub fn frequency_package() -> Self {
        let schedule_id = BillingScheduleId::new();
        let tax_id = TaxId::new();
        let package_id = ProductId::new();
        let fee_id = ProductId::new();
        let discount_id = DiscountId::new();
        let math = CourseId::new();
        let art = CourseId::new();

        let catalog = CatalogBuilder::new()
            .with_monthly_schedule(schedule_id, &TERM_MONTHS)
            .with_tax(tax_id, dec!(20), TaxCategory::Inclusive)
            .with_product(
                Product::new(
                    package_id,
                    NameFixtures::product_name(),
                    ProductKind::Package(PackageType::FrequencyBased),
                )
                .with_tax(tax_id)
                .with_billing_schedule(schedule_id),
                dec!(100),
            )
            .with_package(
                Package::new(package_id, 5)
                    .with_course(PackageCourse::new(math, 3, 1).mandatory())
                    .with_course(PackageCourse::new(art, 2, 1)),
            )
            .with_product(
                Product::new(fee_id, "Registration fee", ProductKind::Fee(Cadence::OneTime)),
                dec!(50),
            )
            .with_discount(discount_id, DiscountType::Regular, DiscountAmount::FixedAmount(dec!(10)))
            .build();

        Self {
            catalog,
            schedule_id,
            tax_id,
            package_id,
            fee_id,
            discount_id,
            math,
            art,
            student_id: StudentId::new(),
            location_id: LocationId::new(),
        }
    }

    /// Math at 2 slots and art at 1, three slots in total
    pub fn courses(&self) -> Vec<CourseItem> {
        vec![
            CourseItem::with_slot(self.math, "Math", 2),
            CourseItem::with_slot(self.art, "Art", 1),
        ]
    }

    /// Lines the billing calculator produces for the package
    pub fn package_lines(&self, order_date: NaiveDate, start: NaiveDate, discounted: bool) -> Vec<BillLine> {
        let mut request = BillingRequest::new(self.package_id, order_date, start).with_quantity(3);
        if discounted {
            if let Ok(discount) = self.catalog.discount(&self.discount_id) {
                request = request.with_discount(discount.clone());
            }
        }
        BillingCalculator::new(&self.catalog)
            .compute(&request)
            .unwrap_or_else(|e| panic!("scenario lines failed to price: {e}"))
    }

    /// A new discounted package order with the client's billing items
    pub fn new_package_order(&self, order_date: NaiveDate, start: NaiveDate) -> CreateOrderRequest {
        let lines = self.package_lines(order_date, start, true);
        CreateOrderRequestBuilder::new(self.student_id, self.location_id, OrderType::New)
            .with_item(
                OrderItemBuilder::new(self.package_id)
                    .with_discount(self.discount_id)
                    .with_start_date(start)
                    .with_courses(self.courses())
                    .build(),
            )
            .with_lines(&lines, &self.courses())
            .build()
    }

    /// A new order for the fee left to server pricing
    pub fn new_fee_order(&self, start: NaiveDate) -> CreateOrderRequest {
        CreateOrderRequestBuilder::new(self.student_id, self.location_id, OrderType::New)
            .with_item(OrderItemBuilder::new(self.fee_id).with_start_date(start).build())
            .build()
    }
}

/// Order service over the in-memory store
pub struct OrderHarness {
    pub store: Arc<InMemoryOrderStore>,
    pub publisher: Arc<RecordingPublisher>,
    pub service: OrderService<InMemoryOrderStore>,
}

impl OrderHarness {
    pub fn new(catalog: Catalog, today: NaiveDate) -> Self {
        Self::with_publisher(catalog, today, RecordingPublisher::new())
    }

    pub fn with_publisher(catalog: Catalog, today: NaiveDate, publisher: RecordingPublisher) -> Self {
        let store = Arc::new(InMemoryOrderStore::new(catalog));
        let publisher = Arc::new(publisher);
        let service = OrderService::new(store.clone(), publisher.clone(), Arc::new(FixedClock(today)));
        Self {
            store,
            publisher,
            service,
        }
    }

    /// Student products in the store with the given label
    pub async fn student_products_labelled(&self, label: StudentProductLabel) -> Vec<StudentProduct> {
        self.store
            .snapshot()
            .await
            .student_products
            .into_values()
            .filter(|sp| sp.label == label)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::DateFixtures;

    #[test]
    fn test_package_lines_match_known_proration() {
        let scenario = PackageScenario::frequency_package();
        let start = DateFixtures::late_january();
        let lines = scenario.package_lines(start, start, false);

        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0].final_price, dec!(150));
        assert_eq!(lines[1].final_price, dec!(300));
    }

    #[test]
    fn test_new_package_order_splits_billing_items() {
        let scenario = PackageScenario::frequency_package();
        let start = DateFixtures::late_january();
        let request = scenario.new_package_order(start, start);

        assert_eq!(request.billing_items.len(), 1);
        assert_eq!(request.upcoming_billing_items.len(), 2);
        assert_eq!(request.billing_items[0].final_price, dec!(145));
    }

    #[tokio::test]
    async fn test_harness_places_order() {
        let scenario = PackageScenario::frequency_package();
        let start = DateFixtures::late_january();
        let harness = OrderHarness::new(scenario.catalog.clone(), start);

        harness.service.create_order(scenario.new_package_order(start, start)).await.unwrap();

        let created = harness.student_products_labelled(StudentProductLabel::Created).await;
        assert_eq!(created.len(), 1);
        assert_eq!(created[0].quantity, Some(3));
    }
}
