//! Test Data Builders
//!
//! Builders for catalogs, create-order requests, order items and billing
//! items. Tests set only the fields they care about.

use chrono::NaiveDate;
use rust_decimal::Decimal;

use core_kernel::{
    BillingScheduleId, BillingSchedulePeriodId, DiscountId, LocationId, Percentage, ProductId,
    StudentId, StudentProductId, TaxId,
};
use domain_catalog::{
    BillingRatio, BillingSchedule, BillingSchedulePeriod, Catalog, Discount, DiscountAmount,
    DiscountType, Package, Product, ProductPrice, Tax, TaxCategory,
};
use domain_order::{
    BillingItem, CourseItem, CreateOrderRequest, DiscountItem, OrderItem, OrderType, TaxItem,
};
use domain_pricing::{BillLine, BillTiming};

use crate::fixtures::DateFixtures;

/// Builder for catalog snapshots
#[derive(Debug, Default)]
pub struct CatalogBuilder {
    catalog: Catalog,
}

impl CatalogBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a monthly schedule over the given months
    ///
    /// Each period bills on its first day; the 1st to 15th prorate at 1/1 and
    /// the 16th to month end at 1/2.
    pub fn with_monthly_schedule(mut self, schedule_id: BillingScheduleId, months: &[(NaiveDate, NaiveDate)]) -> Self {
        let periods = months
            .iter()
            .map(|(start, end)| {
                let mid = *start + chrono::Duration::days(14);
                BillingSchedulePeriod::new(start.format("%b %Y").to_string(), *start, *end, *start)
                    .and_then(|p| p.with_ratio(BillingRatio::new(*start, mid, 1, 1)?))
                    .and_then(|p| p.with_ratio(BillingRatio::new(mid.succ_opt().unwrap_or(mid), *end, 1, 2)?))
                    .unwrap_or_else(|e| panic!("invalid fixture period: {e}"))
            })
            .collect();
        let schedule = BillingSchedule::new(schedule_id, "Monthly", periods)
            .unwrap_or_else(|e| panic!("invalid fixture schedule: {e}"));
        self.catalog.insert_schedule(schedule);
        self
    }

    pub fn with_tax(mut self, tax_id: TaxId, percentage: Decimal, category: TaxCategory) -> Self {
        let percentage = Percentage::new(percentage).unwrap_or_else(|e| panic!("invalid fixture tax: {e}"));
        self.catalog.insert_tax(Tax::new(tax_id, "Tax", percentage, category));
        self
    }

    /// Adds a product with a default price
    pub fn with_product(mut self, product: Product, price: Decimal) -> Self {
        self.catalog.insert_price(ProductPrice::new(product.id, price));
        self.catalog.insert_product(product);
        self
    }

    pub fn with_package(mut self, package: Package) -> Self {
        self.catalog.insert_package(package);
        self
    }

    pub fn with_price(mut self, price: ProductPrice) -> Self {
        self.catalog.insert_price(price);
        self
    }

    pub fn with_discount(mut self, discount_id: DiscountId, discount_type: DiscountType, amount: DiscountAmount) -> Self {
        self.catalog
            .insert_discount(Discount::new(discount_id, "Discount", discount_type, amount));
        self
    }

    /// Restricts a product to the discounts allowed this way
    pub fn allowing_discount(mut self, product_id: ProductId, discount_id: DiscountId) -> Self {
        self.catalog.allow_discount(product_id, discount_id);
        self
    }

    pub fn build(self) -> Catalog {
        self.catalog
    }
}

/// Builder for order items
#[derive(Debug, Clone)]
pub struct OrderItemBuilder {
    item: OrderItem,
}

impl OrderItemBuilder {
    pub fn new(product_id: ProductId) -> Self {
        Self {
            item: OrderItem::new(product_id),
        }
    }

    pub fn with_discount(mut self, discount_id: DiscountId) -> Self {
        self.item.discount_id = Some(discount_id);
        self
    }

    pub fn with_start_date(mut self, date: NaiveDate) -> Self {
        self.item.start_date = Some(date);
        self
    }

    pub fn with_effective_date(mut self, date: NaiveDate) -> Self {
        self.item.effective_date = Some(date);
        self
    }

    pub fn with_cancellation_date(mut self, date: NaiveDate) -> Self {
        self.item.cancellation_date = Some(date);
        self
    }

    /// References the student product being changed at the version last read
    pub fn for_student_product(mut self, id: StudentProductId, version: i32) -> Self {
        self.item.student_product_id = Some(id);
        self.item.student_product_version = Some(version);
        self
    }

    pub fn with_courses(mut self, courses: Vec<CourseItem>) -> Self {
        self.item.course_items = courses;
        self
    }

    pub fn build(self) -> OrderItem {
        self.item
    }
}

/// Builder for client-computed billing items
#[derive(Debug, Clone)]
pub struct BillingItemBuilder {
    item: BillingItem,
}

impl BillingItemBuilder {
    pub fn new(product_id: ProductId, price: Decimal, final_price: Decimal) -> Self {
        Self {
            item: BillingItem::new(product_id, price, final_price),
        }
    }

    /// Copies the amounts a client would display for a computed line
    pub fn from_line(line: &BillLine) -> Self {
        let mut item = BillingItem::new(line.product_id, line.price, line.final_price);
        item.billing_schedule_period_id = line.period_id;
        item.quantity = line.quantity;
        item.tax_item = line.tax.as_ref().map(|t| TaxItem {
            tax_id: t.tax_id,
            tax_percentage: t.percentage.value(),
            tax_category: t.category,
            tax_amount: t.tax_amount,
        });
        item.discount_item = line.discount.as_ref().map(|d| DiscountItem {
            discount_id: d.discount_id,
            discount_type: d.discount_type,
            discount_amount_type: d.amount,
            discount_amount: d.discount_amount,
        });
        Self { item }
    }

    pub fn for_period(mut self, period_id: BillingSchedulePeriodId) -> Self {
        self.item.billing_schedule_period_id = Some(period_id);
        self
    }

    pub fn with_quantity(mut self, quantity: u32) -> Self {
        self.item.quantity = Some(quantity);
        self
    }

    pub fn with_adjustment(mut self, adjustment: Decimal) -> Self {
        self.item.adjustment_price = Some(adjustment);
        self
    }

    pub fn with_courses(mut self, courses: Vec<CourseItem>) -> Self {
        self.item.course_items = courses;
        self
    }

    pub fn cancelled(mut self) -> Self {
        self.item.is_cancel_bill_item = true;
        self
    }

    pub fn build(self) -> BillingItem {
        self.item
    }
}

/// Builder for create-order requests
#[derive(Debug, Clone)]
pub struct CreateOrderRequestBuilder {
    request: CreateOrderRequest,
}

impl CreateOrderRequestBuilder {
    pub fn new(student_id: StudentId, location_id: LocationId, order_type: OrderType) -> Self {
        Self {
            request: CreateOrderRequest::new(student_id, location_id, order_type),
        }
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.request.order_comment = Some(comment.into());
        self
    }

    pub fn with_item(mut self, item: OrderItem) -> Self {
        self.request.order_items.push(item);
        self
    }

    pub fn with_billing_item(mut self, item: BillingItem) -> Self {
        self.request.billing_items.push(item);
        self
    }

    /// Adds computed lines, split by timing, carrying the given courses
    pub fn with_lines(mut self, lines: &[BillLine], courses: &[CourseItem]) -> Self {
        for line in lines {
            let item = BillingItemBuilder::from_line(line)
                .with_courses(courses.to_vec())
                .build();
            match line.timing {
                BillTiming::AtOrder => self.request.billing_items.push(item),
                BillTiming::Upcoming => self.request.upcoming_billing_items.push(item),
            }
        }
        self
    }

    pub fn build(self) -> CreateOrderRequest {
        self.request
    }
}

impl Default for CreateOrderRequestBuilder {
    fn default() -> Self {
        Self::new(StudentId::new(), LocationId::new(), OrderType::New)
    }
}

/// Date used by builders that need an order date and were not given one
pub fn default_order_date() -> NaiveDate {
    DateFixtures::late_january()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::TERM_MONTHS;
    use domain_catalog::{PackageType, ProductKind};
    use rust_decimal_macros::dec;

    #[test]
    fn test_catalog_builder_schedule_ratios() {
        let schedule_id = BillingScheduleId::new();
        let catalog = CatalogBuilder::new()
            .with_monthly_schedule(schedule_id, &TERM_MONTHS)
            .build();

        let schedule = catalog.schedule(&schedule_id).unwrap();
        assert_eq!(schedule.periods().len(), 3);
        assert_eq!(schedule.periods()[1].ratios.len(), 2);
    }

    #[test]
    fn test_catalog_builder_product_and_price() {
        let product_id = ProductId::new();
        let catalog = CatalogBuilder::new()
            .with_product(
                Product::new(product_id, "Lessons", ProductKind::Package(PackageType::OneTime)),
                dec!(300),
            )
            .build();

        assert!(catalog.product(&product_id).is_ok());
        assert_eq!(catalog.prices().by_product(&product_id).count(), 1);
    }

    #[test]
    fn test_request_builder() {
        let product_id = ProductId::new();
        let request = CreateOrderRequestBuilder::default()
            .with_comment("first order")
            .with_item(OrderItemBuilder::new(product_id).with_start_date(default_order_date()).build())
            .with_billing_item(BillingItemBuilder::new(product_id, dec!(10), dec!(10)).build())
            .build();

        assert_eq!(request.order_items.len(), 1);
        assert_eq!(request.billing_items_for(&product_id).count(), 1);
        assert!(!request.is_server_priced());
    }
}
