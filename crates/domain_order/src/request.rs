//! Order request types
//!
//! A create-order request names the student, the order type, the order items
//! being bought or changed, and the billing items the client computed for
//! them. Billing items are split into those billed at order time and those
//! billed on a future billing date.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use core_kernel::{
    BillingSchedulePeriodId, CourseId, DiscountId, LocationId, ProductId, StudentId,
    StudentProductId, TaxId,
};
use domain_catalog::{DiscountAmount, DiscountType, TaxCategory};
use domain_pricing::{BillingAmounts, CourseQuantity};
use crate::error::OrderError;

/// Kind of order
///
/// Cancellation is an `Update` whose order item carries a cancellation date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderType {
    New,
    Update,
    Withdrawal,
    Graduate,
}

impl OrderType {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderType::New => "ORDER_TYPE_NEW",
            OrderType::Update => "ORDER_TYPE_UPDATE",
            OrderType::Withdrawal => "ORDER_TYPE_WITHDRAWAL",
            OrderType::Graduate => "ORDER_TYPE_GRADUATE",
        }
    }
}

impl FromStr for OrderType {
    type Err = OrderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ORDER_TYPE_NEW" => Ok(OrderType::New),
            "ORDER_TYPE_UPDATE" => Ok(OrderType::Update),
            "ORDER_TYPE_WITHDRAWAL" => Ok(OrderType::Withdrawal),
            "ORDER_TYPE_GRADUATE" => Ok(OrderType::Graduate),
            other => Err(OrderError::invalid_request(format!("unknown order type {other}"))),
        }
    }
}

/// A course chosen inside a package, with its slot or weight
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseItem {
    pub course_id: CourseId,
    pub course_name: String,
    /// Weight, for schedule-based and one-time packages
    pub weight: Option<u32>,
    /// Slot count, for slot-based and frequency-based packages
    pub slot: Option<u32>,
}

impl CourseItem {
    pub fn with_slot(course_id: CourseId, course_name: impl Into<String>, slot: u32) -> Self {
        Self {
            course_id,
            course_name: course_name.into(),
            weight: None,
            slot: Some(slot),
        }
    }

    pub fn with_weight(course_id: CourseId, course_name: impl Into<String>, weight: u32) -> Self {
        Self {
            course_id,
            course_name: course_name.into(),
            weight: Some(weight),
            slot: None,
        }
    }

    pub fn quantity(&self) -> CourseQuantity {
        CourseQuantity {
            weight: self.weight,
            slot: self.slot,
        }
    }
}

/// One product being ordered, updated or ended
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    pub product_id: ProductId,
    pub discount_id: Option<DiscountId>,
    pub start_date: Option<NaiveDate>,
    pub effective_date: Option<NaiveDate>,
    pub cancellation_date: Option<NaiveDate>,
    /// Existing student product being changed
    pub student_product_id: Option<StudentProductId>,
    /// Version of the student product the client last read
    pub student_product_version: Option<i32>,
    pub course_items: Vec<CourseItem>,
    /// Package this product is ordered as an add-on of
    pub package_associated_id: Option<ProductId>,
}

impl OrderItem {
    pub fn new(product_id: ProductId) -> Self {
        Self {
            product_id,
            ..Default::default()
        }
    }

    /// Returns true for an update that ends the student product
    pub fn is_cancellation(&self) -> bool {
        self.cancellation_date.is_some()
    }

    pub fn course_quantities(&self) -> impl Iterator<Item = CourseQuantity> + '_ {
        self.course_items.iter().map(CourseItem::quantity)
    }
}

/// Tax as shown on a billing item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxItem {
    pub tax_id: TaxId,
    pub tax_percentage: Decimal,
    pub tax_category: TaxCategory,
    pub tax_amount: Decimal,
}

/// Discount as shown on a billing item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscountItem {
    pub discount_id: DiscountId,
    pub discount_type: DiscountType,
    pub discount_amount_type: DiscountAmount,
    pub discount_amount: Decimal,
}

/// A client-computed billing line
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BillingItem {
    pub product_id: ProductId,
    pub billing_schedule_period_id: Option<BillingSchedulePeriodId>,
    pub price: Decimal,
    pub quantity: Option<u32>,
    pub tax_item: Option<TaxItem>,
    pub discount_item: Option<DiscountItem>,
    pub final_price: Decimal,
    pub adjustment_price: Option<Decimal>,
    pub is_cancel_bill_item: bool,
    pub package_associated_id: Option<ProductId>,
    pub course_items: Vec<CourseItem>,
}

impl BillingItem {
    pub fn new(product_id: ProductId, price: Decimal, final_price: Decimal) -> Self {
        Self {
            product_id,
            billing_schedule_period_id: None,
            price,
            quantity: None,
            tax_item: None,
            discount_item: None,
            final_price,
            adjustment_price: None,
            is_cancel_bill_item: false,
            package_associated_id: None,
            course_items: Vec::new(),
        }
    }

    pub fn amounts(&self) -> BillingAmounts {
        BillingAmounts {
            product_id: self.product_id,
            period_id: self.billing_schedule_period_id,
            price: self.price,
            discount_amount: self.discount_item.as_ref().map(|d| d.discount_amount),
            tax_amount: self.tax_item.as_ref().map(|t| t.tax_amount),
            final_price: self.final_price,
            adjustment_price: self.adjustment_price,
        }
    }
}

/// Request to create an order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateOrderRequest {
    pub student_id: StudentId,
    pub location_id: LocationId,
    pub order_type: OrderType,
    pub order_comment: Option<String>,
    pub order_items: Vec<OrderItem>,
    /// Items billed at order time
    pub billing_items: Vec<BillingItem>,
    /// Items billed on a later billing date
    pub upcoming_billing_items: Vec<BillingItem>,
}

impl CreateOrderRequest {
    pub fn new(student_id: StudentId, location_id: LocationId, order_type: OrderType) -> Self {
        Self {
            student_id,
            location_id,
            order_type,
            order_comment: None,
            order_items: Vec::new(),
            billing_items: Vec::new(),
            upcoming_billing_items: Vec::new(),
        }
    }

    /// True when the client left pricing to the server
    pub fn is_server_priced(&self) -> bool {
        self.billing_items.is_empty() && self.upcoming_billing_items.is_empty()
    }

    /// Submitted non-cancel billing items for a product
    pub fn billing_items_for<'a>(&'a self, product_id: &'a ProductId) -> impl Iterator<Item = &'a BillingItem> {
        self.billing_items
            .iter()
            .chain(self.upcoming_billing_items.iter())
            .filter(move |item| &item.product_id == product_id && !item.is_cancel_bill_item)
    }

    /// Checks the structural requirements of the request
    pub fn validate(&self) -> Result<(), OrderError> {
        if self.order_items.is_empty() {
            return Err(OrderError::invalid_request("order has no order items"));
        }
        for item in &self.order_items {
            match self.order_type {
                OrderType::New => {
                    if item.student_product_id.is_some() {
                        return Err(OrderError::invalid_request(format!(
                            "new order item for product {} must not reference a student product",
                            item.product_id
                        )));
                    }
                }
                OrderType::Update | OrderType::Withdrawal | OrderType::Graduate => {
                    if item.student_product_id.is_none() {
                        return Err(OrderError::invalid_request(format!(
                            "order item for product {} requires a student product",
                            item.product_id
                        )));
                    }
                    if item.effective_date.is_none() && item.cancellation_date.is_none() {
                        return Err(OrderError::invalid_request(format!(
                            "order item for product {} requires an effective date",
                            item.product_id
                        )));
                    }
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_new_order_rejects_student_product_reference() {
        let mut request = CreateOrderRequest::new(StudentId::new(), LocationId::new(), OrderType::New);
        let mut item = OrderItem::new(ProductId::new());
        item.student_product_id = Some(StudentProductId::new());
        request.order_items.push(item);
        assert!(matches!(request.validate(), Err(OrderError::InvalidRequest(_))));
    }

    #[test]
    fn test_update_requires_effective_date() {
        let mut request = CreateOrderRequest::new(StudentId::new(), LocationId::new(), OrderType::Update);
        let mut item = OrderItem::new(ProductId::new());
        item.student_product_id = Some(StudentProductId::new());
        request.order_items.push(item.clone());
        assert!(request.validate().is_err());

        item.cancellation_date = NaiveDate::from_ymd_opt(2024, 3, 1);
        request.order_items = vec![item];
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_billing_items_for_skips_cancel_items() {
        let product = ProductId::new();
        let mut request = CreateOrderRequest::new(StudentId::new(), LocationId::new(), OrderType::New);
        request.billing_items.push(BillingItem::new(product, dec!(10), dec!(10)));
        let mut cancel = BillingItem::new(product, dec!(10), dec!(10));
        cancel.is_cancel_bill_item = true;
        request.upcoming_billing_items.push(cancel);
        request.upcoming_billing_items.push(BillingItem::new(ProductId::new(), dec!(5), dec!(5)));

        assert_eq!(request.billing_items_for(&product).count(), 1);
        assert!(!request.is_server_priced());
    }

    #[test]
    fn test_order_type_storage_names() {
        for order_type in [OrderType::New, OrderType::Update, OrderType::Withdrawal, OrderType::Graduate] {
            assert_eq!(order_type.as_str().parse::<OrderType>().unwrap(), order_type);
        }
    }
}
