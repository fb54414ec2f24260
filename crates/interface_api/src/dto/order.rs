//! Order DTOs
//!
//! Bodies are checked with `validator` for shape (non-empty order, positive
//! slots and versions, non-negative prices) before they become a domain
//! `CreateOrderRequest`. Business rules stay in the order service.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use core_kernel::{
    BillingSchedulePeriodId, CourseId, DiscountId, LocationId, OrderId, ProductId, StudentId,
    StudentProductId,
};
use domain_order::{
    BillItem, BillingItem, CourseItem, CreateOrderRequest, DiscountItem, LifecycleState, OrderItem,
    OrderType, StudentProduct, StudentProductView, TaxItem,
};

fn non_negative(value: &Decimal) -> Result<(), ValidationError> {
    if value.is_sign_negative() && !value.is_zero() {
        return Err(ValidationError::new("negative_amount"));
    }
    Ok(())
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateOrderBody {
    pub student_id: StudentId,
    pub location_id: LocationId,
    pub order_type: OrderType,
    #[validate(length(max = 2000, message = "Order comment is too long"))]
    pub order_comment: Option<String>,
    #[validate(length(min = 1, message = "At least one order item is required"), nested)]
    pub order_items: Vec<OrderItemBody>,
    #[serde(default)]
    #[validate(nested)]
    pub billing_items: Vec<BillingItemBody>,
    #[serde(default)]
    #[validate(nested)]
    pub upcoming_billing_items: Vec<BillingItemBody>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct OrderItemBody {
    pub product_id: ProductId,
    pub discount_id: Option<DiscountId>,
    pub start_date: Option<NaiveDate>,
    pub effective_date: Option<NaiveDate>,
    pub cancellation_date: Option<NaiveDate>,
    pub student_product_id: Option<StudentProductId>,
    #[validate(range(min = 1, message = "Versions start at 1"))]
    pub student_product_version: Option<i32>,
    #[serde(default)]
    #[validate(nested)]
    pub course_items: Vec<CourseItemBody>,
    pub package_associated_id: Option<ProductId>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CourseItemBody {
    pub course_id: CourseId,
    #[validate(length(min = 1, message = "Course name is required"))]
    pub course_name: String,
    #[validate(range(min = 1))]
    pub weight: Option<u32>,
    #[validate(range(min = 1))]
    pub slot: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct BillingItemBody {
    pub product_id: ProductId,
    pub billing_schedule_period_id: Option<BillingSchedulePeriodId>,
    #[validate(custom(function = "non_negative"))]
    pub price: Decimal,
    pub quantity: Option<u32>,
    pub tax_item: Option<TaxItem>,
    pub discount_item: Option<DiscountItem>,
    pub final_price: Decimal,
    pub adjustment_price: Option<Decimal>,
    #[serde(default)]
    pub is_cancel_bill_item: bool,
    pub package_associated_id: Option<ProductId>,
    #[serde(default)]
    #[validate(nested)]
    pub course_items: Vec<CourseItemBody>,
}

impl From<CourseItemBody> for CourseItem {
    fn from(body: CourseItemBody) -> Self {
        CourseItem {
            course_id: body.course_id,
            course_name: body.course_name,
            weight: body.weight,
            slot: body.slot,
        }
    }
}

impl From<OrderItemBody> for OrderItem {
    fn from(body: OrderItemBody) -> Self {
        OrderItem {
            product_id: body.product_id,
            discount_id: body.discount_id,
            start_date: body.start_date,
            effective_date: body.effective_date,
            cancellation_date: body.cancellation_date,
            student_product_id: body.student_product_id,
            student_product_version: body.student_product_version,
            course_items: body.course_items.into_iter().map(Into::into).collect(),
            package_associated_id: body.package_associated_id,
        }
    }
}

impl From<BillingItemBody> for BillingItem {
    fn from(body: BillingItemBody) -> Self {
        BillingItem {
            product_id: body.product_id,
            billing_schedule_period_id: body.billing_schedule_period_id,
            price: body.price,
            quantity: body.quantity,
            tax_item: body.tax_item,
            discount_item: body.discount_item,
            final_price: body.final_price,
            adjustment_price: body.adjustment_price,
            is_cancel_bill_item: body.is_cancel_bill_item,
            package_associated_id: body.package_associated_id,
            course_items: body.course_items.into_iter().map(Into::into).collect(),
        }
    }
}

impl From<CreateOrderBody> for CreateOrderRequest {
    fn from(body: CreateOrderBody) -> Self {
        CreateOrderRequest {
            student_id: body.student_id,
            location_id: body.location_id,
            order_type: body.order_type,
            order_comment: body.order_comment,
            order_items: body.order_items.into_iter().map(Into::into).collect(),
            billing_items: body.billing_items.into_iter().map(Into::into).collect(),
            upcoming_billing_items: body.upcoming_billing_items.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateOrderResponse {
    pub order_id: OrderId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StudentProductResponse {
    pub state: LifecycleState,
    pub student_product: StudentProduct,
    pub bill_items: Vec<BillItem>,
}

impl From<StudentProductView> for StudentProductResponse {
    fn from(view: StudentProductView) -> Self {
        Self {
            state: view.student_product.state(),
            student_product: view.student_product,
            bill_items: view.bill_items,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    fn body() -> CreateOrderBody {
        CreateOrderBody {
            student_id: StudentId::new(),
            location_id: LocationId::new(),
            order_type: OrderType::New,
            order_comment: None,
            order_items: vec![OrderItemBody {
                product_id: ProductId::new(),
                discount_id: None,
                start_date: NaiveDate::from_ymd_opt(2024, 1, 20),
                effective_date: None,
                cancellation_date: None,
                student_product_id: None,
                student_product_version: None,
                course_items: vec![],
                package_associated_id: None,
            }],
            billing_items: vec![],
            upcoming_billing_items: vec![],
        }
    }

    #[test]
    fn test_valid_body_passes() {
        assert!(body().validate().is_ok());
    }

    #[test]
    fn test_empty_order_rejected() {
        let mut empty = body();
        empty.order_items.clear();
        assert!(empty.validate().is_err());
    }

    #[test]
    fn test_nested_zero_slot_rejected() {
        let mut bad = body();
        bad.order_items[0].course_items.push(CourseItemBody {
            course_id: CourseId::new(),
            course_name: "Math".to_string(),
            weight: None,
            slot: Some(0),
        });
        assert!(bad.validate().is_err());
    }

    fn billing_item(product_id: ProductId, price: Decimal) -> BillingItemBody {
        BillingItemBody {
            product_id,
            billing_schedule_period_id: None,
            price,
            quantity: None,
            tax_item: None,
            discount_item: None,
            final_price: dec!(0),
            adjustment_price: None,
            is_cancel_bill_item: false,
            package_associated_id: None,
            course_items: vec![],
        }
    }

    #[test]
    fn test_negative_price_rejected() {
        let mut bad = body();
        let product_id = bad.order_items[0].product_id;
        bad.billing_items.push(billing_item(product_id, dec!(-1)));
        assert!(bad.validate().is_err());
    }

    proptest! {
        #[test]
        fn price_sign_decides_validation(cents in -1_000_000i64..1_000_000i64) {
            let mut candidate = body();
            let product_id = candidate.order_items[0].product_id;
            candidate.billing_items.push(billing_item(product_id, Decimal::new(cents, 2)));
            prop_assert_eq!(candidate.validate().is_ok(), cents >= 0);
        }
    }

    #[test]
    fn test_order_type_wire_name() {
        let json = serde_json::to_value(body()).unwrap();
        assert_eq!(json["order_type"], "NEW");
        let request = CreateOrderRequest::from(body());
        assert_eq!(request.order_items.len(), 1);
        assert!(request.is_server_priced());
    }
}
