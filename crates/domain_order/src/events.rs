//! Domain events for the order lifecycle
//!
//! Events are published after the order transaction commits. Publication is
//! at-least-once and never blocks or fails the order.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use core_kernel::{DiscountId, LocationId, OrderId, ProductId, StudentId, StudentProductId};
use domain_catalog::{DiscountAmount, DiscountType};
use crate::error::OrderError;
use crate::request::OrderType;

/// Subject of the message that re-applies discounts to a student product
pub const SUBJECT_UPDATE_STUDENT_PRODUCT_CREATED: &str = "UpdateStudentProduct.Created";

/// Domain events emitted while processing orders
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderEvent {
    /// An order has been accepted and committed
    OrderCreated {
        order_id: OrderId,
        student_id: StudentId,
        location_id: LocationId,
        order_type: OrderType,
        timestamp: DateTime<Utc>,
    },

    /// A student product has been created by a new order or an update
    StudentProductCreated {
        order_id: OrderId,
        student_product_id: StudentProductId,
        student_id: StudentId,
        location_id: LocationId,
        product_id: ProductId,
        start_date: NaiveDate,
        discount_id: Option<DiscountId>,
        timestamp: DateTime<Utc>,
    },

    /// A student product has been replaced from an effective date
    StudentProductUpdated {
        order_id: OrderId,
        student_product_id: StudentProductId,
        replaced_by: StudentProductId,
        effective_date: NaiveDate,
        timestamp: DateTime<Utc>,
    },

    /// A student product has been cancelled
    StudentProductCancelled {
        order_id: OrderId,
        student_product_id: StudentProductId,
        cancellation_date: NaiveDate,
        refund: Decimal,
        timestamp: DateTime<Utc>,
    },

    /// A withdrawal has been scheduled
    StudentProductWithdrawn {
        order_id: OrderId,
        student_product_id: StudentProductId,
        effective_date: NaiveDate,
        refund: Decimal,
        timestamp: DateTime<Utc>,
    },

    /// A graduation has been scheduled
    StudentProductGraduated {
        order_id: OrderId,
        student_product_id: StudentProductId,
        effective_date: NaiveDate,
        refund: Decimal,
        timestamp: DateTime<Utc>,
    },
}

impl OrderEvent {
    pub fn order_id(&self) -> OrderId {
        match self {
            OrderEvent::OrderCreated { order_id, .. } => *order_id,
            OrderEvent::StudentProductCreated { order_id, .. } => *order_id,
            OrderEvent::StudentProductUpdated { order_id, .. } => *order_id,
            OrderEvent::StudentProductCancelled { order_id, .. } => *order_id,
            OrderEvent::StudentProductWithdrawn { order_id, .. } => *order_id,
            OrderEvent::StudentProductGraduated { order_id, .. } => *order_id,
        }
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            OrderEvent::OrderCreated { timestamp, .. } => *timestamp,
            OrderEvent::StudentProductCreated { timestamp, .. } => *timestamp,
            OrderEvent::StudentProductUpdated { timestamp, .. } => *timestamp,
            OrderEvent::StudentProductCancelled { timestamp, .. } => *timestamp,
            OrderEvent::StudentProductWithdrawn { timestamp, .. } => *timestamp,
            OrderEvent::StudentProductGraduated { timestamp, .. } => *timestamp,
        }
    }

    /// Returns the event type name
    pub fn event_type(&self) -> &'static str {
        match self {
            OrderEvent::OrderCreated { .. } => "OrderCreated",
            OrderEvent::StudentProductCreated { .. } => "StudentProductCreated",
            OrderEvent::StudentProductUpdated { .. } => "StudentProductUpdated",
            OrderEvent::StudentProductCancelled { .. } => "StudentProductCancelled",
            OrderEvent::StudentProductWithdrawn { .. } => "StudentProductWithdrawn",
            OrderEvent::StudentProductGraduated { .. } => "StudentProductGraduated",
        }
    }

    /// Subject the event is published on
    pub fn subject(&self) -> String {
        format!("Order.{}", self.event_type())
    }
}

/// Message asking for a discount change on an existing student product
///
/// Produced when an org-level discount tag changes for a student, consumed by
/// [`DiscountSyncHandler`](crate::discount_sync::DiscountSyncHandler).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProductDiscount {
    pub student_id: StudentId,
    pub location_id: LocationId,
    pub product_id: ProductId,
    pub student_product_id: StudentProductId,
    pub effective_date: NaiveDate,
    /// New discount; none removes the current one
    pub discount_id: Option<DiscountId>,
    pub discount_type: Option<DiscountType>,
    pub discount_amount_type: Option<String>,
    pub discount_amount_value: Option<Decimal>,
}

impl UpdateProductDiscount {
    pub fn from_json(payload: &[u8]) -> Result<Self, OrderError> {
        serde_json::from_slice(payload)
            .map_err(|e| OrderError::invalid_request(format!("malformed discount message: {e}")))
    }

    pub fn to_json(&self) -> Result<Vec<u8>, OrderError> {
        serde_json::to_vec(self).map_err(|e| OrderError::storage(e.to_string()))
    }

    /// Discount amount carried by the message, when both parts are present
    pub fn discount_amount(&self) -> Option<DiscountAmount> {
        match (&self.discount_amount_type, self.discount_amount_value) {
            (Some(kind), Some(value)) => DiscountAmount::from_parts(kind, value).ok(),
            _ => None,
        }
    }
}
