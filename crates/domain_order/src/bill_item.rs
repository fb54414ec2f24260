//! Persisted bill items
//!
//! One bill item is written per student product and billing period (or a
//! single item for a one-time product). Items whose billing date has passed
//! at order time are `Billed`; the rest stay `Pending` until their billing
//! date.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use core_kernel::{
    BillItemId, BillingSchedulePeriodId, DiscountId, LocationId, OrderId, ProductId, Ratio,
    StudentId, StudentProductId, TaxId,
};
use domain_catalog::TaxCategory;
use domain_pricing::{adjustment_for_cancel, BillLine, BillTiming, BillingAmounts};
use crate::error::OrderError;
use crate::student_product::StudentProduct;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BillStatus {
    Pending,
    Billed,
}

impl BillStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BillStatus::Pending => "PENDING",
            BillStatus::Billed => "BILLED",
        }
    }
}

impl FromStr for BillStatus {
    type Err = OrderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(BillStatus::Pending),
            "BILLED" => Ok(BillStatus::Billed),
            other => Err(OrderError::storage(format!("unknown bill status {other}"))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BillType {
    BilledAtOrder,
    UpcomingBilling,
}

impl BillType {
    pub fn as_str(&self) -> &'static str {
        match self {
            BillType::BilledAtOrder => "BILLED_AT_ORDER",
            BillType::UpcomingBilling => "UPCOMING_BILLING",
        }
    }
}

impl FromStr for BillType {
    type Err = OrderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "BILLED_AT_ORDER" => Ok(BillType::BilledAtOrder),
            "UPCOMING_BILLING" => Ok(BillType::UpcomingBilling),
            other => Err(OrderError::storage(format!("unknown bill type {other}"))),
        }
    }
}

/// Status and type of an item billed with the given timing
pub fn classify(timing: BillTiming) -> (BillStatus, BillType) {
    match timing {
        BillTiming::AtOrder => (BillStatus::Billed, BillType::BilledAtOrder),
        BillTiming::Upcoming => (BillStatus::Pending, BillType::UpcomingBilling),
    }
}

/// A bill item row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BillItem {
    pub id: BillItemId,
    pub order_id: OrderId,
    pub student_product_id: StudentProductId,
    pub student_id: StudentId,
    pub location_id: LocationId,
    pub product_id: ProductId,
    pub billing_schedule_period_id: Option<BillingSchedulePeriodId>,
    pub billing_date: NaiveDate,
    pub billing_from: Option<NaiveDate>,
    pub billing_to: Option<NaiveDate>,
    pub quantity: Option<u32>,
    pub ratio: Ratio,
    pub price: Decimal,
    pub discount_id: Option<DiscountId>,
    pub discount_amount: Option<Decimal>,
    pub tax_id: Option<TaxId>,
    pub tax_percentage: Option<Decimal>,
    pub tax_category: Option<TaxCategory>,
    pub tax_amount: Option<Decimal>,
    pub final_price: Decimal,
    /// Signed delta against the item this one replaces or cancels
    pub adjustment_price: Option<Decimal>,
    pub is_cancel_bill_item: bool,
    pub status: BillStatus,
    pub bill_type: BillType,
    pub package_associated_id: Option<ProductId>,
    /// Item of the previous student product for the same period
    pub previous_bill_item_id: Option<BillItemId>,
    pub created_at: DateTime<Utc>,
}

impl BillItem {
    /// Creates a bill item from a priced line
    pub fn from_line(order_id: OrderId, student_product: &StudentProduct, line: &BillLine) -> Self {
        let (status, bill_type) = classify(line.timing);
        Self {
            id: BillItemId::new_v7(),
            order_id,
            student_product_id: student_product.id,
            student_id: student_product.student_id,
            location_id: student_product.location_id,
            product_id: line.product_id,
            billing_schedule_period_id: line.period_id,
            billing_date: line.billing_date,
            billing_from: line.period_start,
            billing_to: line.period_end,
            quantity: line.quantity,
            ratio: line.ratio,
            price: line.price,
            discount_id: line.discount.as_ref().map(|d| d.discount_id),
            discount_amount: line.discount.as_ref().map(|d| d.discount_amount),
            tax_id: line.tax.as_ref().map(|t| t.tax_id),
            tax_percentage: line.tax.as_ref().map(|t| t.percentage.value()),
            tax_category: line.tax.as_ref().map(|t| t.category),
            tax_amount: line.tax.as_ref().map(|t| t.tax_amount),
            final_price: line.final_price,
            adjustment_price: None,
            is_cancel_bill_item: false,
            status,
            bill_type,
            package_associated_id: None,
            previous_bill_item_id: None,
            created_at: Utc::now(),
        }
    }

    pub fn with_adjustment(mut self, adjustment_price: Decimal, previous: Option<BillItemId>) -> Self {
        self.adjustment_price = Some(adjustment_price);
        self.previous_bill_item_id = previous;
        self
    }

    pub fn with_package(mut self, package_id: Option<ProductId>) -> Self {
        self.package_associated_id = package_id;
        self
    }

    /// Returns true when the item's period ends on or after the date
    ///
    /// One-time items have no period and always qualify.
    pub fn ends_on_or_after(&self, date: NaiveDate) -> bool {
        self.billing_to.map_or(true, |end| end >= date)
    }

    /// Returns true when the item's period starts on or after the date
    pub fn starts_on_or_after(&self, date: NaiveDate) -> bool {
        self.billing_from.unwrap_or(self.billing_date) >= date
    }

    /// Final price of the whole period, undoing the item's own proration
    ///
    /// A zero-ratio item charged nothing, so its final price is returned as is.
    pub fn full_period_final(&self) -> Decimal {
        if self.ratio.is_full() || self.ratio.numerator() == 0 {
            return self.final_price;
        }
        self.final_price * Decimal::from(self.ratio.denominator()) / Decimal::from(self.ratio.numerator())
    }

    /// Flags the item as cancelled and records the refund as an adjustment
    pub fn cancel(&mut self) {
        self.is_cancel_bill_item = true;
        self.adjustment_price = Some(adjustment_for_cancel(self.final_price));
    }

    pub fn amounts(&self) -> BillingAmounts {
        BillingAmounts {
            product_id: self.product_id,
            period_id: self.billing_schedule_period_id,
            price: self.price,
            discount_amount: self.discount_amount,
            tax_amount: self.tax_amount,
            final_price: self.final_price,
            adjustment_price: self.adjustment_price,
        }
    }
}
