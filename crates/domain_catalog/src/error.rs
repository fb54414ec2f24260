//! Catalog domain errors
//!
//! Lookup failures and master-data validation errors raised while building
//! or reading the catalog.

use chrono::NaiveDate;
use thiserror::Error;

use core_kernel::{
    BillingScheduleId, BillingSchedulePeriodId, DiscountId, MoneyError, ProductId, TaxId,
    TemporalError,
};

/// Errors that can occur in the catalog domain
#[derive(Debug, Error)]
pub enum CatalogError {
    /// Product is unknown
    #[error("Product not found: {0}")]
    ProductNotFound(ProductId),

    /// Product is not a package or has no package row
    #[error("Package not found for product {0}")]
    PackageNotFound(ProductId),

    /// Tax is unknown or archived
    #[error("Tax not found: {0}")]
    TaxNotFound(TaxId),

    /// Discount is unknown or archived
    #[error("Discount not found: {0}")]
    DiscountNotFound(DiscountId),

    /// Billing schedule is unknown or archived
    #[error("Billing schedule not found: {0}")]
    ScheduleNotFound(BillingScheduleId),

    /// Product definition is inconsistent
    #[error("Invalid product {product_id}: {reason}")]
    InvalidProduct {
        product_id: ProductId,
        reason: String,
    },

    /// Two periods of one schedule share days
    #[error("Billing periods {first} and {second} overlap")]
    OverlappingPeriods {
        first: BillingSchedulePeriodId,
        second: BillingSchedulePeriodId,
    },

    /// Ratio dates fall outside the owning period
    #[error("Billing ratio {start}..{end} lies outside period {period_id}")]
    RatioOutsidePeriod {
        period_id: BillingSchedulePeriodId,
        start: NaiveDate,
        end: NaiveDate,
    },

    /// No period ends on or after the requested start date
    #[error("Start date {date} is after the last period of billing schedule {schedule_id}")]
    StartDateAfterSchedule {
        schedule_id: BillingScheduleId,
        date: NaiveDate,
    },

    /// A mid-period start has no covering ratio
    #[error("No billing ratio covers {date} in period {period_id}")]
    RatioNotFound {
        period_id: BillingSchedulePeriodId,
        date: NaiveDate,
    },

    /// Unknown enum value read from storage or a request
    #[error("Unknown {kind} value: {value}")]
    UnknownValue {
        kind: &'static str,
        value: String,
    },

    #[error(transparent)]
    Money(#[from] MoneyError),

    #[error(transparent)]
    Temporal(#[from] TemporalError),
}

impl CatalogError {
    /// Creates an invalid product error
    pub fn invalid_product(product_id: ProductId, reason: impl Into<String>) -> Self {
        CatalogError::InvalidProduct {
            product_id,
            reason: reason.into(),
        }
    }

    pub(crate) fn unknown(kind: &'static str, value: impl Into<String>) -> Self {
        CatalogError::UnknownValue {
            kind,
            value: value.into(),
        }
    }

    /// Returns true for lookup failures
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            CatalogError::ProductNotFound(_)
                | CatalogError::PackageNotFound(_)
                | CatalogError::TaxNotFound(_)
                | CatalogError::DiscountNotFound(_)
                | CatalogError::ScheduleNotFound(_)
        )
    }
}
