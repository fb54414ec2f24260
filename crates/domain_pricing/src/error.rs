//! Pricing errors
//!
//! Calculation failures and the mismatches reported when client-submitted
//! billing items disagree with the computed ones. Every variant names the
//! offending product so callers can match on the message.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use thiserror::Error;

use core_kernel::{BillingSchedulePeriodId, DiscountId, MoneyError, ProductId, StudentId};
use domain_catalog::CatalogError;

/// Errors that can occur while pricing an order
#[derive(Debug, Error)]
pub enum PricingError {
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Money(#[from] MoneyError),

    /// No price row for the product
    #[error("No price found for product {product_id}")]
    NoPriceFound { product_id: ProductId },

    /// Product priced per quantity has no row for this quantity
    #[error("No price for quantity {quantity} of product {product_id}")]
    NoPriceForQuantity { product_id: ProductId, quantity: u32 },

    /// Package order carries no quantity
    #[error("Quantity is required for package {product_id}")]
    MissingQuantity { product_id: ProductId },

    #[error("Discount {discount_id} is not available on {date}")]
    DiscountNotAvailable { discount_id: DiscountId, date: NaiveDate },

    #[error("Discount {discount_id} cannot be applied to product {product_id}")]
    DiscountNotApplicable { discount_id: DiscountId, product_id: ProductId },

    #[error("Student {student_id} has more than one active discount tag")]
    MultipleDiscountTags { student_id: StudentId },

    #[error("Missing billing item for product {product_id}")]
    MissingBillingItem {
        product_id: ProductId,
        period_id: Option<BillingSchedulePeriodId>,
    },

    #[error("Unexpected billing item for product {product_id}")]
    UnexpectedBillingItem {
        product_id: ProductId,
        period_id: Option<BillingSchedulePeriodId>,
    },

    #[error("Incorrect price for product {product_id}: expected {expected}, got {actual}")]
    IncorrectProductPrice { product_id: ProductId, expected: Decimal, actual: Decimal },

    #[error("Incorrect discount amount for product {product_id}: expected {expected}, got {actual}")]
    IncorrectDiscountAmount { product_id: ProductId, expected: Decimal, actual: Decimal },

    #[error("Incorrect tax amount for product {product_id}: expected {expected}, got {actual}")]
    IncorrectTaxAmount { product_id: ProductId, expected: Decimal, actual: Decimal },

    #[error("Incorrect final price for product {product_id}: expected {expected}, got {actual}")]
    IncorrectFinalPrice { product_id: ProductId, expected: Decimal, actual: Decimal },

    #[error("Missing adjustment price for product {product_id}")]
    MissingAdjustmentPrice { product_id: ProductId },

    #[error("Incorrect adjustment price for product {product_id}: expected {expected}, got {actual}")]
    IncorrectAdjustmentPrice { product_id: ProductId, expected: Decimal, actual: Decimal },
}

impl PricingError {
    /// Returns true for mismatches between submitted and computed items
    pub fn is_verification_failure(&self) -> bool {
        matches!(
            self,
            PricingError::MissingBillingItem { .. }
                | PricingError::UnexpectedBillingItem { .. }
                | PricingError::IncorrectProductPrice { .. }
                | PricingError::IncorrectDiscountAmount { .. }
                | PricingError::IncorrectTaxAmount { .. }
                | PricingError::IncorrectFinalPrice { .. }
                | PricingError::MissingAdjustmentPrice { .. }
                | PricingError::IncorrectAdjustmentPrice { .. }
        )
    }
}
