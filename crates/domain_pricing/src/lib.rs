//! Pricing Domain
//!
//! Turns an order item into priced bill lines:
//!
//! - **Price Calculator**: full-period base price from the catalog price table
//! - **Proration**: fraction of the first period charged on a late start
//! - **Discounts**: explicit or org-level tag discounts, applied before tax
//! - **Taxes**: inclusive or exclusive, six decimal places
//! - **Billing Calculator**: one line per billing period with Billed/Pending timing
//! - **Verification**: submitted billing items checked against computed lines
//!
//! All arithmetic is done on `rust_decimal::Decimal`. Only the final price of
//! a line is rounded to cents.

pub mod billing;
pub mod discount;
pub mod error;
pub mod price;
pub mod proration;
pub mod tax;
pub mod verify;

pub use billing::{
    adjustment_for_cancel, adjustment_for_update, BillLine, BillTiming, BillingCalculator,
    BillingRequest,
};
pub use discount::{apply_discount, DiscountLine, DiscountQuery, DiscountResolver};
pub use error::PricingError;
pub use price::{quantity_from_courses, CourseQuantity, PriceCalculator, PriceQuery};
pub use proration::{prorate, ProrationPolicy};
pub use tax::{compute_tax, TaxBreakdown, TaxLine};
pub use verify::{verify_billing_items, BillingAmounts};
