//! Core Kernel - Foundational types and utilities for the order pricing engine
//!
//! This crate provides the fundamental building blocks used across all domain modules:
//! - Strongly-typed identifiers for catalog, order and billing entities
//! - Decimal helpers for ratios, percentages and price rounding
//! - Timezone-aware dates and a pluggable clock

pub mod money;
pub mod temporal;
pub mod identifiers;

pub use money::{
    Ratio, Percentage, MoneyError,
    round_final_price, round_tax_amount, amounts_match, AMOUNT_TOLERANCE,
};
pub use temporal::{Timezone, Clock, OrgClock, FixedClock, DateRange, TemporalError};
pub use identifiers::{
    ProductId, StudentId, LocationId, DiscountId, TaxId,
    BillingScheduleId, BillingSchedulePeriodId, BillingRatioId, CourseId,
    OrderId, StudentProductId, BillItemId, StudentPackageId,
};
