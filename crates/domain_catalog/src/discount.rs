//! Discounts and org-level discount tags
//!
//! Regular discounts are chosen explicitly on an order item. Org-level
//! discounts (single parent, family, employee) are instead granted through a
//! [`UserDiscountTag`] attached to the student at a location.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use core_kernel::{DiscountId, LocationId, StudentId};
use crate::error::CatalogError;

/// Kind of discount
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DiscountType {
    Regular,
    SingleParent,
    Family,
    EmployeeFullTime,
    EmployeeSlotBased,
}

impl DiscountType {
    /// Org-level discounts are granted through discount tags
    pub fn is_org_level(&self) -> bool {
        !matches!(self, DiscountType::Regular)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DiscountType::Regular => "DISCOUNT_TYPE_REGULAR",
            DiscountType::SingleParent => "DISCOUNT_TYPE_SINGLE_PARENT",
            DiscountType::Family => "DISCOUNT_TYPE_FAMILY",
            DiscountType::EmployeeFullTime => "DISCOUNT_TYPE_EMPLOYEE_FULL_TIME",
            DiscountType::EmployeeSlotBased => "DISCOUNT_TYPE_EMPLOYEE_PART_TIME",
        }
    }
}

impl FromStr for DiscountType {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "DISCOUNT_TYPE_REGULAR" => Ok(DiscountType::Regular),
            "DISCOUNT_TYPE_SINGLE_PARENT" => Ok(DiscountType::SingleParent),
            "DISCOUNT_TYPE_FAMILY" => Ok(DiscountType::Family),
            "DISCOUNT_TYPE_EMPLOYEE_FULL_TIME" => Ok(DiscountType::EmployeeFullTime),
            "DISCOUNT_TYPE_EMPLOYEE_PART_TIME" => Ok(DiscountType::EmployeeSlotBased),
            other => Err(CatalogError::unknown("discount type", other)),
        }
    }
}

/// Amount of a discount
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "amount_type", content = "value", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DiscountAmount {
    /// Fixed currency amount per full period
    FixedAmount(Decimal),
    /// Percentage of the price
    Percentage(Decimal),
}

impl DiscountAmount {
    pub fn value(&self) -> Decimal {
        match self {
            DiscountAmount::FixedAmount(v) | DiscountAmount::Percentage(v) => *v,
        }
    }

    pub fn amount_type_str(&self) -> &'static str {
        match self {
            DiscountAmount::FixedAmount(_) => "DISCOUNT_AMOUNT_TYPE_FIXED_AMOUNT",
            DiscountAmount::Percentage(_) => "DISCOUNT_AMOUNT_TYPE_PERCENTAGE",
        }
    }

    /// Rebuilds an amount from its storage columns
    pub fn from_parts(amount_type: &str, value: Decimal) -> Result<Self, CatalogError> {
        match amount_type {
            "DISCOUNT_AMOUNT_TYPE_FIXED_AMOUNT" => Ok(DiscountAmount::FixedAmount(value)),
            "DISCOUNT_AMOUNT_TYPE_PERCENTAGE" => Ok(DiscountAmount::Percentage(value)),
            other => Err(CatalogError::unknown("discount amount type", other)),
        }
    }
}

/// A discount definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Discount {
    pub id: DiscountId,
    pub name: String,
    pub discount_type: DiscountType,
    pub amount: DiscountAmount,
    pub available_from: Option<NaiveDate>,
    pub available_until: Option<NaiveDate>,
    pub is_archived: bool,
}

impl Discount {
    pub fn new(id: DiscountId, name: impl Into<String>, discount_type: DiscountType, amount: DiscountAmount) -> Self {
        Self {
            id,
            name: name.into(),
            discount_type,
            amount,
            available_from: None,
            available_until: None,
            is_archived: false,
        }
    }

    pub fn with_availability(mut self, from: NaiveDate, until: NaiveDate) -> Self {
        self.available_from = Some(from);
        self.available_until = Some(until);
        self
    }

    /// Returns true if the discount can be applied on the given date
    pub fn is_available_on(&self, date: NaiveDate) -> bool {
        !self.is_archived
            && self.available_from.map_or(true, |from| date >= from)
            && self.available_until.map_or(true, |until| date <= until)
    }
}

/// Grants an org-level discount to a student at a location
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserDiscountTag {
    pub student_id: StudentId,
    pub location_id: LocationId,
    pub discount_type: DiscountType,
    pub discount_id: DiscountId,
    pub valid_from: NaiveDate,
    pub valid_until: Option<NaiveDate>,
}

impl UserDiscountTag {
    pub fn is_active_on(&self, date: NaiveDate) -> bool {
        date >= self.valid_from && self.valid_until.map_or(true, |until| date <= until)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_org_level_types() {
        assert!(!DiscountType::Regular.is_org_level());
        assert!(DiscountType::Family.is_org_level());
        assert!(DiscountType::EmployeeSlotBased.is_org_level());
    }

    #[test]
    fn test_availability_window() {
        let discount = Discount::new(DiscountId::new(), "Spring", DiscountType::Regular, DiscountAmount::Percentage(dec!(10)))
            .with_availability(date(2024, 3, 1), date(2024, 5, 31));
        assert!(discount.is_available_on(date(2024, 3, 1)));
        assert!(discount.is_available_on(date(2024, 5, 31)));
        assert!(!discount.is_available_on(date(2024, 6, 1)));
    }

    #[test]
    fn test_archived_discount_unavailable() {
        let mut discount = Discount::new(DiscountId::new(), "Old", DiscountType::Regular, DiscountAmount::FixedAmount(dec!(5)));
        discount.is_archived = true;
        assert!(!discount.is_available_on(date(2024, 1, 1)));
    }

    #[test]
    fn test_tag_open_ended() {
        let tag = UserDiscountTag {
            student_id: StudentId::new(),
            location_id: LocationId::new(),
            discount_type: DiscountType::SingleParent,
            discount_id: DiscountId::new(),
            valid_from: date(2024, 1, 1),
            valid_until: None,
        };
        assert!(tag.is_active_on(date(2030, 1, 1)));
        assert!(!tag.is_active_on(date(2023, 12, 31)));
    }

    #[test]
    fn test_amount_storage_parts() {
        let amount = DiscountAmount::from_parts("DISCOUNT_AMOUNT_TYPE_FIXED_AMOUNT", dec!(10)).unwrap();
        assert_eq!(amount, DiscountAmount::FixedAmount(dec!(10)));
        assert!(DiscountAmount::from_parts("NOPE", dec!(1)).is_err());
    }
}
