//! Catalog price rows
//!
//! A product can carry several price rows: a plain row, rows per billing
//! period, rows per quantity for packages, and separate rows for students
//! enrolled in the organization.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use core_kernel::{BillingSchedulePeriodId, ProductId};
use crate::error::CatalogError;

/// Which audience a price row targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PriceType {
    #[default]
    Default,
    /// Price for students enrolled in the organization
    Enrolled,
}

impl PriceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PriceType::Default => "DEFAULT_PRICE",
            PriceType::Enrolled => "ENROLLED_PRICE",
        }
    }
}

impl FromStr for PriceType {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "DEFAULT_PRICE" => Ok(PriceType::Default),
            "ENROLLED_PRICE" => Ok(PriceType::Enrolled),
            other => Err(CatalogError::unknown("price type", other)),
        }
    }
}

/// One row of the product price table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductPrice {
    pub product_id: ProductId,
    pub billing_schedule_period_id: Option<BillingSchedulePeriodId>,
    pub quantity: Option<u32>,
    pub price_type: PriceType,
    pub price: Decimal,
}

impl ProductPrice {
    /// Creates a plain default price row
    pub fn new(product_id: ProductId, price: Decimal) -> Self {
        Self {
            product_id,
            billing_schedule_period_id: None,
            quantity: None,
            price_type: PriceType::Default,
            price,
        }
    }

    pub fn for_period(mut self, period_id: BillingSchedulePeriodId) -> Self {
        self.billing_schedule_period_id = Some(period_id);
        self
    }

    pub fn for_quantity(mut self, quantity: u32) -> Self {
        self.quantity = Some(quantity);
        self
    }

    pub fn enrolled(mut self) -> Self {
        self.price_type = PriceType::Enrolled;
        self
    }
}

/// All price rows known to a catalog snapshot
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PriceTable {
    rows: Vec<ProductPrice>,
}

impl PriceTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, row: ProductPrice) {
        self.rows.push(row);
    }

    /// Every row in insertion order
    pub fn by_all(&self) -> impl Iterator<Item = &ProductPrice> {
        self.rows.iter()
    }

    pub fn by_product<'a, 'b>(&'a self, product_id: &'b ProductId) -> impl Iterator<Item = &'a ProductPrice> + use<'a, 'b> {
        self.rows.iter().filter(move |r| &r.product_id == product_id)
    }

    /// Rows for a product and quantity
    pub fn by_quantity<'a>(&'a self, product_id: &'a ProductId, quantity: u32) -> impl Iterator<Item = &'a ProductPrice> {
        self.by_product(product_id).filter(move |r| r.quantity == Some(quantity))
    }

    /// True when the product is priced per quantity
    pub fn has_quantity_rows(&self, product_id: &ProductId) -> bool {
        self.by_product(product_id).any(|r| r.quantity.is_some())
    }

    /// Exact match on every key
    pub fn find(
        &self,
        product_id: &ProductId,
        period_id: Option<&BillingSchedulePeriodId>,
        quantity: Option<u32>,
        price_type: PriceType,
    ) -> Option<&ProductPrice> {
        self.by_product(product_id).find(|r| {
            r.billing_schedule_period_id.as_ref() == period_id
                && r.quantity == quantity
                && r.price_type == price_type
        })
    }

    /// Finds by period and quantity, falling back to the period-independent row
    pub fn by_period_and_quantity(
        &self,
        product_id: &ProductId,
        period_id: Option<&BillingSchedulePeriodId>,
        quantity: Option<u32>,
        price_type: PriceType,
    ) -> Option<&ProductPrice> {
        period_id
            .and_then(|period| self.find(product_id, Some(period), quantity, price_type))
            .or_else(|| self.find(product_id, None, quantity, price_type))
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_period_row_preferred_over_plain_row() {
        let product = ProductId::new();
        let period = BillingSchedulePeriodId::new();
        let mut table = PriceTable::new();
        table.insert(ProductPrice::new(product, dec!(100)));
        table.insert(ProductPrice::new(product, dec!(120)).for_period(period));

        let row = table.by_period_and_quantity(&product, Some(&period), None, PriceType::Default);
        assert_eq!(row.map(|r| r.price), Some(dec!(120)));

        let other = BillingSchedulePeriodId::new();
        let row = table.by_period_and_quantity(&product, Some(&other), None, PriceType::Default);
        assert_eq!(row.map(|r| r.price), Some(dec!(100)));
    }

    #[test]
    fn test_quantity_rows() {
        let product = ProductId::new();
        let mut table = PriceTable::new();
        table.insert(ProductPrice::new(product, dec!(50)).for_quantity(1));
        table.insert(ProductPrice::new(product, dec!(90)).for_quantity(2));

        assert!(table.has_quantity_rows(&product));
        assert_eq!(table.by_quantity(&product, 2).next().map(|r| r.price), Some(dec!(90)));
        assert!(table.find(&product, None, Some(3), PriceType::Default).is_none());
    }

    #[test]
    fn test_price_type_parse() {
        assert_eq!("ENROLLED_PRICE".parse::<PriceType>().unwrap(), PriceType::Enrolled);
        assert!("VIP".parse::<PriceType>().is_err());
    }
}
