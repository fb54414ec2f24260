//! Base price lookup
//!
//! Fees, materials and flat packages take their price straight from the
//! price table. Frequency-based and schedule-based packages multiply a unit
//! price by the ordered quantity unless the product has quantity-keyed rows,
//! in which case the exact row for the quantity is required.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use core_kernel::BillingSchedulePeriodId;
use domain_catalog::{Catalog, PackageType, PriceType, Product, ProductPrice, QuantityType};
use crate::error::PricingError;

/// Quantity carried by one course of a package order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CourseQuantity {
    pub weight: Option<u32>,
    pub slot: Option<u32>,
}

/// Sums slots or weights over the courses of a package order
///
/// Courses missing the relevant value contribute nothing.
pub fn quantity_from_courses<I>(quantity_type: QuantityType, courses: I) -> u32
where
    I: IntoIterator<Item = CourseQuantity>,
{
    courses
        .into_iter()
        .map(|c| {
            if quantity_type.uses_slots() {
                c.slot.unwrap_or(0)
            } else {
                c.weight.unwrap_or(0)
            }
        })
        .sum()
}

/// Inputs for a base price lookup
#[derive(Debug, Clone, Copy)]
pub struct PriceQuery<'a> {
    pub product: &'a Product,
    pub period_id: Option<&'a BillingSchedulePeriodId>,
    pub quantity: Option<u32>,
    pub price_type: PriceType,
}

/// Computes full-period base prices from the catalog price table
#[derive(Debug, Clone, Copy)]
pub struct PriceCalculator<'a> {
    catalog: &'a Catalog,
}

impl<'a> PriceCalculator<'a> {
    pub fn new(catalog: &'a Catalog) -> Self {
        Self { catalog }
    }

    /// Returns the undiscounted, unprorated price for one period
    ///
    /// # Errors
    ///
    /// * `NoPriceFound` - no usable row for the product
    /// * `NoPriceForQuantity` - quantity-priced product lacks the exact row
    /// * `MissingQuantity` - a multiplied package was ordered without quantity
    pub fn base_price(&self, query: &PriceQuery<'_>) -> Result<Decimal, PricingError> {
        let product_id = query.product.id;
        let prices = self.catalog.prices();

        let Some(package_type) = query.product.kind.package_type() else {
            return self
                .lookup(query, None)
                .map(|row| row.price)
                .ok_or(PricingError::NoPriceFound { product_id });
        };

        if prices.has_quantity_rows(&product_id) {
            let quantity = query
                .quantity
                .ok_or(PricingError::MissingQuantity { product_id })?;
            return self
                .lookup(query, Some(quantity))
                .map(|row| row.price)
                .ok_or(PricingError::NoPriceForQuantity { product_id, quantity });
        }

        let unit = self
            .lookup(query, None)
            .map(|row| row.price)
            .ok_or(PricingError::NoPriceFound { product_id })?;

        match package_type {
            PackageType::FrequencyBased | PackageType::ScheduleBased => {
                let quantity = query
                    .quantity
                    .ok_or(PricingError::MissingQuantity { product_id })?;
                Ok(unit * Decimal::from(quantity))
            }
            PackageType::OneTime | PackageType::SlotBased => Ok(unit),
        }
    }

    fn lookup(&self, query: &PriceQuery<'_>, quantity: Option<u32>) -> Option<&'a ProductPrice> {
        let prices = self.catalog.prices();
        let find = |price_type| {
            prices.by_period_and_quantity(&query.product.id, query.period_id, quantity, price_type)
        };
        find(query.price_type).or_else(|| match query.price_type {
            PriceType::Enrolled => find(PriceType::Default),
            PriceType::Default => None,
        })
    }
}
