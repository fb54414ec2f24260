//! Bill line computation
//!
//! Composes the price calculator, proration, discount and tax engines into
//! the bill lines of one order item. A one-time product produces a single
//! line; a recurring product produces one line per resolved billing period.
//!
//! # Line arithmetic
//!
//! ```text
//! price       = prorate(base_price, ratio)
//! discount    = apply_discount(price, discount, ratio)
//! discounted  = price - discount
//! tax         = compute_tax(discounted, rate, category)
//! final_price = round(discounted + exclusive tax)
//! ```

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use core_kernel::{round_final_price, BillingSchedulePeriodId, ProductId, Ratio};
use domain_catalog::{
    BillingSchedulePeriod, Catalog, CatalogError, Discount, PriceType, Product, Tax, TaxCategory,
};
use crate::discount::DiscountLine;
use crate::error::PricingError;
use crate::price::{PriceCalculator, PriceQuery};
use crate::proration::{prorate, ProrationPolicy};
use crate::tax::TaxLine;
use crate::verify::BillingAmounts;

/// When a line is billed relative to the order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BillTiming {
    /// Billing date is on or before the order date
    AtOrder,
    /// Billing date is after the order date
    Upcoming,
}

impl BillTiming {
    pub fn classify(billing_date: NaiveDate, order_date: NaiveDate) -> Self {
        if billing_date <= order_date {
            BillTiming::AtOrder
        } else {
            BillTiming::Upcoming
        }
    }
}

/// Everything needed to price one order item
#[derive(Debug, Clone)]
pub struct BillingRequest {
    pub product_id: ProductId,
    pub order_date: NaiveDate,
    /// Product start date, or the effective date of an update
    pub start_date: NaiveDate,
    pub price_type: PriceType,
    /// Package quantity (total slots or weights)
    pub quantity: Option<u32>,
    pub discount: Option<Discount>,
    /// Charge every period in full regardless of the product flag
    pub skip_proration: bool,
}

impl BillingRequest {
    pub fn new(product_id: ProductId, order_date: NaiveDate, start_date: NaiveDate) -> Self {
        Self {
            product_id,
            order_date,
            start_date,
            price_type: PriceType::Default,
            quantity: None,
            discount: None,
            skip_proration: false,
        }
    }

    pub fn with_quantity(mut self, quantity: u32) -> Self {
        self.quantity = Some(quantity);
        self
    }

    pub fn with_discount(mut self, discount: Discount) -> Self {
        self.discount = Some(discount);
        self
    }

    pub fn with_price_type(mut self, price_type: PriceType) -> Self {
        self.price_type = price_type;
        self
    }
}

/// Priced billing line for one period (or the single one-time charge)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BillLine {
    pub product_id: ProductId,
    pub period_id: Option<BillingSchedulePeriodId>,
    pub period_start: Option<NaiveDate>,
    pub period_end: Option<NaiveDate>,
    pub billing_date: NaiveDate,
    pub quantity: Option<u32>,
    /// Undiscounted full-period price
    pub base_price: Decimal,
    pub ratio: Ratio,
    /// Prorated price before discount
    pub price: Decimal,
    pub discount: Option<DiscountLine>,
    pub tax: Option<TaxLine>,
    pub final_price: Decimal,
    pub timing: BillTiming,
}

impl BillLine {
    pub fn discount_amount(&self) -> Decimal {
        self.discount.as_ref().map_or(Decimal::ZERO, |d| d.discount_amount)
    }

    pub fn tax_amount(&self) -> Decimal {
        self.tax.as_ref().map_or(Decimal::ZERO, |t| t.tax_amount)
    }

    /// Amounts compared against a submitted billing item
    pub fn amounts(&self, adjustment_price: Option<Decimal>) -> BillingAmounts {
        BillingAmounts {
            product_id: self.product_id,
            period_id: self.period_id,
            price: self.price,
            discount_amount: self.discount.as_ref().map(|d| d.discount_amount),
            tax_amount: self.tax.as_ref().map(|t| t.tax_amount),
            final_price: self.final_price,
            adjustment_price,
        }
    }
}

/// Computes bill lines against a catalog snapshot
#[derive(Debug, Clone, Copy)]
pub struct BillingCalculator<'a> {
    catalog: &'a Catalog,
}

impl<'a> BillingCalculator<'a> {
    pub fn new(catalog: &'a Catalog) -> Self {
        Self { catalog }
    }

    /// Computes the bill lines of one order item
    ///
    /// # Errors
    ///
    /// Propagates catalog lookups, schedule resolution and price lookup failures.
    pub fn compute(&self, request: &BillingRequest) -> Result<Vec<BillLine>, PricingError> {
        let product = self.catalog.product(&request.product_id)?;
        let tax = product
            .tax_id
            .map(|tax_id| self.catalog.tax(&tax_id))
            .transpose()?;

        let lines = if product.is_recurring() {
            self.recurring_lines(product, tax, request)?
        } else {
            vec![self.one_time_line(product, tax, request)?]
        };

        debug!(
            product_id = %request.product_id,
            lines = lines.len(),
            "Computed bill lines"
        );
        Ok(lines)
    }

    fn one_time_line(
        &self,
        product: &Product,
        tax: Option<&Tax>,
        request: &BillingRequest,
    ) -> Result<BillLine, PricingError> {
        let package_start = match product.kind.package_type() {
            Some(_) => self
                .catalog
                .package(&product.id)
                .ok()
                .and_then(|package| package.start_date),
            None => None,
        };
        let billing_date = package_start
            .filter(|start| *start > request.order_date)
            .unwrap_or(request.order_date);

        self.line(product, tax, request, None, Ratio::FULL, billing_date)
    }

    fn recurring_lines(
        &self,
        product: &Product,
        tax: Option<&Tax>,
        request: &BillingRequest,
    ) -> Result<Vec<BillLine>, PricingError> {
        let schedule_id = product.billing_schedule_id.ok_or_else(|| {
            CatalogError::invalid_product(product.id, "recurring product requires a billing schedule")
        })?;
        let resolved = self.catalog.resolve_periods(&schedule_id, request.start_date)?;
        let policy = if request.skip_proration {
            ProrationPolicy::disabled()
        } else {
            ProrationPolicy::for_product(product)
        };

        resolved
            .iter()
            .map(|r| {
                let ratio = policy.ratio_for(r);
                self.line(product, tax, request, Some(&r.period), ratio, r.period.billing_date)
            })
            .collect()
    }

    fn line(
        &self,
        product: &Product,
        tax: Option<&Tax>,
        request: &BillingRequest,
        period: Option<&BillingSchedulePeriod>,
        ratio: Ratio,
        billing_date: NaiveDate,
    ) -> Result<BillLine, PricingError> {
        let base_price = PriceCalculator::new(self.catalog).base_price(&PriceQuery {
            product,
            period_id: period.map(|p| &p.id),
            quantity: request.quantity,
            price_type: request.price_type,
        })?;
        let price = prorate(base_price, ratio);

        let discount = request
            .discount
            .as_ref()
            .map(|d| DiscountLine::new(d, price, ratio));
        let discounted = price - discount.as_ref().map_or(Decimal::ZERO, |d| d.discount_amount);

        let (tax_line, payable) = match tax {
            Some(tax) => {
                let (line, breakdown) = TaxLine::compute(tax, discounted);
                let payable = match tax.category {
                    TaxCategory::Inclusive => discounted,
                    TaxCategory::Exclusive => breakdown.gross_amount,
                };
                (Some(line), payable)
            }
            None => (None, discounted),
        };

        Ok(BillLine {
            product_id: product.id,
            period_id: period.map(|p| p.id),
            period_start: period.map(|p| p.start_date),
            period_end: period.map(|p| p.end_date),
            billing_date,
            quantity: request.quantity,
            base_price,
            ratio,
            price,
            discount,
            tax: tax_line,
            final_price: round_final_price(payable),
            timing: BillTiming::classify(billing_date, request.order_date),
        })
    }
}

/// Adjustment recorded when a line is replaced by an update
pub fn adjustment_for_update(old_final: Decimal, new_final: Decimal) -> Decimal {
    new_final - old_final
}

/// Adjustment recorded when a line is cancelled
pub fn adjustment_for_cancel(old_final: Decimal) -> Decimal {
    -old_final
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_timing_boundary() {
        let day = NaiveDate::from_ymd_opt(2024, 1, 10).unwrap();
        assert_eq!(BillTiming::classify(day, day), BillTiming::AtOrder);
        assert_eq!(
            BillTiming::classify(day.succ_opt().unwrap(), day),
            BillTiming::Upcoming
        );
    }

    #[test]
    fn test_adjustments() {
        assert_eq!(adjustment_for_update(dec!(290), dec!(270)), dec!(-20));
        assert_eq!(adjustment_for_cancel(dec!(145)), dec!(-145));
    }
}
