//! Read-only catalog snapshot
//!
//! An order is priced against a snapshot of the master data it touches. The
//! snapshot is assembled once per request, either from storage or from test
//! builders, and is never mutated while pricing.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

use core_kernel::{BillingScheduleId, DiscountId, ProductId, TaxId};
use crate::discount::Discount;
use crate::error::CatalogError;
use crate::price::PriceTable;
use crate::product::{Package, Product};
use crate::schedule::{BillingSchedule, ResolvedPeriod};
use crate::tax::Tax;
use crate::ProductPrice;

/// Master data needed to price and validate an order
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Catalog {
    products: HashMap<ProductId, Product>,
    packages: HashMap<ProductId, Package>,
    schedules: HashMap<BillingScheduleId, BillingSchedule>,
    discounts: HashMap<DiscountId, Discount>,
    taxes: HashMap<TaxId, Tax>,
    prices: PriceTable,
    /// Discounts allowed per product; absent means any discount
    product_discounts: HashMap<ProductId, HashSet<DiscountId>>,
    /// Package product to its associated add-on products
    associations: HashMap<ProductId, HashSet<ProductId>>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_product(&mut self, product: Product) {
        self.products.insert(product.id, product);
    }

    pub fn insert_package(&mut self, package: Package) {
        self.packages.insert(package.product_id, package);
    }

    pub fn insert_schedule(&mut self, schedule: BillingSchedule) {
        self.schedules.insert(schedule.id, schedule);
    }

    pub fn insert_discount(&mut self, discount: Discount) {
        self.discounts.insert(discount.id, discount);
    }

    pub fn insert_tax(&mut self, tax: Tax) {
        self.taxes.insert(tax.id, tax);
    }

    pub fn insert_price(&mut self, price: ProductPrice) {
        self.prices.insert(price);
    }

    /// Restricts a product to an allowed discount
    pub fn allow_discount(&mut self, product_id: ProductId, discount_id: DiscountId) {
        self.product_discounts.entry(product_id).or_default().insert(discount_id);
    }

    /// Records that `product_id` can be ordered as an add-on of `package_id`
    pub fn associate(&mut self, package_id: ProductId, product_id: ProductId) {
        self.associations.entry(package_id).or_default().insert(product_id);
    }

    /// Looks up an orderable product
    pub fn product(&self, id: &ProductId) -> Result<&Product, CatalogError> {
        self.products
            .get(id)
            .filter(|p| !p.is_archived)
            .ok_or(CatalogError::ProductNotFound(*id))
    }

    pub fn package(&self, product_id: &ProductId) -> Result<&Package, CatalogError> {
        self.packages
            .get(product_id)
            .ok_or(CatalogError::PackageNotFound(*product_id))
    }

    pub fn tax(&self, id: &TaxId) -> Result<&Tax, CatalogError> {
        self.taxes
            .get(id)
            .filter(|t| !t.is_archived)
            .ok_or(CatalogError::TaxNotFound(*id))
    }

    /// Looks up a discount, archived or not
    pub fn discount(&self, id: &DiscountId) -> Result<&Discount, CatalogError> {
        self.discounts.get(id).ok_or(CatalogError::DiscountNotFound(*id))
    }

    /// Looks up an active billing schedule
    pub fn schedule(&self, id: &BillingScheduleId) -> Result<&BillingSchedule, CatalogError> {
        self.schedules
            .get(id)
            .filter(|s| !s.is_archived)
            .ok_or(CatalogError::ScheduleNotFound(*id))
    }

    pub fn prices(&self) -> &PriceTable {
        &self.prices
    }

    pub fn products(&self) -> impl Iterator<Item = &Product> {
        self.products.values()
    }

    pub fn packages(&self) -> impl Iterator<Item = &Package> {
        self.packages.values()
    }

    pub fn schedules(&self) -> impl Iterator<Item = &BillingSchedule> {
        self.schedules.values()
    }

    pub fn discounts(&self) -> impl Iterator<Item = &Discount> {
        self.discounts.values()
    }

    pub fn taxes(&self) -> impl Iterator<Item = &Tax> {
        self.taxes.values()
    }

    /// `(product, discount)` pairs restricting which discounts a product accepts
    pub fn discount_restrictions(&self) -> impl Iterator<Item = (ProductId, DiscountId)> + '_ {
        self.product_discounts
            .iter()
            .flat_map(|(product, allowed)| allowed.iter().map(move |discount| (*product, *discount)))
    }

    /// `(package, associated product)` pairs
    pub fn associations(&self) -> impl Iterator<Item = (ProductId, ProductId)> + '_ {
        self.associations
            .iter()
            .flat_map(|(package, products)| products.iter().map(move |product| (*package, *product)))
    }

    /// Resolves the billing periods of a schedule for a start date
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::ScheduleNotFound` for unknown or archived
    /// schedules, otherwise the resolver's own errors.
    pub fn resolve_periods(
        &self,
        schedule_id: &BillingScheduleId,
        start: NaiveDate,
    ) -> Result<Vec<ResolvedPeriod>, CatalogError> {
        self.schedule(schedule_id)?.resolve_periods(start)
    }

    pub fn is_discount_allowed(&self, product_id: &ProductId, discount_id: &DiscountId) -> bool {
        self.product_discounts
            .get(product_id)
            .map_or(true, |allowed| allowed.contains(discount_id))
    }

    pub fn is_associated(&self, package_id: &ProductId, product_id: &ProductId) -> bool {
        self.associations
            .get(package_id)
            .is_some_and(|products| products.contains(product_id))
    }

    /// Merges another snapshot into this one
    pub fn merge(&mut self, other: Catalog) {
        self.products.extend(other.products);
        self.packages.extend(other.packages);
        self.schedules.extend(other.schedules);
        self.discounts.extend(other.discounts);
        self.taxes.extend(other.taxes);
        for row in other.prices.by_all() {
            self.prices.insert(row.clone());
        }
        for (product, allowed) in other.product_discounts {
            self.product_discounts.entry(product).or_default().extend(allowed);
        }
        for (package, products) in other.associations {
            self.associations.entry(package).or_default().extend(products);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::product::{Cadence, ProductKind};

    #[test]
    fn test_archived_product_not_found() {
        let mut catalog = Catalog::new();
        let mut product = Product::new(ProductId::new(), "Old fee", ProductKind::Fee(Cadence::OneTime));
        product.is_archived = true;
        let id = product.id;
        catalog.insert_product(product);

        assert!(matches!(catalog.product(&id), Err(CatalogError::ProductNotFound(_))));
    }

    #[test]
    fn test_unknown_schedule() {
        let catalog = Catalog::new();
        let schedule_id = BillingScheduleId::new();
        let err = catalog
            .resolve_periods(&schedule_id, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap())
            .unwrap_err();
        assert!(matches!(err, CatalogError::ScheduleNotFound(id) if id == schedule_id));
    }

    #[test]
    fn test_discount_restrictions() {
        let mut catalog = Catalog::new();
        let product = ProductId::new();
        let allowed = DiscountId::new();
        assert!(catalog.is_discount_allowed(&product, &DiscountId::new()));

        catalog.allow_discount(product, allowed);
        assert!(catalog.is_discount_allowed(&product, &allowed));
        assert!(!catalog.is_discount_allowed(&product, &DiscountId::new()));
    }

    #[test]
    fn test_associations() {
        let mut catalog = Catalog::new();
        let package = ProductId::new();
        let material = ProductId::new();
        catalog.associate(package, material);

        assert!(catalog.is_associated(&package, &material));
        assert!(!catalog.is_associated(&material, &package));
    }
}
