//! Catalog repository
//!
//! Loads the master-data snapshot an order is priced against, and writes a
//! snapshot back for seeding environments.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool};
use std::collections::HashMap;
use tracing::{debug, instrument};
use uuid::Uuid;

use core_kernel::{Percentage, ProductId};
use domain_catalog::{
    BillingRatio, BillingSchedule, BillingSchedulePeriod, Catalog, Discount, DiscountAmount,
    Package, PackageCourse, Product, ProductKind, ProductPrice, Tax,
};

use super::package_quantity_type::PackageQuantityTypeRepository;
use super::{to_i32, to_u32};
use crate::error::DatabaseError;

/// Product row
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ProductRow {
    pub product_id: Uuid,
    pub name: String,
    pub product_type: String,
    pub product_subtype: String,
    pub tax_id: Option<Uuid>,
    pub billing_schedule_id: Option<Uuid>,
    pub disable_pro_rating: bool,
    pub is_unique: bool,
    pub is_archived: bool,
}

impl TryFrom<ProductRow> for Product {
    type Error = DatabaseError;

    fn try_from(row: ProductRow) -> Result<Self, Self::Error> {
        let kind = ProductKind::from_parts(&row.product_type, &row.product_subtype)
            .map_err(DatabaseError::invalid_value)?;
        Ok(Product {
            id: row.product_id.into(),
            name: row.name,
            kind,
            tax_id: row.tax_id.map(Into::into),
            billing_schedule_id: row.billing_schedule_id.map(Into::into),
            disable_pro_rating: row.disable_pro_rating,
            is_unique: row.is_unique,
            is_archived: row.is_archived,
        })
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct TaxRow {
    pub tax_id: Uuid,
    pub name: String,
    pub tax_percentage: Decimal,
    pub tax_category: String,
    pub is_archived: bool,
}

impl TryFrom<TaxRow> for Tax {
    type Error = DatabaseError;

    fn try_from(row: TaxRow) -> Result<Self, Self::Error> {
        let percentage = Percentage::new(row.tax_percentage).map_err(DatabaseError::invalid_value)?;
        let category = row.tax_category.parse().map_err(DatabaseError::invalid_value)?;
        let mut tax = Tax::new(row.tax_id.into(), row.name, percentage, category);
        tax.is_archived = row.is_archived;
        Ok(tax)
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ScheduleRow {
    pub billing_schedule_id: Uuid,
    pub name: String,
    pub is_archived: bool,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PeriodRow {
    pub billing_schedule_period_id: Uuid,
    pub billing_schedule_id: Uuid,
    pub name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub billing_date: NaiveDate,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct RatioRow {
    pub billing_ratio_id: Uuid,
    pub billing_schedule_period_id: Uuid,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub billing_ratio_numerator: i32,
    pub billing_ratio_denominator: i32,
}

impl TryFrom<RatioRow> for BillingRatio {
    type Error = DatabaseError;

    fn try_from(row: RatioRow) -> Result<Self, Self::Error> {
        let mut ratio = BillingRatio::new(
            row.start_date,
            row.end_date,
            to_u32(row.billing_ratio_numerator, "billing_ratio_numerator")?,
            to_u32(row.billing_ratio_denominator, "billing_ratio_denominator")?,
        )
        .map_err(DatabaseError::invalid_value)?;
        ratio.id = row.billing_ratio_id.into();
        Ok(ratio)
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PackageRow {
    pub package_id: Uuid,
    pub package_start_date: Option<NaiveDate>,
    pub package_end_date: Option<NaiveDate>,
    pub max_slot: i32,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PackageCourseRow {
    pub package_id: Uuid,
    pub course_id: Uuid,
    pub mandatory_flag: bool,
    pub max_slots_per_course: i32,
    pub course_weight: i32,
}

impl TryFrom<PackageCourseRow> for PackageCourse {
    type Error = DatabaseError;

    fn try_from(row: PackageCourseRow) -> Result<Self, Self::Error> {
        Ok(PackageCourse {
            course_id: row.course_id.into(),
            mandatory: row.mandatory_flag,
            max_slots_per_course: to_u32(row.max_slots_per_course, "max_slots_per_course")?,
            course_weight: to_u32(row.course_weight, "course_weight")?,
        })
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct DiscountRow {
    pub discount_id: Uuid,
    pub name: String,
    pub discount_type: String,
    pub discount_amount_type: String,
    pub discount_amount_value: Decimal,
    pub available_from: Option<NaiveDate>,
    pub available_until: Option<NaiveDate>,
    pub is_archived: bool,
}

impl TryFrom<DiscountRow> for Discount {
    type Error = DatabaseError;

    fn try_from(row: DiscountRow) -> Result<Self, Self::Error> {
        let discount_type = row.discount_type.parse().map_err(DatabaseError::invalid_value)?;
        let amount = DiscountAmount::from_parts(&row.discount_amount_type, row.discount_amount_value)
            .map_err(DatabaseError::invalid_value)?;
        Ok(Discount {
            id: row.discount_id.into(),
            name: row.name,
            discount_type,
            amount,
            available_from: row.available_from,
            available_until: row.available_until,
            is_archived: row.is_archived,
        })
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PriceRow {
    pub product_id: Uuid,
    pub billing_schedule_period_id: Option<Uuid>,
    pub quantity: Option<i32>,
    pub price_type: String,
    pub price: Decimal,
}

impl TryFrom<PriceRow> for ProductPrice {
    type Error = DatabaseError;

    fn try_from(row: PriceRow) -> Result<Self, Self::Error> {
        Ok(ProductPrice {
            product_id: row.product_id.into(),
            billing_schedule_period_id: row.billing_schedule_period_id.map(Into::into),
            quantity: row.quantity.map(|q| to_u32(q, "quantity")).transpose()?,
            price_type: row.price_type.parse().map_err(DatabaseError::invalid_value)?,
            price: row.price,
        })
    }
}

/// Repository for catalog master data
#[derive(Debug, Clone)]
pub struct CatalogRepository {
    pool: PgPool,
}

impl CatalogRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Loads the snapshot needed to price the given products
    ///
    /// The snapshot holds the products themselves, their taxes, billing
    /// schedules (with periods and ratios), package definitions, price rows,
    /// discount restrictions and package associations, plus every discount so
    /// that tag discounts resolve.
    ///
    /// # Errors
    ///
    /// Query failures, or `InvalidValue` when a stored row no longer forms a
    /// valid domain value.
    #[instrument(skip(self, product_ids), fields(products = product_ids.len()))]
    pub async fn load_snapshot(&self, product_ids: &[ProductId]) -> Result<Catalog, DatabaseError> {
        let ids: Vec<Uuid> = product_ids.iter().map(|id| *id.as_uuid()).collect();
        let mut catalog = Catalog::new();

        let products: Vec<ProductRow> = sqlx::query_as(
            r#"
            SELECT product_id, name, product_type, product_subtype, tax_id,
                   billing_schedule_id, disable_pro_rating, is_unique, is_archived
            FROM product
            WHERE product_id = ANY($1)
            "#,
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await?;

        let tax_ids: Vec<Uuid> = products.iter().filter_map(|p| p.tax_id).collect();
        let schedule_ids: Vec<Uuid> = products.iter().filter_map(|p| p.billing_schedule_id).collect();
        for row in products {
            catalog.insert_product(row.try_into()?);
        }

        let taxes: Vec<TaxRow> = sqlx::query_as(
            "SELECT tax_id, name, tax_percentage, tax_category, is_archived FROM tax WHERE tax_id = ANY($1)",
        )
        .bind(&tax_ids)
        .fetch_all(&self.pool)
        .await?;
        for row in taxes {
            catalog.insert_tax(row.try_into()?);
        }

        for schedule in self.load_schedules(&schedule_ids).await? {
            catalog.insert_schedule(schedule);
        }
        for package in self.load_packages(&ids).await? {
            catalog.insert_package(package);
        }

        let discounts: Vec<DiscountRow> = sqlx::query_as(
            r#"
            SELECT discount_id, name, discount_type, discount_amount_type,
                   discount_amount_value, available_from, available_until, is_archived
            FROM discount
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        for row in discounts {
            catalog.insert_discount(row.try_into()?);
        }

        let restrictions: Vec<(Uuid, Uuid)> = sqlx::query_as(
            "SELECT product_id, discount_id FROM product_discount WHERE product_id = ANY($1)",
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await?;
        for (product_id, discount_id) in restrictions {
            catalog.allow_discount(product_id.into(), discount_id.into());
        }

        let associations: Vec<(Uuid, Uuid)> = sqlx::query_as(
            "SELECT package_id, associated_product_id FROM package_associated_product WHERE package_id = ANY($1)",
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await?;
        for (package_id, product_id) in associations {
            catalog.associate(package_id.into(), product_id.into());
        }

        let prices: Vec<PriceRow> = sqlx::query_as(
            r#"
            SELECT product_id, billing_schedule_period_id, quantity, price_type, price
            FROM product_price
            WHERE product_id = ANY($1)
            "#,
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await?;
        let price_rows = prices.len();
        for row in prices {
            catalog.insert_price(row.try_into()?);
        }

        debug!(price_rows, "Loaded catalog snapshot");
        Ok(catalog)
    }

    async fn load_schedules(&self, schedule_ids: &[Uuid]) -> Result<Vec<BillingSchedule>, DatabaseError> {
        if schedule_ids.is_empty() {
            return Ok(Vec::new());
        }

        let schedules: Vec<ScheduleRow> = sqlx::query_as(
            "SELECT billing_schedule_id, name, is_archived FROM billing_schedule WHERE billing_schedule_id = ANY($1)",
        )
        .bind(schedule_ids)
        .fetch_all(&self.pool)
        .await?;

        let periods: Vec<PeriodRow> = sqlx::query_as(
            r#"
            SELECT billing_schedule_period_id, billing_schedule_id, name,
                   start_date, end_date, billing_date
            FROM billing_schedule_period
            WHERE billing_schedule_id = ANY($1)
            ORDER BY start_date
            "#,
        )
        .bind(schedule_ids)
        .fetch_all(&self.pool)
        .await?;

        let ratios: Vec<RatioRow> = sqlx::query_as(
            r#"
            SELECT r.billing_ratio_id, r.billing_schedule_period_id, r.start_date, r.end_date,
                   r.billing_ratio_numerator, r.billing_ratio_denominator
            FROM billing_ratio r
            JOIN billing_schedule_period p
              ON p.billing_schedule_period_id = r.billing_schedule_period_id
            WHERE p.billing_schedule_id = ANY($1)
            ORDER BY r.start_date
            "#,
        )
        .bind(schedule_ids)
        .fetch_all(&self.pool)
        .await?;

        let mut ratios_by_period: HashMap<Uuid, Vec<RatioRow>> = HashMap::new();
        for ratio in ratios {
            ratios_by_period
                .entry(ratio.billing_schedule_period_id)
                .or_default()
                .push(ratio);
        }

        let mut periods_by_schedule: HashMap<Uuid, Vec<BillingSchedulePeriod>> = HashMap::new();
        for row in periods {
            let ratios = ratios_by_period
                .remove(&row.billing_schedule_period_id)
                .unwrap_or_default();
            let schedule_id = row.billing_schedule_id;
            let period = build_period(row, ratios)?;
            periods_by_schedule.entry(schedule_id).or_default().push(period);
        }

        schedules
            .into_iter()
            .map(|row| {
                let periods = periods_by_schedule
                    .remove(&row.billing_schedule_id)
                    .unwrap_or_default();
                let schedule = BillingSchedule::new(row.billing_schedule_id.into(), row.name, periods)
                    .map_err(DatabaseError::invalid_value)?;
                Ok(if row.is_archived { schedule.archived() } else { schedule })
            })
            .collect()
    }

    async fn load_packages(&self, product_ids: &[Uuid]) -> Result<Vec<Package>, DatabaseError> {
        let packages: Vec<PackageRow> = sqlx::query_as(
            r#"
            SELECT package_id, package_start_date, package_end_date, max_slot
            FROM package
            WHERE package_id = ANY($1)
            "#,
        )
        .bind(product_ids)
        .fetch_all(&self.pool)
        .await?;
        if packages.is_empty() {
            return Ok(Vec::new());
        }

        let courses: Vec<PackageCourseRow> = sqlx::query_as(
            r#"
            SELECT package_id, course_id, mandatory_flag, max_slots_per_course, course_weight
            FROM package_course
            WHERE package_id = ANY($1)
            ORDER BY course_id
            "#,
        )
        .bind(product_ids)
        .fetch_all(&self.pool)
        .await?;

        let mut courses_by_package: HashMap<Uuid, Vec<PackageCourse>> = HashMap::new();
        for row in courses {
            let package_id = row.package_id;
            courses_by_package
                .entry(package_id)
                .or_default()
                .push(row.try_into()?);
        }

        packages
            .into_iter()
            .map(|row| {
                Ok(Package {
                    product_id: row.package_id.into(),
                    start_date: row.package_start_date,
                    end_date: row.package_end_date,
                    max_slot: to_u32(row.max_slot, "max_slot")?,
                    courses: courses_by_package.remove(&row.package_id).unwrap_or_default(),
                })
            })
            .collect()
    }

    /// Writes a catalog snapshot in one transaction
    ///
    /// Existing rows are left untouched; price rows of the snapshot's
    /// products are replaced. Package quantity-type mappings go through
    /// [`PackageQuantityTypeRepository::ensure_mapping`], so concurrent
    /// seeders of the same package type do not conflict.
    #[instrument(skip(self, catalog))]
    pub async fn save(&self, catalog: &Catalog) -> Result<(), DatabaseError> {
        let mut tx = self.pool.begin().await?;

        for tax in catalog.taxes() {
            sqlx::query(
                r#"
                INSERT INTO tax (tax_id, name, tax_percentage, tax_category, is_archived)
                VALUES ($1, $2, $3, $4, $5)
                ON CONFLICT (tax_id) DO NOTHING
                "#,
            )
            .bind(tax.id.as_uuid())
            .bind(&tax.name)
            .bind(tax.percentage.value())
            .bind(tax.category.as_str())
            .bind(tax.is_archived)
            .execute(&mut *tx)
            .await?;
        }

        for schedule in catalog.schedules() {
            save_schedule(&mut tx, schedule).await?;
        }

        for product in catalog.products() {
            sqlx::query(
                r#"
                INSERT INTO product (
                    product_id, name, product_type, product_subtype, tax_id,
                    billing_schedule_id, disable_pro_rating, is_unique, is_archived
                ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
                ON CONFLICT (product_id) DO NOTHING
                "#,
            )
            .bind(product.id.as_uuid())
            .bind(&product.name)
            .bind(product.kind.product_type_str())
            .bind(product.kind.subtype_str())
            .bind(product.tax_id.map(|id| *id.as_uuid()))
            .bind(product.billing_schedule_id.map(|id| *id.as_uuid()))
            .bind(product.disable_pro_rating)
            .bind(product.is_unique)
            .bind(product.is_archived)
            .execute(&mut *tx)
            .await?;

            if let Some(package_type) = product.kind.package_type() {
                PackageQuantityTypeRepository::ensure_mapping(&mut tx, package_type).await?;
            }
        }

        for package in catalog.packages() {
            save_package(&mut tx, package).await?;
        }

        for discount in catalog.discounts() {
            sqlx::query(
                r#"
                INSERT INTO discount (
                    discount_id, name, discount_type, discount_amount_type,
                    discount_amount_value, available_from, available_until, is_archived
                ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                ON CONFLICT (discount_id) DO NOTHING
                "#,
            )
            .bind(discount.id.as_uuid())
            .bind(&discount.name)
            .bind(discount.discount_type.as_str())
            .bind(discount.amount.amount_type_str())
            .bind(discount.amount.value())
            .bind(discount.available_from)
            .bind(discount.available_until)
            .bind(discount.is_archived)
            .execute(&mut *tx)
            .await?;
        }

        for (product_id, discount_id) in catalog.discount_restrictions() {
            sqlx::query(
                "INSERT INTO product_discount (product_id, discount_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
            )
            .bind(product_id.as_uuid())
            .bind(discount_id.as_uuid())
            .execute(&mut *tx)
            .await?;
        }

        for (package_id, product_id) in catalog.associations() {
            sqlx::query(
                r#"
                INSERT INTO package_associated_product (package_id, associated_product_id)
                VALUES ($1, $2)
                ON CONFLICT DO NOTHING
                "#,
            )
            .bind(package_id.as_uuid())
            .bind(product_id.as_uuid())
            .execute(&mut *tx)
            .await?;
        }

        let product_ids: Vec<Uuid> = catalog.products().map(|p| *p.id.as_uuid()).collect();
        sqlx::query("DELETE FROM product_price WHERE product_id = ANY($1)")
            .bind(&product_ids)
            .execute(&mut *tx)
            .await?;
        for row in catalog.prices().by_all() {
            sqlx::query(
                r#"
                INSERT INTO product_price (
                    product_id, billing_schedule_period_id, quantity, price_type, price
                ) VALUES ($1, $2, $3, $4, $5)
                "#,
            )
            .bind(row.product_id.as_uuid())
            .bind(row.billing_schedule_period_id.map(|id| *id.as_uuid()))
            .bind(row.quantity.map(|q| to_i32(q, "quantity")).transpose()?)
            .bind(row.price_type.as_str())
            .bind(row.price)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        debug!(products = product_ids.len(), "Saved catalog snapshot");
        Ok(())
    }
}

fn build_period(row: PeriodRow, ratios: Vec<RatioRow>) -> Result<BillingSchedulePeriod, DatabaseError> {
    let mut period = BillingSchedulePeriod::new(row.name, row.start_date, row.end_date, row.billing_date)
        .map_err(DatabaseError::invalid_value)?;
    period.id = row.billing_schedule_period_id.into();
    for ratio in ratios {
        period = period
            .with_ratio(ratio.try_into()?)
            .map_err(DatabaseError::invalid_value)?;
    }
    Ok(period)
}

async fn save_schedule(conn: &mut PgConnection, schedule: &BillingSchedule) -> Result<(), DatabaseError> {
    sqlx::query(
        r#"
        INSERT INTO billing_schedule (billing_schedule_id, name, is_archived)
        VALUES ($1, $2, $3)
        ON CONFLICT (billing_schedule_id) DO NOTHING
        "#,
    )
    .bind(schedule.id.as_uuid())
    .bind(&schedule.name)
    .bind(schedule.is_archived)
    .execute(&mut *conn)
    .await?;

    for period in schedule.periods() {
        sqlx::query(
            r#"
            INSERT INTO billing_schedule_period (
                billing_schedule_period_id, billing_schedule_id, name,
                start_date, end_date, billing_date
            ) VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (billing_schedule_period_id) DO NOTHING
            "#,
        )
        .bind(period.id.as_uuid())
        .bind(schedule.id.as_uuid())
        .bind(&period.name)
        .bind(period.start_date)
        .bind(period.end_date)
        .bind(period.billing_date)
        .execute(&mut *conn)
        .await?;

        for ratio in &period.ratios {
            sqlx::query(
                r#"
                INSERT INTO billing_ratio (
                    billing_ratio_id, billing_schedule_period_id, start_date, end_date,
                    billing_ratio_numerator, billing_ratio_denominator
                ) VALUES ($1, $2, $3, $4, $5, $6)
                ON CONFLICT (billing_ratio_id) DO NOTHING
                "#,
            )
            .bind(ratio.id.as_uuid())
            .bind(period.id.as_uuid())
            .bind(ratio.start_date)
            .bind(ratio.end_date)
            .bind(to_i32(ratio.ratio.numerator(), "billing_ratio_numerator")?)
            .bind(to_i32(ratio.ratio.denominator(), "billing_ratio_denominator")?)
            .execute(&mut *conn)
            .await?;
        }
    }
    Ok(())
}

async fn save_package(conn: &mut PgConnection, package: &Package) -> Result<(), DatabaseError> {
    sqlx::query(
        r#"
        INSERT INTO package (package_id, package_start_date, package_end_date, max_slot)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT (package_id) DO NOTHING
        "#,
    )
    .bind(package.product_id.as_uuid())
    .bind(package.start_date)
    .bind(package.end_date)
    .bind(to_i32(package.max_slot, "max_slot")?)
    .execute(&mut *conn)
    .await?;

    for course in &package.courses {
        sqlx::query(
            r#"
            INSERT INTO package_course (
                package_id, course_id, mandatory_flag, max_slots_per_course, course_weight
            ) VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (package_id, course_id) DO NOTHING
            "#,
        )
        .bind(package.product_id.as_uuid())
        .bind(course.course_id.as_uuid())
        .bind(course.mandatory)
        .bind(to_i32(course.max_slots_per_course, "max_slots_per_course")?)
        .bind(to_i32(course.course_weight, "course_weight")?)
        .execute(&mut *conn)
        .await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain_catalog::{Cadence, DiscountType, PackageType, TaxCategory};
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_product_row_conversion() {
        let row = ProductRow {
            product_id: Uuid::new_v4(),
            name: "Weekly lessons".to_string(),
            product_type: "PRODUCT_TYPE_PACKAGE".to_string(),
            product_subtype: PackageType::FrequencyBased.as_str().to_string(),
            tax_id: None,
            billing_schedule_id: Some(Uuid::new_v4()),
            disable_pro_rating: false,
            is_unique: true,
            is_archived: false,
        };
        let product = Product::try_from(row).unwrap();
        assert_eq!(product.kind, ProductKind::Package(PackageType::FrequencyBased));
        assert!(product.is_unique);
    }

    #[test]
    fn test_unknown_product_type_rejected() {
        let row = ProductRow {
            product_id: Uuid::new_v4(),
            name: "Bad".to_string(),
            product_type: "PRODUCT_TYPE_SERVICE".to_string(),
            product_subtype: "ONE_TIME".to_string(),
            tax_id: None,
            billing_schedule_id: None,
            disable_pro_rating: false,
            is_unique: false,
            is_archived: false,
        };
        assert!(matches!(Product::try_from(row), Err(DatabaseError::InvalidValue(_))));
    }

    #[test]
    fn test_fee_cadence_round_trips_storage_names() {
        let kind = ProductKind::Fee(Cadence::Recurring);
        let parsed = ProductKind::from_parts(kind.product_type_str(), kind.subtype_str()).unwrap();
        assert_eq!(parsed, kind);
    }

    #[test]
    fn test_tax_and_discount_rows() {
        let tax = Tax::try_from(TaxRow {
            tax_id: Uuid::new_v4(),
            name: "VAT".to_string(),
            tax_percentage: dec!(20),
            tax_category: "TAX_CATEGORY_INCLUSIVE".to_string(),
            is_archived: false,
        })
        .unwrap();
        assert_eq!(tax.category, TaxCategory::Inclusive);

        let discount = Discount::try_from(DiscountRow {
            discount_id: Uuid::new_v4(),
            name: "Family".to_string(),
            discount_type: DiscountType::Family.as_str().to_string(),
            discount_amount_type: "DISCOUNT_AMOUNT_TYPE_PERCENTAGE".to_string(),
            discount_amount_value: dec!(10),
            available_from: None,
            available_until: None,
            is_archived: false,
        })
        .unwrap();
        assert_eq!(discount.amount, DiscountAmount::Percentage(dec!(10)));
    }

    #[test]
    fn test_period_with_ratios() {
        let period_id = Uuid::new_v4();
        let row = PeriodRow {
            billing_schedule_period_id: period_id,
            billing_schedule_id: Uuid::new_v4(),
            name: "January".to_string(),
            start_date: date(2024, 1, 1),
            end_date: date(2024, 1, 31),
            billing_date: date(2024, 1, 1),
        };
        let ratio = RatioRow {
            billing_ratio_id: Uuid::new_v4(),
            billing_schedule_period_id: period_id,
            start_date: date(2024, 1, 16),
            end_date: date(2024, 1, 31),
            billing_ratio_numerator: 1,
            billing_ratio_denominator: 2,
        };

        let period = build_period(row, vec![ratio]).unwrap();
        assert_eq!(*period.id.as_uuid(), period_id);
        assert_eq!(period.ratio_for_start(date(2024, 1, 20)).unwrap().denominator(), 2);
    }

    #[test]
    fn test_zero_denominator_rejected() {
        let ratio = RatioRow {
            billing_ratio_id: Uuid::new_v4(),
            billing_schedule_period_id: Uuid::new_v4(),
            start_date: date(2024, 1, 1),
            end_date: date(2024, 1, 31),
            billing_ratio_numerator: 1,
            billing_ratio_denominator: 0,
        };
        assert!(BillingRatio::try_from(ratio).is_err());
    }
}
