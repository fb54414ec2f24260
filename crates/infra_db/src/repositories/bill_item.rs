//! Bill item repository

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::PgConnection;
use uuid::Uuid;

use core_kernel::{Ratio, StudentProductId};
use domain_order::BillItem;
use super::{to_i32, to_u32};
use crate::error::DatabaseError;

const COLUMNS: &str = r#"
    bill_item_id, order_id, student_product_id, student_id, location_id, product_id,
    billing_schedule_period_id, billing_date, billing_from, billing_to, quantity,
    billing_ratio_numerator, billing_ratio_denominator, price, discount_id,
    discount_amount, tax_id, tax_percentage, tax_category, tax_amount, final_price,
    adjustment_price, is_cancel_bill_item, bill_status, bill_type,
    package_associated_id, previous_bill_item_id, created_at
"#;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct BillItemRow {
    pub bill_item_id: Uuid,
    pub order_id: Uuid,
    pub student_product_id: Uuid,
    pub student_id: Uuid,
    pub location_id: Uuid,
    pub product_id: Uuid,
    pub billing_schedule_period_id: Option<Uuid>,
    pub billing_date: NaiveDate,
    pub billing_from: Option<NaiveDate>,
    pub billing_to: Option<NaiveDate>,
    pub quantity: Option<i32>,
    pub billing_ratio_numerator: i32,
    pub billing_ratio_denominator: i32,
    pub price: Decimal,
    pub discount_id: Option<Uuid>,
    pub discount_amount: Option<Decimal>,
    pub tax_id: Option<Uuid>,
    pub tax_percentage: Option<Decimal>,
    pub tax_category: Option<String>,
    pub tax_amount: Option<Decimal>,
    pub final_price: Decimal,
    pub adjustment_price: Option<Decimal>,
    pub is_cancel_bill_item: bool,
    pub bill_status: String,
    pub bill_type: String,
    pub package_associated_id: Option<Uuid>,
    pub previous_bill_item_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<BillItemRow> for BillItem {
    type Error = DatabaseError;

    fn try_from(row: BillItemRow) -> Result<Self, Self::Error> {
        let ratio = Ratio::new(
            to_u32(row.billing_ratio_numerator, "billing_ratio_numerator")?,
            to_u32(row.billing_ratio_denominator, "billing_ratio_denominator")?,
        )
        .map_err(DatabaseError::invalid_value)?;

        Ok(BillItem {
            id: row.bill_item_id.into(),
            order_id: row.order_id.into(),
            student_product_id: row.student_product_id.into(),
            student_id: row.student_id.into(),
            location_id: row.location_id.into(),
            product_id: row.product_id.into(),
            billing_schedule_period_id: row.billing_schedule_period_id.map(Into::into),
            billing_date: row.billing_date,
            billing_from: row.billing_from,
            billing_to: row.billing_to,
            quantity: row.quantity.map(|q| to_u32(q, "quantity")).transpose()?,
            ratio,
            price: row.price,
            discount_id: row.discount_id.map(Into::into),
            discount_amount: row.discount_amount,
            tax_id: row.tax_id.map(Into::into),
            tax_percentage: row.tax_percentage,
            tax_category: row
                .tax_category
                .map(|c| c.parse().map_err(DatabaseError::invalid_value))
                .transpose()?,
            tax_amount: row.tax_amount,
            final_price: row.final_price,
            adjustment_price: row.adjustment_price,
            is_cancel_bill_item: row.is_cancel_bill_item,
            status: row.bill_status.parse().map_err(DatabaseError::invalid_value)?,
            bill_type: row.bill_type.parse().map_err(DatabaseError::invalid_value)?,
            package_associated_id: row.package_associated_id.map(Into::into),
            previous_bill_item_id: row.previous_bill_item_id.map(Into::into),
            created_at: row.created_at,
        })
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct BillItemRepository;

impl BillItemRepository {
    /// Bill items of a student product in billing order
    pub async fn find_by_student_product(
        conn: &mut PgConnection,
        student_product_id: StudentProductId,
    ) -> Result<Vec<BillItem>, DatabaseError> {
        let rows: Vec<BillItemRow> = sqlx::query_as(&format!(
            r#"
            SELECT {COLUMNS} FROM bill_item
            WHERE student_product_id = $1
            ORDER BY billing_date, billing_from
            "#
        ))
        .bind(student_product_id.as_uuid())
        .fetch_all(&mut *conn)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    pub async fn insert(conn: &mut PgConnection, item: &BillItem) -> Result<(), DatabaseError> {
        sqlx::query(&format!(
            r#"
            INSERT INTO bill_item ({COLUMNS})
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16,
                    $17, $18, $19, $20, $21, $22, $23, $24, $25, $26, $27, $28)
            "#
        ))
        .bind(item.id.as_uuid())
        .bind(item.order_id.as_uuid())
        .bind(item.student_product_id.as_uuid())
        .bind(item.student_id.as_uuid())
        .bind(item.location_id.as_uuid())
        .bind(item.product_id.as_uuid())
        .bind(item.billing_schedule_period_id.map(|id| *id.as_uuid()))
        .bind(item.billing_date)
        .bind(item.billing_from)
        .bind(item.billing_to)
        .bind(item.quantity.map(|q| to_i32(q, "quantity")).transpose()?)
        .bind(to_i32(item.ratio.numerator(), "billing_ratio_numerator")?)
        .bind(to_i32(item.ratio.denominator(), "billing_ratio_denominator")?)
        .bind(item.price)
        .bind(item.discount_id.map(|id| *id.as_uuid()))
        .bind(item.discount_amount)
        .bind(item.tax_id.map(|id| *id.as_uuid()))
        .bind(item.tax_percentage)
        .bind(item.tax_category.map(|c| c.as_str()))
        .bind(item.tax_amount)
        .bind(item.final_price)
        .bind(item.adjustment_price)
        .bind(item.is_cancel_bill_item)
        .bind(item.status.as_str())
        .bind(item.bill_type.as_str())
        .bind(item.package_associated_id.map(|id| *id.as_uuid()))
        .bind(item.previous_bill_item_id.map(|id| *id.as_uuid()))
        .bind(item.created_at)
        .execute(&mut *conn)
        .await?;
        Ok(())
    }

    /// Writes the cancellation state of an existing bill item
    ///
    /// # Errors
    ///
    /// `DatabaseError::NotFound` when the item does not exist.
    pub async fn update(conn: &mut PgConnection, item: &BillItem) -> Result<(), DatabaseError> {
        let affected = sqlx::query(
            r#"
            UPDATE bill_item
            SET adjustment_price = $2,
                is_cancel_bill_item = $3,
                bill_status = $4
            WHERE bill_item_id = $1
            "#,
        )
        .bind(item.id.as_uuid())
        .bind(item.adjustment_price)
        .bind(item.is_cancel_bill_item)
        .bind(item.status.as_str())
        .execute(&mut *conn)
        .await?
        .rows_affected();

        if affected == 0 {
            return Err(DatabaseError::not_found("BillItem", item.id));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain_order::{BillStatus, BillType};
    use rust_decimal_macros::dec;

    fn row() -> BillItemRow {
        BillItemRow {
            bill_item_id: Uuid::new_v4(),
            order_id: Uuid::new_v4(),
            student_product_id: Uuid::new_v4(),
            student_id: Uuid::new_v4(),
            location_id: Uuid::new_v4(),
            product_id: Uuid::new_v4(),
            billing_schedule_period_id: Some(Uuid::new_v4()),
            billing_date: NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(),
            billing_from: NaiveDate::from_ymd_opt(2024, 2, 1),
            billing_to: NaiveDate::from_ymd_opt(2024, 2, 29),
            quantity: None,
            billing_ratio_numerator: 1,
            billing_ratio_denominator: 2,
            price: dec!(150),
            discount_id: None,
            discount_amount: None,
            tax_id: Some(Uuid::new_v4()),
            tax_percentage: Some(dec!(20)),
            tax_category: Some("TAX_CATEGORY_INCLUSIVE".to_string()),
            tax_amount: Some(dec!(25)),
            final_price: dec!(150),
            adjustment_price: Some(dec!(-150)),
            is_cancel_bill_item: true,
            bill_status: "PENDING".to_string(),
            bill_type: "UPCOMING_BILLING".to_string(),
            package_associated_id: None,
            previous_bill_item_id: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_row_conversion() {
        let item = BillItem::try_from(row()).unwrap();
        assert_eq!(item.ratio, Ratio::new(1, 2).unwrap());
        assert_eq!(item.status, BillStatus::Pending);
        assert_eq!(item.bill_type, BillType::UpcomingBilling);
        assert!(item.is_cancel_bill_item);
        assert_eq!(item.adjustment_price, Some(dec!(-150)));
    }

    #[test]
    fn test_invalid_ratio_rejected() {
        let mut bad = row();
        bad.billing_ratio_denominator = 0;
        assert!(matches!(BillItem::try_from(bad), Err(DatabaseError::InvalidValue(_))));
    }

    #[test]
    fn test_unknown_status_rejected() {
        let mut bad = row();
        bad.bill_status = "INVOICED".to_string();
        assert!(BillItem::try_from(bad).is_err());
    }

    proptest::proptest! {
        #[test]
        fn stored_ratio_survives_conversion(den in 1i32..=31, pick in 0i32..=31) {
            let num = pick.min(den);
            let mut stored = row();
            stored.billing_ratio_numerator = num;
            stored.billing_ratio_denominator = den;
            let item = BillItem::try_from(stored).unwrap();
            proptest::prop_assert_eq!(item.ratio.numerator() as i32, num);
            proptest::prop_assert_eq!(item.ratio.denominator() as i32, den);
        }

        #[test]
        fn negative_ratio_parts_are_rejected(num in i32::MIN..0) {
            let mut stored = row();
            stored.billing_ratio_numerator = num;
            proptest::prop_assert!(BillItem::try_from(stored).is_err());
        }
    }
}
