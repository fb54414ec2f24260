//! Student product repository
//!
//! Student products are versioned. Writers lock the row with
//! `SELECT ... FOR UPDATE` and update it only where the stored version equals
//! the version they read:
//!
//! ```text
//! UPDATE student_product SET ..., version_number = $expected + 1
//! WHERE student_product_id = $id AND version_number = $expected
//! ```
//!
//! Zero affected rows means someone else changed it first.

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::PgConnection;
use tracing::{debug, instrument};
use uuid::Uuid;

use core_kernel::{ProductId, StudentId, StudentProductId};
use domain_order::StudentProduct;
use super::{to_i32, to_u32};
use crate::error::DatabaseError;

const COLUMNS: &str = r#"
    student_product_id, student_id, location_id, product_id, start_date, end_date,
    product_status, student_product_label, version_number, root_student_product_id,
    updated_from_student_product_id, updated_to_student_product_id, is_associated,
    discount_id, quantity, created_at, updated_at
"#;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct StudentProductRow {
    pub student_product_id: Uuid,
    pub student_id: Uuid,
    pub location_id: Uuid,
    pub product_id: Uuid,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub product_status: String,
    pub student_product_label: String,
    pub version_number: i32,
    pub root_student_product_id: Option<Uuid>,
    pub updated_from_student_product_id: Option<Uuid>,
    pub updated_to_student_product_id: Option<Uuid>,
    pub is_associated: bool,
    pub discount_id: Option<Uuid>,
    pub quantity: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<StudentProductRow> for StudentProduct {
    type Error = DatabaseError;

    fn try_from(row: StudentProductRow) -> Result<Self, Self::Error> {
        Ok(StudentProduct {
            id: row.student_product_id.into(),
            student_id: row.student_id.into(),
            location_id: row.location_id.into(),
            product_id: row.product_id.into(),
            start_date: row.start_date,
            end_date: row.end_date,
            label: row.student_product_label.parse().map_err(DatabaseError::invalid_value)?,
            status: row.product_status.parse().map_err(DatabaseError::invalid_value)?,
            version_number: row.version_number,
            root_student_product_id: row.root_student_product_id.map(Into::into),
            updated_from_student_product_id: row.updated_from_student_product_id.map(Into::into),
            updated_to_student_product_id: row.updated_to_student_product_id.map(Into::into),
            is_associated: row.is_associated,
            discount_id: row.discount_id.map(Into::into),
            quantity: row.quantity.map(|q| to_u32(q, "quantity")).transpose()?,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct StudentProductRepository;

impl StudentProductRepository {
    pub async fn find(
        conn: &mut PgConnection,
        id: StudentProductId,
    ) -> Result<Option<StudentProduct>, DatabaseError> {
        let row: Option<StudentProductRow> = sqlx::query_as(&format!(
            "SELECT {COLUMNS} FROM student_product WHERE student_product_id = $1"
        ))
        .bind(id.as_uuid())
        .fetch_optional(&mut *conn)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// Reads a student product and locks it until the transaction ends
    #[instrument(skip(conn), fields(student_product_id = %id))]
    pub async fn find_for_update(
        conn: &mut PgConnection,
        id: StudentProductId,
    ) -> Result<Option<StudentProduct>, DatabaseError> {
        let row: Option<StudentProductRow> = sqlx::query_as(&format!(
            "SELECT {COLUMNS} FROM student_product WHERE student_product_id = $1 FOR UPDATE"
        ))
        .bind(id.as_uuid())
        .fetch_optional(&mut *conn)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// All student products of a student for one product, oldest first
    pub async fn find_by_student_and_product(
        conn: &mut PgConnection,
        student_id: StudentId,
        product_id: ProductId,
    ) -> Result<Vec<StudentProduct>, DatabaseError> {
        let rows: Vec<StudentProductRow> = sqlx::query_as(&format!(
            r#"
            SELECT {COLUMNS} FROM student_product
            WHERE student_id = $1 AND product_id = $2
            ORDER BY start_date, created_at
            "#
        ))
        .bind(student_id.as_uuid())
        .bind(product_id.as_uuid())
        .fetch_all(&mut *conn)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    pub async fn insert(conn: &mut PgConnection, sp: &StudentProduct) -> Result<(), DatabaseError> {
        sqlx::query(&format!(
            r#"
            INSERT INTO student_product ({COLUMNS})
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)
            "#
        ))
        .bind(sp.id.as_uuid())
        .bind(sp.student_id.as_uuid())
        .bind(sp.location_id.as_uuid())
        .bind(sp.product_id.as_uuid())
        .bind(sp.start_date)
        .bind(sp.end_date)
        .bind(sp.status.as_str())
        .bind(sp.label.as_str())
        .bind(sp.version_number)
        .bind(sp.root_student_product_id.map(|id| *id.as_uuid()))
        .bind(sp.updated_from_student_product_id.map(|id| *id.as_uuid()))
        .bind(sp.updated_to_student_product_id.map(|id| *id.as_uuid()))
        .bind(sp.is_associated)
        .bind(sp.discount_id.map(|id| *id.as_uuid()))
        .bind(sp.quantity.map(|q| to_i32(q, "quantity")).transpose()?)
        .bind(sp.created_at)
        .bind(sp.updated_at)
        .execute(&mut *conn)
        .await?;
        Ok(())
    }

    /// Writes the mutable fields of a student product if its version is unchanged
    ///
    /// # Returns
    ///
    /// `true` when the row was updated, `false` when the stored version no
    /// longer equals `expected_version`.
    #[instrument(skip(conn, sp), fields(student_product_id = %sp.id, expected_version))]
    pub async fn update_versioned(
        conn: &mut PgConnection,
        sp: &StudentProduct,
        expected_version: i32,
    ) -> Result<bool, DatabaseError> {
        let affected = sqlx::query(
            r#"
            UPDATE student_product
            SET end_date = $3,
                product_status = $4,
                student_product_label = $5,
                updated_to_student_product_id = $6,
                discount_id = $7,
                quantity = $8,
                updated_at = $9,
                version_number = $2 + 1
            WHERE student_product_id = $1 AND version_number = $2
            "#,
        )
        .bind(sp.id.as_uuid())
        .bind(expected_version)
        .bind(sp.end_date)
        .bind(sp.status.as_str())
        .bind(sp.label.as_str())
        .bind(sp.updated_to_student_product_id.map(|id| *id.as_uuid()))
        .bind(sp.discount_id.map(|id| *id.as_uuid()))
        .bind(sp.quantity.map(|q| to_i32(q, "quantity")).transpose()?)
        .bind(sp.updated_at)
        .execute(&mut *conn)
        .await?
        .rows_affected();

        debug!(affected, "Versioned student product update");
        Ok(affected == 1)
    }

    pub async fn current_version(
        conn: &mut PgConnection,
        id: StudentProductId,
    ) -> Result<Option<i32>, DatabaseError> {
        let version = sqlx::query_scalar("SELECT version_number FROM student_product WHERE student_product_id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&mut *conn)
            .await?;
        Ok(version)
    }
}
