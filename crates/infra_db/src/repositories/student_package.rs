//! Student package repository
//!
//! Course picks are stored as a JSONB array on the package record.

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::types::Json;
use sqlx::PgConnection;
use uuid::Uuid;

use core_kernel::StudentProductId;
use domain_order::{CourseItem, StudentPackage};
use crate::error::DatabaseError;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct StudentPackageRow {
    pub student_package_id: Uuid,
    pub student_id: Uuid,
    pub package_id: Uuid,
    pub student_product_id: Uuid,
    pub order_id: Uuid,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub course_items: Json<Vec<CourseItem>>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<StudentPackageRow> for StudentPackage {
    fn from(row: StudentPackageRow) -> Self {
        StudentPackage {
            id: row.student_package_id.into(),
            student_id: row.student_id.into(),
            package_id: row.package_id.into(),
            student_product_id: row.student_product_id.into(),
            order_id: row.order_id.into(),
            start_date: row.start_date,
            end_date: row.end_date,
            course_items: row.course_items.0,
            is_active: row.is_active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct StudentPackageRepository;

impl StudentPackageRepository {
    /// The active package record of a student product, newest first
    pub async fn find_active_for(
        conn: &mut PgConnection,
        student_product_id: StudentProductId,
    ) -> Result<Option<StudentPackage>, DatabaseError> {
        let row: Option<StudentPackageRow> = sqlx::query_as(
            r#"
            SELECT student_package_id, student_id, package_id, student_product_id, order_id,
                   start_date, end_date, course_items, is_active, created_at, updated_at
            FROM student_packages_by_order
            WHERE student_product_id = $1 AND is_active
            ORDER BY start_date DESC, created_at DESC
            LIMIT 1
            "#,
        )
        .bind(student_product_id.as_uuid())
        .fetch_optional(&mut *conn)
        .await?;

        Ok(row.map(Into::into))
    }

    /// All package records of a student product, oldest first
    pub async fn find_by_student_product(
        conn: &mut PgConnection,
        student_product_id: StudentProductId,
    ) -> Result<Vec<StudentPackage>, DatabaseError> {
        let rows: Vec<StudentPackageRow> = sqlx::query_as(
            r#"
            SELECT student_package_id, student_id, package_id, student_product_id, order_id,
                   start_date, end_date, course_items, is_active, created_at, updated_at
            FROM student_packages_by_order
            WHERE student_product_id = $1
            ORDER BY start_date, created_at
            "#,
        )
        .bind(student_product_id.as_uuid())
        .fetch_all(&mut *conn)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    pub async fn upsert(conn: &mut PgConnection, package: &StudentPackage) -> Result<(), DatabaseError> {
        sqlx::query(
            r#"
            INSERT INTO student_packages_by_order (
                student_package_id, student_id, package_id, student_product_id, order_id,
                start_date, end_date, course_items, is_active, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            ON CONFLICT (student_package_id) DO UPDATE SET
                end_date = EXCLUDED.end_date,
                course_items = EXCLUDED.course_items,
                is_active = EXCLUDED.is_active,
                updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(package.id.as_uuid())
        .bind(package.student_id.as_uuid())
        .bind(package.package_id.as_uuid())
        .bind(package.student_product_id.as_uuid())
        .bind(package.order_id.as_uuid())
        .bind(package.start_date)
        .bind(package.end_date)
        .bind(Json(&package.course_items))
        .bind(package.is_active)
        .bind(package.created_at)
        .bind(package.updated_at)
        .execute(&mut *conn)
        .await?;
        Ok(())
    }
}
