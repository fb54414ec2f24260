//! Student enrollment and discount tags

use chrono::NaiveDate;
use sqlx::PgPool;
use tracing::instrument;
use uuid::Uuid;

use core_kernel::{LocationId, StudentId};
use domain_catalog::UserDiscountTag;
use domain_order::StudentContext;
use crate::error::DatabaseError;

/// Enrollment status value marking an enrolled student
pub const ENROLLED: &str = "STUDENT_ENROLLMENT_STATUS_ENROLLED";

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct DiscountTagRow {
    pub student_id: Uuid,
    pub location_id: Uuid,
    pub discount_type: String,
    pub discount_id: Uuid,
    pub valid_from: NaiveDate,
    pub valid_until: Option<NaiveDate>,
}

impl TryFrom<DiscountTagRow> for UserDiscountTag {
    type Error = DatabaseError;

    fn try_from(row: DiscountTagRow) -> Result<Self, Self::Error> {
        Ok(UserDiscountTag {
            student_id: row.student_id.into(),
            location_id: row.location_id.into(),
            discount_type: row.discount_type.parse().map_err(DatabaseError::invalid_value)?,
            discount_id: row.discount_id.into(),
            valid_from: row.valid_from,
            valid_until: row.valid_until,
        })
    }
}

#[derive(Debug, Clone)]
pub struct StudentRepository {
    pool: PgPool,
}

impl StudentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Loads enrollment status and discount tags of a student at a location
    #[instrument(skip(self), fields(student_id = %student_id, location_id = %location_id))]
    pub async fn load_context(
        &self,
        student_id: StudentId,
        location_id: LocationId,
    ) -> Result<StudentContext, DatabaseError> {
        let status: Option<String> = sqlx::query_scalar(
            "SELECT enrollment_status FROM student_enrollment WHERE student_id = $1 AND location_id = $2",
        )
        .bind(student_id.as_uuid())
        .bind(location_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        let tags: Vec<DiscountTagRow> = sqlx::query_as(
            r#"
            SELECT student_id, location_id, discount_type, discount_id, valid_from, valid_until
            FROM user_discount_tag
            WHERE student_id = $1 AND location_id = $2
            ORDER BY valid_from
            "#,
        )
        .bind(student_id.as_uuid())
        .bind(location_id.as_uuid())
        .fetch_all(&self.pool)
        .await?;

        Ok(StudentContext {
            student_id,
            location_id,
            enrolled: status.as_deref() == Some(ENROLLED),
            tags: tags.into_iter().map(TryInto::try_into).collect::<Result<_, _>>()?,
        })
    }

    /// Records a student's enrollment status
    pub async fn set_enrollment(
        &self,
        student_id: StudentId,
        location_id: LocationId,
        status: &str,
    ) -> Result<(), DatabaseError> {
        sqlx::query(
            r#"
            INSERT INTO student_enrollment (student_id, location_id, enrollment_status)
            VALUES ($1, $2, $3)
            ON CONFLICT (student_id, location_id) DO UPDATE SET enrollment_status = EXCLUDED.enrollment_status
            "#,
        )
        .bind(student_id.as_uuid())
        .bind(location_id.as_uuid())
        .bind(status)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn insert_tag(&self, tag: &UserDiscountTag) -> Result<(), DatabaseError> {
        sqlx::query(
            r#"
            INSERT INTO user_discount_tag (
                user_discount_tag_id, student_id, location_id, discount_type,
                discount_id, valid_from, valid_until
            ) VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(Uuid::now_v7())
        .bind(tag.student_id.as_uuid())
        .bind(tag.location_id.as_uuid())
        .bind(tag.discount_type.as_str())
        .bind(tag.discount_id.as_uuid())
        .bind(tag.valid_from)
        .bind(tag.valid_until)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
