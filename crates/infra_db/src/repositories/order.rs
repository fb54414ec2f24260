//! Order repository

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::PgConnection;
use uuid::Uuid;

use core_kernel::OrderId;
use domain_order::Order;
use crate::error::DatabaseError;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct OrderRow {
    pub order_id: Uuid,
    pub student_id: Uuid,
    pub location_id: Uuid,
    pub order_type: String,
    pub order_comment: Option<String>,
    pub order_date: NaiveDate,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<OrderRow> for Order {
    type Error = DatabaseError;

    fn try_from(row: OrderRow) -> Result<Self, Self::Error> {
        Ok(Order {
            id: row.order_id.into(),
            student_id: row.student_id.into(),
            location_id: row.location_id.into(),
            order_type: row.order_type.parse().map_err(DatabaseError::invalid_value)?,
            order_comment: row.order_comment,
            order_date: row.order_date,
            created_at: row.created_at,
        })
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct OrderRepository;

impl OrderRepository {
    pub async fn insert(conn: &mut PgConnection, order: &Order) -> Result<(), DatabaseError> {
        sqlx::query(
            r#"
            INSERT INTO orders (
                order_id, student_id, location_id, order_type, order_comment, order_date, created_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(order.id.as_uuid())
        .bind(order.student_id.as_uuid())
        .bind(order.location_id.as_uuid())
        .bind(order.order_type.as_str())
        .bind(&order.order_comment)
        .bind(order.order_date)
        .bind(order.created_at)
        .execute(&mut *conn)
        .await?;
        Ok(())
    }

    pub async fn find(conn: &mut PgConnection, id: OrderId) -> Result<Option<Order>, DatabaseError> {
        let row: Option<OrderRow> = sqlx::query_as(
            r#"
            SELECT order_id, student_id, location_id, order_type, order_comment, order_date, created_at
            FROM orders
            WHERE order_id = $1
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&mut *conn)
        .await?;

        row.map(TryInto::try_into).transpose()
    }
}
