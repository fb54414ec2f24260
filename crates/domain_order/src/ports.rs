//! Order Domain Ports
//!
//! This module defines the storage and messaging interfaces the order service
//! depends on, so the lifecycle can run against PostgreSQL (infra_db), the
//! in-memory adapter, or a test double.
//!
//! # Transactions
//!
//! Every order runs inside one [`OrderTransaction`]. Reads that precede a
//! write (`student_product_for_update`) lock the row, and
//! `update_student_product` only succeeds when the stored version equals the
//! expected one. Dropping a transaction without `commit` discards all writes.
//!
//! ```text
//! OrderStore::begin ─► reads ─► validate ─► writes ─► commit
//!                                   │
//!                                   └─► error: drop (rollback)
//! ```

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use core_kernel::{LocationId, OrderId, ProductId, StudentId, StudentProductId};
use domain_catalog::{Catalog, UserDiscountTag};
use crate::bill_item::BillItem;
use crate::error::OrderError;
use crate::events::OrderEvent;
use crate::request::{CreateOrderRequest, OrderType};
use crate::student_package::StudentPackage;
use crate::student_product::StudentProduct;

/// A committed order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub student_id: StudentId,
    pub location_id: LocationId,
    pub order_type: OrderType,
    pub order_comment: Option<String>,
    pub order_date: NaiveDate,
    pub created_at: DateTime<Utc>,
}

impl Order {
    pub fn from_request(request: &CreateOrderRequest, order_date: NaiveDate) -> Self {
        Self {
            id: OrderId::new_v7(),
            student_id: request.student_id,
            location_id: request.location_id,
            order_type: request.order_type,
            order_comment: request.order_comment.clone(),
            order_date,
            created_at: Utc::now(),
        }
    }
}

/// Enrollment status and discount tags of a student at a location
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentContext {
    pub student_id: StudentId,
    pub location_id: LocationId,
    pub enrolled: bool,
    pub tags: Vec<UserDiscountTag>,
}

impl StudentContext {
    /// A student with no enrollment and no tags
    pub fn unenrolled(student_id: StudentId, location_id: LocationId) -> Self {
        Self {
            student_id,
            location_id,
            enrolled: false,
            tags: Vec::new(),
        }
    }
}

/// Entry point to order storage
#[async_trait]
pub trait OrderStore: Send + Sync {
    type Tx: OrderTransaction;

    /// Loads the master data needed to price the given products
    async fn load_catalog(&self, product_ids: &[ProductId]) -> Result<Catalog, OrderError>;

    async fn load_student_context(
        &self,
        student_id: StudentId,
        location_id: LocationId,
    ) -> Result<StudentContext, OrderError>;

    /// Reads a student product outside any transaction
    async fn student_product(&self, id: StudentProductId) -> Result<Option<StudentProduct>, OrderError>;

    async fn bill_items(&self, student_product_id: StudentProductId) -> Result<Vec<BillItem>, OrderError>;

    async fn begin(&self) -> Result<Self::Tx, OrderError>;
}

/// Unit of work covering one order
#[async_trait]
pub trait OrderTransaction: Send {
    /// Reads and locks a student product
    async fn student_product_for_update(
        &mut self,
        id: StudentProductId,
    ) -> Result<Option<StudentProduct>, OrderError>;

    async fn student_products_for(
        &mut self,
        student_id: StudentId,
        product_id: ProductId,
    ) -> Result<Vec<StudentProduct>, OrderError>;

    async fn bill_items_for_student_product(
        &mut self,
        student_product_id: StudentProductId,
    ) -> Result<Vec<BillItem>, OrderError>;

    /// The active package record of a student product
    async fn student_package_for(
        &mut self,
        student_product_id: StudentProductId,
    ) -> Result<Option<StudentPackage>, OrderError>;

    async fn insert_order(&mut self, order: &Order) -> Result<(), OrderError>;

    async fn insert_student_product(&mut self, student_product: &StudentProduct) -> Result<(), OrderError>;

    /// Writes a student product if the stored version equals `expected_version`
    ///
    /// # Errors
    ///
    /// `OrderError::StaleVersion` when another writer got there first.
    async fn update_student_product(
        &mut self,
        student_product: &StudentProduct,
        expected_version: i32,
    ) -> Result<(), OrderError>;

    async fn insert_bill_items(&mut self, items: &[BillItem]) -> Result<(), OrderError>;

    async fn update_bill_items(&mut self, items: &[BillItem]) -> Result<(), OrderError>;

    async fn upsert_student_package(&mut self, package: &StudentPackage) -> Result<(), OrderError>;

    async fn commit(self) -> Result<(), OrderError>;
}

/// Outbound event channel
#[async_trait]
pub trait EventPublisher: Send + Sync {
    async fn publish(&self, event: &OrderEvent) -> Result<(), OrderError>;
}
