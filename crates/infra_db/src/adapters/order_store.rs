//! PostgreSQL Order Store
//!
//! Implements the order domain's storage ports on top of the repositories.
//! Each order runs in one database transaction; student products read for a
//! change are locked with `FOR UPDATE` and written back with a version check.
//!
//! # Example
//!
//! ```rust,ignore
//! use infra_db::adapters::PgOrderStore;
//! use domain_order::OrderService;
//!
//! let store = PgOrderStore::new(pool);
//! let service = OrderService::new(store, publisher, clock);
//! let order_id = service.create_order(request).await?;
//! ```

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Transaction};
use tracing::{debug, instrument, warn};

use core_kernel::{LocationId, ProductId, StudentId, StudentProductId};
use domain_catalog::Catalog;
use domain_order::{
    BillItem, Order, OrderError, OrderStore, OrderTransaction, StudentContext, StudentPackage,
    StudentProduct,
};

use crate::error::DatabaseError;
use crate::repositories::{
    BillItemRepository, CatalogRepository, OrderRepository, StudentPackageRepository,
    StudentProductRepository, StudentRepository,
};

/// PostgreSQL-backed [`OrderStore`]
#[derive(Debug, Clone)]
pub struct PgOrderStore {
    pool: PgPool,
    catalog: CatalogRepository,
    students: StudentRepository,
}

impl PgOrderStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            catalog: CatalogRepository::new(pool.clone()),
            students: StudentRepository::new(pool.clone()),
            pool,
        }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Checks that the database answers a trivial query
    pub async fn health_check(&self) -> Result<(), DatabaseError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

#[async_trait]
impl OrderStore for PgOrderStore {
    type Tx = PgOrderTransaction;

    async fn load_catalog(&self, product_ids: &[ProductId]) -> Result<Catalog, OrderError> {
        Ok(self.catalog.load_snapshot(product_ids).await?)
    }

    async fn load_student_context(
        &self,
        student_id: StudentId,
        location_id: LocationId,
    ) -> Result<StudentContext, OrderError> {
        Ok(self.students.load_context(student_id, location_id).await?)
    }

    async fn student_product(&self, id: StudentProductId) -> Result<Option<StudentProduct>, OrderError> {
        let mut conn = self.pool.acquire().await.map_err(DatabaseError::from)?;
        Ok(StudentProductRepository::find(&mut conn, id).await?)
    }

    async fn bill_items(&self, student_product_id: StudentProductId) -> Result<Vec<BillItem>, OrderError> {
        let mut conn = self.pool.acquire().await.map_err(DatabaseError::from)?;
        Ok(BillItemRepository::find_by_student_product(&mut conn, student_product_id).await?)
    }

    #[instrument(skip(self))]
    async fn begin(&self) -> Result<Self::Tx, OrderError> {
        let tx = self.pool.begin().await.map_err(DatabaseError::from)?;
        debug!("Order transaction started");
        Ok(PgOrderTransaction { tx })
    }
}

/// One order's database transaction
///
/// Dropping it without calling `commit` rolls back every write.
pub struct PgOrderTransaction {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl OrderTransaction for PgOrderTransaction {
    async fn student_product_for_update(
        &mut self,
        id: StudentProductId,
    ) -> Result<Option<StudentProduct>, OrderError> {
        Ok(StudentProductRepository::find_for_update(&mut self.tx, id).await?)
    }

    async fn student_products_for(
        &mut self,
        student_id: StudentId,
        product_id: ProductId,
    ) -> Result<Vec<StudentProduct>, OrderError> {
        Ok(StudentProductRepository::find_by_student_and_product(&mut self.tx, student_id, product_id).await?)
    }

    async fn bill_items_for_student_product(
        &mut self,
        student_product_id: StudentProductId,
    ) -> Result<Vec<BillItem>, OrderError> {
        Ok(BillItemRepository::find_by_student_product(&mut self.tx, student_product_id).await?)
    }

    async fn student_package_for(
        &mut self,
        student_product_id: StudentProductId,
    ) -> Result<Option<StudentPackage>, OrderError> {
        Ok(StudentPackageRepository::find_active_for(&mut self.tx, student_product_id).await?)
    }

    #[instrument(skip(self, order), fields(order_id = %order.id))]
    async fn insert_order(&mut self, order: &Order) -> Result<(), OrderError> {
        Ok(OrderRepository::insert(&mut self.tx, order).await?)
    }

    async fn insert_student_product(&mut self, student_product: &StudentProduct) -> Result<(), OrderError> {
        Ok(StudentProductRepository::insert(&mut self.tx, student_product).await?)
    }

    async fn update_student_product(
        &mut self,
        student_product: &StudentProduct,
        expected_version: i32,
    ) -> Result<(), OrderError> {
        let updated =
            StudentProductRepository::update_versioned(&mut self.tx, student_product, expected_version).await?;
        if updated {
            return Ok(());
        }

        match StudentProductRepository::current_version(&mut self.tx, student_product.id).await? {
            Some(actual) => {
                warn!(
                    student_product_id = %student_product.id,
                    expected = expected_version,
                    actual,
                    "Student product version changed underneath the order"
                );
                Err(OrderError::StaleVersion {
                    student_product_id: student_product.id,
                    expected: expected_version,
                    actual,
                })
            }
            None => Err(OrderError::StudentProductNotFound(student_product.id)),
        }
    }

    async fn insert_bill_items(&mut self, items: &[BillItem]) -> Result<(), OrderError> {
        for item in items {
            BillItemRepository::insert(&mut self.tx, item).await?;
        }
        debug!(count = items.len(), "Bill items inserted");
        Ok(())
    }

    async fn update_bill_items(&mut self, items: &[BillItem]) -> Result<(), OrderError> {
        for item in items {
            BillItemRepository::update(&mut self.tx, item).await?;
        }
        debug!(count = items.len(), "Bill items updated");
        Ok(())
    }

    async fn upsert_student_package(&mut self, package: &StudentPackage) -> Result<(), OrderError> {
        Ok(StudentPackageRepository::upsert(&mut self.tx, package).await?)
    }

    #[instrument(skip(self))]
    async fn commit(self) -> Result<(), OrderError> {
        self.tx.commit().await.map_err(DatabaseError::from)?;
        debug!("Order transaction committed");
        Ok(())
    }
}
