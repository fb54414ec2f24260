//! In-memory order store
//!
//! Keeps all rows in process memory behind a single async mutex. A
//! transaction holds the lock for its whole lifetime and works on a staged
//! copy that replaces the shared state on commit, so an abandoned
//! transaction leaves nothing behind.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};

use core_kernel::{BillItemId, LocationId, OrderId, ProductId, StudentId, StudentPackageId, StudentProductId};
use domain_catalog::Catalog;
use crate::bill_item::BillItem;
use crate::error::OrderError;
use crate::ports::{Order, OrderStore, OrderTransaction, StudentContext};
use crate::student_package::StudentPackage;
use crate::student_product::StudentProduct;

/// Rows held by the in-memory store
#[derive(Debug, Clone, Default)]
pub struct MemoryState {
    pub orders: HashMap<OrderId, Order>,
    pub student_products: HashMap<StudentProductId, StudentProduct>,
    pub bill_items: HashMap<BillItemId, BillItem>,
    pub student_packages: HashMap<StudentPackageId, StudentPackage>,
}

impl MemoryState {
    fn bill_items_for(&self, student_product_id: StudentProductId) -> Vec<BillItem> {
        let mut items: Vec<BillItem> = self
            .bill_items
            .values()
            .filter(|b| b.student_product_id == student_product_id)
            .cloned()
            .collect();
        items.sort_by_key(|b| (b.billing_date, b.billing_from));
        items
    }
}

/// Order store backed by process memory
#[derive(Debug, Clone, Default)]
pub struct InMemoryOrderStore {
    catalog: Arc<RwLock<Catalog>>,
    contexts: Arc<RwLock<HashMap<(StudentId, LocationId), StudentContext>>>,
    state: Arc<Mutex<MemoryState>>,
}

impl InMemoryOrderStore {
    pub fn new(catalog: Catalog) -> Self {
        Self {
            catalog: Arc::new(RwLock::new(catalog)),
            ..Default::default()
        }
    }

    /// Replaces the catalog served to new orders
    pub async fn set_catalog(&self, catalog: Catalog) {
        *self.catalog.write().await = catalog;
    }

    pub async fn set_student_context(&self, context: StudentContext) {
        self.contexts
            .write()
            .await
            .insert((context.student_id, context.location_id), context);
    }

    /// Copy of every stored row
    pub async fn snapshot(&self) -> MemoryState {
        self.state.lock().await.clone()
    }

    pub async fn order(&self, id: OrderId) -> Option<Order> {
        self.state.lock().await.orders.get(&id).cloned()
    }
}

#[async_trait]
impl OrderStore for InMemoryOrderStore {
    type Tx = InMemoryTransaction;

    async fn load_catalog(&self, _product_ids: &[ProductId]) -> Result<Catalog, OrderError> {
        Ok(self.catalog.read().await.clone())
    }

    async fn load_student_context(
        &self,
        student_id: StudentId,
        location_id: LocationId,
    ) -> Result<StudentContext, OrderError> {
        Ok(self
            .contexts
            .read()
            .await
            .get(&(student_id, location_id))
            .cloned()
            .unwrap_or_else(|| StudentContext::unenrolled(student_id, location_id)))
    }

    async fn student_product(&self, id: StudentProductId) -> Result<Option<StudentProduct>, OrderError> {
        Ok(self.state.lock().await.student_products.get(&id).cloned())
    }

    async fn bill_items(&self, student_product_id: StudentProductId) -> Result<Vec<BillItem>, OrderError> {
        Ok(self.state.lock().await.bill_items_for(student_product_id))
    }

    async fn begin(&self) -> Result<InMemoryTransaction, OrderError> {
        let guard = self.state.clone().lock_owned().await;
        let staged = guard.clone();
        Ok(InMemoryTransaction { guard, staged })
    }
}

/// Transaction over the in-memory store
#[derive(Debug)]
pub struct InMemoryTransaction {
    guard: OwnedMutexGuard<MemoryState>,
    staged: MemoryState,
}

#[async_trait]
impl OrderTransaction for InMemoryTransaction {
    async fn student_product_for_update(
        &mut self,
        id: StudentProductId,
    ) -> Result<Option<StudentProduct>, OrderError> {
        Ok(self.staged.student_products.get(&id).cloned())
    }

    async fn student_products_for(
        &mut self,
        student_id: StudentId,
        product_id: ProductId,
    ) -> Result<Vec<StudentProduct>, OrderError> {
        Ok(self
            .staged
            .student_products
            .values()
            .filter(|sp| sp.student_id == student_id && sp.product_id == product_id)
            .cloned()
            .collect())
    }

    async fn bill_items_for_student_product(
        &mut self,
        student_product_id: StudentProductId,
    ) -> Result<Vec<BillItem>, OrderError> {
        Ok(self.staged.bill_items_for(student_product_id))
    }

    async fn student_package_for(
        &mut self,
        student_product_id: StudentProductId,
    ) -> Result<Option<StudentPackage>, OrderError> {
        Ok(self
            .staged
            .student_packages
            .values()
            .find(|p| p.student_product_id == student_product_id && p.is_active)
            .cloned())
    }

    async fn insert_order(&mut self, order: &Order) -> Result<(), OrderError> {
        self.staged.orders.insert(order.id, order.clone());
        Ok(())
    }

    async fn insert_student_product(&mut self, student_product: &StudentProduct) -> Result<(), OrderError> {
        if self.staged.student_products.contains_key(&student_product.id) {
            return Err(OrderError::storage(format!(
                "duplicate student product {}",
                student_product.id
            )));
        }
        self.staged
            .student_products
            .insert(student_product.id, student_product.clone());
        Ok(())
    }

    async fn update_student_product(
        &mut self,
        student_product: &StudentProduct,
        expected_version: i32,
    ) -> Result<(), OrderError> {
        let stored = self
            .staged
            .student_products
            .get_mut(&student_product.id)
            .ok_or(OrderError::StudentProductNotFound(student_product.id))?;
        if stored.version_number != expected_version {
            return Err(OrderError::StaleVersion {
                student_product_id: student_product.id,
                expected: expected_version,
                actual: stored.version_number,
            });
        }
        *stored = student_product.clone();
        stored.version_number = expected_version + 1;
        Ok(())
    }

    async fn insert_bill_items(&mut self, items: &[BillItem]) -> Result<(), OrderError> {
        for item in items {
            self.staged.bill_items.insert(item.id, item.clone());
        }
        Ok(())
    }

    async fn update_bill_items(&mut self, items: &[BillItem]) -> Result<(), OrderError> {
        for item in items {
            if !self.staged.bill_items.contains_key(&item.id) {
                return Err(OrderError::storage(format!("bill item {} does not exist", item.id)));
            }
            self.staged.bill_items.insert(item.id, item.clone());
        }
        Ok(())
    }

    async fn upsert_student_package(&mut self, package: &StudentPackage) -> Result<(), OrderError> {
        self.staged.student_packages.insert(package.id, package.clone());
        Ok(())
    }

    async fn commit(mut self) -> Result<(), OrderError> {
        *self.guard = std::mem::take(&mut self.staged);
        Ok(())
    }
}
