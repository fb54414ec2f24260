//! Order Domain
//!
//! This crate turns create-order requests into student products, bill items
//! and package records, following the student product lifecycle.
//!
//! # Flow
//!
//! ```text
//! CreateOrderRequest
//!   │
//!   ├─► CourseValidator        (package course and slot checks)
//!   ├─► BillingCalculator      (domain_pricing: periods, price, discount, tax)
//!   ├─► lifecycle::plan_*      (new / update / cancel / withdrawal / graduation)
//!   ├─► verify_billing_items   (client-submitted amounts)
//!   └─► OrderTransaction       (one atomic write, then events)
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use domain_order::{OrderService, adapters::{InMemoryOrderStore, NoopPublisher}};
//!
//! let store = Arc::new(InMemoryOrderStore::new(catalog));
//! let service = OrderService::new(store, Arc::new(NoopPublisher), Arc::new(OrgClock::default()));
//! let order_id = service.create_order(request).await?;
//! ```

pub mod adapters;
pub mod bill_item;
pub mod courses;
pub mod discount_sync;
pub mod error;
pub mod events;
pub mod lifecycle;
pub mod ports;
pub mod request;
pub mod service;
pub mod student_package;
pub mod student_product;

pub use bill_item::{BillItem, BillStatus, BillType};
pub use courses::CourseValidator;
pub use discount_sync::DiscountSyncHandler;
pub use error::{ErrorCode, OrderError};
pub use events::{OrderEvent, UpdateProductDiscount, SUBJECT_UPDATE_STUDENT_PRODUCT_CREATED};
pub use lifecycle::{
    plan_cancel, plan_graduation, plan_new, plan_update, plan_withdrawal, Changes, CurrentState,
    PlanContext, PricedItem, VersionedUpdate,
};
pub use ports::{EventPublisher, Order, OrderStore, OrderTransaction, StudentContext};
pub use request::{
    BillingItem, CourseItem, CreateOrderRequest, DiscountItem, OrderItem, OrderType, TaxItem,
};
pub use service::{OrderService, StudentProductView};
pub use student_package::StudentPackage;
pub use student_product::{LifecycleState, StudentProduct, StudentProductLabel, StudentProductStatus};
