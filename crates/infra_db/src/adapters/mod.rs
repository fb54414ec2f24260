//! Domain Adapters
//!
//! Implementations of the order domain's ports backed by PostgreSQL.
//!
//! # Usage
//!
//! ```rust,ignore
//! use infra_db::adapters::PgOrderStore;
//! use domain_order::OrderStore;
//!
//! let store = PgOrderStore::new(pool);
//! let mut tx = store.begin().await?;
//! ```

pub mod order_store;

pub use order_store::{PgOrderStore, PgOrderTransaction};
