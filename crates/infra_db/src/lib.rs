//! Infrastructure Database Layer
//!
//! PostgreSQL persistence for the order system using SQLx: catalog master
//! data, student enrollment and discount tags, orders, versioned student
//! products, bill items and student package records.
//!
//! # Architecture
//!
//! The crate follows the repository pattern. Repositories own the SQL and
//! the row mapping; [`adapters::PgOrderStore`] composes them into the order
//! domain's `OrderStore` port so one database transaction covers each order.
//!
//! # Example
//!
//! ```rust,ignore
//! use infra_db::{create_pool_from_url, run_migrations, PgOrderStore};
//!
//! let pool = create_pool_from_url("postgres://localhost/orders").await?;
//! run_migrations(&pool).await?;
//! let store = PgOrderStore::new(pool);
//! ```

pub mod adapters;
pub mod error;
pub mod pool;
pub mod repositories;

pub use adapters::{PgOrderStore, PgOrderTransaction};
pub use error::DatabaseError;
pub use pool::{create_pool, create_pool_from_url, run_migrations, DatabaseConfig, DatabasePool};
