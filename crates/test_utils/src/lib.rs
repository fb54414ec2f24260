//! Test Utilities Crate
//!
//! Provides shared test infrastructure, fixtures, and helpers for the
//! order system test suite.
//!
//! # Modules
//!
//! - `fixtures`: Pre-built dates, ids and generated names
//! - `builders`: Builders for catalogs, order requests and billing items
//! - `scenarios`: Named catalog scenarios and an in-memory order harness
//! - `database`: PostgreSQL container management for integration tests
//! - `assertions`: Assertion helpers for bill items and order errors
//! - `generators`: Property-based test data generators

pub mod assertions;
pub mod builders;
pub mod database;
pub mod fixtures;
pub mod generators;
pub mod scenarios;

pub use assertions::*;
pub use builders::*;
pub use database::*;
pub use fixtures::*;
pub use generators::*;
pub use scenarios::*;
