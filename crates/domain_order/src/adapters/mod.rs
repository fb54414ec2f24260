//! Adapters for the order ports
//!
//! - **InMemoryOrderStore**: process-local storage with transactional staging
//! - **RecordingPublisher** / **NoopPublisher**: event sinks for tests and
//!   deployments without a message bus
//!
//! The PostgreSQL store lives in `infra_db`.

pub mod memory;
pub mod publisher;

pub use memory::{InMemoryOrderStore, InMemoryTransaction, MemoryState};
pub use publisher::{NoopPublisher, RecordingPublisher};
