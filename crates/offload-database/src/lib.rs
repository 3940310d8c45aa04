//! # offload-database
//!
//! Persistence for CDN Offload: the PostgreSQL connection pool and
//! migrations, the [`QueueStore`] and [`ResourceStore`] traits, and their
//! PostgreSQL and in-memory implementations.

pub mod connection;
pub mod memory;
pub mod migration;
pub mod repositories;
pub mod store;

pub use connection::DatabasePool;
pub use memory::{MemoryQueueStore, MemoryResourceStore};
pub use repositories::{QueueRepository, ResourceRepository};
pub use store::{QueueStore, ResourceStore};
