//! In-memory stores using a Tokio mutex for single-node deployments and
//! tests.

pub mod queue;
pub mod resource;

pub use queue::MemoryQueueStore;
pub use resource::MemoryResourceStore;
