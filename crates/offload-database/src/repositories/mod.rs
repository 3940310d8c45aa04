//! PostgreSQL implementations of the persistence traits.

pub mod queue;
pub mod resource;

pub use queue::QueueRepository;
pub use resource::ResourceRepository;
