//! Offload queue job entities.

pub mod model;
pub mod status;

pub use model::{MAX_FILE_PATH_LEN, QueueJob};
pub use status::{JobStatus, StatusCounts};
