//! Per-resource offload state.

pub mod model;

pub use model::{OffloadState, OffloadSummary, ResourceOffload};
