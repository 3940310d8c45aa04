//! Events the host environment delivers to the offload pipeline.
//!
//! The host (upload pipeline, CMS hooks) translates its own callbacks into
//! these typed events and hands them to the intake hook. Identifiers travel
//! inside the event; nothing is correlated through ambient state.

pub mod upload;

pub use upload::{UploadEvent, UploadVariant};
