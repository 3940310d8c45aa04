//! HTTP API for CDN Offload.
//!
//! Exposes the manual triggers ("process now", "retry failed", status),
//! the upload intake hook the host calls after each upload, and public URL
//! resolution. Everything is mounted under `/api`.

pub mod dto;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod state;

pub use error::ApiError;
pub use router::build_router;
pub use state::AppState;

#[cfg(test)]
mod tests;
