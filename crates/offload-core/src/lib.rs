//! # offload-core
//!
//! Core crate for CDN Offload. Contains configuration schemas, typed
//! identifiers, the clock abstraction, domain events, collaborator traits
//! and the unified error system.
//!
//! This crate has **no** internal dependencies on other offload crates.

pub mod config;
pub mod error;
pub mod events;
pub mod result;
pub mod traits;
pub mod types;

pub use error::AppError;
pub use result::AppResult;
