//! # offload-entity
//!
//! Records persisted by CDN Offload. Every struct in this crate represents
//! a database table row or a value object derived from one. All entities
//! derive `Debug`, `Clone`, `Serialize`, `Deserialize`, and database
//! entities additionally derive `sqlx::FromRow`.

pub mod job;
pub mod resource;
