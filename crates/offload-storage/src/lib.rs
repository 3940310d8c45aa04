//! # offload-storage
//!
//! Remote object store implementations for CDN Offload. Currently ships
//! the Bunny.net storage-zone client, plus the remote-key derivation and
//! MIME detection it relies on.

pub mod key;
pub mod mime;
pub mod providers;

pub use providers::bunny::BunnyStore;
