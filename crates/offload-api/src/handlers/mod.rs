//! Route handlers organized by domain.

pub mod health;
pub mod intake;
pub mod offload;
