//! Remote store provider implementations.

pub mod bunny;
