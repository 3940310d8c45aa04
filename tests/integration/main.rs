//! Integration tests against a live PostgreSQL database.
//!
//! Run with `DATABASE_URL=postgres://... cargo test -- --ignored`.

mod helpers;
mod queue_test;
mod resource_test;
