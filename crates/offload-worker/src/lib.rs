//! Offload pipeline for CDN Offload.
//!
//! This crate provides:
//! - The offload processor that drains due jobs to the remote store
//! - The intake hook that classifies and enqueues new uploads
//! - Manual "process now" / "retry failed" triggers with privilege checks
//! - A cron scheduler for the periodic cycle
//! - Public URL resolution for offloaded resources

pub mod control;
pub mod intake;
pub mod processor;
pub mod resolve;
pub mod scheduler;

pub use control::{Ack, Caller, OffloadControl};
pub use intake::{IntakeDecision, IntakeHook};
pub use processor::{CycleReport, OffloadProcessor};
pub use resolve::UrlResolver;
pub use scheduler::CronScheduler;

#[cfg(test)]
pub(crate) mod testing;
