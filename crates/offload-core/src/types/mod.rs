//! Shared value types used across crates.

pub mod clock;
pub mod id;
pub mod remote_key;

pub use clock::{Clock, ManualClock, SystemClock};
pub use id::{JobId, ResourceId, TenantId};
