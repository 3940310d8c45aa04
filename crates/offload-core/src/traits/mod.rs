//! Core traits defined in `offload-core` and implemented by other crates
//! or by the host environment.

pub mod settings;
pub mod storage;
pub mod tenant;

pub use settings::{SettingsProvider, StaticSettings};
pub use storage::{RemoteStore, UploadReceipt};
pub use tenant::{NoopTenantContext, TenantContext, TenantScope};
