//! Remote object store trait.

use std::path::Path;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::offload::OffloadSettings;
use crate::result::AppResult;

/// Proof of a successful transfer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadReceipt {
    /// Key the object was stored under, relative to the storage zone.
    pub remote_key: String,
    /// Public URL the object is served from.
    pub public_url: String,
    /// Number of bytes sent.
    pub bytes: u64,
}

/// A remote object store that accepts single-object uploads.
///
/// Implementations perform exactly one transfer attempt per call and never
/// retry internally; the processor owns retry policy.
#[async_trait]
pub trait RemoteStore: Send + Sync + std::fmt::Debug + 'static {
    /// Return the provider type name (e.g. `"bunny"`).
    fn provider_type(&self) -> &str;

    /// Derive the remote key for a local file.
    ///
    /// Fails with `Validation` when the path is not under the configured
    /// local root.
    fn remote_key(&self, settings: &OffloadSettings, file_path: &Path) -> AppResult<String>;

    /// Upload one local file under `remote_key`.
    ///
    /// Fails with `FileMissing` if the file does not exist and with
    /// `TransferFailure` for any transport error, timeout or non-success
    /// response.
    async fn upload(
        &self,
        settings: &OffloadSettings,
        file_path: &Path,
        remote_key: &str,
    ) -> AppResult<UploadReceipt>;
}
