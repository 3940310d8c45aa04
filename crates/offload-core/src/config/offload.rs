//! Offload settings: the CDN credentials and the intake policy.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::types::id::TenantId;
use crate::types::remote_key::encode_key;

/// Settings snapshot consumed by the intake hook, the remote store client
/// and the processor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OffloadSettings {
    /// Storage zone access key, sent as the `AccessKey` header.
    #[serde(default)]
    pub api_key: String,
    /// Storage zone name.
    #[serde(default)]
    pub storage_zone: String,
    /// Public CDN base URL (e.g. `https://media.example.b-cdn.net`).
    #[serde(default)]
    pub cdn_url: String,
    /// Storage API endpoint the files are PUT to.
    #[serde(default = "default_storage_endpoint")]
    pub storage_endpoint: String,
    /// Local directory that remote keys are computed relative to.
    #[serde(default = "default_uploads_root")]
    pub uploads_root: PathBuf,
    /// Delay between upload and the first offload attempt, in seconds.
    #[serde(default = "default_offload_delay")]
    pub offload_delay_seconds: u64,
    /// Comma-separated extensions that are never offloaded.
    #[serde(default = "default_local_file_types")]
    pub local_file_types: String,
    /// Tenants the intake hook is active for. Empty means every tenant.
    #[serde(default)]
    pub enabled_tenants: Vec<TenantId>,
    /// Rewrite `http://` CDN URLs to `https://`.
    #[serde(default = "default_true")]
    pub force_https: bool,
    /// Remove the local copy once the file is on the CDN.
    #[serde(default)]
    pub delete_local_after_offload: bool,
    /// Upper bound for a single transfer, in seconds.
    #[serde(default = "default_transfer_timeout")]
    pub transfer_timeout_seconds: u64,
}

impl Default for OffloadSettings {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            storage_zone: String::new(),
            cdn_url: String::new(),
            storage_endpoint: default_storage_endpoint(),
            uploads_root: default_uploads_root(),
            offload_delay_seconds: default_offload_delay(),
            local_file_types: default_local_file_types(),
            enabled_tenants: Vec::new(),
            force_https: true,
            delete_local_after_offload: false,
            transfer_timeout_seconds: default_transfer_timeout(),
        }
    }
}

impl OffloadSettings {
    /// Whether API key, storage zone and CDN URL are all present.
    pub fn is_complete(&self) -> bool {
        self.missing_fields().is_empty()
    }

    /// Names of the required settings that are empty.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.api_key.trim().is_empty() {
            missing.push("api_key");
        }
        if self.storage_zone.trim().is_empty() {
            missing.push("storage_zone");
        }
        if self.cdn_url.trim().is_empty() {
            missing.push("cdn_url");
        }
        missing
    }

    /// Fail with `ConfigIncomplete` unless the required settings are present.
    pub fn require_complete(&self) -> Result<(), AppError> {
        let missing = self.missing_fields();
        if missing.is_empty() {
            return Ok(());
        }
        Err(AppError::config_incomplete(format!(
            "Offload settings incomplete: missing {}",
            missing.join(", ")
        )))
    }

    /// The retained-local extension set: lower-cased, trimmed, no empties,
    /// leading dots removed.
    pub fn retained_extensions(&self) -> Vec<String> {
        self.local_file_types
            .split(',')
            .map(|ext| ext.trim().trim_start_matches('.').to_ascii_lowercase())
            .filter(|ext| !ext.is_empty())
            .collect()
    }

    /// Whether a file must stay on the local filesystem.
    pub fn retains_locally(&self, file_path: &Path) -> bool {
        let Some(ext) = file_path.extension().and_then(|e| e.to_str()) else {
            return false;
        };
        let ext = ext.to_ascii_lowercase();
        self.retained_extensions().iter().any(|kept| *kept == ext)
    }

    /// Whether intake is active for `tenant`.
    pub fn is_enabled_for(&self, tenant: TenantId) -> bool {
        self.enabled_tenants.is_empty() || self.enabled_tenants.contains(&tenant)
    }

    /// Public URL for a remote key, percent-encoded, honoring `force_https`.
    pub fn public_url(&self, remote_key: &str) -> String {
        let url = format!(
            "{}/{}",
            self.cdn_url.trim_end_matches('/'),
            encode_key(remote_key.trim_start_matches('/'))
        );
        self.normalize_scheme(&url)
    }

    /// Apply the `http://` to `https://` rewrite when `force_https` is set.
    pub fn normalize_scheme(&self, url: &str) -> String {
        match url.strip_prefix("http://") {
            Some(rest) if self.force_https => format!("https://{rest}"),
            _ => url.to_string(),
        }
    }

    /// Delay applied to newly enqueued files.
    pub fn offload_delay(&self) -> chrono::Duration {
        chrono::Duration::seconds(i64::try_from(self.offload_delay_seconds).unwrap_or(i64::MAX))
    }
}

fn default_storage_endpoint() -> String {
    "https://storage.bunnycdn.com".to_string()
}

fn default_uploads_root() -> PathBuf {
    PathBuf::from("./data/uploads")
}

fn default_offload_delay() -> u64 {
    300
}

fn default_local_file_types() -> String {
    "json".to_string()
}

fn default_true() -> bool {
    true
}

fn default_transfer_timeout() -> u64 {
    30
}
