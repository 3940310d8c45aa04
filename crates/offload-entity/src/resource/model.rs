//! Resource offload record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use offload_core::types::id::{ResourceId, TenantId};

/// Where a resource's bytes are served from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "offload_resource_state", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum OffloadState {
    /// The file was transferred and is served from the CDN.
    Offloaded,
    /// The file's type is retained locally. Never enqueued.
    LocalOnly,
}

impl OffloadState {
    /// Return the state as a snake_case string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Offloaded => "offloaded",
            Self::LocalOnly => "local_only",
        }
    }
}

/// Offload state recorded against a tenant's resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct ResourceOffload {
    /// Owning site.
    pub tenant_id: TenantId,
    /// Media object.
    pub resource_id: ResourceId,
    /// Current state.
    pub state: OffloadState,
    /// Public CDN URL (offloaded resources only).
    pub cdn_url: Option<String>,
    /// Remote key inside the storage zone (offloaded resources only).
    pub remote_path: Option<String>,
    /// When the record was last written.
    pub updated_at: DateTime<Utc>,
}

impl ResourceOffload {
    /// Whether the resource is served from the CDN.
    pub fn is_offloaded(&self) -> bool {
        self.state == OffloadState::Offloaded && self.cdn_url.is_some()
    }

    /// Whether the resource is pinned to local storage.
    pub fn is_local_only(&self) -> bool {
        self.state == OffloadState::LocalOnly
    }
}

/// Resource counts per state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OffloadSummary {
    /// Resources served from the CDN.
    pub offloaded: i64,
    /// Resources pinned to local storage.
    pub local_only: i64,
}
