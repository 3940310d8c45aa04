//! Request DTOs.

use serde::{Deserialize, Serialize};

use offload_core::types::id::{ResourceId, TenantId};

/// Body of the "process now" and "retry failed" triggers.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TriggerRequest {
    /// Restrict the trigger to one tenant
    #[serde(default)]
    pub tenant_id: Option<TenantId>,
}

/// Query string of the status endpoint.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StatusQuery {
    /// Restrict the counts to one tenant
    #[serde(default)]
    pub tenant_id: Option<TenantId>,
}

/// Query string of the URL resolution endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolveQuery {
    pub tenant_id: TenantId,
    pub resource_id: ResourceId,
    /// URL served when the resource is not on the CDN
    pub local_url: String,
}
