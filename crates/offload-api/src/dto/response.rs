//! Response DTOs.

use serde::{Deserialize, Serialize};

/// Standard success response wrapper.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T: Serialize> {
    /// Whether the request was successful.
    pub success: bool,
    /// Response data.
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    /// Creates a successful response.
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

/// Queue counts returned by the status endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueStatusResponse {
    pub pending: i64,
    pub processing: i64,
    pub failed: i64,
    pub total: i64,
}

/// Result of URL resolution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolveResponse {
    pub url: String,
}

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// "ok" or "degraded"
    pub status: String,
    /// Crate version
    pub version: String,
    /// Seconds since startup
    pub uptime_seconds: u64,
    /// "connected", "not migrated", "unreachable" or "not configured"
    pub database: String,
    /// Ping round trip, when the database answered
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database_latency_ms: Option<u64>,
}
