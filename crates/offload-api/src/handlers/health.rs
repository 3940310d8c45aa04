//! Health check handler.

use axum::Json;
use axum::extract::State;

use crate::dto::response::{ApiResponse, HealthResponse};
use crate::state::AppState;

/// GET /api/health
pub async fn health(State(state): State<AppState>) -> Json<ApiResponse<HealthResponse>> {
    let (database, latency) = match &state.db {
        None => ("not configured", None),
        Some(db) => match db.ping().await {
            Ok(health) if health.queue_ready => ("connected", Some(health.latency_ms)),
            Ok(health) => ("not migrated", Some(health.latency_ms)),
            Err(e) => {
                tracing::warn!("Health check failed: {}", e);
                ("unreachable", None)
            }
        },
    };
    let status = match database {
        "connected" | "not configured" => "ok",
        _ => "degraded",
    };

    Json(ApiResponse::ok(HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.started_at.elapsed().as_secs(),
        database: database.to_string(),
        database_latency_ms: latency,
    }))
}
