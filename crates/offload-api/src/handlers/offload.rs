//! Manual offload triggers.

use axum::Json;
use axum::extract::{Query, State};

use offload_worker::Ack;

use crate::dto::request::{StatusQuery, TriggerRequest};
use crate::dto::response::{ApiResponse, QueueStatusResponse};
use crate::error::ApiError;
use crate::extractors::AdminCaller;
use crate::state::AppState;

/// POST /api/offload/process
pub async fn process_now(
    State(state): State<AppState>,
    caller: AdminCaller,
    body: Option<Json<TriggerRequest>>,
) -> Result<Json<Ack>, ApiError> {
    let req = body.map(|Json(b)| b).unwrap_or_default();
    let ack = state.control.process_now(&caller, req.tenant_id).await?;
    Ok(Json(ack))
}

/// POST /api/offload/retry-failed
pub async fn retry_failed(
    State(state): State<AppState>,
    caller: AdminCaller,
    body: Option<Json<TriggerRequest>>,
) -> Result<Json<Ack>, ApiError> {
    let req = body.map(|Json(b)| b).unwrap_or_default();
    let ack = state.control.retry_failed(&caller, req.tenant_id).await?;
    Ok(Json(ack))
}

/// GET /api/offload/status
pub async fn status(
    State(state): State<AppState>,
    caller: AdminCaller,
    Query(query): Query<StatusQuery>,
) -> Result<Json<ApiResponse<QueueStatusResponse>>, ApiError> {
    let counts = state.control.status(&caller, query.tenant_id).await?;
    Ok(Json(ApiResponse::ok(QueueStatusResponse {
        pending: counts.pending,
        processing: counts.processing,
        failed: counts.failed,
        total: counts.total(),
    })))
}
