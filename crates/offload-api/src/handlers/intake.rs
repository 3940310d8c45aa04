//! Host-facing hooks: upload intake and URL resolution.

use axum::Json;
use axum::extract::{Query, State};

use offload_core::error::AppError;
use offload_core::events::upload::UploadEvent;
use offload_worker::IntakeDecision;

use crate::dto::request::ResolveQuery;
use crate::dto::response::{ApiResponse, ResolveResponse};
use crate::error::ApiError;
use crate::extractors::AdminCaller;
use crate::state::AppState;

/// POST /api/offload/uploads
pub async fn upload_received(
    State(state): State<AppState>,
    caller: AdminCaller,
    Json(event): Json<UploadEvent>,
) -> Result<Json<ApiResponse<IntakeDecision>>, ApiError> {
    if !caller.is_admin {
        return Err(AppError::permission_denied("Administrative privilege is required").into());
    }
    if !event.file_path.is_absolute() {
        return Err(AppError::validation("file_path must be absolute").into());
    }
    let decision = state.intake.on_upload(&event).await?;
    Ok(Json(ApiResponse::ok(decision)))
}

/// GET /api/offload/resolve
pub async fn resolve_url(
    State(state): State<AppState>,
    Query(query): Query<ResolveQuery>,
) -> Result<Json<ApiResponse<ResolveResponse>>, ApiError> {
    let url = state
        .resolver
        .resolve_url(query.tenant_id, query.resource_id, &query.local_url)
        .await?;
    Ok(Json(ApiResponse::ok(ResolveResponse { url })))
}
