//! Route definitions for the CDN Offload HTTP API.
//!
//! All routes are mounted under `/api`. The router receives `AppState` and
//! passes it to every handler via Axum's `State` extractor.

use axum::{
    Router, middleware as axum_middleware,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::middleware;
use crate::state::AppState;

/// Build the complete Axum router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .merge(offload_routes())
        .merge(health_routes());

    Router::new()
        .nest("/api", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(axum_middleware::from_fn(middleware::logging::request_logging))
        .with_state(state)
}

/// Triggers, status, intake and URL resolution
fn offload_routes() -> Router<AppState> {
    Router::new()
        .route("/offload/process", post(handlers::offload::process_now))
        .route("/offload/retry-failed", post(handlers::offload::retry_failed))
        .route("/offload/status", get(handlers::offload::status))
        .route("/offload/uploads", post(handlers::intake::upload_received))
        .route("/offload/resolve", get(handlers::intake::resolve_url))
}

fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(handlers::health::health))
}
