// ABOUTME: Route definitions for the hookstream HTTP API plus liveness and readiness probes.
// ABOUTME: Assembles the router with request tracing, the body size limit, and shared state.

use axum::extract::{DefaultBodyLimit, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use tower_http::trace::TraceLayer;

use crate::api;
use crate::app_state::SharedState;

/// Build the complete Axum router with all routes and shared state.
pub fn create_router(state: SharedState) -> Router {
    let body_limit = state.max_body_bytes;

    Router::new()
        .route("/health", get(health))
        .route("/ready", get(ready))
        .route("/api/send", post(api::send::send))
        .route("/api/stream", get(api::stream::stream_info))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check handler. Returns 200 OK without touching the store.
async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

/// Readiness handler. Pings the store within the configured bound.
async fn ready(State(state): State<SharedState>) -> impl IntoResponse {
    let backend = state.store.backend();

    match state.bounded(state.store.ping()).await {
        Ok(()) => (
            StatusCode::OK,
            Json(serde_json::json!({ "status": "ready", "backend": backend })),
        ),
        Err(e) => {
            tracing::warn!(backend, error = %e, "store not ready");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(serde_json::json!({
                    "status": "unavailable",
                    "backend": backend,
                    "error": e.to_string(),
                })),
            )
        }
    }
}
