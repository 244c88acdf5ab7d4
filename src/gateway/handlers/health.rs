//! Health check and metrics handlers

use std::sync::Arc;

use axum::{
    Json,
    extract::State,
    http::{StatusCode, header},
    response::IntoResponse,
};
use utoipa::ToSchema;

use super::super::state::AppState;
use super::super::types::{ApiError, ApiResult};

/// Health check response data
#[derive(serde::Serialize, ToSchema)]
pub struct HealthResponse {
    #[schema(example = "ok")]
    pub status: String,
    /// Backing store name
    #[schema(example = "postgres")]
    pub storage: String,
}

/// Health check endpoint
///
/// - Healthy: 200 OK + {status, storage}
/// - Unhealthy: 503 Service Unavailable + {code: 5001, msg: "unavailable"}
#[utoipa::path(
    get,
    path = "/api/health",
    responses(
        (status = 200, description = "Service healthy", body = HealthResponse, content_type = "application/json"),
        (status = 503, description = "Service unavailable")
    ),
    tag = "System"
)]
pub async fn health_check(State(state): State<Arc<AppState>>) -> ApiResult<Json<HealthResponse>> {
    if let Err(e) = state.store.health_check().await {
        tracing::error!("[HEALTH] {} store check failed: {}", state.store.name(), e);
        return Err(ApiError::service_unavailable("unavailable"));
    }
    Ok(Json(HealthResponse {
        status: "ok".to_string(),
        storage: state.store.name().to_string(),
    }))
}

/// Prometheus metrics
pub async fn metrics(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let pending = match state.store.count_unpublished().await {
        Ok(n) => usize::try_from(n).ok(),
        Err(e) => {
            tracing::warn!(error = %e, "Could not count pending outbox events");
            None
        }
    };
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(pending),
    )
}
