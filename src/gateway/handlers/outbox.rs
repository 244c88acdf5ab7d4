//! Dev-only outbox flush

use std::sync::Arc;

use axum::{Json, extract::State};

use super::super::state::AppState;
use super::super::types::{ApiResult, ErrorResponse, StatusResponse};

/// Flush the outbox to the sink
///
/// Also mounted at `/api/temperatures/dev/flush-outbox`.
#[utoipa::path(
    post,
    path = "/api/dev/flush-outbox",
    responses(
        (status = 200, description = "Outbox flushed", body = StatusResponse),
        (status = 500, description = "Delivery or store failure", body = ErrorResponse)
    ),
    tag = "Dev"
)]
pub async fn flush_outbox(State(state): State<Arc<AppState>>) -> ApiResult<Json<StatusResponse>> {
    match state.relay.flush().await {
        Ok(report) => {
            state.metrics.add_published(report.delivered);
            Ok(Json(StatusResponse::new("flushed")))
        }
        Err(e) => {
            state.metrics.inc_flush_failures();
            Err(e.into())
        }
    }
}
