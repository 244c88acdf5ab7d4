//! Temperature ingest and alert handlers

use std::sync::Arc;

use axum::{Json, extract::State};

use super::super::state::AppState;
use super::super::types::{ApiResult, ErrorResponse, ValidJson};
use crate::temperature::{Alert, IngestReport, TemperatureReading};

/// Ingest a batch of readings
///
/// Readings are processed in order; a store failure aborts the rest of the
/// batch with 500 and keeps what was already stored.
#[utoipa::path(
    post,
    path = "/api/temperatures",
    request_body = Vec<TemperatureReading>,
    responses(
        (status = 200, description = "Batch ingested", body = IngestReport),
        (status = 400, description = "Invalid body", body = ErrorResponse),
        (status = 500, description = "Store failure", body = ErrorResponse)
    ),
    tag = "Temperature"
)]
pub async fn ingest_temperatures(
    State(state): State<Arc<AppState>>,
    ValidJson(readings): ValidJson<Vec<TemperatureReading>>,
) -> ApiResult<Json<IngestReport>> {
    Ok(Json(state.monitor.ingest(&readings).await?))
}

/// Newest 100 alerts, newest first
#[utoipa::path(
    get,
    path = "/api/alerts",
    responses(
        (status = 200, description = "Alerts", body = Vec<Alert>),
        (status = 500, description = "Store failure", body = ErrorResponse)
    ),
    tag = "Temperature"
)]
pub async fn list_alerts(State(state): State<Arc<AppState>>) -> ApiResult<Json<Vec<Alert>>> {
    Ok(Json(state.monitor.list_alerts().await?))
}
