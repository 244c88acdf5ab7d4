//! Transfer lifecycle handlers

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
};

use super::super::state::AppState;
use super::super::types::{ApiError, ApiResult, ErrorResponse, StatusResponse, ValidJson};
use crate::error::ServiceError;
use crate::transfer::{CreateTransferRequest, Transfer};

pub const IDEMPOTENCY_KEY_HEADER: &str = "Idempotency-Key";

/// Create a transfer
///
/// Rejected with 422 when the destination already holds the maximum number
/// of in-flight transfers.
#[utoipa::path(
    post,
    path = "/api/transfers",
    request_body = CreateTransferRequest,
    params(
        ("Idempotency-Key" = Option<String>, Header, description = "Client request key; reuse is rejected with 409")
    ),
    responses(
        (status = 201, description = "Transfer created", body = Transfer),
        (status = 400, description = "Invalid body or Idempotency-Key", body = ErrorResponse),
        (status = 409, description = "Idempotency key already used", body = ErrorResponse),
        (status = 422, description = "Destination at capacity", body = ErrorResponse),
        (status = 500, description = "Store failure", body = ErrorResponse)
    ),
    tag = "Transfer"
)]
pub async fn create_transfer(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    ValidJson(req): ValidJson<CreateTransferRequest>,
) -> ApiResult<(StatusCode, Json<Transfer>)> {
    let key = headers
        .get(IDEMPOTENCY_KEY_HEADER)
        .map(|v| v.to_str())
        .transpose()
        .map_err(|_| ApiError::bad_request("Idempotency-Key must be visible ASCII"))?;

    match state.transfers.create_transfer(req, key).await {
        Ok(transfer) => {
            state.metrics.inc_transfers_created();
            Ok((StatusCode::CREATED, Json(transfer)))
        }
        Err(e) => {
            if matches!(e, ServiceError::CapacityExceeded { .. }) {
                state.metrics.inc_capacity_rejections();
            }
            Err(e.into())
        }
    }
}

/// Accept a pending transfer
#[utoipa::path(
    post,
    path = "/api/transfers/{id}/accept",
    params(("id" = String, Path, description = "Transfer id")),
    responses(
        (status = 200, description = "Transfer accepted", body = StatusResponse),
        (status = 404, description = "Unknown transfer", body = ErrorResponse),
        (status = 409, description = "Transfer is not pending", body = ErrorResponse)
    ),
    tag = "Transfer"
)]
pub async fn accept_transfer(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<StatusResponse>> {
    let transfer = state.transfers.accept_transfer(&id).await?;
    Ok(Json(StatusResponse::new(transfer.status.as_str())))
}

/// Complete an accepted transfer
#[utoipa::path(
    post,
    path = "/api/transfers/{id}/complete",
    params(("id" = String, Path, description = "Transfer id")),
    responses(
        (status = 200, description = "Transfer completed", body = StatusResponse),
        (status = 404, description = "Unknown transfer", body = ErrorResponse),
        (status = 409, description = "Transfer is not accepted", body = ErrorResponse)
    ),
    tag = "Transfer"
)]
pub async fn complete_transfer(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<StatusResponse>> {
    let transfer = state.transfers.complete_transfer(&id).await?;
    Ok(Json(StatusResponse::new(transfer.status.as_str())))
}

/// Fetch a transfer
#[utoipa::path(
    get,
    path = "/api/transfers/{id}",
    params(("id" = String, Path, description = "Transfer id")),
    responses(
        (status = 200, description = "Transfer", body = Transfer),
        (status = 404, description = "Unknown transfer", body = ErrorResponse)
    ),
    tag = "Transfer"
)]
pub async fn get_transfer(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<Transfer>> {
    Ok(Json(state.transfers.get_transfer(&id).await?))
}
