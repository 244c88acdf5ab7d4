//! API response types and error codes
//!
//! - `ErrorResponse`: error body (`{code, msg}`)
//! - `ApiError`: handler error, rendered as `ErrorResponse` with an HTTP status
//! - `error_codes`: stable numeric codes

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use utoipa::ToSchema;

use crate::error::ServiceError;

// ============================================================================
// Error Body
// ============================================================================

/// Error body: `{"code": <non-zero>, "msg": "..."}`
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    #[schema(example = 4001)]
    pub code: i32,
    #[schema(example = "Transfer not found: 01J9Z3M8Q2W7T6V5X4Y3Z2A1B0")]
    pub msg: String,
}

impl ErrorResponse {
    pub fn new(code: i32, msg: impl Into<String>) -> Self {
        Self {
            code,
            msg: msg.into(),
        }
    }
}

// ============================================================================
// Response DTOs
// ============================================================================

/// Body of accept/complete/flush responses
#[derive(Debug, Serialize, ToSchema)]
pub struct StatusResponse {
    #[schema(example = "accepted")]
    pub status: String,
}

impl StatusResponse {
    pub fn new(status: &str) -> Self {
        Self {
            status: status.to_string(),
        }
    }
}

// ============================================================================
// Handler errors
// ============================================================================

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub code: i32,
    pub msg: String,
}

pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    pub fn new(status: StatusCode, code: i32, msg: impl Into<String>) -> Self {
        Self {
            status,
            code,
            msg: msg.into(),
        }
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, error_codes::INVALID_PARAMETER, msg)
    }

    pub fn service_unavailable(msg: impl Into<String>) -> Self {
        Self::new(
            StatusCode::SERVICE_UNAVAILABLE,
            error_codes::SERVICE_UNAVAILABLE,
            msg,
        )
    }
}

impl From<ServiceError> for ApiError {
    fn from(e: ServiceError) -> Self {
        let status = StatusCode::from_u16(e.http_status())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let code = error_codes::from_service_code(e.code());
        if status.is_server_error() {
            tracing::error!(code = e.code(), error = %e, "Request failed");
        }
        Self::new(status, code, e.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(ErrorResponse::new(self.code, self.msg));
        (self.status, body).into_response()
    }
}

// ============================================================================
// Error Codes
// ============================================================================

pub mod error_codes {
    // Success
    pub const SUCCESS: i32 = 0;

    // Client errors (1xxx)
    pub const INVALID_PARAMETER: i32 = 1001;
    pub const DUPLICATE_REQUEST: i32 = 1002;

    // Resource / state errors (4xxx)
    pub const TRANSFER_NOT_FOUND: i32 = 4001;
    pub const INVALID_STATE_TRANSITION: i32 = 4002;
    pub const CAPACITY_EXCEEDED: i32 = 4003;

    // Server errors (5xxx)
    pub const INTERNAL_ERROR: i32 = 5000;
    pub const SERVICE_UNAVAILABLE: i32 = 5001;
    pub const DATABASE_ERROR: i32 = 5002;
    pub const DELIVERY_ERROR: i32 = 5003;

    /// Map a `ServiceError::code()` name to its numeric code
    pub fn from_service_code(name: &str) -> i32 {
        match name {
            "INVALID_PARAMETER" => INVALID_PARAMETER,
            "DUPLICATE_REQUEST" => DUPLICATE_REQUEST,
            "TRANSFER_NOT_FOUND" => TRANSFER_NOT_FOUND,
            "INVALID_STATE_TRANSITION" => INVALID_STATE_TRANSITION,
            "CAPACITY_EXCEEDED" => CAPACITY_EXCEEDED,
            "DATABASE_ERROR" => DATABASE_ERROR,
            "DELIVERY_ERROR" => DELIVERY_ERROR,
            _ => INTERNAL_ERROR,
        }
    }
}
