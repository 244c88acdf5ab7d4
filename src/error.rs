//! Service Error Types
//!
//! One error enum shared by the transfer lifecycle, the temperature monitor
//! and the outbox relay. Every variant carries a stable code and an HTTP
//! status suggestion for the gateway.

use thiserror::Error;

/// Service error types
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ServiceError {
    // === Validation Errors ===
    #[error("Invalid request: {0}")]
    Validation(String),

    // === Lifecycle Errors ===
    #[error("Transfer not found: {0}")]
    NotFound(String),

    #[error("Capacity exceeded at {location}: {in_flight} in-flight transfers (max {max})")]
    CapacityExceeded {
        location: String,
        in_flight: i64,
        max: u32,
    },

    #[error("Invalid state transition: {from} -> {to}")]
    InvalidStateTransition { from: String, to: String },

    // === Idempotency Errors ===
    #[error("Duplicate request (idempotency key already used)")]
    DuplicateRequest,

    // === System Errors ===
    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Outbox delivery failed: {0}")]
    DeliveryError(String),

    #[error("Internal system error: {0}")]
    SystemError(String),
}

impl ServiceError {
    /// Get the error code for API responses
    pub fn code(&self) -> &'static str {
        match self {
            ServiceError::Validation(_) => "INVALID_PARAMETER",
            ServiceError::NotFound(_) => "TRANSFER_NOT_FOUND",
            ServiceError::CapacityExceeded { .. } => "CAPACITY_EXCEEDED",
            ServiceError::InvalidStateTransition { .. } => "INVALID_STATE_TRANSITION",
            ServiceError::DuplicateRequest => "DUPLICATE_REQUEST",
            ServiceError::DatabaseError(_) => "DATABASE_ERROR",
            ServiceError::DeliveryError(_) => "DELIVERY_ERROR",
            ServiceError::SystemError(_) => "SYSTEM_ERROR",
        }
    }

    /// Get HTTP status code suggestion
    pub fn http_status(&self) -> u16 {
        match self {
            ServiceError::Validation(_) => 400,
            ServiceError::NotFound(_) => 404,
            ServiceError::InvalidStateTransition { .. } | ServiceError::DuplicateRequest => 409,
            ServiceError::CapacityExceeded { .. } => 422,
            ServiceError::DatabaseError(_)
            | ServiceError::DeliveryError(_)
            | ServiceError::SystemError(_) => 500,
        }
    }
}

impl From<sqlx::Error> for ServiceError {
    fn from(e: sqlx::Error) -> Self {
        match &e {
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                ServiceError::DuplicateRequest
            }
            _ => ServiceError::DatabaseError(e.to_string()),
        }
    }
}

impl From<std::io::Error> for ServiceError {
    fn from(e: std::io::Error) -> Self {
        ServiceError::DeliveryError(e.to_string())
    }
}

impl From<serde_json::Error> for ServiceError {
    fn from(e: serde_json::Error) -> Self {
        ServiceError::SystemError(e.to_string())
    }
}

impl From<anyhow::Error> for ServiceError {
    fn from(e: anyhow::Error) -> Self {
        ServiceError::SystemError(e.to_string())
    }
}
