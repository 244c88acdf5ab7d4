//! HTTP handlers

pub mod health;
pub mod outbox;
pub mod temperature;
pub mod transfer;

pub use health::{HealthResponse, health_check, metrics};
pub use outbox::flush_outbox;
pub use temperature::{ingest_temperatures, list_alerts};
pub use transfer::{accept_transfer, complete_transfer, create_transfer, get_transfer};

// `#[derive(OpenApi)]` resolves `paths(...)` through the macro-generated `__path_*` types
pub use health::__path_health_check;
pub use outbox::__path_flush_outbox;
pub use temperature::{__path_ingest_temperatures, __path_list_alerts};
pub use transfer::{
    __path_accept_transfer, __path_complete_transfer, __path_create_transfer, __path_get_transfer,
};
