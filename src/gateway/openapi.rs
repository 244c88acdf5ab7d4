//! OpenAPI / Swagger UI Documentation
//!
//! - Swagger UI: `http://localhost:8080/docs`
//! - OpenAPI JSON: `http://localhost:8080/api-docs/openapi.json`

use utoipa::{Modify, OpenApi};

use crate::gateway::handlers::HealthResponse;
use crate::gateway::types::{ErrorResponse, StatusResponse};
use crate::temperature::{Alert, AlertLevel, IngestReport, TemperatureReading};
use crate::transfer::{CreateTransferRequest, Transfer, TransferStatus};

/// Dev flush routes are only mounted with the `dev-api` feature
const DEV_PATHS: [&str; 1] = ["/api/dev/flush-outbox"];

/// Drops the dev routes from the document when they are not mounted
struct DevRoutesAddon;

impl Modify for DevRoutesAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if !cfg!(feature = "dev-api") {
            for path in DEV_PATHS {
                openapi.paths.paths.remove(path);
            }
            if let Some(tags) = openapi.tags.as_mut() {
                tags.retain(|t| t.name != "Dev");
            }
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Pallet Gateway API",
        version = "1.0.0",
        description = "Pallet transfer lifecycle and cold-storage temperature monitoring, with a transactional outbox."
    ),
    servers(
        (url = "http://localhost:8080", description = "Development"),
    ),
    paths(
        crate::gateway::handlers::health_check,
        crate::gateway::handlers::create_transfer,
        crate::gateway::handlers::get_transfer,
        crate::gateway::handlers::accept_transfer,
        crate::gateway::handlers::complete_transfer,
        crate::gateway::handlers::ingest_temperatures,
        crate::gateway::handlers::list_alerts,
        crate::gateway::handlers::flush_outbox,
    ),
    components(
        schemas(
            HealthResponse,
            ErrorResponse,
            StatusResponse,
            CreateTransferRequest,
            Transfer,
            TransferStatus,
            TemperatureReading,
            IngestReport,
            Alert,
            AlertLevel,
        )
    ),
    tags(
        (name = "Transfer", description = "Pallet transfer lifecycle"),
        (name = "Temperature", description = "Cold-room readings and alerts"),
        (name = "Dev", description = "Development helpers (dev-api builds only)"),
        (name = "System", description = "Health checks and system info")
    ),
    modifiers(&DevRoutesAddon)
)]
pub struct ApiDoc;
