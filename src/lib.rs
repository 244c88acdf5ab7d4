//! Pallet Gateway - warehouse pallet transfers and cold-room monitoring
//!
//! An HTTP service that tracks pallet transfers through a small lifecycle,
//! ingests cold-room temperature readings, and publishes every state change
//! through a transactional outbox.
//!
//! # Modules
//!
//! - [`transfer`] - Transfer lifecycle (pending → accepted → completed) and admission
//! - [`temperature`] - Reading ingest and threshold alerts
//! - [`outbox`] - Domain events, relay, sinks and background worker
//! - [`store`] - Persistence seam (`Store`) with PostgreSQL and in-memory backends
//! - [`db`] - PostgreSQL pool and schema
//! - [`gateway`] - axum HTTP surface, OpenAPI docs
//! - [`config`] - YAML config with environment overrides
//! - [`metrics`] - Prometheus counters

pub mod config;
pub mod db;
pub mod error;
pub mod gateway;
pub mod logging;
pub mod metrics;
pub mod outbox;
pub mod store;
pub mod temperature;
pub mod transfer;

// Convenient re-exports at crate root
pub use config::{AppConfig, StorageKind};
pub use error::ServiceError;
pub use metrics::Metrics;
pub use outbox::{DomainEvent, EventSink, FileSink, FlushReport, OutboxEvent, OutboxRelay};
pub use store::{MemoryStore, PgStore, Store};
pub use temperature::{Alert, IngestReport, TemperatureMonitor, TemperatureReading};
pub use transfer::{CreateTransferRequest, Transfer, TransferId, TransferService, TransferStatus};
