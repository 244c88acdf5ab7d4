//! Transactional outbox
//!
//! Events are appended by the store in the same transaction as the state
//! change they describe, then relayed to a sink on demand or by the
//! background worker.

pub mod event;
pub mod relay;
pub mod sink;
pub mod worker;

pub use event::{AGGREGATE_TEMPERATURE, AGGREGATE_TRANSFER, DomainEvent, OutboxEvent, format_ts};
pub use relay::{FlushReport, OutboxRelay};
pub use sink::{EventSink, FileSink};
pub use worker::OutboxWorker;
