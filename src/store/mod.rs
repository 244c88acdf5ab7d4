//! Persistence seam
//!
//! The lifecycle manager, the temperature monitor and the outbox relay only
//! talk to storage through [`Store`]. Every method that changes domain state
//! also takes the outbox row describing that change; implementations MUST
//! commit both in one unit of work.

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

use async_trait::async_trait;
use chrono::{DateTime, SubsecRound, Utc};
use uuid::Uuid;

use crate::error::ServiceError;
use crate::outbox::OutboxEvent;
use crate::temperature::{Alert, RecordedReading};
use crate::transfer::{StatusChange, Transfer, TransferId};

/// Maximum alerts returned by [`Store::list_alerts`]
pub const ALERT_LIST_LIMIT: i64 = 100;

/// Current time truncated to microseconds, the precision of `TIMESTAMPTZ`
///
/// Every timestamp that is persisted and later read back must be taken
/// here, otherwise a value returned at write time differs from the stored one.
pub fn store_now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

#[async_trait]
pub trait Store: Send + Sync {
    /// Store name for logging
    fn name(&self) -> &'static str;

    /// Cheap liveness probe
    async fn health_check(&self) -> Result<(), ServiceError>;

    // === Transfers ===

    /// Insert a new transfer and its creation event atomically
    ///
    /// Fails with `DuplicateRequest` when `idempotency_key` is already taken.
    async fn insert_transfer(
        &self,
        transfer: &Transfer,
        idempotency_key: Option<&str>,
        event: &OutboxEvent,
    ) -> Result<(), ServiceError>;

    async fn get_transfer(&self, id: TransferId) -> Result<Option<Transfer>, ServiceError>;

    /// CAS status update plus event append
    ///
    /// Returns false (and appends nothing) when the current status is not
    /// `change.expected` or the transfer does not exist.
    async fn transition_transfer(
        &self,
        id: TransferId,
        change: &StatusChange,
        event: &OutboxEvent,
    ) -> Result<bool, ServiceError>;

    /// Count transfers to `destination` that are still in flight
    async fn count_in_flight(&self, destination: &str) -> Result<i64, ServiceError>;

    // === Temperature ===

    async fn insert_reading(&self, reading: &RecordedReading) -> Result<(), ServiceError>;

    /// Insert an alert and its event atomically
    async fn record_alert(&self, alert: &Alert, event: &OutboxEvent) -> Result<(), ServiceError>;

    /// Newest alerts first
    async fn list_alerts(&self, limit: i64) -> Result<Vec<Alert>, ServiceError>;

    // === Outbox ===

    /// Unpublished events in (created_at, seq) order
    async fn fetch_unpublished(&self) -> Result<Vec<OutboxEvent>, ServiceError>;

    /// Number of unpublished events, without loading payloads
    async fn count_unpublished(&self) -> Result<i64, ServiceError>;

    async fn mark_published(&self, id: Uuid) -> Result<(), ServiceError>;
}
