//! PostgreSQL store
//!
//! Each state change and its outbox row are written inside one transaction.
//! Status updates use a CAS on the current status.

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use super::Store;
use crate::error::ServiceError;
use crate::outbox::OutboxEvent;
use crate::temperature::{Alert, AlertLevel, RecordedReading};
use crate::transfer::{StatusChange, Transfer, TransferId, TransferStatus};

const TRANSFER_COLUMNS: &str = "id, pallet_id, from_location, to_location, status, \
     requested_by, approved_by, created_at, updated_at";

/// Store backed by a PostgreSQL pool
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn insert_event<'e, E>(executor: E, event: &OutboxEvent) -> Result<(), ServiceError>
    where
        E: sqlx::Executor<'e, Database = sqlx::Postgres>,
    {
        sqlx::query(
            r#"
            INSERT INTO outbox (id, aggregate_type, aggregate_id, topic, payload, published, created_at)
            VALUES ($1, $2, $3, $4, $5, FALSE, $6)
            "#,
        )
        .bind(event.id.to_string())
        .bind(&event.aggregate_type)
        .bind(&event.aggregate_id)
        .bind(&event.topic)
        .bind(&event.payload)
        .bind(event.created_at)
        .execute(executor)
        .await?;
        Ok(())
    }

    fn row_to_transfer(row: &PgRow) -> Result<Transfer, ServiceError> {
        let id_str: String = row.try_get("id")?;
        let id: TransferId = id_str
            .parse()
            .map_err(|_| ServiceError::SystemError(format!("Invalid transfer id: {}", id_str)))?;

        let status_str: String = row.try_get("status")?;
        let status: TransferStatus = status_str.parse().map_err(ServiceError::SystemError)?;

        Ok(Transfer {
            id,
            pallet_id: row.try_get("pallet_id")?,
            from_location: row.try_get("from_location")?,
            to_location: row.try_get("to_location")?,
            status,
            requested_by: row.try_get("requested_by")?,
            approved_by: row.try_get("approved_by")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    fn row_to_alert(row: &PgRow) -> Result<Alert, ServiceError> {
        let id_str: String = row.try_get("id")?;
        let id = Uuid::parse_str(&id_str)
            .map_err(|_| ServiceError::SystemError(format!("Invalid alert id: {}", id_str)))?;

        let level_str: String = row.try_get("level")?;
        let level = AlertLevel::from_str_opt(&level_str).ok_or_else(|| {
            ServiceError::SystemError(format!("Invalid alert level: {}", level_str))
        })?;

        let message: Option<String> = row.try_get("message")?;

        Ok(Alert {
            id,
            room_id: row.try_get("room_id")?,
            temp: row.try_get("temp")?,
            level,
            message: message.unwrap_or_default(),
            created_at: row.try_get("created_at")?,
        })
    }

    fn row_to_event(row: &PgRow) -> Result<OutboxEvent, ServiceError> {
        let id_str: String = row.try_get("id")?;
        let id = Uuid::parse_str(&id_str)
            .map_err(|_| ServiceError::SystemError(format!("Invalid event id: {}", id_str)))?;

        Ok(OutboxEvent {
            id,
            aggregate_type: row.try_get("aggregate_type")?,
            aggregate_id: row.try_get("aggregate_id")?,
            topic: row.try_get("topic")?,
            payload: row.try_get("payload")?,
            published: row.try_get("published")?,
            created_at: row.try_get("created_at")?,
            seq: row.try_get("seq")?,
        })
    }
}

#[async_trait]
impl Store for PgStore {
    fn name(&self) -> &'static str {
        "postgres"
    }

    async fn health_check(&self) -> Result<(), ServiceError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn insert_transfer(
        &self,
        transfer: &Transfer,
        idempotency_key: Option<&str>,
        event: &OutboxEvent,
    ) -> Result<(), ServiceError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO transfers
                (id, pallet_id, from_location, to_location, status, requested_by,
                 idempotency_key, created_at, updated_at)
            VALUES
                ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(transfer.id.to_string())
        .bind(&transfer.pallet_id)
        .bind(&transfer.from_location)
        .bind(&transfer.to_location)
        .bind(transfer.status.as_str())
        .bind(&transfer.requested_by)
        .bind(idempotency_key)
        .bind(transfer.created_at)
        .bind(transfer.updated_at)
        .execute(&mut *tx)
        .await?;

        Self::insert_event(&mut *tx, event).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn get_transfer(&self, id: TransferId) -> Result<Option<Transfer>, ServiceError> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM transfers WHERE id = $1",
            TRANSFER_COLUMNS
        ))
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(Self::row_to_transfer).transpose()
    }

    async fn transition_transfer(
        &self,
        id: TransferId,
        change: &StatusChange,
        event: &OutboxEvent,
    ) -> Result<bool, ServiceError> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r#"
            UPDATE transfers
            SET status = $1, approved_by = $2, updated_at = $3
            WHERE id = $4 AND status = $5
            "#,
        )
        .bind(change.new.as_str())
        .bind(change.approved_by.as_deref())
        .bind(change.at)
        .bind(id.to_string())
        .bind(change.expected.as_str())
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(false);
        }

        Self::insert_event(&mut *tx, event).await?;
        tx.commit().await?;
        Ok(true)
    }

    async fn count_in_flight(&self, destination: &str) -> Result<i64, ServiceError> {
        let names: Vec<String> = TransferStatus::in_flight_names()
            .iter()
            .map(|s| s.to_string())
            .collect();

        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(1) FROM transfers WHERE to_location = $1 AND status = ANY($2)",
        )
        .bind(destination)
        .bind(names)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    async fn insert_reading(&self, reading: &RecordedReading) -> Result<(), ServiceError> {
        sqlx::query(
            r#"
            INSERT INTO temperature_readings (id, room_id, temp, recorded_at, created_at)
            VALUES ($1, $2, $3, $4, NOW())
            "#,
        )
        .bind(reading.id.to_string())
        .bind(&reading.room_id)
        .bind(reading.temp)
        .bind(reading.recorded_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn record_alert(&self, alert: &Alert, event: &OutboxEvent) -> Result<(), ServiceError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO alerts (id, room_id, temp, level, message, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(alert.id.to_string())
        .bind(&alert.room_id)
        .bind(alert.temp)
        .bind(alert.level.as_str())
        .bind(&alert.message)
        .bind(alert.created_at)
        .execute(&mut *tx)
        .await?;

        Self::insert_event(&mut *tx, event).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn list_alerts(&self, limit: i64) -> Result<Vec<Alert>, ServiceError> {
        let rows = sqlx::query(
            r#"
            SELECT id, room_id, temp, level, message, created_at
            FROM alerts
            ORDER BY created_at DESC
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(Self::row_to_alert).collect()
    }

    async fn fetch_unpublished(&self) -> Result<Vec<OutboxEvent>, ServiceError> {
        let rows = sqlx::query(
            r#"
            SELECT id, aggregate_type, aggregate_id, topic, payload, published, created_at, seq
            FROM outbox
            WHERE published = FALSE
            ORDER BY created_at ASC, seq ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(Self::row_to_event).collect()
    }

    async fn count_unpublished(&self) -> Result<i64, ServiceError> {
        let row = sqlx::query("SELECT COUNT(1) AS pending FROM outbox WHERE published = FALSE")
            .fetch_one(&self.pool)
            .await?;
        Ok(row.try_get("pending")?)
    }

    async fn mark_published(&self, id: Uuid) -> Result<(), ServiceError> {
        sqlx::query("UPDATE outbox SET published = TRUE WHERE id = $1")
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
