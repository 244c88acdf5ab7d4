//! Table bootstrap
//!
//! Idempotent DDL run at startup. There is no migration history.

use sqlx::PgPool;

const CREATE_TRANSFERS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS transfers (
    id TEXT PRIMARY KEY,
    pallet_id TEXT NOT NULL,
    from_location TEXT NOT NULL,
    to_location TEXT NOT NULL,
    status TEXT NOT NULL,
    requested_by TEXT NOT NULL,
    approved_by TEXT,
    idempotency_key TEXT UNIQUE,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
)
"#;

const CREATE_TRANSFERS_DEST_INDEX: &str = r#"
CREATE INDEX IF NOT EXISTS idx_transfers_to_location_status
    ON transfers (to_location, status)
"#;

const CREATE_READINGS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS temperature_readings (
    id TEXT PRIMARY KEY,
    room_id TEXT NOT NULL,
    temp DOUBLE PRECISION NOT NULL,
    recorded_at TIMESTAMPTZ NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
)
"#;

const CREATE_ALERTS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS alerts (
    id TEXT PRIMARY KEY,
    room_id TEXT NOT NULL,
    temp DOUBLE PRECISION NOT NULL,
    level TEXT NOT NULL,
    message TEXT,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
)
"#;

const CREATE_OUTBOX_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS outbox (
    id TEXT PRIMARY KEY,
    aggregate_type TEXT NOT NULL,
    aggregate_id TEXT NOT NULL,
    topic TEXT NOT NULL,
    payload JSONB NOT NULL,
    published BOOLEAN NOT NULL DEFAULT FALSE,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    seq BIGSERIAL NOT NULL
)
"#;

const CREATE_OUTBOX_PENDING_INDEX: &str = r#"
CREATE INDEX IF NOT EXISTS idx_outbox_unpublished
    ON outbox (published, created_at, seq)
"#;

/// Create all tables and indexes if missing
pub async fn init_schema(pool: &PgPool) -> Result<(), sqlx::Error> {
    tracing::info!("Initializing PostgreSQL schema...");

    for (name, ddl) in [
        ("transfers", CREATE_TRANSFERS_TABLE),
        ("transfers destination index", CREATE_TRANSFERS_DEST_INDEX),
        ("temperature_readings", CREATE_READINGS_TABLE),
        ("alerts", CREATE_ALERTS_TABLE),
        ("outbox", CREATE_OUTBOX_TABLE),
        ("outbox pending index", CREATE_OUTBOX_PENDING_INDEX),
    ] {
        sqlx::query(ddl).execute(pool).await.inspect_err(|e| {
            tracing::error!(object = name, error = %e, "Failed to create schema object");
        })?;
    }

    tracing::info!("PostgreSQL schema initialized successfully");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ddl_is_idempotent() {
        for ddl in [
            CREATE_TRANSFERS_TABLE,
            CREATE_TRANSFERS_DEST_INDEX,
            CREATE_READINGS_TABLE,
            CREATE_ALERTS_TABLE,
            CREATE_OUTBOX_TABLE,
            CREATE_OUTBOX_PENDING_INDEX,
        ] {
            assert!(ddl.contains("IF NOT EXISTS"));
        }
    }

    #[test]
    fn test_idempotency_key_is_unique() {
        assert!(CREATE_TRANSFERS_TABLE.contains("idempotency_key TEXT UNIQUE"));
        assert!(CREATE_OUTBOX_TABLE.contains("payload JSONB"));
    }
}
