//! Domain events and their outbox records
//!
//! A [`DomainEvent`] is the typed fact produced by a state change. It is
//! turned into an [`OutboxEvent`] row before the store writes it in the same
//! transaction as the change itself.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ServiceError;
use crate::store::store_now;
use crate::temperature::Alert;
use crate::transfer::{Transfer, TransferId};

pub const AGGREGATE_TRANSFER: &str = "transfer";
pub const AGGREGATE_TEMPERATURE: &str = "temperature";

/// RFC 3339, second precision, `Z` suffix
pub fn format_ts(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Typed event payloads, tagged by topic name
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event")]
pub enum DomainEvent {
    #[serde(rename = "transfer.created")]
    TransferCreated {
        transfer_id: String,
        pallet_id: String,
        from: String,
        to: String,
        status: String,
        requested_by: String,
        ts: String,
    },

    #[serde(rename = "transfer.accepted")]
    TransferAccepted {
        transfer_id: String,
        approved_by: String,
        ts: String,
    },

    #[serde(rename = "transfer.completed")]
    TransferCompleted {
        transfer_id: String,
        processed_by: String,
        ts: String,
    },

    #[serde(rename = "temperature.alert")]
    TemperatureAlert {
        alert_id: String,
        room_id: String,
        temp: f64,
        level: String,
        message: String,
        ts: String,
    },
}

impl DomainEvent {
    pub fn transfer_created(t: &Transfer) -> Self {
        DomainEvent::TransferCreated {
            transfer_id: t.id.to_string(),
            pallet_id: t.pallet_id.clone(),
            from: t.from_location.clone(),
            to: t.to_location.clone(),
            status: t.status.to_string(),
            requested_by: t.requested_by.clone(),
            ts: format_ts(t.created_at),
        }
    }

    pub fn transfer_accepted(id: TransferId, approved_by: &str, at: DateTime<Utc>) -> Self {
        DomainEvent::TransferAccepted {
            transfer_id: id.to_string(),
            approved_by: approved_by.to_string(),
            ts: format_ts(at),
        }
    }

    pub fn transfer_completed(id: TransferId, processed_by: &str, at: DateTime<Utc>) -> Self {
        DomainEvent::TransferCompleted {
            transfer_id: id.to_string(),
            processed_by: processed_by.to_string(),
            ts: format_ts(at),
        }
    }

    pub fn temperature_alert(a: &Alert) -> Self {
        DomainEvent::TemperatureAlert {
            alert_id: a.id.to_string(),
            room_id: a.room_id.clone(),
            temp: a.temp,
            level: a.level.to_string(),
            message: a.message.clone(),
            ts: format_ts(a.created_at),
        }
    }

    /// Topic name, identical to the serde tag
    pub fn topic(&self) -> &'static str {
        match self {
            DomainEvent::TransferCreated { .. } => "transfer.created",
            DomainEvent::TransferAccepted { .. } => "transfer.accepted",
            DomainEvent::TransferCompleted { .. } => "transfer.completed",
            DomainEvent::TemperatureAlert { .. } => "temperature.alert",
        }
    }

    pub fn aggregate_type(&self) -> &'static str {
        match self {
            DomainEvent::TransferCreated { .. }
            | DomainEvent::TransferAccepted { .. }
            | DomainEvent::TransferCompleted { .. } => AGGREGATE_TRANSFER,
            DomainEvent::TemperatureAlert { .. } => AGGREGATE_TEMPERATURE,
        }
    }

    pub fn aggregate_id(&self) -> &str {
        match self {
            DomainEvent::TransferCreated { transfer_id, .. }
            | DomainEvent::TransferAccepted { transfer_id, .. }
            | DomainEvent::TransferCompleted { transfer_id, .. } => transfer_id,
            DomainEvent::TemperatureAlert { alert_id, .. } => alert_id,
        }
    }
}

/// Durable outbox row
///
/// `seq` is assigned by the store on insert and breaks `created_at` ties.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutboxEvent {
    pub id: Uuid,
    pub aggregate_type: String,
    pub aggregate_id: String,
    pub topic: String,
    pub payload: serde_json::Value,
    pub published: bool,
    pub created_at: DateTime<Utc>,
    pub seq: i64,
}

impl OutboxEvent {
    /// Build an unpublished row for `event`, stamped now
    pub fn record(event: &DomainEvent) -> Result<Self, ServiceError> {
        Self::record_at(event, store_now())
    }

    pub fn record_at(event: &DomainEvent, at: DateTime<Utc>) -> Result<Self, ServiceError> {
        Ok(Self {
            id: Uuid::new_v4(),
            aggregate_type: event.aggregate_type().to_string(),
            aggregate_id: event.aggregate_id().to_string(),
            topic: event.topic().to_string(),
            payload: serde_json::to_value(event)?,
            published: false,
            created_at: at,
            seq: 0,
        })
    }

    /// File name used by the file sink
    pub fn file_name(&self) -> String {
        format!("{}_{}.json", self.aggregate_type, self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::temperature::AlertLevel;
    use crate::transfer::CreateTransferRequest;
    use chrono::TimeZone;

    fn transfer() -> Transfer {
        let at = Utc.with_ymd_and_hms(2024, 5, 1, 10, 30, 0).unwrap();
        Transfer::pending(
            CreateTransferRequest {
                pallet_id: "PAL-9".into(),
                from_location: "COLD-A".into(),
                to_location: "DOCK1".into(),
                requested_by: "picker".into(),
            },
            at,
        )
    }

    #[test]
    fn test_transfer_created_payload() {
        let t = transfer();
        let event = DomainEvent::transfer_created(&t);
        let row = OutboxEvent::record(&event).unwrap();

        assert_eq!(row.aggregate_type, "transfer");
        assert_eq!(row.aggregate_id, t.id.to_string());
        assert_eq!(row.topic, "transfer.created");
        assert!(!row.published);

        assert_eq!(row.payload["event"], "transfer.created");
        assert_eq!(row.payload["pallet_id"], "PAL-9");
        assert_eq!(row.payload["from"], "COLD-A");
        assert_eq!(row.payload["to"], "DOCK1");
        assert_eq!(row.payload["status"], "pending");
        assert_eq!(row.payload["requested_by"], "picker");
        assert_eq!(row.payload["ts"], "2024-05-01T10:30:00Z");
    }

    #[test]
    fn test_lifecycle_topics() {
        let id = TransferId::new();
        let at = Utc::now();
        let accepted = DomainEvent::transfer_accepted(id, "supervisor", at);
        let completed = DomainEvent::transfer_completed(id, "operator", at);

        assert_eq!(accepted.topic(), "transfer.accepted");
        assert_eq!(completed.topic(), "transfer.completed");
        assert_eq!(accepted.aggregate_id(), id.to_string());

        let payload = serde_json::to_value(&completed).unwrap();
        assert_eq!(payload["processed_by"], "operator");
    }

    #[test]
    fn test_alert_event_aggregate_is_alert() {
        let alert = Alert {
            id: Uuid::new_v4(),
            room_id: "R1".into(),
            temp: 12.0,
            level: AlertLevel::Critical,
            message: "temp 12.00 out of bounds (-5.00..8.00)".into(),
            created_at: Utc::now(),
        };
        let event = DomainEvent::temperature_alert(&alert);
        assert_eq!(event.aggregate_type(), "temperature");
        assert_eq!(event.aggregate_id(), alert.id.to_string());

        let payload = serde_json::to_value(&event).unwrap();
        assert_eq!(payload["level"], "critical");
        assert_eq!(payload["room_id"], "R1");
        assert_eq!(payload["temp"], 12.0);
    }

    #[test]
    fn test_payload_parses_back_by_tag() {
        let event = DomainEvent::transfer_created(&transfer());
        let row = OutboxEvent::record(&event).unwrap();
        let parsed: DomainEvent = serde_json::from_value(row.payload).unwrap();
        assert_eq!(parsed, event);
    }

    #[test]
    fn test_file_name() {
        let row = OutboxEvent::record(&DomainEvent::transfer_created(&transfer())).unwrap();
        assert_eq!(row.file_name(), format!("transfer_{}.json", row.id));
    }
}
