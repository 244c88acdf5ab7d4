//! In-memory store
//!
//! Backs the `storage: memory` dev mode and the unit tests. One mutex guards
//! all tables, so every multi-row write is atomic.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use uuid::Uuid;

use super::Store;
use crate::error::ServiceError;
use crate::outbox::OutboxEvent;
use crate::temperature::{Alert, RecordedReading};
use crate::transfer::{StatusChange, Transfer, TransferId, TransferStatus};

#[derive(Default)]
struct Tables {
    transfers: HashMap<TransferId, Transfer>,
    idempotency_keys: HashMap<String, TransferId>,
    readings: Vec<RecordedReading>,
    alerts: Vec<Alert>,
    outbox: Vec<OutboxEvent>,
    next_seq: i64,
}

impl Tables {
    fn append_event(&mut self, event: &OutboxEvent) {
        self.next_seq += 1;
        let mut row = event.clone();
        row.seq = self.next_seq;
        row.published = false;
        self.outbox.push(row);
    }
}

#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn tables(&self) -> MutexGuard<'_, Tables> {
        // A panic while holding the lock leaves the tables consistent: every
        // write completes before the guard drops.
        self.tables.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Snapshot of every outbox row, published or not
    pub fn outbox_events(&self) -> Vec<OutboxEvent> {
        self.tables().outbox.clone()
    }

    pub fn reading_count(&self) -> usize {
        self.tables().readings.len()
    }

    pub fn transfer_count(&self) -> usize {
        self.tables().transfers.len()
    }
}

#[async_trait]
impl Store for MemoryStore {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn health_check(&self) -> Result<(), ServiceError> {
        Ok(())
    }

    async fn insert_transfer(
        &self,
        transfer: &Transfer,
        idempotency_key: Option<&str>,
        event: &OutboxEvent,
    ) -> Result<(), ServiceError> {
        let mut tables = self.tables();

        if let Some(key) = idempotency_key
            && tables.idempotency_keys.contains_key(key)
        {
            return Err(ServiceError::DuplicateRequest);
        }
        if tables.transfers.contains_key(&transfer.id) {
            return Err(ServiceError::DatabaseError(format!(
                "duplicate transfer id {}",
                transfer.id
            )));
        }

        if let Some(key) = idempotency_key {
            tables.idempotency_keys.insert(key.to_string(), transfer.id);
        }
        tables.transfers.insert(transfer.id, transfer.clone());
        tables.append_event(event);
        Ok(())
    }

    async fn get_transfer(&self, id: TransferId) -> Result<Option<Transfer>, ServiceError> {
        Ok(self.tables().transfers.get(&id).cloned())
    }

    async fn transition_transfer(
        &self,
        id: TransferId,
        change: &StatusChange,
        event: &OutboxEvent,
    ) -> Result<bool, ServiceError> {
        let mut tables = self.tables();

        let Some(transfer) = tables.transfers.get_mut(&id) else {
            return Ok(false);
        };
        if transfer.status != change.expected {
            return Ok(false);
        }

        transfer.status = change.new;
        transfer.approved_by = change.approved_by.clone();
        transfer.updated_at = change.at;
        tables.append_event(event);
        Ok(true)
    }

    async fn count_in_flight(&self, destination: &str) -> Result<i64, ServiceError> {
        let count = self
            .tables()
            .transfers
            .values()
            .filter(|t| t.to_location == destination)
            .filter(|t| TransferStatus::in_flight_names().contains(&t.status.as_str()))
            .count();
        Ok(count as i64)
    }

    async fn insert_reading(&self, reading: &RecordedReading) -> Result<(), ServiceError> {
        self.tables().readings.push(reading.clone());
        Ok(())
    }

    async fn record_alert(&self, alert: &Alert, event: &OutboxEvent) -> Result<(), ServiceError> {
        let mut tables = self.tables();
        tables.alerts.push(alert.clone());
        tables.append_event(event);
        Ok(())
    }

    async fn list_alerts(&self, limit: i64) -> Result<Vec<Alert>, ServiceError> {
        let tables = self.tables();
        // Reverse first so that equal timestamps keep newest-inserted first
        // through the stable sort.
        let mut alerts: Vec<Alert> = tables.alerts.iter().rev().cloned().collect();
        alerts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        alerts.truncate(limit.max(0) as usize);
        Ok(alerts)
    }

    async fn fetch_unpublished(&self) -> Result<Vec<OutboxEvent>, ServiceError> {
        let mut events: Vec<OutboxEvent> = self
            .tables()
            .outbox
            .iter()
            .filter(|e| !e.published)
            .cloned()
            .collect();
        events.sort_by(|a, b| (a.created_at, a.seq).cmp(&(b.created_at, b.seq)));
        Ok(events)
    }

    async fn count_unpublished(&self) -> Result<i64, ServiceError> {
        Ok(self.tables().outbox.iter().filter(|e| !e.published).count() as i64)
    }

    async fn mark_published(&self, id: Uuid) -> Result<(), ServiceError> {
        if let Some(row) = self.tables().outbox.iter_mut().find(|e| e.id == id) {
            row.published = true;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outbox::DomainEvent;
    use crate::temperature::AlertLevel;
    use crate::transfer::CreateTransferRequest;
    use chrono::{Duration, Utc};

    fn transfer(to: &str) -> Transfer {
        Transfer::pending(
            CreateTransferRequest {
                pallet_id: "PAL-1".into(),
                from_location: "COLD-A".into(),
                to_location: to.into(),
                requested_by: "picker".into(),
            },
            Utc::now(),
        )
    }

    fn created(t: &Transfer) -> OutboxEvent {
        OutboxEvent::record(&DomainEvent::transfer_created(t)).unwrap()
    }

    fn alert(created_at: chrono::DateTime<Utc>, room: &str) -> Alert {
        Alert {
            id: Uuid::new_v4(),
            room_id: room.into(),
            temp: 10.0,
            level: AlertLevel::Critical,
            message: "hot".into(),
            created_at,
        }
    }

    #[tokio::test]
    async fn test_duplicate_idempotency_key_rejected_without_event() {
        let store = MemoryStore::new();
        let a = transfer("DOCK1");
        let b = transfer("DOCK1");

        store.insert_transfer(&a, Some("k-1"), &created(&a)).await.unwrap();
        let err = store
            .insert_transfer(&b, Some("k-1"), &created(&b))
            .await
            .unwrap_err();

        assert_eq!(err, ServiceError::DuplicateRequest);
        assert_eq!(store.transfer_count(), 1);
        assert_eq!(store.outbox_events().len(), 1);
    }

    #[tokio::test]
    async fn test_transfers_without_key_do_not_conflict() {
        let store = MemoryStore::new();
        for _ in 0..3 {
            let t = transfer("DOCK1");
            store.insert_transfer(&t, None, &created(&t)).await.unwrap();
        }
        assert_eq!(store.transfer_count(), 3);
    }

    #[tokio::test]
    async fn test_transition_is_compare_and_set() {
        let store = MemoryStore::new();
        let t = transfer("DOCK1");
        store.insert_transfer(&t, None, &created(&t)).await.unwrap();

        let change = StatusChange {
            expected: TransferStatus::Pending,
            new: TransferStatus::Accepted,
            approved_by: Some("supervisor".into()),
            at: Utc::now(),
        };
        let event =
            OutboxEvent::record(&DomainEvent::transfer_accepted(t.id, "supervisor", change.at))
                .unwrap();

        assert!(store.transition_transfer(t.id, &change, &event).await.unwrap());
        assert!(!store.transition_transfer(t.id, &change, &event).await.unwrap());
        assert_eq!(store.outbox_events().len(), 2);

        let stored = store.get_transfer(t.id).await.unwrap().unwrap();
        assert_eq!(stored.status, TransferStatus::Accepted);
        assert_eq!(stored.approved_by.as_deref(), Some("supervisor"));
    }

    #[tokio::test]
    async fn test_count_in_flight_ignores_completed() {
        let store = MemoryStore::new();
        let t = transfer("DOCK1");
        store.insert_transfer(&t, None, &created(&t)).await.unwrap();
        assert_eq!(store.count_in_flight("DOCK1").await.unwrap(), 1);

        let at = Utc::now();
        let ev = created(&t);
        for (expected, new) in [
            (TransferStatus::Pending, TransferStatus::Accepted),
            (TransferStatus::Accepted, TransferStatus::Completed),
        ] {
            let change = StatusChange {
                expected,
                new,
                approved_by: None,
                at,
            };
            assert!(store.transition_transfer(t.id, &change, &ev).await.unwrap());
        }
        assert_eq!(store.count_in_flight("DOCK1").await.unwrap(), 0);
        assert_eq!(store.count_in_flight("DOCK2").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_list_alerts_newest_first_with_limit() {
        let store = MemoryStore::new();
        let base = Utc::now();
        for i in 0..5 {
            let a = alert(base + Duration::seconds(i), &format!("R{}", i));
            let ev = OutboxEvent::record(&DomainEvent::temperature_alert(&a)).unwrap();
            store.record_alert(&a, &ev).await.unwrap();
        }

        let alerts = store.list_alerts(3).await.unwrap();
        let rooms: Vec<&str> = alerts.iter().map(|a| a.room_id.as_str()).collect();
        assert_eq!(rooms, vec!["R4", "R3", "R2"]);
    }

    #[tokio::test]
    async fn test_list_alerts_ties_prefer_latest_insert() {
        let store = MemoryStore::new();
        let at = Utc::now();
        for room in ["first", "second"] {
            let a = alert(at, room);
            let ev = OutboxEvent::record(&DomainEvent::temperature_alert(&a)).unwrap();
            store.record_alert(&a, &ev).await.unwrap();
        }
        let alerts = store.list_alerts(10).await.unwrap();
        assert_eq!(alerts[0].room_id, "second");
    }

    #[tokio::test]
    async fn test_fetch_unpublished_orders_by_created_then_seq() {
        let store = MemoryStore::new();
        let at = Utc::now();
        let t1 = transfer("DOCK1");
        let t2 = transfer("DOCK1");
        let t0 = transfer("DOCK1");

        // Same timestamp for the first two, earlier timestamp for the third.
        let e1 = OutboxEvent::record_at(&DomainEvent::transfer_created(&t1), at).unwrap();
        let e2 = OutboxEvent::record_at(&DomainEvent::transfer_created(&t2), at).unwrap();
        let e0 = OutboxEvent::record_at(
            &DomainEvent::transfer_created(&t0),
            at - Duration::seconds(1),
        )
        .unwrap();

        store.insert_transfer(&t1, None, &e1).await.unwrap();
        store.insert_transfer(&t2, None, &e2).await.unwrap();
        store.insert_transfer(&t0, None, &e0).await.unwrap();

        let ids: Vec<Uuid> = store
            .fetch_unpublished()
            .await
            .unwrap()
            .iter()
            .map(|e| e.id)
            .collect();
        assert_eq!(ids, vec![e0.id, e1.id, e2.id]);

        assert_eq!(store.count_unpublished().await.unwrap(), 3);
        store.mark_published(e0.id).await.unwrap();
        assert_eq!(store.fetch_unpublished().await.unwrap().len(), 2);
        assert_eq!(store.count_unpublished().await.unwrap(), 2);
    }
}
