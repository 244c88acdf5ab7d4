//! Temperature Threshold Monitor
//!
//! Stores every reading and raises a critical alert, plus its outbox event,
//! for each reading outside the configured safe range. A batch is processed
//! in order and stops at the first persistence failure; readings stored
//! before the failure stay stored.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info};
use utoipa::ToSchema;
use uuid::Uuid;

use super::types::{
    Alert, AlertLevel, DEFAULT_TEMP_MAX, DEFAULT_TEMP_MIN, RecordedReading, TemperatureReading,
};
use crate::error::ServiceError;
use crate::metrics::Metrics;
use crate::outbox::{DomainEvent, OutboxEvent};
use crate::store::{ALERT_LIST_LIMIT, Store, store_now};

/// Safe range, inclusive on both ends
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThresholdConfig {
    pub min: f64,
    pub max: f64,
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self {
            min: DEFAULT_TEMP_MIN,
            max: DEFAULT_TEMP_MAX,
        }
    }
}

impl ThresholdConfig {
    #[inline]
    pub fn is_breach(&self, temp: f64) -> bool {
        temp < self.min || temp > self.max
    }

    pub fn breach_message(&self, temp: f64) -> String {
        format!(
            "temp {:.2} out of bounds ({:.2}..{:.2})",
            temp, self.min, self.max
        )
    }
}

/// Outcome of one ingest batch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct IngestReport {
    pub readings: usize,
    pub alerts: usize,
}

pub struct TemperatureMonitor {
    store: Arc<dyn Store>,
    thresholds: ThresholdConfig,
    metrics: Option<Arc<Metrics>>,
}

impl TemperatureMonitor {
    pub fn new(store: Arc<dyn Store>, thresholds: ThresholdConfig) -> Self {
        Self {
            store,
            thresholds,
            metrics: None,
        }
    }

    /// Count each committed reading and alert, including those of a batch
    /// that later fails
    pub fn with_metrics(mut self, metrics: Arc<Metrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn thresholds(&self) -> ThresholdConfig {
        self.thresholds
    }

    pub async fn ingest(
        &self,
        readings: &[TemperatureReading],
    ) -> Result<IngestReport, ServiceError> {
        let mut report = IngestReport::default();

        for reading in readings {
            let now = store_now();
            let recorded = RecordedReading::from_reading(reading, now);
            self.store.insert_reading(&recorded).await?;
            report.readings += 1;
            self.count(1, 0);

            if !self.thresholds.is_breach(recorded.temp) {
                continue;
            }

            let alert = Alert {
                id: Uuid::new_v4(),
                room_id: recorded.room_id.clone(),
                temp: recorded.temp,
                level: AlertLevel::Critical,
                message: self.thresholds.breach_message(recorded.temp),
                created_at: now,
            };
            let event = OutboxEvent::record_at(&DomainEvent::temperature_alert(&alert), now)?;
            self.store.record_alert(&alert, &event).await?;
            report.alerts += 1;
            self.count(0, 1);

            info!(
                event = "temperature.alert",
                room = %alert.room_id,
                temp = alert.temp,
                "Alert created"
            );
        }

        debug!(
            readings = report.readings,
            alerts = report.alerts,
            "Ingest batch done"
        );
        Ok(report)
    }

    /// Newest 100 alerts, newest first
    pub async fn list_alerts(&self) -> Result<Vec<Alert>, ServiceError> {
        self.store.list_alerts(ALERT_LIST_LIMIT).await
    }

    fn count(&self, readings: usize, alerts: usize) {
        if let Some(metrics) = &self.metrics {
            metrics.add_ingest(readings, alerts);
        }
    }
}
