//! Outbox Relay
//!
//! Drains unpublished events to a sink in `(created_at, seq)` order. Each
//! event is marked published only after the sink accepted it, so a crash or
//! error between the two steps leads to redelivery, never loss.

use std::sync::Arc;

use serde::Serialize;
use tracing::{error, info};
use utoipa::ToSchema;

use super::sink::EventSink;
use crate::error::ServiceError;
use crate::store::Store;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct FlushReport {
    pub delivered: usize,
}

pub struct OutboxRelay {
    store: Arc<dyn Store>,
    sink: Arc<dyn EventSink>,
}

impl OutboxRelay {
    pub fn new(store: Arc<dyn Store>, sink: Arc<dyn EventSink>) -> Self {
        Self { store, sink }
    }

    pub fn sink_name(&self) -> &'static str {
        self.sink.name()
    }

    /// Deliver every pending event, stopping at the first failure
    pub async fn flush(&self) -> Result<FlushReport, ServiceError> {
        let pending = self.store.fetch_unpublished().await?;
        let mut report = FlushReport::default();

        for event in &pending {
            if let Err(e) = self.sink.deliver(event).await {
                error!(
                    id = %event.id,
                    topic = %event.topic,
                    sink = self.sink.name(),
                    error = %e,
                    "Delivery failed, stopping flush"
                );
                return Err(e);
            }
            if let Err(e) = self.store.mark_published(event.id).await {
                error!(
                    id = %event.id,
                    error = %e,
                    "Delivered but not marked, will redeliver"
                );
                return Err(e);
            }
            report.delivered += 1;
        }

        if report.delivered > 0 {
            info!(
                delivered = report.delivered,
                sink = self.sink.name(),
                "Outbox flushed"
            );
        }
        Ok(report)
    }
}
