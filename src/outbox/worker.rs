//! Outbox Worker
//!
//! Background loop that flushes the outbox on a fixed interval.

use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info};

use super::relay::OutboxRelay;
use crate::error::ServiceError;
use crate::metrics::Metrics;

pub struct OutboxWorker {
    relay: Arc<OutboxRelay>,
    metrics: Arc<Metrics>,
    interval: Duration,
}

impl OutboxWorker {
    pub fn new(relay: Arc<OutboxRelay>, metrics: Arc<Metrics>, interval: Duration) -> Self {
        Self {
            relay,
            metrics,
            interval,
        }
    }

    /// Run the flush loop forever
    ///
    /// A failed flush is logged; the next tick retries from the first
    /// unpublished event.
    pub async fn run(&self) -> ! {
        info!(
            interval_ms = self.interval.as_millis() as u64,
            sink = self.relay.sink_name(),
            "Starting outbox worker"
        );

        loop {
            if let Err(e) = self.tick().await {
                error!(error = %e, "Outbox flush failed");
            }

            tokio::time::sleep(self.interval).await;
        }
    }

    /// Run a single flush cycle
    pub async fn tick(&self) -> Result<usize, ServiceError> {
        match self.relay.flush().await {
            Ok(report) => {
                if report.delivered == 0 {
                    debug!("Outbox empty");
                }
                self.metrics.add_published(report.delivered);
                Ok(report.delivered)
            }
            Err(e) => {
                self.metrics.inc_flush_failures();
                Err(e)
            }
        }
    }
}
