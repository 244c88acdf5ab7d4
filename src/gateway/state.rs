use std::sync::Arc;

use crate::config::AppConfig;
use crate::metrics::Metrics;
use crate::outbox::{EventSink, FileSink, OutboxRelay};
use crate::store::Store;
use crate::temperature::TemperatureMonitor;
use crate::transfer::TransferService;

/// Gateway shared state
#[derive(Clone)]
pub struct AppState {
    pub transfers: Arc<TransferService>,
    pub monitor: Arc<TemperatureMonitor>,
    pub relay: Arc<OutboxRelay>,
    pub store: Arc<dyn Store>,
    pub metrics: Arc<Metrics>,
}

impl AppState {
    pub fn new(
        transfers: Arc<TransferService>,
        monitor: Arc<TemperatureMonitor>,
        relay: Arc<OutboxRelay>,
        store: Arc<dyn Store>,
        metrics: Arc<Metrics>,
    ) -> Self {
        Self {
            transfers,
            monitor,
            relay,
            store,
            metrics,
        }
    }

    /// Wire every service onto `store` from config, using the file sink
    pub fn from_config(store: Arc<dyn Store>, config: &AppConfig) -> Self {
        let sink: Arc<dyn EventSink> = Arc::new(FileSink::new(&config.outbox.dir));
        Self::with_sink(store, sink, config)
    }

    pub fn with_sink(store: Arc<dyn Store>, sink: Arc<dyn EventSink>, config: &AppConfig) -> Self {
        let metrics = Arc::new(Metrics::new());
        Self::new(
            Arc::new(TransferService::new(store.clone(), config.transfer_config())),
            Arc::new(
                TemperatureMonitor::new(store.clone(), config.threshold_config())
                    .with_metrics(metrics.clone()),
            ),
            Arc::new(OutboxRelay::new(store.clone(), sink)),
            store,
            metrics,
        )
    }
}
