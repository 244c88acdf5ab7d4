//! Service counters and their Prometheus text rendering

use std::fmt::Write;
use std::sync::atomic::{AtomicU64, Ordering};

enum MetricType {
    Counter,
    Gauge,
}

impl MetricType {
    fn as_str(&self) -> &'static str {
        match self {
            MetricType::Counter => "counter",
            MetricType::Gauge => "gauge",
        }
    }
}

fn write_metric(output: &mut String, name: &str, help: &str, typ: MetricType, val: u64) {
    let _ = writeln!(output, "# HELP {name} {help}");
    let _ = writeln!(output, "# TYPE {name} {}", typ.as_str());
    let _ = writeln!(output, "{name} {val}");
}

#[derive(Debug, Default)]
pub struct Metrics {
    transfers_created: AtomicU64,
    capacity_rejections: AtomicU64,
    readings_ingested: AtomicU64,
    alerts_raised: AtomicU64,
    events_published: AtomicU64,
    flush_failures: AtomicU64,
}

/// Point-in-time copy of the counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub transfers_created: u64,
    pub capacity_rejections: u64,
    pub readings_ingested: u64,
    pub alerts_raised: u64,
    pub events_published: u64,
    pub flush_failures: u64,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn inc_transfers_created(&self) {
        self.transfers_created.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn inc_capacity_rejections(&self) {
        self.capacity_rejections.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add_ingest(&self, readings: usize, alerts: usize) {
        self.readings_ingested
            .fetch_add(readings as u64, Ordering::Relaxed);
        self.alerts_raised.fetch_add(alerts as u64, Ordering::Relaxed);
    }

    pub fn add_published(&self, n: usize) {
        self.events_published.fetch_add(n as u64, Ordering::Relaxed);
    }

    #[inline]
    pub fn inc_flush_failures(&self) {
        self.flush_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            transfers_created: self.transfers_created.load(Ordering::Relaxed),
            capacity_rejections: self.capacity_rejections.load(Ordering::Relaxed),
            readings_ingested: self.readings_ingested.load(Ordering::Relaxed),
            alerts_raised: self.alerts_raised.load(Ordering::Relaxed),
            events_published: self.events_published.load(Ordering::Relaxed),
            flush_failures: self.flush_failures.load(Ordering::Relaxed),
        }
    }

    /// Prometheus text exposition format
    pub fn render(&self, pending_events: Option<usize>) -> String {
        let s = self.snapshot();
        let mut output = String::with_capacity(1024);

        write_metric(
            &mut output,
            "pallet_gateway_transfers_created_total",
            "Transfers created",
            MetricType::Counter,
            s.transfers_created,
        );
        write_metric(
            &mut output,
            "pallet_gateway_capacity_rejections_total",
            "Transfer creations rejected for destination capacity",
            MetricType::Counter,
            s.capacity_rejections,
        );
        write_metric(
            &mut output,
            "pallet_gateway_readings_ingested_total",
            "Temperature readings stored",
            MetricType::Counter,
            s.readings_ingested,
        );
        write_metric(
            &mut output,
            "pallet_gateway_alerts_raised_total",
            "Temperature alerts raised",
            MetricType::Counter,
            s.alerts_raised,
        );
        write_metric(
            &mut output,
            "pallet_gateway_events_published_total",
            "Outbox events delivered to the sink",
            MetricType::Counter,
            s.events_published,
        );
        write_metric(
            &mut output,
            "pallet_gateway_flush_failures_total",
            "Outbox flushes that stopped on an error",
            MetricType::Counter,
            s.flush_failures,
        );
        if let Some(pending) = pending_events {
            write_metric(
                &mut output,
                "pallet_gateway_outbox_pending",
                "Unpublished outbox events",
                MetricType::Gauge,
                pending as u64,
            );
        }

        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters() {
        let m = Metrics::new();
        m.inc_transfers_created();
        m.inc_transfers_created();
        m.inc_capacity_rejections();
        m.add_ingest(5, 2);
        m.add_published(3);

        let s = m.snapshot();
        assert_eq!(s.transfers_created, 2);
        assert_eq!(s.capacity_rejections, 1);
        assert_eq!(s.readings_ingested, 5);
        assert_eq!(s.alerts_raised, 2);
        assert_eq!(s.events_published, 3);
        assert_eq!(s.flush_failures, 0);
    }

    #[test]
    fn test_render_prometheus_text() {
        let m = Metrics::new();
        m.add_ingest(4, 1);
        let text = m.render(Some(7));

        assert!(text.contains("# TYPE pallet_gateway_readings_ingested_total counter\n"));
        assert!(text.contains("pallet_gateway_readings_ingested_total 4\n"));
        assert!(text.contains("pallet_gateway_alerts_raised_total 1\n"));
        assert!(text.contains("# TYPE pallet_gateway_outbox_pending gauge\n"));
        assert!(text.contains("pallet_gateway_outbox_pending 7\n"));
    }

    #[test]
    fn test_render_without_gauge() {
        let text = Metrics::new().render(None);
        assert!(!text.contains("outbox_pending"));
        assert!(text.contains("pallet_gateway_transfers_created_total 0\n"));
    }
}
