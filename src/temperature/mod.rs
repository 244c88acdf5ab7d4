//! Cold-storage temperature monitoring

pub mod monitor;
pub mod types;

pub use monitor::{IngestReport, TemperatureMonitor, ThresholdConfig};
pub use types::{
    Alert, AlertLevel, DEFAULT_TEMP_MAX, DEFAULT_TEMP_MIN, RecordedReading, TemperatureReading,
};
