//! Temperature readings and alerts

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Default lower alert bound (°C)
pub const DEFAULT_TEMP_MIN: f64 = -5.0;
/// Default upper alert bound (°C)
pub const DEFAULT_TEMP_MAX: f64 = 8.0;

/// Sensor observation as submitted by a client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct TemperatureReading {
    #[schema(example = "R1")]
    pub room_id: String,
    #[schema(example = 4.5)]
    pub temp: f64,
    /// Observation time; ingestion time when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ts: Option<DateTime<Utc>>,
}

/// Reading as persisted, with its observation time resolved
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedReading {
    pub id: Uuid,
    pub room_id: String,
    pub temp: f64,
    pub recorded_at: DateTime<Utc>,
}

impl RecordedReading {
    pub fn from_reading(reading: &TemperatureReading, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            room_id: reading.room_id.clone(),
            temp: reading.temp,
            recorded_at: reading.ts.unwrap_or(now),
        }
    }
}

/// Alert severity
///
/// Current policy only raises `critical`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum AlertLevel {
    Critical,
}

impl AlertLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertLevel::Critical => "critical",
        }
    }

    pub fn from_str_opt(s: &str) -> Option<Self> {
        match s {
            "critical" => Some(AlertLevel::Critical),
            _ => None,
        }
    }
}

impl fmt::Display for AlertLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A reading that broke the configured safe range
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Alert {
    pub id: Uuid,
    pub room_id: String,
    pub temp: f64,
    pub level: AlertLevel,
    pub message: String,
    pub created_at: DateTime<Utc>,
}
