use anyhow::Context;
use serde::{Deserialize, Serialize};
use sqlx::postgres::{PgConnectOptions, PgSslMode};
use std::fs;
use std::path::Path;

use crate::temperature::{DEFAULT_TEMP_MAX, DEFAULT_TEMP_MIN, ThresholdConfig};
use crate::transfer::{CapacityPolicy, DEFAULT_MAX_PER_LOCATION, TransferConfig};

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    pub log_level: String,
    pub log_dir: String,
    pub log_file: String,
    pub use_json: bool,
    pub rotation: String,
    pub storage: StorageKind,
    pub gateway: GatewayConfig,
    pub database: DatabaseConfig,
    pub transfer: TransferSettings,
    pub temperature: TemperatureSettings,
    pub outbox: OutboxSettings,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_dir: "logs".to_string(),
            log_file: "app.log".to_string(),
            use_json: false,
            rotation: "never".to_string(),
            storage: StorageKind::Postgres,
            gateway: GatewayConfig::default(),
            database: DatabaseConfig::default(),
            transfer: TransferSettings::default(),
            temperature: TemperatureSettings::default(),
            outbox: OutboxSettings::default(),
        }
    }
}

/// Backing store selection
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StorageKind {
    Postgres,
    /// Dev mode: no database, state is lost on restart
    Memory,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct GatewayConfig {
    pub host: String,
    pub port: u16,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Full connection URL; takes precedence over the individual fields
    pub url: Option<String>,
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub name: String,
    pub max_connections: u32,
    pub acquire_timeout_secs: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: None,
            host: "localhost".to_string(),
            port: 5432,
            user: "postgres".to_string(),
            password: String::new(),
            name: "pallet_gateway".to_string(),
            max_connections: 10,
            acquire_timeout_secs: 5,
        }
    }
}

impl DatabaseConfig {
    /// Connection options from `url` when set, else from the individual fields
    ///
    /// The fields are passed through unescaped, so credentials may hold any
    /// character.
    pub fn connect_options(&self) -> Result<PgConnectOptions, sqlx::Error> {
        match &self.url {
            Some(url) => url.parse(),
            None => Ok(PgConnectOptions::new()
                .host(&self.host)
                .port(self.port)
                .username(&self.user)
                .password(&self.password)
                .database(&self.name)
                .ssl_mode(PgSslMode::Disable)),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct TransferSettings {
    pub max_capacity_per_location: u32,
    pub validate_capacity: bool,
    /// Identity recorded on accept
    pub approver: String,
    /// Identity recorded on complete
    pub processor: String,
}

impl Default for TransferSettings {
    fn default() -> Self {
        Self {
            max_capacity_per_location: DEFAULT_MAX_PER_LOCATION,
            validate_capacity: true,
            approver: "supervisor".to_string(),
            processor: "operator".to_string(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct TemperatureSettings {
    pub min: f64,
    pub max: f64,
}

impl Default for TemperatureSettings {
    fn default() -> Self {
        Self {
            min: DEFAULT_TEMP_MIN,
            max: DEFAULT_TEMP_MAX,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct OutboxSettings {
    /// Directory the file sink writes into (created on demand)
    pub dir: String,
    /// Background flush interval; 0 disables the poller
    pub poll_interval_ms: u64,
}

impl Default for OutboxSettings {
    fn default() -> Self {
        Self {
            dir: "outbox_events".to_string(),
            poll_interval_ms: 0,
        }
    }
}

impl AppConfig {
    /// Load `config/{env}.yaml`, falling back to defaults when the file is
    /// absent, then apply environment overrides.
    pub fn load(env: &str) -> anyhow::Result<Self> {
        let config_path = format!("config/{}.yaml", env);
        let mut config = Self::from_file(&config_path)?;
        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::from_yaml(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    pub fn from_yaml(content: &str) -> anyhow::Result<Self> {
        Ok(serde_yaml::from_str(content)?)
    }

    /// Apply environment-style overrides from `lookup`
    ///
    /// Unparsable numeric values are ignored and the current value is kept.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.is_empty());

        if let Some(url) = get("DATABASE_URL") {
            self.database.url = Some(url);
        }
        if let Some(host) = get("DB_HOST") {
            self.database.host = host;
        }
        if let Some(port) = get("DB_PORT") {
            override_parsed(&mut self.database.port, "DB_PORT", &port);
        }
        if let Some(user) = get("DB_USER") {
            self.database.user = user;
        }
        if let Some(pass) = get("DB_PASS") {
            self.database.password = pass;
        }
        if let Some(name) = get("DB_NAME") {
            self.database.name = name;
        }

        if let Some(v) = get("TEMP_MIN") {
            override_parsed(&mut self.temperature.min, "TEMP_MIN", &v);
        }
        if let Some(v) = get("TEMP_MAX") {
            override_parsed(&mut self.temperature.max, "TEMP_MAX", &v);
        }

        if let Some(v) = get("MAX_CAPACITY_PER_LOCATION") {
            override_parsed(
                &mut self.transfer.max_capacity_per_location,
                "MAX_CAPACITY_PER_LOCATION",
                &v,
            );
        }
        if let Some(v) = get("VALIDATE_CAPACITY") {
            self.transfer.validate_capacity = !(v == "false" || v == "0");
        }

        if let Some(v) = get("LOG_LEVEL") {
            self.log_level = v;
        }
        if let Some(dir) = get("OUTBOX_DIR") {
            self.outbox.dir = dir;
        }
    }

    pub fn transfer_config(&self) -> TransferConfig {
        TransferConfig {
            capacity: CapacityPolicy {
                max_per_location: self.transfer.max_capacity_per_location,
                enabled: self.transfer.validate_capacity,
            },
            approver: self.transfer.approver.clone(),
            processor: self.transfer.processor.clone(),
        }
    }

    pub fn threshold_config(&self) -> ThresholdConfig {
        ThresholdConfig {
            min: self.temperature.min,
            max: self.temperature.max,
        }
    }
}

fn override_parsed<T: std::str::FromStr>(slot: &mut T, key: &str, raw: &str) {
    match raw.parse::<T>() {
        Ok(v) => *slot = v,
        Err(_) => eprintln!("⚠️  Ignoring {}={:?}: not a valid value", key, raw),
    }
}
