//! Pallet Gateway
//!
//! ```text
//! ┌──────────┐    ┌───────────────┐    ┌──────────┐    ┌──────────┐
//! │  HTTP    │───▶│ Transfer /    │───▶│  Store   │───▶│  Outbox  │
//! │ (axum)   │    │ Temperature   │    │ (PG/mem) │    │  Relay   │
//! └──────────┘    └───────────────┘    └──────────┘    └──────────┘
//! ```
//!
//! Usage: `pallet_gateway [--env dev] [--port 8080]`

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use pallet_gateway::config::{AppConfig, StorageKind};
use pallet_gateway::db::{Database, schema};
use pallet_gateway::gateway::{self, state::AppState};
use pallet_gateway::outbox::OutboxWorker;
use pallet_gateway::store::{MemoryStore, PgStore, Store};

fn get_env() -> String {
    let args: Vec<String> = std::env::args().collect();
    for i in 0..args.len() {
        if (args[i] == "--env" || args[i] == "-e") && i + 1 < args.len() {
            return args[i + 1].clone();
        }
    }
    "dev".to_string()
}

/// Get port override from command line (--port argument)
fn get_port_override() -> Option<u16> {
    let args: Vec<String> = std::env::args().collect();
    for i in 0..args.len() {
        if args[i] == "--port" && i + 1 < args.len() {
            return args[i + 1].parse().ok();
        }
    }
    None
}

async fn open_store(config: &AppConfig) -> anyhow::Result<Arc<dyn Store>> {
    match config.storage {
        StorageKind::Postgres => {
            let db = Database::connect(&config.database)
                .await
                .context("Failed to connect to PostgreSQL")?;
            schema::init_schema(db.pool())
                .await
                .context("Failed to initialize schema")?;
            println!("✅ PostgreSQL connected and schema initialized");
            Ok(Arc::new(PgStore::new(db.pool().clone())))
        }
        StorageKind::Memory => {
            println!("⚠️  In-memory storage: state is lost on restart");
            Ok(Arc::new(MemoryStore::new()))
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let env = get_env();
    let mut app_config = AppConfig::load(&env)?;
    if let Some(port) = get_port_override() {
        app_config.gateway.port = port;
    }
    let _log_guard = pallet_gateway::logging::init_logging(&app_config);

    tracing::info!("Starting Pallet Gateway in {} mode", env);
    println!("=== Pallet Gateway ({}) ===", env);

    let store = open_store(&app_config).await?;
    let state = Arc::new(AppState::from_config(store, &app_config));

    if app_config.outbox.poll_interval_ms > 0 {
        let worker = OutboxWorker::new(
            state.relay.clone(),
            state.metrics.clone(),
            Duration::from_millis(app_config.outbox.poll_interval_ms),
        );
        tokio::spawn(async move {
            worker.run().await;
        });
        println!(
            "🔄 Outbox worker started (every {} ms)",
            app_config.outbox.poll_interval_ms
        );
    } else {
        println!("📤 Outbox relay on demand (poll_interval_ms = 0)");
    }

    gateway::run_server(state, &app_config.gateway.host, app_config.gateway.port).await
}
