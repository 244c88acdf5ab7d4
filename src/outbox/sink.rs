//! Event sinks
//!
//! A sink receives each unpublished outbox event exactly as stored. Delivery
//! must be idempotent per event id, since an event delivered but not yet
//! marked published is delivered again on the next flush.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::debug;

use super::event::OutboxEvent;
use crate::error::ServiceError;

#[async_trait]
pub trait EventSink: Send + Sync {
    fn name(&self) -> &'static str;

    async fn deliver(&self, event: &OutboxEvent) -> Result<(), ServiceError>;
}

/// Writes one `{aggregate_type}_{id}.json` file per event
pub struct FileSink {
    dir: PathBuf,
}

impl FileSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, event: &OutboxEvent) -> PathBuf {
        self.dir.join(event.file_name())
    }
}

#[async_trait]
impl EventSink for FileSink {
    fn name(&self) -> &'static str {
        "file"
    }

    async fn deliver(&self, event: &OutboxEvent) -> Result<(), ServiceError> {
        tokio::fs::create_dir_all(&self.dir).await?;

        let path = self.path_for(event);
        let body = serde_json::to_vec_pretty(&event.payload)?;
        tokio::fs::write(&path, body).await?;

        debug!(path = %path.display(), topic = %event.topic, "Event written");
        Ok(())
    }
}
