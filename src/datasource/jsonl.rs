//! Event source over a JSONL capture file, one event object per line.

use super::{EventSource, EventSourceError};
use crate::domain::BillingEvent;
use async_trait::async_trait;
use std::path::PathBuf;
use tracing::debug;

/// Reads a captured billing event feed from disk.
#[derive(Debug, Clone)]
pub struct JsonlEventSource {
    path: PathBuf,
}

impl JsonlEventSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl EventSource for JsonlEventSource {
    async fn fetch_events(&self) -> Result<Vec<BillingEvent>, EventSourceError> {
        let content = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| EventSourceError::Io(format!("{}: {}", self.path.display(), e)))?;

        let mut events = Vec::new();
        for (line_number, line) in content.lines().enumerate() {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            let event: BillingEvent = serde_json::from_str(trimmed).map_err(|e| {
                EventSourceError::Parse(format!(
                    "{} line {}: {}",
                    self.path.display(),
                    line_number + 1,
                    e
                ))
            })?;
            events.push(event);
        }

        debug!("Read {} events from {}", events.len(), self.path.display());
        Ok(events)
    }
}
