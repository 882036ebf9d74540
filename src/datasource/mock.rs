//! Mock event source for testing without a capture file.

use super::{EventSource, EventSourceError};
use crate::domain::BillingEvent;
use async_trait::async_trait;

/// Mock event source returning predefined events.
#[derive(Debug, Clone, Default)]
pub struct MockEventSource {
    events: Vec<BillingEvent>,
}

impl MockEventSource {
    /// Create a new mock source with no events.
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    /// Add one event.
    pub fn with_event(mut self, event: BillingEvent) -> Self {
        self.events.push(event);
        self
    }

    /// Add multiple events.
    pub fn with_events(mut self, events: Vec<BillingEvent>) -> Self {
        self.events.extend(events);
        self
    }
}

#[async_trait]
impl EventSource for MockEventSource {
    async fn fetch_events(&self) -> Result<Vec<BillingEvent>, EventSourceError> {
        Ok(self.events.clone())
    }
}
