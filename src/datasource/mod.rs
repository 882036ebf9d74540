//! Event feed abstraction and the one-time bootstrap admin source.

use crate::domain::{Address, BillingEvent};
use async_trait::async_trait;
use thiserror::Error;

pub mod jsonl;
pub mod mock;

pub use jsonl::JsonlEventSource;
pub use mock::MockEventSource;

/// Error type for event source operations.
#[derive(Debug, Error)]
pub enum EventSourceError {
    /// The capture could not be read.
    #[error("io error: {0}")]
    Io(String),
    /// A record in the feed could not be decoded.
    #[error("parse error: {0}")]
    Parse(String),
    /// Other error.
    #[error("{0}")]
    Other(String),
}

/// Supplier of the ordered billing event feed.
///
/// Implementations return every known event with its metadata attached; the
/// ingestion driver sorts canonically and skips already-applied events, so
/// a source may return overlapping batches across calls.
#[async_trait]
pub trait EventSource: Send + Sync {
    /// Fetch all available events.
    async fn fetch_events(&self) -> Result<Vec<BillingEvent>, EventSourceError>;
}

/// One-time source of the bootstrap admin address, read only when the
/// ledger singleton is first created.
#[async_trait]
pub trait AdminSource: Send + Sync {
    /// The event source's configured administrator.
    async fn bootstrap_admin(&self) -> Result<Address, EventSourceError>;
}

/// Admin source backed by a configured address.
#[derive(Debug, Clone)]
pub struct StaticAdminSource {
    admin: Address,
}

impl StaticAdminSource {
    pub fn new(admin: Address) -> Self {
        Self { admin }
    }
}

#[async_trait]
impl AdminSource for StaticAdminSource {
    async fn bootstrap_admin(&self) -> Result<Address, EventSourceError> {
        Ok(self.admin.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[tokio::test]
    async fn test_static_admin_source() {
        let admin = Address::from_str("0x0101010101010101010101010101010101010101").unwrap();
        let source = StaticAdminSource::new(admin.clone());
        assert_eq!(source.bootstrap_admin().await.unwrap(), admin);
    }

    #[test]
    fn test_event_source_error_display() {
        assert_eq!(
            EventSourceError::Io("missing file".to_string()).to_string(),
            "io error: missing file"
        );
        assert_eq!(
            EventSourceError::Parse("bad json".to_string()).to_string(),
            "parse error: bad json"
        );
    }
}
