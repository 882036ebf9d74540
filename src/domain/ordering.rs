//! Canonical event ordering for deterministic processing.

use crate::domain::BillingEvent;

/// Canonical ordering key for billing events.
///
/// Ordering: block number, then log index within the block. The feed
/// attaches both to every event, so the key is total.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct EventOrderingKey {
    /// Block number (primary sort).
    pub block_number: i64,
    /// Log index within the block (secondary sort).
    pub log_index: i64,
}

impl EventOrderingKey {
    pub fn new(block_number: i64, log_index: i64) -> Self {
        Self {
            block_number,
            log_index,
        }
    }

    /// Create an ordering key from an event's metadata.
    pub fn from_event(event: &BillingEvent) -> Self {
        Self::new(event.meta.block_number, event.meta.log_index)
    }

    /// Returns true if `a` must be applied before `b`.
    pub fn should_come_before(a: &BillingEvent, b: &BillingEvent) -> bool {
        Self::from_event(a) < Self::from_event(b)
    }
}

/// Sort events into canonical application order.
pub fn sort_events_canonical(events: &mut [BillingEvent]) {
    events.sort_by_key(EventOrderingKey::from_event);
}
