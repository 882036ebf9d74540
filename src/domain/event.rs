//! Typed billing events as decoded from the external event feed.

use crate::domain::{Address, Timestamp, TokenAmount};
use serde::{Deserialize, Serialize};

/// Metadata attached to every event by the source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventMeta {
    /// Transaction hash the event was emitted in.
    pub tx_hash: String,
    /// Block the transaction was included in.
    pub block_number: i64,
    /// Position of the event's log within the block.
    pub log_index: i64,
    /// Block timestamp in seconds.
    pub timestamp: Timestamp,
}

/// Per-kind event payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum EventPayload {
    /// The gateway address was changed.
    #[serde(rename_all = "camelCase")]
    GatewayUpdated { new_gateway: Address },
    /// Administration moved to a new address.
    #[serde(rename_all = "camelCase")]
    OwnershipTransferred { from: Address, to: Address },
    /// Tokens credited to an actor's billing balance.
    #[serde(rename_all = "camelCase")]
    TokensAdded { actor: Address, amount: TokenAmount },
    /// Tokens debited from an actor and sent to a destination address.
    #[serde(rename_all = "camelCase")]
    TokensRemoved {
        actor: Address,
        to: Address,
        amount: TokenAmount,
    },
    /// Tokens pulled (spent) from an actor's billing balance.
    #[serde(rename_all = "camelCase")]
    TokensPulled { actor: Address, amount: TokenAmount },
}

/// One event from the ordered billing feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BillingEvent {
    #[serde(flatten)]
    pub meta: EventMeta,
    #[serde(flatten)]
    pub payload: EventPayload,
}

impl BillingEvent {
    pub fn new(meta: EventMeta, payload: EventPayload) -> Self {
        Self { meta, payload }
    }

    /// Stable id for the transaction record this event produces.
    pub fn record_id(&self) -> String {
        format!("{}{}", self.meta.tx_hash, self.meta.log_index)
    }
}
