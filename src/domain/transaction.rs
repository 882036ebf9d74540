//! Immutable transaction records, one per balance-affecting event.

use crate::domain::{Address, EventMeta, Timestamp, TokenAmount};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Which balance-affecting event produced a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransactionKind {
    TokensAdded,
    TokensRemoved,
    TokensPulled,
}

/// Error parsing a transaction kind tag.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown transaction kind {0:?}")]
pub struct KindParseError(pub String);

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self {
            TransactionKind::TokensAdded => "TokensAdded",
            TransactionKind::TokensRemoved => "TokensRemoved",
            TransactionKind::TokensPulled => "TokensPulled",
        };
        write!(f, "{}", tag)
    }
}

impl FromStr for TransactionKind {
    type Err = KindParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "TokensAdded" => Ok(TransactionKind::TokensAdded),
            "TokensRemoved" => Ok(TransactionKind::TokensRemoved),
            "TokensPulled" => Ok(TransactionKind::TokensPulled),
            other => Err(KindParseError(other.to_string())),
        }
    }
}

/// An append-only record of one balance-affecting event.
///
/// Never updated or deleted; re-appending the same id is a no-op.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionRecord {
    /// Stable id, `<txHash><logIndex>`.
    pub id: String,
    pub tx_hash: String,
    pub block_number: i64,
    pub timestamp: Timestamp,
    pub actor: Address,
    pub amount: TokenAmount,
    pub kind: TransactionKind,
    /// Destination address; set for removals only.
    pub destination: Option<Address>,
}

impl TransactionRecord {
    /// Build a record from an event's metadata and payload fields.
    pub fn from_event(
        meta: &EventMeta,
        actor: Address,
        amount: TokenAmount,
        kind: TransactionKind,
        destination: Option<Address>,
    ) -> Self {
        TransactionRecord {
            id: format!("{}{}", meta.tx_hash, meta.log_index),
            tx_hash: meta.tx_hash.clone(),
            block_number: meta.block_number,
            timestamp: meta.timestamp,
            actor,
            amount,
            kind,
            destination,
        }
    }
}
