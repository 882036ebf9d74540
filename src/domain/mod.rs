//! Domain types and determinism layer for the billing ledger.
//!
//! This module provides:
//! - Lossless numeric handling: TokenAmount/AmountDelta (big integers) and
//!   a Decimal wrapper for USD values and prices
//! - Domain primitives: Address, Timestamp
//! - The root aggregates (Ledger, Actor), their daily snapshot rows, and
//!   immutable transaction records
//! - Typed billing events with a canonical ordering key

pub mod actor;
pub mod amount;
pub mod decimal;
pub mod event;
pub mod ledger;
pub mod ordering;
pub mod primitives;
pub mod transaction;

pub use actor::{Actor, ActorDay};
pub use amount::{AmountDelta, AmountParseError, AmountRangeError, TokenAmount, TOKEN_DECIMALS};
pub use decimal::Decimal;
pub use event::{BillingEvent, EventMeta, EventPayload};
pub use ledger::{Ledger, LedgerDay, LEDGER_ID};
pub use ordering::{sort_events_canonical, EventOrderingKey};
pub use primitives::{Address, AddressParseError, Timestamp};
pub use transaction::{KindParseError, TransactionKind, TransactionRecord};
