//! Deterministic ledger engine: event handlers, the daily snapshot engine,
//! and the ordered ingestion driver.

use crate::datasource::EventSourceError;
use crate::domain::{AmountRangeError, TokenAmount, TransactionKind};
use crate::oracle::OracleError;
use thiserror::Error;

pub mod ingest;
pub mod process;
pub mod snapshot;

pub use ingest::{IngestError, IngestReport, Ingestor};
pub use process::EventProcessor;
pub use snapshot::{
    day_bucket_id, day_number, day_start, update_daily_snapshot, SnapshotRoot, LAUNCH_DAY,
    SECONDS_PER_DAY,
};

/// Error type for applying events to the ledger state.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The entity store failed.
    #[error("entity store error: {0}")]
    Store(#[from] sqlx::Error),
    /// The price oracle could not produce a quote. Fatal to the pulling
    /// event; no default price is ever substituted.
    #[error("price oracle failure: {0}")]
    Oracle(#[from] OracleError),
    /// The one-time bootstrap admin read failed.
    #[error("bootstrap admin read failed: {0}")]
    Bootstrap(#[from] EventSourceError),
    /// A root's previous-bucket pointer references a snapshot that does not
    /// exist. Indicates corrupted state; never skipped silently.
    #[error("day snapshot {id} referenced by {entity} is missing")]
    MissingSnapshot { entity: String, id: String },
    /// A debit exceeds the tracked balance. The event is rejected before
    /// any state is persisted; unsigned arithmetic never wraps.
    #[error("{kind} of {amount} underflows the balance of {entity}")]
    BalanceUnderflow {
        entity: String,
        kind: TransactionKind,
        amount: TokenAmount,
    },
    /// An amount could not be converted for USD accounting.
    #[error("usd conversion failed: {0}")]
    UsdConversion(#[from] AmountRangeError),
}
