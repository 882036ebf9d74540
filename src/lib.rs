pub mod api;
pub mod config;
pub mod datasource;
pub mod db;
pub mod domain;
pub mod engine;
pub mod error;
pub mod oracle;

pub use config::Config;
pub use datasource::{
    AdminSource, EventSource, EventSourceError, JsonlEventSource, MockEventSource,
    StaticAdminSource,
};
pub use db::{init_db, Repository};
pub use domain::{
    Actor, ActorDay, Address, AmountDelta, BillingEvent, Decimal, EventMeta, EventPayload, Ledger,
    LedgerDay, Timestamp, TokenAmount, TransactionKind, TransactionRecord, LEDGER_ID,
};
pub use engine::{EngineError, EventProcessor, IngestReport, Ingestor};
pub use error::AppError;
pub use oracle::{FixedReservePair, PairPriceOracle, PriceSource, ReservePair, RpcReservePair};
