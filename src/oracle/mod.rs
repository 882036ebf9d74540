//! Price oracle adapter: derives a token/USD cross price from two external
//! reserve pairs.
//!
//! The pairs are re-read on every quote; nothing is cached, so each quote
//! reflects the reserves as of the current processing position. Any failure
//! to read a pair is fatal to the caller; no fallback price is ever
//! substituted.

use crate::domain::{Decimal, TokenAmount};
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

pub mod fixed;
pub mod rpc;

pub use fixed::FixedReservePair;
pub use rpc::RpcReservePair;

/// Error type for oracle operations.
#[derive(Debug, Clone, Error)]
pub enum OracleError {
    /// The reserve pair could not be read at all.
    #[error("reserve pair unavailable: {0}")]
    Unavailable(String),
    /// The pair responded with data that could not be decoded.
    #[error("malformed reserve data: {0}")]
    Malformed(String),
    /// A zero base reserve makes the mid price undefined.
    #[error("zero base reserve in pair")]
    ZeroReserve,
    /// A reserve value exceeds the exact-decimal range.
    #[error("reserve value out of range: {0}")]
    OutOfRange(String),
}

/// A reserve-pair reading: base and quote reserves at one point in time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reserves {
    pub reserve0: TokenAmount,
    pub reserve1: TokenAmount,
}

impl Reserves {
    pub fn new(reserve0: TokenAmount, reserve1: TokenAmount) -> Self {
        Self { reserve0, reserve1 }
    }

    /// Mid price of the pair, `reserve1 / reserve0`.
    ///
    /// # Errors
    /// Returns an error if `reserve0` is zero or either reserve exceeds the
    /// exact-decimal range.
    pub fn mid_price(&self) -> Result<Decimal, OracleError> {
        if self.reserve0.is_zero() {
            return Err(OracleError::ZeroReserve);
        }
        let reserve0 = self
            .reserve0
            .to_decimal()
            .map_err(|e| OracleError::OutOfRange(e.to_string()))?;
        let reserve1 = self
            .reserve1
            .to_decimal()
            .map_err(|e| OracleError::OutOfRange(e.to_string()))?;
        Ok(reserve1 / reserve0)
    }
}

/// An external constant-product pair exposing its current reserves.
#[async_trait]
pub trait ReservePair: Send + Sync + fmt::Debug {
    /// Read the pair's reserves as of the current processing position.
    async fn get_reserves(&self) -> Result<Reserves, OracleError>;
}

/// Source of token/USD price quotes.
#[async_trait]
pub trait PriceSource: Send + Sync {
    /// Quote the token price in USD.
    async fn quote_price_in_usd(&self) -> Result<Decimal, OracleError>;
}

/// Cross-price oracle over two reserve pairs: token/intermediate and
/// intermediate/USD.
#[derive(Debug, Clone)]
pub struct PairPriceOracle {
    token_pair: Arc<dyn ReservePair>,
    usd_pair: Arc<dyn ReservePair>,
}

impl PairPriceOracle {
    pub fn new(token_pair: Arc<dyn ReservePair>, usd_pair: Arc<dyn ReservePair>) -> Self {
        Self {
            token_pair,
            usd_pair,
        }
    }
}

#[async_trait]
impl PriceSource for PairPriceOracle {
    async fn quote_price_in_usd(&self) -> Result<Decimal, OracleError> {
        let token_in_intermediate = self.token_pair.get_reserves().await?.mid_price()?;
        let intermediate_in_usd = self.usd_pair.get_reserves().await?.mid_price()?;
        Ok(token_in_intermediate * intermediate_in_usd)
    }
}
