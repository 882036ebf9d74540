//! In-memory reserve pair for tests and offline capture replays.

use super::{OracleError, ReservePair, Reserves};
use crate::domain::TokenAmount;
use async_trait::async_trait;
use std::sync::Mutex;

/// A reserve pair whose readings are set programmatically.
///
/// Replays of a captured event log set the reserves to the values captured
/// alongside the events, modelling "reserves as of the current processing
/// position" without a live chain.
#[derive(Debug)]
pub struct FixedReservePair {
    reserves: Mutex<Option<Reserves>>,
}

impl FixedReservePair {
    /// Create a pair with the given reserves.
    pub fn new(reserve0: TokenAmount, reserve1: TokenAmount) -> Self {
        Self {
            reserves: Mutex::new(Some(Reserves::new(reserve0, reserve1))),
        }
    }

    /// Create a pair that fails every read.
    pub fn unavailable() -> Self {
        Self {
            reserves: Mutex::new(None),
        }
    }

    /// Replace the pair's reserves.
    pub fn set(&self, reserve0: TokenAmount, reserve1: TokenAmount) {
        let mut guard = self.reserves.lock().expect("reserve lock poisoned");
        *guard = Some(Reserves::new(reserve0, reserve1));
    }
}

#[async_trait]
impl ReservePair for FixedReservePair {
    async fn get_reserves(&self) -> Result<Reserves, OracleError> {
        let guard = self.reserves.lock().expect("reserve lock poisoned");
        guard
            .clone()
            .ok_or_else(|| OracleError::Unavailable("no reserves configured".to_string()))
    }
}
