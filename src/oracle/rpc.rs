//! JSON-RPC reserve pair client.
//!
//! Issues `eth_call` against a constant-product pair contract and decodes
//! the `getReserves()` result. A failed call or undecodable response is
//! returned as-is; there is no retry, because an unreadable pair is a fatal
//! condition for the caller.

use super::{OracleError, ReservePair, Reserves};
use crate::domain::{Address, TokenAmount};
use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

/// 4-byte selector of `getReserves()`.
const GET_RESERVES_SELECTOR: &str = "0x0902f1ac";

/// A reserve pair read over JSON-RPC.
#[derive(Debug, Clone)]
pub struct RpcReservePair {
    client: Client,
    rpc_url: String,
    pair_address: Address,
}

impl RpcReservePair {
    /// Create a client for one pair contract.
    pub fn new(rpc_url: String, pair_address: Address) -> Self {
        Self {
            client: Client::new(),
            rpc_url,
            pair_address,
        }
    }
}

#[async_trait]
impl ReservePair for RpcReservePair {
    async fn get_reserves(&self) -> Result<Reserves, OracleError> {
        debug!("Reading reserves of pair {}", self.pair_address);

        let payload = serde_json::json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": "eth_call",
            "params": [
                { "to": self.pair_address.as_str(), "data": GET_RESERVES_SELECTOR },
                "latest"
            ]
        });

        let response = self
            .client
            .post(&self.rpc_url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| OracleError::Unavailable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(OracleError::Unavailable(format!(
                "rpc returned status {}",
                status
            )));
        }

        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| OracleError::Malformed(e.to_string()))?;

        if let Some(err) = body.get("error") {
            return Err(OracleError::Unavailable(err.to_string()));
        }

        let result = body
            .get("result")
            .and_then(|v| v.as_str())
            .ok_or_else(|| OracleError::Malformed("missing result field".to_string()))?;

        decode_reserves(result)
    }
}

/// Decode a `getReserves()` call result: the first two 256-bit words are
/// reserve0 and reserve1 (the third is the last-update timestamp).
fn decode_reserves(result: &str) -> Result<Reserves, OracleError> {
    let data = result.strip_prefix("0x").unwrap_or(result);
    if data.len() < 128 {
        return Err(OracleError::Malformed(format!(
            "expected at least two 32-byte words, got {} hex chars",
            data.len()
        )));
    }

    let word = |index: usize| -> Result<TokenAmount, OracleError> {
        let slice = &data.as_bytes()[index * 64..(index + 1) * 64];
        let bytes = hex::decode(slice).map_err(|e| OracleError::Malformed(e.to_string()))?;
        Ok(TokenAmount::from_be_bytes(&bytes))
    };

    Ok(Reserves::new(word(0)?, word(1)?))
}
