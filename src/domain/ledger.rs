//! The global ledger aggregate and its daily snapshot row.

use crate::domain::{Address, AmountDelta, Decimal, Timestamp, TokenAmount};

/// Fixed id of the ledger singleton.
pub const LEDGER_ID: &str = "1";

/// Global aggregate of all token movements across all actors.
///
/// Invariant: `total_current_balance == total_tokens_added -
/// total_tokens_removed - total_tokens_pulled`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ledger {
    pub current_admin: Address,
    pub current_gateway: Option<Address>,
    pub total_current_balance: TokenAmount,
    pub total_tokens_added: TokenAmount,
    pub total_tokens_removed: TokenAmount,
    pub total_tokens_pulled: TokenAmount,
    pub total_usd_pulled: Decimal,
    pub last_quoted_price: Decimal,
    /// Backward snapshot chain: the current day's bucket, if any.
    pub current_day_id: Option<String>,
    /// Backward snapshot chain: the bucket the current one superseded.
    pub previous_day_id: Option<String>,
}

impl Ledger {
    /// Create the singleton with its one-time bootstrap admin.
    pub fn bootstrap(admin: Address) -> Self {
        Ledger {
            current_admin: admin,
            current_gateway: None,
            total_current_balance: TokenAmount::zero(),
            total_tokens_added: TokenAmount::zero(),
            total_tokens_removed: TokenAmount::zero(),
            total_tokens_pulled: TokenAmount::zero(),
            total_usd_pulled: Decimal::zero(),
            last_quoted_price: Decimal::zero(),
            current_day_id: None,
            previous_day_id: None,
        }
    }

    /// Advance the snapshot chain to a new day bucket.
    ///
    /// Only called on the first write of a new day; same-day updates reuse
    /// the current bucket without rotating.
    pub fn rotate_day_ids(&mut self, new_id: String) {
        if let Some(current) = self.current_day_id.take() {
            self.previous_day_id = Some(current);
        }
        self.current_day_id = Some(new_id);
    }
}

/// One calendar day of ledger state: mirrored totals plus deltas against
/// the previous day's final snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerDay {
    /// Bucket id, `<entityId>-<dayNumber>`.
    pub id: String,
    pub entity_id: String,
    pub day_number: i64,
    pub day_start: Timestamp,
    pub day_end: Timestamp,
    pub current_admin: Address,
    pub current_gateway: Option<Address>,
    pub total_current_balance: TokenAmount,
    pub total_tokens_added: TokenAmount,
    pub total_tokens_removed: TokenAmount,
    pub total_tokens_pulled: TokenAmount,
    pub total_usd_pulled: Decimal,
    pub last_quoted_price: Decimal,
    pub total_current_balance_delta: AmountDelta,
    pub total_tokens_added_delta: AmountDelta,
    pub total_tokens_removed_delta: AmountDelta,
    pub total_tokens_pulled_delta: AmountDelta,
    pub total_usd_pulled_delta: Decimal,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_rotate_day_ids_first_day_sets_no_previous() {
        let mut ledger =
            Ledger::bootstrap(Address::from_str("0x0101010101010101010101010101010101010101").unwrap());
        ledger.rotate_day_ids("1-0".to_string());
        assert_eq!(ledger.current_day_id.as_deref(), Some("1-0"));
        assert_eq!(ledger.previous_day_id, None);
    }

    #[test]
    fn test_rotate_day_ids_moves_current_to_previous() {
        let mut ledger =
            Ledger::bootstrap(Address::from_str("0x0101010101010101010101010101010101010101").unwrap());
        ledger.rotate_day_ids("1-0".to_string());
        ledger.rotate_day_ids("1-1".to_string());
        assert_eq!(ledger.current_day_id.as_deref(), Some("1-1"));
        assert_eq!(ledger.previous_day_id.as_deref(), Some("1-0"));

        ledger.rotate_day_ids("1-2".to_string());
        assert_eq!(ledger.current_day_id.as_deref(), Some("1-2"));
        assert_eq!(ledger.previous_day_id.as_deref(), Some("1-1"));
    }
}
