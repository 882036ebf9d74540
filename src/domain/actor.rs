//! Per-address billing aggregate and its daily snapshot row.

use crate::domain::{Address, AmountDelta, Decimal, Timestamp, TokenAmount};

/// An address-keyed billing participant, created lazily on the first event
/// that references it.
///
/// Invariant: `billing_balance == total_tokens_added - total_tokens_removed
/// - total_tokens_pulled`, and the sum of all actors' balances equals the
/// ledger's `total_current_balance`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    pub address: Address,
    pub billing_balance: TokenAmount,
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

impl Actor {
    /// A zero-valued actor for an address seen for the first time.
    pub fn new(address: Address) -> Self {
        Actor {
            address,
            billing_balance: TokenAmount::zero(),
            total_tokens_added: TokenAmount::zero(),
            total_tokens_removed: TokenAmount::zero(),
            total_tokens_pulled: TokenAmount::zero(),
            total_usd_pulled: Decimal::zero(),
            last_quoted_price: Decimal::zero(),
            current_day_id: None,
            previous_day_id: None,
        }
    }

    /// Entity id, derived from the normalized address.
    pub fn id(&self) -> &str {
        self.address.as_str()
    }

    /// Advance the snapshot chain to a new day bucket.
    pub fn rotate_day_ids(&mut self, new_id: String) {
        if let Some(current) = self.current_day_id.take() {
            self.previous_day_id = Some(current);
        }
        self.current_day_id = Some(new_id);
    }
}

/// One calendar day of actor state: mirrored totals plus deltas against
/// the previous day's final snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActorDay {
    /// Bucket id, `<address>-<dayNumber>`.
    pub id: String,
    pub entity_id: String,
    pub day_number: i64,
    pub day_start: Timestamp,
    pub day_end: Timestamp,
    pub billing_balance: TokenAmount,
    pub total_tokens_added: TokenAmount,
    pub total_tokens_removed: TokenAmount,
    pub total_tokens_pulled: TokenAmount,
    pub total_usd_pulled: Decimal,
    pub last_quoted_price: Decimal,
    pub billing_balance_delta: AmountDelta,
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
    fn test_new_actor_is_zero_valued() {
        let actor =
            Actor::new(Address::from_str("0x0101010101010101010101010101010101010101").unwrap());
        assert!(actor.billing_balance.is_zero());
        assert!(actor.total_tokens_added.is_zero());
        assert!(actor.total_tokens_removed.is_zero());
        assert!(actor.total_tokens_pulled.is_zero());
        assert!(actor.total_usd_pulled.is_zero());
        assert_eq!(actor.current_day_id, None);
    }

    #[test]
    fn test_actor_id_is_normalized_address() {
        let actor =
            Actor::new(Address::from_str("0x0101010101010101010101010101010101010ABC").unwrap());
        assert_eq!(actor.id(), "0x0101010101010101010101010101010101010abc");
    }
}
