//! Event handlers: one state transition per event kind.
//!
//! Every handler follows the same shape: load/create the affected roots,
//! mutate cumulative fields, update the daily snapshot of each affected
//! root, persist the roots, and append the immutable transaction record.
//! Snapshot updates always observe already-mutated fields.

use super::snapshot::update_daily_snapshot;
use super::EngineError;
use crate::datasource::AdminSource;
use crate::db::Repository;
use crate::domain::{
    Actor, Address, BillingEvent, EventMeta, EventPayload, Ledger, TokenAmount, TransactionKind,
    TransactionRecord, LEDGER_ID,
};
use crate::oracle::PriceSource;
use std::sync::Arc;
use tracing::debug;

/// Applies billing events to the ledger state, one at a time.
#[derive(Clone)]
pub struct EventProcessor {
    store: Arc<Repository>,
    price_source: Arc<dyn PriceSource>,
    admin_source: Arc<dyn AdminSource>,
}

impl EventProcessor {
    pub fn new(
        store: Arc<Repository>,
        price_source: Arc<dyn PriceSource>,
        admin_source: Arc<dyn AdminSource>,
    ) -> Self {
        Self {
            store,
            price_source,
            admin_source,
        }
    }

    /// Apply one event. The caller guarantees events arrive in canonical
    /// order; a failed event leaves the persisted state untouched.
    pub async fn apply(&self, event: &BillingEvent) -> Result<(), EngineError> {
        debug!(
            "Applying event at block {} log {}",
            event.meta.block_number, event.meta.log_index
        );

        match &event.payload {
            EventPayload::GatewayUpdated { new_gateway } => {
                self.handle_gateway_updated(&event.meta, new_gateway).await
            }
            EventPayload::OwnershipTransferred { to, .. } => {
                self.handle_ownership_transferred(&event.meta, to).await
            }
            EventPayload::TokensAdded { actor, amount } => {
                self.handle_tokens_added(&event.meta, actor, amount).await
            }
            EventPayload::TokensRemoved { actor, to, amount } => {
                self.handle_tokens_removed(&event.meta, actor, to, amount)
                    .await
            }
            EventPayload::TokensPulled { actor, amount } => {
                self.handle_tokens_pulled(&event.meta, actor, amount).await
            }
        }
    }

    /// Load the ledger singleton, creating it with the bootstrap admin on
    /// first use. Idempotent: an existing ledger is returned unchanged.
    async fn get_or_create_ledger(&self) -> Result<Ledger, EngineError> {
        if let Some(ledger) = self.store.load_ledger().await? {
            return Ok(ledger);
        }
        let admin = self.admin_source.bootstrap_admin().await?;
        let ledger = Ledger::bootstrap(admin);
        self.store.save_ledger(&ledger).await?;
        Ok(ledger)
    }

    /// Load an actor, or build a zero-valued one for a first-seen address.
    /// The new actor is only persisted by the calling handler.
    async fn get_or_create_actor(&self, address: &Address) -> Result<Actor, EngineError> {
        Ok(self
            .store
            .load_actor(address)
            .await?
            .unwrap_or_else(|| Actor::new(address.clone())))
    }

    async fn handle_gateway_updated(
        &self,
        meta: &EventMeta,
        new_gateway: &Address,
    ) -> Result<(), EngineError> {
        let mut ledger = self.get_or_create_ledger().await?;
        ledger.current_gateway = Some(new_gateway.clone());

        update_daily_snapshot(&self.store, &mut ledger, meta.timestamp).await?;

        self.store.save_ledger(&ledger).await?;
        Ok(())
    }

    async fn handle_ownership_transferred(
        &self,
        meta: &EventMeta,
        to: &Address,
    ) -> Result<(), EngineError> {
        let mut ledger = self.get_or_create_ledger().await?;
        ledger.current_admin = to.clone();

        update_daily_snapshot(&self.store, &mut ledger, meta.timestamp).await?;

        self.store.save_ledger(&ledger).await?;
        Ok(())
    }

    async fn handle_tokens_added(
        &self,
        meta: &EventMeta,
        actor_address: &Address,
        amount: &TokenAmount,
    ) -> Result<(), EngineError> {
        let mut ledger = self.get_or_create_ledger().await?;
        let mut actor = self.get_or_create_actor(actor_address).await?;

        actor.billing_balance += amount;
        actor.total_tokens_added += amount;

        ledger.total_current_balance += amount;
        ledger.total_tokens_added += amount;

        update_daily_snapshot(&self.store, &mut actor, meta.timestamp).await?;
        update_daily_snapshot(&self.store, &mut ledger, meta.timestamp).await?;

        self.store.save_actor(&actor).await?;
        self.store.save_ledger(&ledger).await?;

        let record = TransactionRecord::from_event(
            meta,
            actor_address.clone(),
            amount.clone(),
            TransactionKind::TokensAdded,
            None,
        );
        self.store.insert_transaction(&record).await?;
        Ok(())
    }

    async fn handle_tokens_removed(
        &self,
        meta: &EventMeta,
        actor_address: &Address,
        to: &Address,
        amount: &TokenAmount,
    ) -> Result<(), EngineError> {
        let mut ledger = self.get_or_create_ledger().await?;
        let mut actor = self.get_or_create_actor(actor_address).await?;

        actor.billing_balance = debit(
            &actor.billing_balance,
            amount,
            actor.id(),
            TransactionKind::TokensRemoved,
        )?;
        actor.total_tokens_removed += amount;

        ledger.total_current_balance = debit(
            &ledger.total_current_balance,
            amount,
            LEDGER_ID,
            TransactionKind::TokensRemoved,
        )?;
        ledger.total_tokens_removed += amount;

        update_daily_snapshot(&self.store, &mut actor, meta.timestamp).await?;
        update_daily_snapshot(&self.store, &mut ledger, meta.timestamp).await?;

        self.store.save_actor(&actor).await?;
        self.store.save_ledger(&ledger).await?;

        let record = TransactionRecord::from_event(
            meta,
            actor_address.clone(),
            amount.clone(),
            TransactionKind::TokensRemoved,
            Some(to.clone()),
        );
        self.store.insert_transaction(&record).await?;
        Ok(())
    }

    async fn handle_tokens_pulled(
        &self,
        meta: &EventMeta,
        actor_address: &Address,
        amount: &TokenAmount,
    ) -> Result<(), EngineError> {
        let mut ledger = self.get_or_create_ledger().await?;
        let mut actor = self.get_or_create_actor(actor_address).await?;

        // One quote per event, shared by both roots.
        let price = self.price_source.quote_price_in_usd().await?;
        let usd = amount.usd_value(&price)?;

        actor.billing_balance = debit(
            &actor.billing_balance,
            amount,
            actor.id(),
            TransactionKind::TokensPulled,
        )?;
        actor.total_tokens_pulled += amount;
        actor.total_usd_pulled = actor.total_usd_pulled + usd;
        actor.last_quoted_price = price;

        ledger.total_current_balance = debit(
            &ledger.total_current_balance,
            amount,
            LEDGER_ID,
            TransactionKind::TokensPulled,
        )?;
        ledger.total_tokens_pulled += amount;
        ledger.total_usd_pulled = ledger.total_usd_pulled + usd;
        ledger.last_quoted_price = price;

        update_daily_snapshot(&self.store, &mut actor, meta.timestamp).await?;
        update_daily_snapshot(&self.store, &mut ledger, meta.timestamp).await?;

        self.store.save_actor(&actor).await?;
        self.store.save_ledger(&ledger).await?;

        let record = TransactionRecord::from_event(
            meta,
            actor_address.clone(),
            amount.clone(),
            TransactionKind::TokensPulled,
            None,
        );
        self.store.insert_transaction(&record).await?;
        Ok(())
    }
}

/// Checked debit: the balance stays untouched and the event fails if the
/// amount exceeds it.
fn debit(
    balance: &TokenAmount,
    amount: &TokenAmount,
    entity: &str,
    kind: TransactionKind,
) -> Result<TokenAmount, EngineError> {
    balance
        .checked_sub(amount)
        .ok_or_else(|| EngineError::BalanceUnderflow {
            entity: entity.to_string(),
            kind,
            amount: amount.clone(),
        })
}
