//! Daily snapshot engine.
//!
//! One bucket per root entity per calendar day, id `<rootId>-<dayNumber>`.
//! The first write of a new day creates the bucket and rotates the root's
//! backward chain (`previous := current`, `current := new`); later writes
//! on the same day update the bucket in place without rotating, so a day's
//! deltas are always computed against the previous day's final snapshot.

use super::EngineError;
use crate::db::Repository;
use crate::domain::{
    Actor, ActorDay, Ledger, LedgerDay, Timestamp, TokenAmount, LEDGER_ID,
};
use async_trait::async_trait;

/// Seconds per calendar day bucket.
pub const SECONDS_PER_DAY: i64 = 86_400;

/// Day index of the system's launch: 1608163200 / 86400 (17 Dec 2020
/// 00:00:00 UTC). Bucket day numbers are relative to this.
pub const LAUNCH_DAY: i64 = 18_613;

/// Day index of a timestamp relative to the launch day.
pub fn day_number(timestamp: Timestamp) -> i64 {
    timestamp.as_secs() / SECONDS_PER_DAY - LAUNCH_DAY
}

/// Start of the calendar day containing a timestamp.
pub fn day_start(timestamp: Timestamp) -> Timestamp {
    Timestamp::new(timestamp.as_secs() / SECONDS_PER_DAY * SECONDS_PER_DAY)
}

/// Bucket id for a root and day number.
pub fn day_bucket_id(entity_id: &str, day_number: i64) -> String {
    format!("{}-{}", entity_id, day_number)
}

/// A root aggregate that keeps daily snapshots.
///
/// The engine is generic over which fields a root mirrors into its bucket;
/// the Ledger and Actor instantiations are structurally identical apart
/// from that field set.
#[async_trait]
pub trait SnapshotRoot: Send + Sync {
    /// The root's day-bucket row type.
    type Day: Send + Sync;

    fn entity_id(&self) -> &str;

    /// The bucket the current one superseded, if any.
    fn chained_previous_id(&self) -> Option<&str>;

    /// Rotate the backward chain onto a newly created bucket.
    fn advance_day(&mut self, new_id: String);

    /// Create an empty bucket for a new day.
    fn open_day(&self, id: String, day_number: i64, day_start: Timestamp) -> Self::Day;

    /// Copy the root's current cumulative fields into the bucket,
    /// overwriting whatever the bucket held for them.
    fn mirror_into(&self, day: &mut Self::Day);

    /// Compute the bucket's delta fields against the previous day's final
    /// snapshot, or against zero when the root has no previous bucket.
    fn write_deltas(&self, day: &mut Self::Day, previous: Option<&Self::Day>);

    async fn load_day(store: &Repository, id: &str) -> Result<Option<Self::Day>, sqlx::Error>;
    async fn save_day(store: &Repository, day: &Self::Day) -> Result<(), sqlx::Error>;
}

/// Update the root's bucket for the calendar day containing `timestamp`.
///
/// Called once per affected root per event, after the root's cumulative
/// fields have been mutated and before the root itself is persisted.
///
/// # Errors
/// Fails on store errors, and fatally if the root's previous-bucket pointer
/// is set but the referenced bucket cannot be loaded (corrupted state; the
/// delta is never silently skipped).
pub async fn update_daily_snapshot<R: SnapshotRoot>(
    store: &Repository,
    root: &mut R,
    timestamp: Timestamp,
) -> Result<R::Day, EngineError> {
    let day_number = day_number(timestamp);
    let id = day_bucket_id(root.entity_id(), day_number);

    let mut day = match R::load_day(store, &id).await? {
        Some(existing) => existing,
        None => {
            let day = root.open_day(id.clone(), day_number, day_start(timestamp));
            root.advance_day(id);
            day
        }
    };

    root.mirror_into(&mut day);

    let previous = match root.chained_previous_id() {
        Some(previous_id) => {
            let loaded = R::load_day(store, previous_id).await?;
            Some(loaded.ok_or_else(|| EngineError::MissingSnapshot {
                entity: root.entity_id().to_string(),
                id: previous_id.to_string(),
            })?)
        }
        None => None,
    };
    root.write_deltas(&mut day, previous.as_ref());

    R::save_day(store, &day).await?;
    Ok(day)
}

#[async_trait]
impl SnapshotRoot for Ledger {
    type Day = LedgerDay;

    fn entity_id(&self) -> &str {
        LEDGER_ID
    }

    fn chained_previous_id(&self) -> Option<&str> {
        self.previous_day_id.as_deref()
    }

    fn advance_day(&mut self, new_id: String) {
        self.rotate_day_ids(new_id);
    }

    fn open_day(&self, id: String, day_number: i64, day_start: Timestamp) -> LedgerDay {
        LedgerDay {
            id,
            entity_id: self.entity_id().to_string(),
            day_number,
            day_start,
            day_end: Timestamp::new(day_start.as_secs() + SECONDS_PER_DAY),
            current_admin: self.current_admin.clone(),
            current_gateway: self.current_gateway.clone(),
            total_current_balance: self.total_current_balance.clone(),
            total_tokens_added: self.total_tokens_added.clone(),
            total_tokens_removed: self.total_tokens_removed.clone(),
            total_tokens_pulled: self.total_tokens_pulled.clone(),
            total_usd_pulled: self.total_usd_pulled,
            last_quoted_price: self.last_quoted_price,
            total_current_balance_delta: Default::default(),
            total_tokens_added_delta: Default::default(),
            total_tokens_removed_delta: Default::default(),
            total_tokens_pulled_delta: Default::default(),
            total_usd_pulled_delta: Default::default(),
        }
    }

    fn mirror_into(&self, day: &mut LedgerDay) {
        day.current_admin = self.current_admin.clone();
        day.current_gateway = self.current_gateway.clone();
        day.total_current_balance = self.total_current_balance.clone();
        day.total_tokens_added = self.total_tokens_added.clone();
        day.total_tokens_removed = self.total_tokens_removed.clone();
        day.total_tokens_pulled = self.total_tokens_pulled.clone();
        day.total_usd_pulled = self.total_usd_pulled;
        day.last_quoted_price = self.last_quoted_price;
    }

    fn write_deltas(&self, day: &mut LedgerDay, previous: Option<&LedgerDay>) {
        match previous {
            Some(prev) => {
                day.total_current_balance_delta = self
                    .total_current_balance
                    .delta_from(&prev.total_current_balance);
                day.total_tokens_added_delta =
                    self.total_tokens_added.delta_from(&prev.total_tokens_added);
                day.total_tokens_removed_delta = self
                    .total_tokens_removed
                    .delta_from(&prev.total_tokens_removed);
                day.total_tokens_pulled_delta = self
                    .total_tokens_pulled
                    .delta_from(&prev.total_tokens_pulled);
                day.total_usd_pulled_delta = self.total_usd_pulled - prev.total_usd_pulled;
            }
            None => {
                let zero = TokenAmount::zero();
                day.total_current_balance_delta = self.total_current_balance.delta_from(&zero);
                day.total_tokens_added_delta = self.total_tokens_added.delta_from(&zero);
                day.total_tokens_removed_delta = self.total_tokens_removed.delta_from(&zero);
                day.total_tokens_pulled_delta = self.total_tokens_pulled.delta_from(&zero);
                day.total_usd_pulled_delta = self.total_usd_pulled;
            }
        }
    }

    async fn load_day(store: &Repository, id: &str) -> Result<Option<LedgerDay>, sqlx::Error> {
        store.load_ledger_day(id).await
    }

    async fn save_day(store: &Repository, day: &LedgerDay) -> Result<(), sqlx::Error> {
        store.save_ledger_day(day).await
    }
}

#[async_trait]
impl SnapshotRoot for Actor {
    type Day = ActorDay;

    fn entity_id(&self) -> &str {
        self.id()
    }

    fn chained_previous_id(&self) -> Option<&str> {
        self.previous_day_id.as_deref()
    }

    fn advance_day(&mut self, new_id: String) {
        self.rotate_day_ids(new_id);
    }

    fn open_day(&self, id: String, day_number: i64, day_start: Timestamp) -> ActorDay {
        ActorDay {
            id,
            entity_id: self.id().to_string(),
            day_number,
            day_start,
            day_end: Timestamp::new(day_start.as_secs() + SECONDS_PER_DAY),
            billing_balance: self.billing_balance.clone(),
            total_tokens_added: self.total_tokens_added.clone(),
            total_tokens_removed: self.total_tokens_removed.clone(),
            total_tokens_pulled: self.total_tokens_pulled.clone(),
            total_usd_pulled: self.total_usd_pulled,
            last_quoted_price: self.last_quoted_price,
            billing_balance_delta: Default::default(),
            total_tokens_added_delta: Default::default(),
            total_tokens_removed_delta: Default::default(),
            total_tokens_pulled_delta: Default::default(),
            total_usd_pulled_delta: Default::default(),
        }
    }

    fn mirror_into(&self, day: &mut ActorDay) {
        day.billing_balance = self.billing_balance.clone();
        day.total_tokens_added = self.total_tokens_added.clone();
        day.total_tokens_removed = self.total_tokens_removed.clone();
        day.total_tokens_pulled = self.total_tokens_pulled.clone();
        day.total_usd_pulled = self.total_usd_pulled;
        day.last_quoted_price = self.last_quoted_price;
    }

    fn write_deltas(&self, day: &mut ActorDay, previous: Option<&ActorDay>) {
        match previous {
            Some(prev) => {
                day.billing_balance_delta =
                    self.billing_balance.delta_from(&prev.billing_balance);
                day.total_tokens_added_delta =
                    self.total_tokens_added.delta_from(&prev.total_tokens_added);
                day.total_tokens_removed_delta = self
                    .total_tokens_removed
                    .delta_from(&prev.total_tokens_removed);
                day.total_tokens_pulled_delta = self
                    .total_tokens_pulled
                    .delta_from(&prev.total_tokens_pulled);
                day.total_usd_pulled_delta = self.total_usd_pulled - prev.total_usd_pulled;
            }
            None => {
                let zero = TokenAmount::zero();
                day.billing_balance_delta = self.billing_balance.delta_from(&zero);
                day.total_tokens_added_delta = self.total_tokens_added.delta_from(&zero);
                day.total_tokens_removed_delta = self.total_tokens_removed.delta_from(&zero);
                day.total_tokens_pulled_delta = self.total_tokens_pulled.delta_from(&zero);
                day.total_usd_pulled_delta = self.total_usd_pulled;
            }
        }
    }

    async fn load_day(store: &Repository, id: &str) -> Result<Option<ActorDay>, sqlx::Error> {
        store.load_actor_day(id).await
    }

    async fn save_day(store: &Repository, day: &ActorDay) -> Result<(), sqlx::Error> {
        store.save_actor_day(day).await
    }
}
