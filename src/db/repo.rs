//! Repository layer for entity store operations.
//!
//! Every entity is addressable by a string id and every save is durable
//! before the next read. Amounts, deltas, and decimals are stored as
//! canonical decimal strings so reloads reproduce the written values
//! exactly.

use crate::domain::{
    Actor, ActorDay, Address, AmountDelta, Decimal, EventOrderingKey, Ledger, LedgerDay,
    Timestamp, TokenAmount, TransactionKind, TransactionRecord, LEDGER_ID,
};
use sqlx::sqlite::{SqlitePool, SqliteRow};
use sqlx::Row;

/// Repository over the SQLite entity store.
pub struct Repository {
    pool: SqlitePool,
}

fn decode_err<E>(err: E) -> sqlx::Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    sqlx::Error::Decode(Box::new(err))
}

fn get_amount(row: &SqliteRow, column: &str) -> Result<TokenAmount, sqlx::Error> {
    row.get::<String, _>(column).parse().map_err(decode_err)
}

fn get_delta(row: &SqliteRow, column: &str) -> Result<AmountDelta, sqlx::Error> {
    row.get::<String, _>(column).parse().map_err(decode_err)
}

fn get_decimal(row: &SqliteRow, column: &str) -> Result<Decimal, sqlx::Error> {
    row.get::<String, _>(column).parse().map_err(decode_err)
}

fn get_address(row: &SqliteRow, column: &str) -> Result<Address, sqlx::Error> {
    row.get::<String, _>(column).parse().map_err(decode_err)
}

fn get_opt_address(row: &SqliteRow, column: &str) -> Result<Option<Address>, sqlx::Error> {
    row.get::<Option<String>, _>(column)
        .map(|s| s.parse().map_err(decode_err))
        .transpose()
}

impl Repository {
    /// Create a new repository over the given connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Repository { pool }
    }

    /// Load the ledger singleton.
    ///
    /// # Errors
    /// Returns an error if the query or row decoding fails.
    pub async fn load_ledger(&self) -> Result<Option<Ledger>, sqlx::Error> {
        let row = sqlx::query("SELECT * FROM ledger WHERE id = ?")
            .bind(LEDGER_ID)
            .fetch_optional(&self.pool)
            .await?;

        row.map(|row| ledger_from_row(&row)).transpose()
    }

    /// Upsert the ledger singleton.
    pub async fn save_ledger(&self, ledger: &Ledger) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO ledger (
                id, current_admin, current_gateway,
                total_current_balance, total_tokens_added, total_tokens_removed,
                total_tokens_pulled, total_usd_pulled, last_quoted_price,
                current_day_id, previous_day_id
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                current_admin = excluded.current_admin,
                current_gateway = excluded.current_gateway,
                total_current_balance = excluded.total_current_balance,
                total_tokens_added = excluded.total_tokens_added,
                total_tokens_removed = excluded.total_tokens_removed,
                total_tokens_pulled = excluded.total_tokens_pulled,
                total_usd_pulled = excluded.total_usd_pulled,
                last_quoted_price = excluded.last_quoted_price,
                current_day_id = excluded.current_day_id,
                previous_day_id = excluded.previous_day_id
            "#,
        )
        .bind(LEDGER_ID)
        .bind(ledger.current_admin.as_str())
        .bind(ledger.current_gateway.as_ref().map(|a| a.as_str()))
        .bind(ledger.total_current_balance.to_string())
        .bind(ledger.total_tokens_added.to_string())
        .bind(ledger.total_tokens_removed.to_string())
        .bind(ledger.total_tokens_pulled.to_string())
        .bind(ledger.total_usd_pulled.to_canonical_string())
        .bind(ledger.last_quoted_price.to_canonical_string())
        .bind(ledger.current_day_id.as_deref())
        .bind(ledger.previous_day_id.as_deref())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Load an actor by address.
    pub async fn load_actor(&self, address: &Address) -> Result<Option<Actor>, sqlx::Error> {
        let row = sqlx::query("SELECT * FROM actors WHERE address = ?")
            .bind(address.as_str())
            .fetch_optional(&self.pool)
            .await?;

        row.map(|row| actor_from_row(&row)).transpose()
    }

    /// Upsert an actor.
    pub async fn save_actor(&self, actor: &Actor) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO actors (
                address, billing_balance,
                total_tokens_added, total_tokens_removed, total_tokens_pulled,
                total_usd_pulled, last_quoted_price,
                current_day_id, previous_day_id
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(address) DO UPDATE SET
                billing_balance = excluded.billing_balance,
                total_tokens_added = excluded.total_tokens_added,
                total_tokens_removed = excluded.total_tokens_removed,
                total_tokens_pulled = excluded.total_tokens_pulled,
                total_usd_pulled = excluded.total_usd_pulled,
                last_quoted_price = excluded.last_quoted_price,
                current_day_id = excluded.current_day_id,
                previous_day_id = excluded.previous_day_id
            "#,
        )
        .bind(actor.address.as_str())
        .bind(actor.billing_balance.to_string())
        .bind(actor.total_tokens_added.to_string())
        .bind(actor.total_tokens_removed.to_string())
        .bind(actor.total_tokens_pulled.to_string())
        .bind(actor.total_usd_pulled.to_canonical_string())
        .bind(actor.last_quoted_price.to_canonical_string())
        .bind(actor.current_day_id.as_deref())
        .bind(actor.previous_day_id.as_deref())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// List all actors, ordered by address.
    pub async fn list_actors(&self) -> Result<Vec<Actor>, sqlx::Error> {
        let rows = sqlx::query("SELECT * FROM actors ORDER BY address ASC")
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(actor_from_row).collect()
    }

    /// Load a ledger day bucket by id.
    pub async fn load_ledger_day(&self, id: &str) -> Result<Option<LedgerDay>, sqlx::Error> {
        let row = sqlx::query("SELECT * FROM ledger_days WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(|row| ledger_day_from_row(&row)).transpose()
    }

    /// Upsert a ledger day bucket.
    pub async fn save_ledger_day(&self, day: &LedgerDay) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO ledger_days (
                id, entity_id, day_number, day_start, day_end,
                current_admin, current_gateway,
                total_current_balance, total_tokens_added, total_tokens_removed,
                total_tokens_pulled, total_usd_pulled, last_quoted_price,
                total_current_balance_delta, total_tokens_added_delta,
                total_tokens_removed_delta, total_tokens_pulled_delta,
                total_usd_pulled_delta
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                current_admin = excluded.current_admin,
                current_gateway = excluded.current_gateway,
                total_current_balance = excluded.total_current_balance,
                total_tokens_added = excluded.total_tokens_added,
                total_tokens_removed = excluded.total_tokens_removed,
                total_tokens_pulled = excluded.total_tokens_pulled,
                total_usd_pulled = excluded.total_usd_pulled,
                last_quoted_price = excluded.last_quoted_price,
                total_current_balance_delta = excluded.total_current_balance_delta,
                total_tokens_added_delta = excluded.total_tokens_added_delta,
                total_tokens_removed_delta = excluded.total_tokens_removed_delta,
                total_tokens_pulled_delta = excluded.total_tokens_pulled_delta,
                total_usd_pulled_delta = excluded.total_usd_pulled_delta
            "#,
        )
        .bind(&day.id)
        .bind(&day.entity_id)
        .bind(day.day_number)
        .bind(day.day_start.as_secs())
        .bind(day.day_end.as_secs())
        .bind(day.current_admin.as_str())
        .bind(day.current_gateway.as_ref().map(|a| a.as_str()))
        .bind(day.total_current_balance.to_string())
        .bind(day.total_tokens_added.to_string())
        .bind(day.total_tokens_removed.to_string())
        .bind(day.total_tokens_pulled.to_string())
        .bind(day.total_usd_pulled.to_canonical_string())
        .bind(day.last_quoted_price.to_canonical_string())
        .bind(day.total_current_balance_delta.to_string())
        .bind(day.total_tokens_added_delta.to_string())
        .bind(day.total_tokens_removed_delta.to_string())
        .bind(day.total_tokens_pulled_delta.to_string())
        .bind(day.total_usd_pulled_delta.to_canonical_string())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Ledger day buckets, newest day first.
    pub async fn query_ledger_days(&self, limit: i64) -> Result<Vec<LedgerDay>, sqlx::Error> {
        let rows = sqlx::query("SELECT * FROM ledger_days ORDER BY day_number DESC LIMIT ?")
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(ledger_day_from_row).collect()
    }

    /// Load an actor day bucket by id.
    pub async fn load_actor_day(&self, id: &str) -> Result<Option<ActorDay>, sqlx::Error> {
        let row = sqlx::query("SELECT * FROM actor_days WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(|row| actor_day_from_row(&row)).transpose()
    }

    /// Upsert an actor day bucket.
    pub async fn save_actor_day(&self, day: &ActorDay) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO actor_days (
                id, entity_id, day_number, day_start, day_end,
                billing_balance, total_tokens_added, total_tokens_removed,
                total_tokens_pulled, total_usd_pulled, last_quoted_price,
                billing_balance_delta, total_tokens_added_delta,
                total_tokens_removed_delta, total_tokens_pulled_delta,
                total_usd_pulled_delta
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                billing_balance = excluded.billing_balance,
                total_tokens_added = excluded.total_tokens_added,
                total_tokens_removed = excluded.total_tokens_removed,
                total_tokens_pulled = excluded.total_tokens_pulled,
                total_usd_pulled = excluded.total_usd_pulled,
                last_quoted_price = excluded.last_quoted_price,
                billing_balance_delta = excluded.billing_balance_delta,
                total_tokens_added_delta = excluded.total_tokens_added_delta,
                total_tokens_removed_delta = excluded.total_tokens_removed_delta,
                total_tokens_pulled_delta = excluded.total_tokens_pulled_delta,
                total_usd_pulled_delta = excluded.total_usd_pulled_delta
            "#,
        )
        .bind(&day.id)
        .bind(&day.entity_id)
        .bind(day.day_number)
        .bind(day.day_start.as_secs())
        .bind(day.day_end.as_secs())
        .bind(day.billing_balance.to_string())
        .bind(day.total_tokens_added.to_string())
        .bind(day.total_tokens_removed.to_string())
        .bind(day.total_tokens_pulled.to_string())
        .bind(day.total_usd_pulled.to_canonical_string())
        .bind(day.last_quoted_price.to_canonical_string())
        .bind(day.billing_balance_delta.to_string())
        .bind(day.total_tokens_added_delta.to_string())
        .bind(day.total_tokens_removed_delta.to_string())
        .bind(day.total_tokens_pulled_delta.to_string())
        .bind(day.total_usd_pulled_delta.to_canonical_string())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Day buckets for one actor, newest day first.
    pub async fn query_actor_days(
        &self,
        address: &Address,
        limit: i64,
    ) -> Result<Vec<ActorDay>, sqlx::Error> {
        let rows = sqlx::query(
            "SELECT * FROM actor_days WHERE entity_id = ? ORDER BY day_number DESC LIMIT ?",
        )
        .bind(address.as_str())
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(actor_day_from_row).collect()
    }

    /// Append a transaction record idempotently.
    ///
    /// Returns true if the record was newly inserted, false if a record
    /// with the same id already existed.
    pub async fn insert_transaction(
        &self,
        record: &TransactionRecord,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            INSERT INTO transactions (
                id, tx_hash, block_number, timestamp, actor, amount, kind,
                destination, created_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(id) DO NOTHING
            "#,
        )
        .bind(&record.id)
        .bind(&record.tx_hash)
        .bind(record.block_number)
        .bind(record.timestamp.as_secs())
        .bind(record.actor.as_str())
        .bind(record.amount.to_string())
        .bind(record.kind.to_string())
        .bind(record.destination.as_ref().map(|a| a.as_str()))
        .bind(chrono::Utc::now().timestamp_millis())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Get a transaction record by id.
    pub async fn get_transaction(
        &self,
        id: &str,
    ) -> Result<Option<TransactionRecord>, sqlx::Error> {
        let row = sqlx::query("SELECT * FROM transactions WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(|row| transaction_from_row(&row)).transpose()
    }

    /// Query transaction records with optional actor and kind filters, in
    /// canonical block order.
    pub async fn query_transactions(
        &self,
        actor: Option<&Address>,
        kind: Option<TransactionKind>,
        limit: i64,
    ) -> Result<Vec<TransactionRecord>, sqlx::Error> {
        let mut sql = String::from("SELECT * FROM transactions");
        let mut clauses = Vec::new();
        if actor.is_some() {
            clauses.push("actor = ?");
        }
        if kind.is_some() {
            clauses.push("kind = ?");
        }
        if !clauses.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&clauses.join(" AND "));
        }
        sql.push_str(" ORDER BY block_number ASC, id ASC LIMIT ?");

        let mut query = sqlx::query(&sql);
        if let Some(actor) = actor {
            query = query.bind(actor.as_str().to_string());
        }
        if let Some(kind) = kind {
            query = query.bind(kind.to_string());
        }
        let rows = query.bind(limit).fetch_all(&self.pool).await?;

        rows.iter().map(transaction_from_row).collect()
    }

    /// Load the single-writer ingest cursor.
    pub async fn load_cursor(&self) -> Result<Option<EventOrderingKey>, sqlx::Error> {
        let row = sqlx::query("SELECT block_number, log_index FROM ingest_cursor WHERE id = 1")
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|row| {
            EventOrderingKey::new(row.get("block_number"), row.get("log_index"))
        }))
    }

    /// Persist the single-writer ingest cursor.
    pub async fn save_cursor(&self, cursor: EventOrderingKey) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO ingest_cursor (id, block_number, log_index)
            VALUES (1, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                block_number = excluded.block_number,
                log_index = excluded.log_index
            "#,
        )
        .bind(cursor.block_number)
        .bind(cursor.log_index)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

fn ledger_from_row(row: &SqliteRow) -> Result<Ledger, sqlx::Error> {
    Ok(Ledger {
        current_admin: get_address(row, "current_admin")?,
        current_gateway: get_opt_address(row, "current_gateway")?,
        total_current_balance: get_amount(row, "total_current_balance")?,
        total_tokens_added: get_amount(row, "total_tokens_added")?,
        total_tokens_removed: get_amount(row, "total_tokens_removed")?,
        total_tokens_pulled: get_amount(row, "total_tokens_pulled")?,
        total_usd_pulled: get_decimal(row, "total_usd_pulled")?,
        last_quoted_price: get_decimal(row, "last_quoted_price")?,
        current_day_id: row.get("current_day_id"),
        previous_day_id: row.get("previous_day_id"),
    })
}

fn actor_from_row(row: &SqliteRow) -> Result<Actor, sqlx::Error> {
    Ok(Actor {
        address: get_address(row, "address")?,
        billing_balance: get_amount(row, "billing_balance")?,
        total_tokens_added: get_amount(row, "total_tokens_added")?,
        total_tokens_removed: get_amount(row, "total_tokens_removed")?,
        total_tokens_pulled: get_amount(row, "total_tokens_pulled")?,
        total_usd_pulled: get_decimal(row, "total_usd_pulled")?,
        last_quoted_price: get_decimal(row, "last_quoted_price")?,
        current_day_id: row.get("current_day_id"),
        previous_day_id: row.get("previous_day_id"),
    })
}

fn ledger_day_from_row(row: &SqliteRow) -> Result<LedgerDay, sqlx::Error> {
    Ok(LedgerDay {
        id: row.get("id"),
        entity_id: row.get("entity_id"),
        day_number: row.get("day_number"),
        day_start: Timestamp::new(row.get("day_start")),
        day_end: Timestamp::new(row.get("day_end")),
        current_admin: get_address(row, "current_admin")?,
        current_gateway: get_opt_address(row, "current_gateway")?,
        total_current_balance: get_amount(row, "total_current_balance")?,
        total_tokens_added: get_amount(row, "total_tokens_added")?,
        total_tokens_removed: get_amount(row, "total_tokens_removed")?,
        total_tokens_pulled: get_amount(row, "total_tokens_pulled")?,
        total_usd_pulled: get_decimal(row, "total_usd_pulled")?,
        last_quoted_price: get_decimal(row, "last_quoted_price")?,
        total_current_balance_delta: get_delta(row, "total_current_balance_delta")?,
        total_tokens_added_delta: get_delta(row, "total_tokens_added_delta")?,
        total_tokens_removed_delta: get_delta(row, "total_tokens_removed_delta")?,
        total_tokens_pulled_delta: get_delta(row, "total_tokens_pulled_delta")?,
        total_usd_pulled_delta: get_decimal(row, "total_usd_pulled_delta")?,
    })
}

fn actor_day_from_row(row: &SqliteRow) -> Result<ActorDay, sqlx::Error> {
    Ok(ActorDay {
        id: row.get("id"),
        entity_id: row.get("entity_id"),
        day_number: row.get("day_number"),
        day_start: Timestamp::new(row.get("day_start")),
        day_end: Timestamp::new(row.get("day_end")),
        billing_balance: get_amount(row, "billing_balance")?,
        total_tokens_added: get_amount(row, "total_tokens_added")?,
        total_tokens_removed: get_amount(row, "total_tokens_removed")?,
        total_tokens_pulled: get_amount(row, "total_tokens_pulled")?,
        total_usd_pulled: get_decimal(row, "total_usd_pulled")?,
        last_quoted_price: get_decimal(row, "last_quoted_price")?,
        billing_balance_delta: get_delta(row, "billing_balance_delta")?,
        total_tokens_added_delta: get_delta(row, "total_tokens_added_delta")?,
        total_tokens_removed_delta: get_delta(row, "total_tokens_removed_delta")?,
        total_tokens_pulled_delta: get_delta(row, "total_tokens_pulled_delta")?,
        total_usd_pulled_delta: get_decimal(row, "total_usd_pulled_delta")?,
    })
}

fn transaction_from_row(row: &SqliteRow) -> Result<TransactionRecord, sqlx::Error> {
    Ok(TransactionRecord {
        id: row.get("id"),
        tx_hash: row.get("tx_hash"),
        block_number: row.get("block_number"),
        timestamp: Timestamp::new(row.get("timestamp")),
        actor: get_address(row, "actor")?,
        amount: get_amount(row, "amount")?,
        kind: row
            .get::<String, _>("kind")
            .parse()
            .map_err(decode_err)?,
        destination: get_opt_address(row, "destination")?,
    })
}
