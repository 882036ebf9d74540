use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::api::ledger::clamp_limit;
use crate::api::AppState;
use crate::domain::{Address, TransactionKind, TransactionRecord};
use crate::error::AppError;

const DEFAULT_TX_LIMIT: i64 = 100;
const MAX_TX_LIMIT: i64 = 1000;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionsQuery {
    pub actor: Option<String>,
    pub kind: Option<String>,
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionDto {
    pub id: String,
    pub tx_hash: String,
    pub block_number: i64,
    pub timestamp: i64,
    pub actor: String,
    pub amount: String,
    pub kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub destination: Option<String>,
}

impl From<TransactionRecord> for TransactionDto {
    fn from(record: TransactionRecord) -> Self {
        TransactionDto {
            id: record.id,
            tx_hash: record.tx_hash,
            block_number: record.block_number,
            timestamp: record.timestamp.as_secs(),
            actor: record.actor.to_string(),
            amount: record.amount.to_string(),
            kind: record.kind.to_string(),
            destination: record.destination.map(|a| a.to_string()),
        }
    }
}

pub async fn get_transactions(
    Query(params): Query<TransactionsQuery>,
    State(state): State<AppState>,
) -> Result<Json<Vec<TransactionDto>>, AppError> {
    let actor = params
        .actor
        .as_deref()
        .map(|raw| {
            raw.parse::<Address>()
                .map_err(|_| AppError::BadRequest("Invalid actor address".into()))
        })
        .transpose()?;

    let kind = params
        .kind
        .as_deref()
        .map(|raw| {
            raw.parse::<TransactionKind>()
                .map_err(|_| AppError::BadRequest("Invalid transaction kind".into()))
        })
        .transpose()?;

    let limit = clamp_limit(params.limit, DEFAULT_TX_LIMIT, MAX_TX_LIMIT)?;

    let records = state
        .repo
        .query_transactions(actor.as_ref(), kind, limit)
        .await?;

    Ok(Json(records.into_iter().map(Into::into).collect()))
}
