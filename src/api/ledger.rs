use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::api::AppState;
use crate::domain::{Ledger, LedgerDay};
use crate::error::AppError;

const DEFAULT_DAY_LIMIT: i64 = 30;
const MAX_DAY_LIMIT: i64 = 1000;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerDto {
    pub current_admin: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_gateway: Option<String>,
    pub total_current_balance: String,
    pub total_tokens_added: String,
    pub total_tokens_removed: String,
    pub total_tokens_pulled: String,
    pub total_usd_pulled: String,
    pub last_quoted_price: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_day_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous_day_id: Option<String>,
}

impl From<Ledger> for LedgerDto {
    fn from(ledger: Ledger) -> Self {
        LedgerDto {
            current_admin: ledger.current_admin.to_string(),
            current_gateway: ledger.current_gateway.map(|a| a.to_string()),
            total_current_balance: ledger.total_current_balance.to_string(),
            total_tokens_added: ledger.total_tokens_added.to_string(),
            total_tokens_removed: ledger.total_tokens_removed.to_string(),
            total_tokens_pulled: ledger.total_tokens_pulled.to_string(),
            total_usd_pulled: ledger.total_usd_pulled.to_canonical_string(),
            last_quoted_price: ledger.last_quoted_price.to_canonical_string(),
            current_day_id: ledger.current_day_id,
            previous_day_id: ledger.previous_day_id,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerDayDto {
    pub id: String,
    pub day_number: i64,
    pub day_start: i64,
    pub day_end: i64,
    pub current_admin: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_gateway: Option<String>,
    pub total_current_balance: String,
    pub total_tokens_added: String,
    pub total_tokens_removed: String,
    pub total_tokens_pulled: String,
    pub total_usd_pulled: String,
    pub last_quoted_price: String,
    pub total_current_balance_delta: String,
    pub total_tokens_added_delta: String,
    pub total_tokens_removed_delta: String,
    pub total_tokens_pulled_delta: String,
    pub total_usd_pulled_delta: String,
}

impl From<LedgerDay> for LedgerDayDto {
    fn from(day: LedgerDay) -> Self {
        LedgerDayDto {
            id: day.id,
            day_number: day.day_number,
            day_start: day.day_start.as_secs(),
            day_end: day.day_end.as_secs(),
            current_admin: day.current_admin.to_string(),
            current_gateway: day.current_gateway.map(|a| a.to_string()),
            total_current_balance: day.total_current_balance.to_string(),
            total_tokens_added: day.total_tokens_added.to_string(),
            total_tokens_removed: day.total_tokens_removed.to_string(),
            total_tokens_pulled: day.total_tokens_pulled.to_string(),
            total_usd_pulled: day.total_usd_pulled.to_canonical_string(),
            last_quoted_price: day.last_quoted_price.to_canonical_string(),
            total_current_balance_delta: day.total_current_balance_delta.to_string(),
            total_tokens_added_delta: day.total_tokens_added_delta.to_string(),
            total_tokens_removed_delta: day.total_tokens_removed_delta.to_string(),
            total_tokens_pulled_delta: day.total_tokens_pulled_delta.to_string(),
            total_usd_pulled_delta: day.total_usd_pulled_delta.to_canonical_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DaysQuery {
    pub limit: Option<i64>,
}

pub(crate) fn clamp_limit(limit: Option<i64>, default: i64, max: i64) -> Result<i64, AppError> {
    let limit = limit.unwrap_or(default);
    if limit < 1 {
        return Err(AppError::BadRequest("limit must be positive".into()));
    }
    Ok(limit.min(max))
}

pub async fn get_ledger(State(state): State<AppState>) -> Result<Json<LedgerDto>, AppError> {
    let ledger = state
        .repo
        .load_ledger()
        .await?
        .ok_or_else(|| AppError::NotFound("ledger not initialized".into()))?;

    Ok(Json(ledger.into()))
}

pub async fn get_ledger_days(
    Query(params): Query<DaysQuery>,
    State(state): State<AppState>,
) -> Result<Json<Vec<LedgerDayDto>>, AppError> {
    let limit = clamp_limit(params.limit, DEFAULT_DAY_LIMIT, MAX_DAY_LIMIT)?;
    let days = state.repo.query_ledger_days(limit).await?;
    Ok(Json(days.into_iter().map(Into::into).collect()))
}
