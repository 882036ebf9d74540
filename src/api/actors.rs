use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Serialize;

use crate::api::ledger::{clamp_limit, DaysQuery};
use crate::api::AppState;
use crate::domain::{Actor, ActorDay, Address};
use crate::error::AppError;

const DEFAULT_DAY_LIMIT: i64 = 30;
const MAX_DAY_LIMIT: i64 = 1000;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActorDto {
    pub address: String,
    pub billing_balance: String,
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

impl From<Actor> for ActorDto {
    fn from(actor: Actor) -> Self {
        ActorDto {
            address: actor.address.to_string(),
            billing_balance: actor.billing_balance.to_string(),
            total_tokens_added: actor.total_tokens_added.to_string(),
            total_tokens_removed: actor.total_tokens_removed.to_string(),
            total_tokens_pulled: actor.total_tokens_pulled.to_string(),
            total_usd_pulled: actor.total_usd_pulled.to_canonical_string(),
            last_quoted_price: actor.last_quoted_price.to_canonical_string(),
            current_day_id: actor.current_day_id,
            previous_day_id: actor.previous_day_id,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActorDayDto {
    pub id: String,
    pub day_number: i64,
    pub day_start: i64,
    pub day_end: i64,
    pub billing_balance: String,
    pub total_tokens_added: String,
    pub total_tokens_removed: String,
    pub total_tokens_pulled: String,
    pub total_usd_pulled: String,
    pub last_quoted_price: String,
    pub billing_balance_delta: String,
    pub total_tokens_added_delta: String,
    pub total_tokens_removed_delta: String,
    pub total_tokens_pulled_delta: String,
    pub total_usd_pulled_delta: String,
}

impl From<ActorDay> for ActorDayDto {
    fn from(day: ActorDay) -> Self {
        ActorDayDto {
            id: day.id,
            day_number: day.day_number,
            day_start: day.day_start.as_secs(),
            day_end: day.day_end.as_secs(),
            billing_balance: day.billing_balance.to_string(),
            total_tokens_added: day.total_tokens_added.to_string(),
            total_tokens_removed: day.total_tokens_removed.to_string(),
            total_tokens_pulled: day.total_tokens_pulled.to_string(),
            total_usd_pulled: day.total_usd_pulled.to_canonical_string(),
            last_quoted_price: day.last_quoted_price.to_canonical_string(),
            billing_balance_delta: day.billing_balance_delta.to_string(),
            total_tokens_added_delta: day.total_tokens_added_delta.to_string(),
            total_tokens_removed_delta: day.total_tokens_removed_delta.to_string(),
            total_tokens_pulled_delta: day.total_tokens_pulled_delta.to_string(),
            total_usd_pulled_delta: day.total_usd_pulled_delta.to_canonical_string(),
        }
    }
}

fn parse_address(raw: &str) -> Result<Address, AppError> {
    raw.parse()
        .map_err(|_| AppError::BadRequest("Invalid actor address".into()))
}

pub async fn list_actors(
    State(state): State<AppState>,
) -> Result<Json<Vec<ActorDto>>, AppError> {
    let actors = state.repo.list_actors().await?;
    Ok(Json(actors.into_iter().map(Into::into).collect()))
}

pub async fn get_actor(
    Path(address): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<ActorDto>, AppError> {
    let address = parse_address(&address)?;
    let actor = state
        .repo
        .load_actor(&address)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("unknown actor {}", address)))?;

    Ok(Json(actor.into()))
}

pub async fn get_actor_days(
    Path(address): Path<String>,
    Query(params): Query<DaysQuery>,
    State(state): State<AppState>,
) -> Result<Json<Vec<ActorDayDto>>, AppError> {
    let address = parse_address(&address)?;
    let limit = clamp_limit(params.limit, DEFAULT_DAY_LIMIT, MAX_DAY_LIMIT)?;
    let days = state.repo.query_actor_days(&address, limit).await?;
    Ok(Json(days.into_iter().map(Into::into).collect()))
}
