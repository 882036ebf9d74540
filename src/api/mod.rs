//! Read-only query surface over the persisted ledger state.

pub mod actors;
pub mod health;
pub mod ledger;
pub mod transactions;

use crate::db::Repository;
use axum::{routing::get, Router};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

#[derive(Clone)]
pub struct AppState {
    pub repo: Arc<Repository>,
}

impl AppState {
    pub fn new(repo: Arc<Repository>) -> Self {
        Self { repo }
    }
}

pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health::health))
        .route("/ready", get(health::ready))
        .route("/v1/ledger", get(ledger::get_ledger))
        .route("/v1/ledger/days", get(ledger::get_ledger_days))
        .route("/v1/actors", get(actors::list_actors))
        .route("/v1/actors/:address", get(actors::get_actor))
        .route("/v1/actors/:address/days", get(actors::get_actor_days))
        .route("/v1/transactions", get(transactions::get_transactions))
        .layer(cors)
        .with_state(state)
}
