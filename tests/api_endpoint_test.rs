use axum::http::StatusCode;
use billdex::api;
use billdex::engine::EventProcessor;
use billdex::oracle::{FixedReservePair, PairPriceOracle};
use billdex::{
    init_db, Address, BillingEvent, EventMeta, EventPayload, Repository, StaticAdminSource,
    Timestamp, TokenAmount,
};
use std::str::FromStr;
use std::sync::Arc;
use tempfile::TempDir;
use tower::util::ServiceExt;

const ACTOR_A: &str = "0x0101010101010101010101010101010101010101";
const ACTOR_B: &str = "0x0101010101010101010101010101010101010102";
const ADMIN: &str = "0x00000000000000000000000000000000000000aa";

const DAY0: i64 = 1_608_163_200;

struct TestApp {
    app: axum::Router,
    processor: EventProcessor,
    _temp: TempDir,
}

fn addr(s: &str) -> Address {
    Address::from_str(s).unwrap()
}

fn amt(s: &str) -> TokenAmount {
    s.parse().unwrap()
}

async fn setup_test_app() -> TestApp {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir
        .path()
        .join("test.db")
        .to_string_lossy()
        .to_string();
    let pool = init_db(&db_path).await.expect("init_db failed");
    let repo = Arc::new(Repository::new(pool));

    let oracle = Arc::new(PairPriceOracle::new(
        Arc::new(FixedReservePair::new(amt("1000000"), amt("1000"))),
        Arc::new(FixedReservePair::new(amt("1000"), amt("500000"))),
    ));
    let processor = EventProcessor::new(
        repo.clone(),
        oracle,
        Arc::new(StaticAdminSource::new(addr(ADMIN))),
    );

    let app = api::create_router(api::AppState::new(repo));

    TestApp {
        app,
        processor,
        _temp: temp_dir,
    }
}

async fn request(app: axum::Router, uri: &str) -> (StatusCode, Vec<u8>) {
    let req = axum::http::Request::builder()
        .method("GET")
        .uri(uri)
        .body(axum::body::Body::empty())
        .unwrap();

    let resp = app.oneshot(req).await.unwrap();
    let status = resp.status();
    let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec();
    (status, body)
}

fn meta(block: i64, timestamp: i64) -> EventMeta {
    EventMeta {
        tx_hash: format!("0x{:08x}", block),
        block_number: block,
        log_index: 0,
        timestamp: Timestamp::new(timestamp),
    }
}

fn added(block: i64, actor: &str, amount: &str) -> BillingEvent {
    BillingEvent::new(
        meta(block, DAY0 + block),
        EventPayload::TokensAdded {
            actor: addr(actor),
            amount: amt(amount),
        },
    )
}

fn pulled(block: i64, timestamp: i64, actor: &str, amount: &str) -> BillingEvent {
    BillingEvent::new(
        meta(block, timestamp),
        EventPayload::TokensPulled {
            actor: addr(actor),
            amount: amt(amount),
        },
    )
}

#[tokio::test]
async fn test_health_and_ready() {
    let test_app = setup_test_app().await;

    let (status, _body) = request(test_app.app.clone(), "/health").await;
    assert_eq!(status, StatusCode::OK);

    let (status, _body) = request(test_app.app, "/ready").await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_ledger_endpoint_before_first_event_is_404() {
    let test_app = setup_test_app().await;
    let (status, _body) = request(test_app.app, "/v1/ledger").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_ledger_endpoint_reports_totals() {
    let test_app = setup_test_app().await;

    test_app
        .processor
        .apply(&added(1, ACTOR_A, "10000000000000000000"))
        .await
        .unwrap();
    test_app
        .processor
        .apply(&pulled(2, DAY0 + 2, ACTOR_A, "4000000000000000000"))
        .await
        .unwrap();

    let (status, body) = request(test_app.app, "/v1/ledger").await;
    assert_eq!(status, StatusCode::OK);

    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["currentAdmin"], ADMIN);
    assert_eq!(json["totalCurrentBalance"], "6000000000000000000");
    assert_eq!(json["totalTokensAdded"], "10000000000000000000");
    assert_eq!(json["totalTokensPulled"], "4000000000000000000");
    assert_eq!(json["totalUsdPulled"], "2");
    assert_eq!(json["lastQuotedPrice"], "0.5");
    assert!(json["currentDayId"].is_string());
}

#[tokio::test]
async fn test_ledger_days_endpoint_newest_first() {
    let test_app = setup_test_app().await;

    test_app
        .processor
        .apply(&added(1, ACTOR_A, "10000000000000000000"))
        .await
        .unwrap();
    test_app
        .processor
        .apply(&pulled(
            2,
            DAY0 + 86_400 + 100,
            ACTOR_A,
            "4000000000000000000",
        ))
        .await
        .unwrap();

    let (status, body) = request(test_app.app, "/v1/ledger/days").await;
    assert_eq!(status, StatusCode::OK);

    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    let days = json.as_array().unwrap();
    assert_eq!(days.len(), 2);
    assert_eq!(days[0]["dayNumber"], 1);
    assert_eq!(days[1]["dayNumber"], 0);
    assert_eq!(days[0]["totalCurrentBalanceDelta"], "-4000000000000000000");
    assert_eq!(days[0]["totalTokensPulledDelta"], "4000000000000000000");
    assert_eq!(days[1]["totalCurrentBalanceDelta"], "10000000000000000000");
}

#[tokio::test]
async fn test_actor_endpoint() {
    let test_app = setup_test_app().await;

    test_app
        .processor
        .apply(&added(1, ACTOR_A, "10000000000000000000"))
        .await
        .unwrap();

    let (status, body) =
        request(test_app.app.clone(), &format!("/v1/actors/{}", ACTOR_A)).await;
    assert_eq!(status, StatusCode::OK);

    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["address"], ACTOR_A);
    assert_eq!(json["billingBalance"], "10000000000000000000");
    assert_eq!(json["totalTokensAdded"], "10000000000000000000");

    let (status, _body) =
        request(test_app.app.clone(), &format!("/v1/actors/{}", ACTOR_B)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _body) = request(test_app.app, "/v1/actors/nonsense").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_actor_days_endpoint() {
    let test_app = setup_test_app().await;

    test_app
        .processor
        .apply(&added(1, ACTOR_A, "10000000000000000000"))
        .await
        .unwrap();

    let (status, body) = request(
        test_app.app,
        &format!("/v1/actors/{}/days?limit=5", ACTOR_A),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    let days = json.as_array().unwrap();
    assert_eq!(days.len(), 1);
    assert_eq!(days[0]["billingBalance"], "10000000000000000000");
    assert_eq!(days[0]["billingBalanceDelta"], "10000000000000000000");
    assert_eq!(days[0]["dayStart"], DAY0);
    assert_eq!(days[0]["dayEnd"], DAY0 + 86_400);
}

#[tokio::test]
async fn test_transactions_endpoint_with_filters() {
    let test_app = setup_test_app().await;

    test_app
        .processor
        .apply(&added(1, ACTOR_A, "10000000000000000000"))
        .await
        .unwrap();
    test_app
        .processor
        .apply(&added(2, ACTOR_B, "10000000000000000000"))
        .await
        .unwrap();
    test_app
        .processor
        .apply(&pulled(3, DAY0 + 3, ACTOR_A, "5000000000000000000"))
        .await
        .unwrap();

    let (status, body) = request(test_app.app.clone(), "/v1/transactions").await;
    assert_eq!(status, StatusCode::OK);
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json.as_array().unwrap().len(), 3);

    let (_status, body) = request(
        test_app.app.clone(),
        &format!("/v1/transactions?actor={}", ACTOR_A),
    )
    .await;
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json.as_array().unwrap().len(), 2);

    let (_status, body) = request(
        test_app.app.clone(),
        "/v1/transactions?kind=TokensPulled",
    )
    .await;
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    let pulls = json.as_array().unwrap();
    assert_eq!(pulls.len(), 1);
    assert_eq!(pulls[0]["actor"], ACTOR_A);
    assert_eq!(pulls[0]["amount"], "5000000000000000000");
    assert_eq!(pulls[0]["kind"], "TokensPulled");

    let (status, _body) = request(test_app.app, "/v1/transactions?kind=Bogus").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_actors_listing() {
    let test_app = setup_test_app().await;

    test_app
        .processor
        .apply(&added(1, ACTOR_A, "10000000000000000000"))
        .await
        .unwrap();
    test_app
        .processor
        .apply(&added(2, ACTOR_B, "5000000000000000000"))
        .await
        .unwrap();

    let (status, body) = request(test_app.app, "/v1/actors").await;
    assert_eq!(status, StatusCode::OK);

    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    let actors = json.as_array().unwrap();
    assert_eq!(actors.len(), 2);
    assert_eq!(actors[0]["address"], ACTOR_A);
    assert_eq!(actors[1]["address"], ACTOR_B);
}
