use billdex::engine::{EventProcessor, Ingestor};
use billdex::oracle::{FixedReservePair, PairPriceOracle};
use billdex::{
    init_db, Address, BillingEvent, EventMeta, EventPayload, MockEventSource, Repository,
    StaticAdminSource, Timestamp, TokenAmount,
};
use std::str::FromStr;
use std::sync::Arc;
use tempfile::TempDir;

const ACTOR_A: &str = "0x0101010101010101010101010101010101010101";
const ACTOR_B: &str = "0x0101010101010101010101010101010101010102";
const ADMIN: &str = "0x00000000000000000000000000000000000000aa";

const DAY0: i64 = 1_608_163_200;

fn addr(s: &str) -> Address {
    Address::from_str(s).unwrap()
}

fn amt(s: &str) -> TokenAmount {
    s.parse().unwrap()
}

fn meta(block: i64, log_index: i64) -> EventMeta {
    EventMeta {
        tx_hash: format!("0x{:04x}{:04x}", block, log_index),
        block_number: block,
        log_index,
        timestamp: Timestamp::new(DAY0 + block),
    }
}

fn added(block: i64, log_index: i64, actor: &str, amount: &str) -> BillingEvent {
    BillingEvent::new(
        meta(block, log_index),
        EventPayload::TokensAdded {
            actor: addr(actor),
            amount: amt(amount),
        },
    )
}

fn removed(block: i64, actor: &str, to: &str, amount: &str) -> BillingEvent {
    BillingEvent::new(
        meta(block, 0),
        EventPayload::TokensRemoved {
            actor: addr(actor),
            to: addr(to),
            amount: amt(amount),
        },
    )
}

fn pulled(block: i64, actor: &str, amount: &str) -> BillingEvent {
    BillingEvent::new(
        meta(block, 0),
        EventPayload::TokensPulled {
            actor: addr(actor),
            amount: amt(amount),
        },
    )
}

struct TestHarness {
    repo: Arc<Repository>,
    processor: EventProcessor,
    token_pair: Arc<FixedReservePair>,
    _temp: TempDir,
}

async fn setup() -> TestHarness {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir
        .path()
        .join("test.db")
        .to_string_lossy()
        .to_string();
    let pool = init_db(&db_path).await.expect("init_db failed");
    let repo = Arc::new(Repository::new(pool));

    let token_pair = Arc::new(FixedReservePair::new(amt("1000000"), amt("1000")));
    let usd_pair = Arc::new(FixedReservePair::new(amt("1000"), amt("500000")));
    let oracle = Arc::new(PairPriceOracle::new(token_pair.clone(), usd_pair));

    TestHarness {
        processor: EventProcessor::new(
            repo.clone(),
            oracle,
            Arc::new(StaticAdminSource::new(addr(ADMIN))),
        ),
        repo,
        token_pair,
        _temp: temp_dir,
    }
}

fn ingestor(h: &TestHarness, source: MockEventSource) -> Ingestor {
    Ingestor::new(Arc::new(source), h.processor.clone(), h.repo.clone())
}

#[tokio::test]
async fn test_out_of_order_feed_is_applied_canonically() {
    let h = setup().await;

    // The removal depends on the addition; fed in reverse order, only
    // canonical sorting makes the run succeed.
    let source = MockEventSource::new().with_events(vec![
        removed(2, ACTOR_A, ACTOR_B, "5000000000000000000"),
        added(1, 0, ACTOR_A, "10000000000000000000"),
    ]);

    let report = ingestor(&h, source).run_once().await.unwrap();
    assert_eq!(report.fetched, 2);
    assert_eq!(report.applied, 2);
    assert_eq!(report.skipped, 0);

    let actor = h.repo.load_actor(&addr(ACTOR_A)).await.unwrap().unwrap();
    assert_eq!(actor.billing_balance, amt("5000000000000000000"));
}

#[tokio::test]
async fn test_within_block_ordering_by_log_index() {
    let h = setup().await;

    let source = MockEventSource::new().with_events(vec![
        // Same block: log 1 removes what log 0 adds.
        BillingEvent::new(
            meta(1, 1),
            EventPayload::TokensRemoved {
                actor: addr(ACTOR_A),
                to: addr(ACTOR_B),
                amount: amt("10000000000000000000"),
            },
        ),
        added(1, 0, ACTOR_A, "10000000000000000000"),
    ]);

    let report = ingestor(&h, source).run_once().await.unwrap();
    assert_eq!(report.applied, 2);

    let actor = h.repo.load_actor(&addr(ACTOR_A)).await.unwrap().unwrap();
    assert!(actor.billing_balance.is_zero());
}

#[tokio::test]
async fn test_replaying_a_capture_applies_nothing() {
    let h = setup().await;

    let source = MockEventSource::new().with_events(vec![
        added(1, 0, ACTOR_A, "10000000000000000000"),
        pulled(2, ACTOR_A, "5000000000000000000"),
    ]);

    let first = ingestor(&h, source.clone()).run_once().await.unwrap();
    assert_eq!(first.applied, 2);

    let second = ingestor(&h, source).run_once().await.unwrap();
    assert_eq!(second.applied, 0);
    assert_eq!(second.skipped, 2);

    // Totals unchanged: nothing was double-counted.
    let actor = h.repo.load_actor(&addr(ACTOR_A)).await.unwrap().unwrap();
    assert_eq!(actor.total_tokens_added, amt("10000000000000000000"));
    assert_eq!(actor.total_tokens_pulled, amt("5000000000000000000"));
    assert_eq!(actor.total_usd_pulled.to_canonical_string(), "2.5");
}

#[tokio::test]
async fn test_cursor_survives_across_driver_instances() {
    let h = setup().await;

    let first_batch =
        MockEventSource::new().with_event(added(1, 0, ACTOR_A, "10000000000000000000"));
    ingestor(&h, first_batch).run_once().await.unwrap();

    // A fresh driver over an extended capture only applies the new tail.
    let extended = MockEventSource::new().with_events(vec![
        added(1, 0, ACTOR_A, "10000000000000000000"),
        added(2, 0, ACTOR_B, "5000000000000000000"),
    ]);
    let report = ingestor(&h, extended).run_once().await.unwrap();
    assert_eq!(report.applied, 1);
    assert_eq!(report.skipped, 1);

    assert_eq!(
        h.repo.load_cursor().await.unwrap().map(|c| c.block_number),
        Some(2)
    );
}

#[tokio::test]
async fn test_failed_run_resumes_where_it_stopped() {
    let h = setup().await;

    // Make the oracle unusable for the pull in block 2.
    h.token_pair.set(TokenAmount::zero(), amt("1000"));

    let source = MockEventSource::new().with_events(vec![
        added(1, 0, ACTOR_A, "10000000000000000000"),
        pulled(2, ACTOR_A, "5000000000000000000"),
        added(3, 0, ACTOR_B, "1000000000000000000"),
    ]);

    let err = ingestor(&h, source.clone()).run_once().await;
    assert!(err.is_err());

    // The addition before the failure is applied and the cursor points at it.
    assert_eq!(
        h.repo.load_cursor().await.unwrap().map(|c| c.block_number),
        Some(1)
    );

    // Restore the oracle; the rerun skips block 1 and applies the rest.
    h.token_pair.set(amt("1000000"), amt("1000"));
    let report = ingestor(&h, source).run_once().await.unwrap();
    assert_eq!(report.skipped, 1);
    assert_eq!(report.applied, 2);

    let actor = h.repo.load_actor(&addr(ACTOR_A)).await.unwrap().unwrap();
    assert_eq!(actor.total_tokens_pulled, amt("5000000000000000000"));
    let actor_b = h.repo.load_actor(&addr(ACTOR_B)).await.unwrap().unwrap();
    assert_eq!(actor_b.total_tokens_added, amt("1000000000000000000"));
}

#[tokio::test]
async fn test_empty_source_reports_zero() {
    let h = setup().await;

    let report = ingestor(&h, MockEventSource::new()).run_once().await.unwrap();
    assert_eq!(report.fetched, 0);
    assert_eq!(report.applied, 0);
    assert_eq!(report.skipped, 0);
    assert!(h.repo.load_cursor().await.unwrap().is_none());
}
