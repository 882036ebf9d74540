use billdex::engine::{EventProcessor, Ingestor};
use billdex::oracle::{PairPriceOracle, RpcReservePair};
use billdex::{api, config::Config, db::init_db, JsonlEventSource, Repository, StaticAdminSource};
use std::net::SocketAddr;
use std::sync::Arc;

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing_subscriber::filter::LevelFilter::INFO.into()),
        )
        .init();

    // Load configuration
    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    // Initialize database and dependencies
    let pool = match init_db(&config.database_path).await {
        Ok(p) => p,
        Err(e) => {
            eprintln!("Failed to initialize database: {}", e);
            std::process::exit(1);
        }
    };

    let repo = Arc::new(Repository::new(pool));

    let token_pair = Arc::new(RpcReservePair::new(
        config.rpc_url.clone(),
        config.token_pair_address.clone(),
    ));
    let usd_pair = Arc::new(RpcReservePair::new(
        config.rpc_url.clone(),
        config.usd_pair_address.clone(),
    ));
    let oracle = Arc::new(PairPriceOracle::new(token_pair, usd_pair));
    let admin_source = Arc::new(StaticAdminSource::new(config.bootstrap_admin.clone()));

    let processor = EventProcessor::new(repo.clone(), oracle, admin_source);

    // Ingest a captured event feed before serving, when one is configured
    if let Some(events_path) = &config.events_path {
        let source = Arc::new(JsonlEventSource::new(events_path.clone()));
        let ingestor = Ingestor::new(source, processor, repo.clone());
        match ingestor.run_once().await {
            Ok(report) => {
                tracing::info!(
                    "Capture ingested: {} applied, {} skipped",
                    report.applied,
                    report.skipped
                );
            }
            Err(e) => {
                eprintln!("Ingestion failed: {}", e);
                std::process::exit(1);
            }
        }
    }

    // Create router
    let app = api::create_router(api::AppState::new(repo));

    // Bind to address
    let addr = SocketAddr::from(([127, 0, 0, 1], config.port));
    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(l) => l,
        Err(e) => {
            eprintln!("Failed to bind to {}: {}", addr, e);
            std::process::exit(1);
        }
    };

    tracing::info!("Server listening on {}", addr);

    // Run server
    if let Err(e) = axum::serve(listener, app).await {
        eprintln!("Server error: {}", e);
        std::process::exit(1);
    }
}
