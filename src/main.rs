//! Timer Train - A state-managed HTTP service that runs named countdowns in sequence
//!
//! This is the main entry point for the timer-train application.

use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

use timer_train::{
    config::Config,
    state::{AppState, RowSet},
    api::create_router,
    tasks::{alert_task, sequence_ticker_task},
    utils::shutdown_signal,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();

    // Initialize tracing with appropriate log level
    tracing_subscriber::fmt()
        .with_env_filter(format!("timer_train={},tower_http=info", config.log_level()))
        .init();

    info!("Starting timer-train server v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration: host={}, port={}", config.host, config.port);

    // Seed the rows from a share query when one was given
    let rows = match config.share.as_deref().and_then(timer_train::share::decode) {
        Some(seeds) => {
            info!("Seeding {} rows from share query", seeds.len());
            RowSet::from_seeds(seeds)
        }
        None => {
            if config.share.is_some() {
                tracing::warn!("Share query did not decode; starting with an empty row");
            }
            RowSet::new()
        }
    };

    // Create application state
    let state = Arc::new(AppState::new(config.port, config.host.clone(), rows));

    // Start the sequence ticker background task
    let ticker_state = Arc::clone(&state);
    tokio::spawn(async move {
        sequence_ticker_task(ticker_state).await;
    });

    // Start the alert background task
    let alert_state = Arc::clone(&state);
    tokio::spawn(async move {
        alert_task(alert_state).await;
    });

    // Create HTTP router with all endpoints
    let app = create_router(Arc::clone(&state));

    // Bind to the specified address
    let addr = config.address();
    let listener = TcpListener::bind(&addr).await?;

    info!("Server running on http://{}", addr);
    info!("Endpoints:");
    info!("  GET    /rows               - List timer rows");
    info!("  POST   /rows               - Append a row");
    info!("  POST   /rows/:index/insert - Insert a row after :index");
    info!("  PUT    /rows/:index        - Edit a row");
    info!("  DELETE /rows/:index        - Remove a row");
    info!("  GET    /share              - Shareable query string");
    info!("  POST   /load               - Load rows from a share query");
    info!("  POST   /start              - Validate rows and start the run");
    info!("  POST   /pause              - Pause the run");
    info!("  POST   /resume             - Resume the run");
    info!("  POST   /reset              - Reset to idle");
    info!("  GET    /status             - Current display and row summary");
    info!("  GET    /health             - Health check");

    // Setup graceful shutdown
    let server = axum::serve(listener, app);

    tokio::select! {
        result = server => {
            if let Err(e) = result {
                tracing::error!("Server error: {}", e);
            }
        }
        _ = shutdown_signal() => {
            info!("Shutdown signal received");
        }
    }

    info!("Server shutdown complete");
    Ok(())
}
