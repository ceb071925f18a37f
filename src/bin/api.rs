//! Footfall API Server
//!
//! Run with: cargo run --bin footfall-api
//!
//! # Configuration
//!
//! Read from `$FOOTFALL_CONFIG` or the default config locations, then
//! overridden by environment variables:
//! - `FOOTFALL_CSV_PATH`: Source CSV (default: ./data/poi_data.csv)
//! - `FOOTFALL_BACKEND`: `memory` or `sqlite` (default: memory)
//! - `FOOTFALL_DB_PATH`: SQLite database for the sqlite backend
//! - `FOOTFALL_API_HOST`: Host to bind to (default: 0.0.0.0)
//! - `FOOTFALL_API_PORT`: Port to listen on (default: 8000)
//! - `FOOTFALL_LOG_LEVEL`, `FOOTFALL_LOG_FORMAT`: Logging
//! - `RUST_LOG`: Overrides the log filter entirely

use footfall::api::{serve, AppState};
use footfall::config::{init_tracing, Config};
use footfall::ingest::open_store;
use footfall::query::QueryEngine;
use std::sync::Arc;
use std::time::Instant;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load_default();
    init_tracing(&config.logging);

    tracing::info!("Starting Footfall API server v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        backend = config.data.backend.as_str(),
        csv = %config.data.csv_path.display(),
        "Opening record store"
    );

    // Loading can take a while on a large CSV; keep it off the async workers
    let started = Instant::now();
    let data = config.data.clone();
    let store = tokio::task::spawn_blocking(move || open_store(&data)).await??;
    let records = store.len()?;
    tracing::info!(
        records,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "Record store ready"
    );

    let engine = Arc::new(QueryEngine::new(store));
    let state = AppState::new(engine, config.api.clone(), config.export.clone());

    tracing::info!("Starting server on {}", config.api.addr());
    serve(state).await?;

    tracing::info!("Footfall API server stopped");
    Ok(())
}
