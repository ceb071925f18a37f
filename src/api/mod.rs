//! Footfall REST API
//!
//! HTTP API layer for Footfall, built with Axum.
//!
//! # Endpoints
//!
//! ## POIs
//! - `GET /api/v1/pois` - Paginated, filtered listing
//! - `GET /api/v1/pois/summary` - Summary statistics for the same filters
//!
//! ## Filter options
//! - `GET /api/v1/pois/filters/chains`
//! - `GET /api/v1/pois/filters/dmas`
//! - `GET /api/v1/pois/filters/categories`
//! - `GET /api/v1/pois/filters/cities`
//! - `GET /api/v1/pois/filters/states`
//!
//! ## Search
//! - `GET /api/v1/pois/autocomplete` - Suggestions for a partial query
//!
//! ## Export
//! - `GET /api/v1/pois/export/csv` - Streamed CSV of the filtered view
//!
//! ## Analytics
//! - `GET /api/v1/pois/analytics/chain-performance`
//! - `GET /api/v1/pois/analytics/dma-distribution`
//!
//! ## Health
//! - `GET /health/live` - Liveness probe
//! - `GET /health/ready` - Readiness probe
//! - `GET /health` - Full health status
//!
//! # Example
//!
//! ```rust,ignore
//! use footfall::api::{serve, AppState};
//! use footfall::config::Config;
//! use footfall::ingest::open_store;
//! use footfall::query::QueryEngine;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::load_default();
//!     let engine = Arc::new(QueryEngine::new(open_store(&config.data)?));
//!
//!     let state = AppState::new(engine, config.api.clone(), config.export.clone());
//!     serve(state).await?;
//!
//!     Ok(())
//! }
//! ```

pub mod dto;
pub mod error;
pub mod routes;
pub mod state;

pub use error::{ApiError, ApiResult};
pub use state::AppState;

use axum::{
    http::{HeaderValue, Method},
    routing::get,
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

/// Build the API router with all routes and middleware
pub fn build_router(state: AppState) -> Router {
    let api_routes = Router::new()
        // Listing and summary
        .route("/pois", get(routes::pois::list_pois))
        .route("/pois/summary", get(routes::pois::summary))
        // Filter options
        .route("/pois/filters/chains", get(routes::filters::chains))
        .route("/pois/filters/dmas", get(routes::filters::dmas))
        .route("/pois/filters/categories", get(routes::filters::categories))
        .route("/pois/filters/cities", get(routes::filters::cities))
        .route("/pois/filters/states", get(routes::filters::states))
        // Search
        .route("/pois/autocomplete", get(routes::autocomplete::autocomplete))
        // Export
        .route("/pois/export/csv", get(routes::export::export_csv))
        // Analytics
        .route(
            "/pois/analytics/chain-performance",
            get(routes::analytics::chain_performance),
        )
        .route(
            "/pois/analytics/dma-distribution",
            get(routes::analytics::dma_distribution),
        );

    let health_routes = Router::new()
        .route("/live", get(routes::health::liveness))
        .route("/ready", get(routes::health::readiness))
        .route("/", get(routes::health::full_health));

    let timeout = Duration::from_secs(state.config.request_timeout_secs.max(1));
    let cors = cors_layer(&state.config.cors_origins);

    // Create shared state
    let shared_state = Arc::new(state);

    Router::new()
        .route("/", get(routes::root::index))
        .nest("/api/v1", api_routes)
        .nest("/health", health_routes)
        .layer(TimeoutLayer::new(timeout))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(shared_state)
}

/// CORS for the configured origins; read-only methods, no credentials.
/// An empty or unparseable origin list falls back to permissive.
fn cors_layer(origins: &[String]) -> CorsLayer {
    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    if allowed.is_empty() {
        return CorsLayer::permissive();
    }

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed))
        .allow_methods([Method::GET, Method::HEAD, Method::OPTIONS])
        .allow_headers(Any)
}

/// Start the API server
pub async fn serve(state: AppState) -> Result<(), ApiError> {
    let addr = state.config.addr();
    let router = build_router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("Footfall API listening on {}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| ApiError::Internal(format!("Server error: {}", e)))?;

    tracing::info!("Footfall API shut down gracefully");
    Ok(())
}

/// Wait for shutdown signal
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ApiConfig, ExportConfig};
    use crate::query::QueryEngine;
    use crate::storage::{MemoryStore, Poi, RecordStore, StoreError, StoreResult};
    use axum::{
        body::Body,
        http::{header, Request, StatusCode},
        response::Response,
    };
    use chrono::NaiveDate;
    use serde_json::Value;
    use std::ops::ControlFlow;
    use tower::util::ServiceExt;

    fn sample_records() -> Vec<Poi> {
        let closed = NaiveDate::from_ymd_opt(2020, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();

        vec![
            Poi::new("A", "Walmart Supercenter #1")
                .chain("Walmart Supercenter")
                .located("Springfield", "IL", "Illinois")
                .category("Discount Store")
                .dma(577)
                .foot_traffic(500)
                .sales(1000.0),
            Poi::new("B", "Walmart Supercenter #2")
                .chain("Walmart Supercenter")
                .located("Peoria", "IL", "Illinois")
                .category("Discount Store")
                .dma(577)
                .foot_traffic(300)
                .closed_at(closed),
            Poi::new("C", "Target Downtown")
                .chain("Target")
                .located("Chicago", "IL", "Illinois")
                .category("Department Store")
                .dma(900)
                .foot_traffic(900),
        ]
    }

    fn app_with(store: Arc<dyn RecordStore>) -> Router {
        let engine = Arc::new(QueryEngine::new(store));
        let export = ExportConfig { chunk_size: 2 };
        build_router(AppState::new(engine, ApiConfig::default(), export))
    }

    fn create_test_app() -> Router {
        app_with(Arc::new(MemoryStore::from_records(sample_records()).unwrap()))
    }

    /// Store whose every read fails
    struct BrokenStore;

    impl RecordStore for BrokenStore {
        fn len(&self) -> StoreResult<usize> {
            Err(StoreError::Lock("connection poisoned".to_string()))
        }

        fn scan(&self, _visit: &mut dyn FnMut(&Poi) -> ControlFlow<()>) -> StoreResult<()> {
            Err(StoreError::Lock("connection poisoned".to_string()))
        }

        fn get(&self, _entity_id: &str) -> StoreResult<Option<Poi>> {
            Err(StoreError::Lock("connection poisoned".to_string()))
        }

        fn backend(&self) -> &'static str {
            "broken"
        }
    }

    async fn get(app: Router, uri: &str) -> Response {
        app.oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap()
    }

    async fn body_bytes(response: Response) -> Vec<u8> {
        axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap()
            .to_vec()
    }

    async fn json(response: Response) -> Value {
        serde_json::from_slice(&body_bytes(response).await).unwrap()
    }

    #[tokio::test]
    async fn test_health_live() {
        let response = get(create_test_app(), "/health/live").await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_health_ready() {
        let response = get(create_test_app(), "/health/ready").await;
        assert_eq!(response.status(), StatusCode::OK);

        let response = get(app_with(Arc::new(BrokenStore)), "/health/ready").await;
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_health_full() {
        let response = get(create_test_app(), "/health").await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = json(response).await;
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["backend"], "memory");
        assert_eq!(body["data_loaded"], 3);
    }

    #[tokio::test]
    async fn test_root_index() {
        let response = get(create_test_app(), "/").await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = json(response).await;
        assert_eq!(body["endpoints"]["pois"], "/api/v1/pois");
    }

    #[tokio::test]
    async fn test_list_pois_defaults() {
        let response = get(create_test_app(), "/api/v1/pois").await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = json(response).await;
        assert_eq!(body["total"], 3);
        assert_eq!(body["page"], 1);
        assert_eq!(body["limit"], 20);
        assert_eq!(body["total_pages"], 1);
        let ids: Vec<&str> = body["items"]
            .as_array()
            .unwrap()
            .iter()
            .map(|item| item["entity_id"].as_str().unwrap())
            .collect();
        assert_eq!(ids, vec!["C", "A", "B"]);
    }

    #[tokio::test]
    async fn test_list_pois_filtered_and_paged() {
        let response = get(create_test_app(), "/api/v1/pois?chain_name=walmart&limit=1&page=2").await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = json(response).await;
        assert_eq!(body["total"], 2);
        assert_eq!(body["total_pages"], 2);
        assert_eq!(body["items"][0]["entity_id"], "B");
        assert_eq!(body["items"][0]["is_open"], false);
    }

    #[tokio::test]
    async fn test_list_pois_rejects_bad_paging() {
        let response = get(create_test_app(), "/api/v1/pois?page=0").await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json(response).await;
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");

        let response = get(create_test_app(), "/api/v1/pois?limit=101").await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = get(create_test_app(), "/api/v1/pois?dma=abc").await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_summary_uses_filters() {
        let response = get(create_test_app(), "/api/v1/pois/summary?chain_name=walmart").await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = json(response).await;
        assert_eq!(body["total_venues"], 2);
        assert_eq!(body["open_venues"], 1);
        assert_eq!(body["closed_venues"], 1);
        assert_eq!(body["total_foot_traffic"], 800);
        assert_eq!(body["unique_dmas"], 1);
    }

    #[tokio::test]
    async fn test_filter_options() {
        let body = json(get(create_test_app(), "/api/v1/pois/filters/chains").await).await;
        assert_eq!(body["chains"], serde_json::json!(["Target", "Walmart Supercenter"]));

        let body = json(get(create_test_app(), "/api/v1/pois/filters/dmas").await).await;
        assert_eq!(body["dmas"], serde_json::json!([577, 900]));

        let body = json(get(create_test_app(), "/api/v1/pois/filters/states").await).await;
        assert_eq!(body["states"], serde_json::json!(["IL"]));
    }

    #[tokio::test]
    async fn test_autocomplete() {
        let body = json(get(create_test_app(), "/api/v1/pois/autocomplete?query=peo&field=city").await).await;
        assert_eq!(body["suggestions"], serde_json::json!(["Peoria"]));

        let response = get(create_test_app(), "/api/v1/pois/autocomplete").await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_analytics() {
        let body = json(get(create_test_app(), "/api/v1/pois/analytics/chain-performance").await).await;
        let chains = body["chain_performance"].as_array().unwrap();
        assert_eq!(chains.len(), 2);
        assert_eq!(chains[1]["chain_name"], "Walmart Supercenter");
        assert_eq!(chains[1]["total_venues"], 2);

        let body = json(get(create_test_app(), "/api/v1/pois/analytics/dma-distribution").await).await;
        assert_eq!(body["dma_distribution"][0]["dma"], 900);
    }

    #[tokio::test]
    async fn test_export_csv() {
        let response = get(create_test_app(), "/api/v1/pois/export/csv?state_code=il").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_DISPOSITION],
            "attachment; filename=poi_export.csv"
        );
        assert_eq!(response.headers()[header::CONTENT_TYPE], "text/csv");

        let text = String::from_utf8(body_bytes(response).await).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[0].starts_with("Entity ID,Name"));
        assert!(lines[1].starts_with("A,"));
        assert!(lines[3].starts_with("C,"));
    }

    #[tokio::test]
    async fn test_export_csv_empty_has_header() {
        let response = get(create_test_app(), "/api/v1/pois/export/csv?city=atlantis").await;
        assert_eq!(response.status(), StatusCode::OK);
        let text = String::from_utf8(body_bytes(response).await).unwrap();
        assert_eq!(text.lines().count(), 1);
    }

    #[tokio::test]
    async fn test_store_failure_is_server_error() {
        let app = app_with(Arc::new(BrokenStore));

        let response = get(app.clone(), "/api/v1/pois").await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = json(response).await;
        assert_eq!(body["error"]["code"], "STORE_ERROR");
        assert!(body["request_id"].is_string());

        let response = get(app.clone(), "/api/v1/pois/summary").await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let response = get(app, "/api/v1/pois/export/csv").await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
