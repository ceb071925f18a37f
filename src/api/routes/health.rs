//! Health Routes
//!
//! Health check endpoints for monitoring and Kubernetes probes.
//!
//! - GET /health/live - Liveness probe (process is alive)
//! - GET /health/ready - Readiness probe (store answers)
//! - GET /health - Full health status

use axum::{extract::State, http::StatusCode, Json};
use std::sync::Arc;

use crate::api::dto::HealthResponse;
use crate::api::routes::run_blocking;
use crate::api::state::AppState;

/// GET /health/live
///
/// Kubernetes liveness probe.
/// Returns 200 if the process is alive, no dependency checks.
pub async fn liveness() -> StatusCode {
    StatusCode::OK
}

/// GET /health/ready
///
/// Kubernetes readiness probe.
/// Returns 200 once the record store answers a count.
pub async fn readiness(State(state): State<Arc<AppState>>) -> StatusCode {
    match check_store(&state).await {
        Some(_) => StatusCode::OK,
        None => StatusCode::SERVICE_UNAVAILABLE,
    }
}

/// GET /health
///
/// Full health status with store details.
pub async fn full_health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let loaded = check_store(&state).await;

    let (status, store) = match loaded {
        Some(_) => ("healthy", "ok"),
        None => ("unhealthy", "error"),
    };

    Json(HealthResponse {
        status: status.to_string(),
        store: store.to_string(),
        backend: state.backend().to_string(),
        data_loaded: loaded,
        uptime_seconds: state.uptime_seconds(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Record count, or `None` when the store fails
async fn check_store(state: &AppState) -> Option<usize> {
    let engine = Arc::clone(&state.engine);
    match run_blocking(move || engine.store().len()).await {
        Ok(len) => Some(len),
        Err(e) => {
            tracing::warn!(error = %e, "Store health check failed");
            None
        }
    }
}
