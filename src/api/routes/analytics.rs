//! Analytics Routes
//!
//! - GET /api/v1/pois/analytics/chain-performance
//! - GET /api/v1/pois/analytics/dma-distribution

use axum::{extract::State, Json};
use std::sync::Arc;

use crate::analytics;
use crate::api::dto::{ChainPerformanceResponse, DmaDistributionResponse};
use crate::api::error::ApiResult;
use crate::api::routes::run_blocking;
use crate::api::state::AppState;

/// GET /api/v1/pois/analytics/chain-performance
pub async fn chain_performance(
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<ChainPerformanceResponse>> {
    let engine = Arc::clone(&state.engine);
    let chain_performance = run_blocking(move || analytics::chain_performance(&engine)).await?;
    Ok(Json(ChainPerformanceResponse { chain_performance }))
}

/// GET /api/v1/pois/analytics/dma-distribution
pub async fn dma_distribution(
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<DmaDistributionResponse>> {
    let engine = Arc::clone(&state.engine);
    let dma_distribution = run_blocking(move || analytics::dma_distribution(&engine)).await?;
    Ok(Json(DmaDistributionResponse { dma_distribution }))
}
