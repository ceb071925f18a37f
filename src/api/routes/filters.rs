//! Filter Option Routes
//!
//! Distinct values used to populate filter pickers, always over the whole
//! store.
//!
//! - GET /api/v1/pois/filters/chains
//! - GET /api/v1/pois/filters/dmas
//! - GET /api/v1/pois/filters/categories
//! - GET /api/v1/pois/filters/cities
//! - GET /api/v1/pois/filters/states

use axum::{extract::State, Json};
use std::sync::Arc;

use crate::api::dto::{DmaOptionsResponse, FilterOptionsResponse};
use crate::api::error::ApiResult;
use crate::api::routes::run_blocking;
use crate::api::state::AppState;
use crate::query::Facet;

async fn facet_options(state: &AppState, facet: Facet) -> ApiResult<Json<FilterOptionsResponse>> {
    let engine = Arc::clone(&state.engine);
    let values = run_blocking(move || engine.facet_values(facet)).await?;

    let mut body = FilterOptionsResponse::new();
    body.insert(facet.plural(), values);
    Ok(Json(body))
}

/// GET /api/v1/pois/filters/chains
pub async fn chains(State(state): State<Arc<AppState>>) -> ApiResult<Json<FilterOptionsResponse>> {
    facet_options(&state, Facet::ChainName).await
}

/// GET /api/v1/pois/filters/categories
pub async fn categories(State(state): State<Arc<AppState>>) -> ApiResult<Json<FilterOptionsResponse>> {
    facet_options(&state, Facet::SubCategory).await
}

/// GET /api/v1/pois/filters/cities
pub async fn cities(State(state): State<Arc<AppState>>) -> ApiResult<Json<FilterOptionsResponse>> {
    facet_options(&state, Facet::City).await
}

/// GET /api/v1/pois/filters/states
pub async fn states(State(state): State<Arc<AppState>>) -> ApiResult<Json<FilterOptionsResponse>> {
    facet_options(&state, Facet::StateCode).await
}

/// GET /api/v1/pois/filters/dmas
///
/// Integer codes, ascending.
pub async fn dmas(State(state): State<Arc<AppState>>) -> ApiResult<Json<DmaOptionsResponse>> {
    let engine = Arc::clone(&state.engine);
    let dmas = run_blocking(move || engine.distinct_dma_values()).await?;
    Ok(Json(DmaOptionsResponse { dmas }))
}
