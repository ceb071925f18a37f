//! POI Routes
//!
//! - GET /api/v1/pois - Paginated, filtered listing
//! - GET /api/v1/pois/summary - Summary statistics for the same filters

use axum::{
    extract::{Query, State},
    Json,
};
use std::sync::Arc;

use crate::api::dto::{FilterParams, PageParams, PoiResponse};
use crate::api::error::ApiResult;
use crate::api::routes::run_blocking;
use crate::api::state::AppState;
use crate::query::{Page, SummaryStats};

/// GET /api/v1/pois
///
/// Ordered by foot traffic descending, then entity id.
pub async fn list_pois(
    State(state): State<Arc<AppState>>,
    Query(paging): Query<PageParams>,
    Query(filters): Query<FilterParams>,
) -> ApiResult<Json<Page<PoiResponse>>> {
    paging.validate()?;

    let predicate = filters.to_predicate();
    let engine = Arc::clone(&state.engine);

    let page = run_blocking(move || engine.query(&predicate, paging.page, paging.limit)).await?;

    Ok(Json(page.map(PoiResponse::from)))
}

/// GET /api/v1/pois/summary
pub async fn summary(
    State(state): State<Arc<AppState>>,
    Query(filters): Query<FilterParams>,
) -> ApiResult<Json<SummaryStats>> {
    let predicate = filters.to_predicate();
    let engine = Arc::clone(&state.engine);

    let stats = run_blocking(move || engine.summarize(&predicate)).await?;

    Ok(Json(stats))
}
