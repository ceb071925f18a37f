//! Service Index
//!
//! - GET / - Name, version and endpoint map

use axum::Json;
use std::collections::BTreeMap;

use crate::api::dto::RootResponse;

/// GET /
pub async fn index() -> Json<RootResponse> {
    let endpoints = BTreeMap::from([
        ("pois", "/api/v1/pois"),
        ("summary", "/api/v1/pois/summary"),
        ("filters.chains", "/api/v1/pois/filters/chains"),
        ("filters.dmas", "/api/v1/pois/filters/dmas"),
        ("filters.categories", "/api/v1/pois/filters/categories"),
        ("filters.cities", "/api/v1/pois/filters/cities"),
        ("filters.states", "/api/v1/pois/filters/states"),
        ("autocomplete", "/api/v1/pois/autocomplete"),
        ("export", "/api/v1/pois/export/csv"),
        ("chain_performance", "/api/v1/pois/analytics/chain-performance"),
        ("dma_distribution", "/api/v1/pois/analytics/dma-distribution"),
        ("health", "/health"),
    ]);

    Json(RootResponse {
        message: "Footfall POI analytics API".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        endpoints,
    })
}
