//! Autocomplete Route
//!
//! - GET /api/v1/pois/autocomplete?query=...&field=...

use axum::{
    extract::{Query, State},
    Json,
};
use std::sync::Arc;

use crate::api::dto::{AutocompleteParams, SuggestionsResponse};
use crate::api::error::ApiResult;
use crate::api::routes::run_blocking;
use crate::api::state::AppState;
use crate::search;

/// GET /api/v1/pois/autocomplete
///
/// An unknown `field` searches every field rather than failing.
pub async fn autocomplete(
    State(state): State<Arc<AppState>>,
    Query(params): Query<AutocompleteParams>,
) -> ApiResult<Json<SuggestionsResponse>> {
    let engine = Arc::clone(&state.engine);

    let suggestions = run_blocking(move || {
        search::suggest(&engine, &params.query, params.field.as_deref())
    })
    .await?;

    Ok(Json(SuggestionsResponse { suggestions }))
}
