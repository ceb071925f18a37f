//! API Routes
//!
//! Route handlers organized by functionality.

pub mod analytics;
pub mod autocomplete;
pub mod export;
pub mod filters;
pub mod health;
pub mod pois;
pub mod root;

use crate::api::error::{ApiError, ApiResult};
use crate::storage::StoreResult;

/// Run a store-bound engine call on the blocking pool.
///
/// Store errors become `ApiError::Store`; a panicked or cancelled task
/// becomes `ApiError::Internal`.
pub(crate) async fn run_blocking<T, F>(f: F) -> ApiResult<T>
where
    F: FnOnce() -> StoreResult<T> + Send + 'static,
    T: Send + 'static,
{
    match tokio::task::spawn_blocking(f).await {
        Ok(result) => result.map_err(ApiError::from),
        Err(e) => Err(ApiError::Internal(format!("engine task failed: {}", e))),
    }
}
