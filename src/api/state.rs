//! Application State
//!
//! Shared state accessible by all API handlers.
//! Wrapped in Arc for thread-safe sharing across async tasks.

use crate::config::{ApiConfig, ExportConfig};
use crate::query::QueryEngine;
use std::sync::Arc;
use std::time::Instant;

/// Shared application state for all handlers
#[derive(Clone)]
pub struct AppState {
    /// Query engine over the loaded record store
    pub engine: Arc<QueryEngine>,
    /// API configuration
    pub config: Arc<ApiConfig>,
    /// Export configuration
    pub export: ExportConfig,
    /// Server start time for uptime tracking
    pub start_time: Instant,
}

impl AppState {
    pub fn new(engine: Arc<QueryEngine>, config: ApiConfig, export: ExportConfig) -> Self {
        Self {
            engine,
            config: Arc::new(config),
            export,
            start_time: Instant::now(),
        }
    }

    /// Get server uptime in seconds
    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }

    /// Name of the store backend serving requests
    pub fn backend(&self) -> &'static str {
        self.engine.store().backend()
    }
}
