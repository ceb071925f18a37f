//! # Footfall
//!
//! Retail point-of-interest analytics - a read-oriented API over a fixed-schema
//! dataset of venues with foot-traffic and sales metrics.
//!
//! ## Features
//!
//! - **Consistent filtering**: one predicate drives paging, summaries and export
//! - **Deterministic paging**: foot traffic descending, `entity_id` tie-break
//! - **Two stores, one engine**: in-memory or SQLite, identical results
//! - **Grouped analytics**: per chain and per market area (DMA)
//! - **Autocomplete** and **streamed CSV export**
//!
//! ## Modules
//!
//! - [`storage`]: Record model, normalization and the two record stores
//! - [`ingest`]: CSV loading into either store
//! - [`query`]: Filter predicate and query engine
//! - [`analytics`]: Chain and market-area roll-ups
//! - [`search`]: Autocomplete suggestions
//! - [`export`]: Flat CSV projection
//! - [`api`]: REST API server with Axum
//! - [`config`]: TOML and environment configuration
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use footfall::ingest::load_memory_store;
//! use footfall::query::{Predicate, QueryEngine};
//! use std::path::Path;
//! use std::sync::Arc;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let (store, report) = load_memory_store(Path::new("poi_data.csv"))?;
//!     println!("Loaded {} records ({} rejected)", report.rows_loaded, report.rows_rejected);
//!
//!     let engine = QueryEngine::new(Arc::new(store));
//!     let open_walmarts = Predicate::builder().chain_name("walmart").is_open(true).build();
//!
//!     let page = engine.query(&open_walmarts, 1, 20)?;
//!     let summary = engine.summarize(&open_walmarts)?;
//!     println!("{} of {} venues on page 1", page.items.len(), summary.total_venues);
//!
//!     Ok(())
//! }
//! ```

pub mod analytics;
pub mod api;
pub mod config;
pub mod export;
pub mod ingest;
pub mod query;
pub mod search;
pub mod storage;

// Re-export top-level types for convenience
pub use storage::{EntityType, MemoryStore, Poi, RecordStore, SqliteStore, StoreError, StoreResult};

pub use query::{Facet, Page, Predicate, PredicateBuilder, QueryEngine, SummaryStats};

pub use analytics::{chain_performance, dma_distribution, ChainPerformance, DmaDistribution};

pub use search::{suggest, SuggestField};

pub use export::{ExportError, ExportRow, EXPORT_COLUMNS};

pub use ingest::{IngestError, IngestReport, PoiCsvReader};

pub use api::{build_router, serve, ApiError, AppState};

pub use config::{ApiConfig, Backend, Config, ConfigError, DataConfig, ExportConfig, LoggingConfig};
