//! Footfall Record Store
//!
//! This module provides the read-only record store the query engine runs on:
//!
//! - **types**: The `Poi` record
//! - **normalize**: The one place raw source values become typed fields
//! - **memory**: In-memory store, records sorted by `entity_id`
//! - **sqlite**: Persisted store backed by SQLite
//! - **error**: Error types
//!
//! # Architecture
//!
//! ```text
//! Load Path:
//!   CSV → normalize → MemoryStore | SqliteStore
//!
//! Read Path:
//!   QueryEngine → RecordStore::scan (entity_id order) → predicate → tally / page
//! ```
//!
//! Stores never evaluate predicates or aggregate. Choosing memory or SQLite
//! changes where records live, not how queries behave.

pub mod error;
pub mod memory;
pub mod normalize;
pub mod sqlite;
pub mod types;

use std::ops::ControlFlow;

pub use error::{StoreError, StoreResult};
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;
pub use types::{EntityType, Poi};

/// Read access to the full POI dataset.
///
/// Implementations are immutable after load and safe to share across threads.
pub trait RecordStore: Send + Sync {
    /// Number of records held
    fn len(&self) -> StoreResult<usize>;

    /// Whether the store holds no records
    fn is_empty(&self) -> StoreResult<bool> {
        Ok(self.len()? == 0)
    }

    /// Visit every record exactly once in ascending `entity_id` order.
    ///
    /// The visitor returns `ControlFlow::Break(())` to stop early.
    fn scan(&self, visit: &mut dyn FnMut(&Poi) -> ControlFlow<()>) -> StoreResult<()>;

    /// Fetch a single record by identifier
    fn get(&self, entity_id: &str) -> StoreResult<Option<Poi>>;

    /// Short name used in logs and health output
    fn backend(&self) -> &'static str;
}
