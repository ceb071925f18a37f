//! Record store error types
//!
//! Defines all errors that can occur in the storage layer. A store failure is
//! always surfaced; it is never folded into an empty result.

use thiserror::Error;

/// Errors that can occur in a record store
#[derive(Error, Debug)]
pub enum StoreError {
    /// I/O operation failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Underlying SQL engine failed
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// A persisted row could not be turned back into a record
    #[error("Corrupt record {entity_id}: {reason}")]
    Corrupt { entity_id: String, reason: String },

    /// Two records share an identifier
    #[error("Duplicate entity id: {0}")]
    DuplicateEntity(String),

    /// Lock acquisition failed
    #[error("Lock error: {0}")]
    Lock(String),
}

/// Result type alias for storage operations
pub type StoreResult<T> = Result<T, StoreError>;
