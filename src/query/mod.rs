//! Footfall Query Engine
//!
//! Filtering, paging and aggregation over a record store:
//!
//! - **predicate**: The filter value object and its builder
//! - **engine**: `QueryEngine` running pages, summaries and filter options
//! - **stats**: Single-pass `Tally` accumulator and `SummaryStats`
//! - **page**: Page object returned to callers
//! - **facet**: Columns that can be enumerated for filter options
//!
//! # Examples
//!
//! ```rust,ignore
//! use footfall::query::{Predicate, QueryEngine};
//!
//! let engine = QueryEngine::new(store);
//! let predicate = Predicate::builder().chain_name("walmart").is_open(true).build();
//!
//! let page = engine.query(&predicate, 1, 20)?;
//! let summary = engine.summarize(&predicate)?;
//! assert_eq!(page.total, summary.total_venues);
//! ```

mod engine;
mod facet;
mod page;
mod predicate;
mod stats;

pub use engine::QueryEngine;
pub use facet::Facet;
pub use page::{Page, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
pub use predicate::{Predicate, PredicateBuilder, SEARCH_FIELDS};
pub use stats::{round2, SummaryStats, Tally};

pub(crate) use predicate::contains_ci;
