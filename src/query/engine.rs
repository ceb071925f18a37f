//! Query Engine
//!
//! Applies a [`Predicate`] to a [`RecordStore`] and produces pages, summary
//! statistics and filter options. Every operation is a single scan of the
//! store in `entity_id` order with the predicate evaluated once per record.
//!
//! # Execution Pipeline
//!
//! ```text
//! scan → Predicate::matches → { top-k heap + count | Tally | distinct set }
//! ```

use crate::query::facet::Facet;
use crate::query::page::Page;
use crate::query::predicate::Predicate;
use crate::query::stats::{SummaryStats, Tally};
use crate::storage::normalize::parse_market_codes;
use crate::storage::{Poi, RecordStore, StoreResult};
use std::cmp::{Ordering, Reverse};
use std::collections::{BTreeSet, BinaryHeap};
use std::ops::ControlFlow;
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;

/// Filter-and-aggregate engine over one record store
#[derive(Clone)]
pub struct QueryEngine {
    store: Arc<dyn RecordStore>,
}

impl QueryEngine {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    /// The underlying store
    pub fn store(&self) -> &Arc<dyn RecordStore> {
        &self.store
    }

    /// Visit every record matching `predicate` in `entity_id` order.
    ///
    /// All other operations, including analytics and export, are built on
    /// this so they share one predicate evaluation.
    pub fn scan_matching(
        &self,
        predicate: &Predicate,
        visit: &mut dyn FnMut(&Poi) -> ControlFlow<()>,
    ) -> StoreResult<()> {
        self.store.scan(&mut |poi| {
            if predicate.matches(poi) {
                visit(poi)
            } else {
                ControlFlow::Continue(())
            }
        })
    }

    /// One page of the filtered view, ordered by foot traffic descending
    /// then `entity_id` ascending, plus the exact match count.
    ///
    /// `page` is 1-based. A page past the end is empty, not an error.
    pub fn query(&self, predicate: &Predicate, page: usize, page_size: usize) -> StoreResult<Page<Poi>> {
        let start = Instant::now();
        let offset = page.saturating_sub(1).saturating_mul(page_size);
        let keep = offset.saturating_add(page_size);

        let mut heap: BinaryHeap<Ranked> = BinaryHeap::new();
        let mut total: u64 = 0;

        self.scan_matching(predicate, &mut |poi| {
            total += 1;
            if keep == 0 {
                return ControlFlow::Continue(());
            }
            if heap.len() < keep {
                heap.push(Ranked(poi.clone()));
            } else if let Some(worst) = heap.peek() {
                // Scan order is ascending entity_id, so a tie on traffic
                // with the current worst always ranks below it.
                if poi.foot_traffic > worst.0.foot_traffic {
                    heap.pop();
                    heap.push(Ranked(poi.clone()));
                }
            }
            ControlFlow::Continue(())
        })?;

        let items: Vec<Poi> = heap
            .into_sorted_vec()
            .into_iter()
            .skip(offset)
            .map(|ranked| ranked.0)
            .collect();

        debug!(
            predicate = ?predicate,
            page,
            page_size,
            total,
            returned = items.len(),
            elapsed_us = start.elapsed().as_micros() as u64,
            "query executed"
        );

        Ok(Page::new(items, total, page, page_size))
    }

    /// Aggregate statistics over the full filtered view
    pub fn summarize(&self, predicate: &Predicate) -> StoreResult<SummaryStats> {
        let mut tally = Tally::new();
        self.scan_matching(predicate, &mut |poi| {
            tally.add(poi);
            ControlFlow::Continue(())
        })?;

        let summary = tally.summary();
        debug!(predicate = ?predicate, total = summary.total_venues, "summary computed");
        Ok(summary)
    }

    /// Sorted, distinct, non-blank values of `column` across the whole store.
    ///
    /// Columns outside the facet allow-list yield no options.
    pub fn distinct_values(&self, column: &str) -> StoreResult<Vec<String>> {
        match Facet::parse(column) {
            Some(facet) => self.facet_values(facet),
            None => Ok(Vec::new()),
        }
    }

    /// Distinct values of one facet
    pub fn facet_values(&self, facet: Facet) -> StoreResult<Vec<String>> {
        let mut values = BTreeSet::new();
        self.store.scan(&mut |poi| {
            if let Some(value) = facet.value_of(poi) {
                values.insert(value);
            }
            ControlFlow::Continue(())
        })?;
        Ok(values.into_iter().collect())
    }

    /// Distinct market-area codes, ascending. Values that do not read as a
    /// positive integer are dropped.
    pub fn distinct_dma_values(&self) -> StoreResult<Vec<u32>> {
        let raw = self.facet_values(Facet::Dma)?;
        Ok(parse_market_codes(raw))
    }
}

impl std::fmt::Debug for QueryEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryEngine")
            .field("backend", &self.store.backend())
            .finish()
    }
}

/// Heap entry ordered so that the greatest element is the lowest-ranked
/// record: less traffic first, then larger `entity_id`.
struct Ranked(Poi);

impl Ranked {
    fn key(&self) -> (Reverse<u64>, &str) {
        (Reverse(self.0.foot_traffic), self.0.entity_id.as_str())
    }
}

impl PartialEq for Ranked {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for Ranked {}

impl PartialOrd for Ranked {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Ranked {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key().cmp(&other.key())
    }
}
