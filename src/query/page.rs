//! Paginated results

use serde::Serialize;

/// Largest page size callers may ask for
pub const MAX_PAGE_SIZE: usize = 100;

/// Page size used when the caller does not give one
pub const DEFAULT_PAGE_SIZE: usize = 20;

/// One page of an ordered, filtered view
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Records matching the predicate across all pages
    pub total: u64,
    pub page: usize,
    pub limit: usize,
    pub total_pages: u64,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, total: u64, page: usize, limit: usize) -> Self {
        let total_pages = if total == 0 {
            0
        } else {
            total.div_ceil(limit.max(1) as u64)
        };

        Self {
            items,
            total,
            page,
            limit,
            total_pages,
        }
    }

    /// Convert the items, keeping the page metadata
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            page: self.page,
            limit: self.limit,
            total_pages: self.total_pages,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
