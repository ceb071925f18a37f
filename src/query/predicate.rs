//! Filter predicate
//!
//! A conjunction of optional conditions plus one free-text search. Absent
//! conditions contribute nothing. String conditions are trimmed and lowercased
//! once at construction and matched as literal, case-insensitive substrings.

use crate::storage::Poi;

/// Fields the free-text search looks at
pub const SEARCH_FIELDS: [&str; 5] = ["name", "chain_name", "city", "state_name", "street_address"];

/// The active filter conditions for a query
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Predicate {
    chain_name: Option<String>,
    dma: Option<u32>,
    sub_category: Option<String>,
    city: Option<String>,
    state_code: Option<String>,
    is_open: Option<bool>,
    search: Option<String>,
}

impl Predicate {
    /// The predicate that matches every record
    pub fn all() -> Self {
        Self::default()
    }

    /// Start building a predicate
    pub fn builder() -> PredicateBuilder {
        PredicateBuilder::default()
    }

    /// Whether no condition is active
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Evaluate the predicate against one record.
    ///
    /// This is the only predicate evaluation in the crate; paging, summary,
    /// and export all go through it.
    pub fn matches(&self, poi: &Poi) -> bool {
        if let Some(needle) = &self.chain_name {
            if !contains_ci(&poi.chain_name, needle) {
                return false;
            }
        }

        if let Some(dma) = self.dma {
            if poi.dma != Some(dma) {
                return false;
            }
        }

        if let Some(needle) = &self.sub_category {
            if !contains_ci(&poi.sub_category, needle) {
                return false;
            }
        }

        if let Some(needle) = &self.city {
            if !contains_ci(&poi.city, needle) {
                return false;
            }
        }

        if let Some(needle) = &self.state_code {
            if !contains_ci(&poi.state_code, needle) {
                return false;
            }
        }

        if let Some(is_open) = self.is_open {
            if poi.is_open != is_open {
                return false;
            }
        }

        if let Some(needle) = &self.search {
            let hit = [
                &poi.name,
                &poi.chain_name,
                &poi.city,
                &poi.state_name,
                &poi.street_address,
            ]
            .into_iter()
            .any(|field| contains_ci(field, needle));

            if !hit {
                return false;
            }
        }

        true
    }

    pub fn chain_name(&self) -> Option<&str> {
        self.chain_name.as_deref()
    }

    pub fn dma(&self) -> Option<u32> {
        self.dma
    }

    pub fn sub_category(&self) -> Option<&str> {
        self.sub_category.as_deref()
    }

    pub fn city(&self) -> Option<&str> {
        self.city.as_deref()
    }

    pub fn state_code(&self) -> Option<&str> {
        self.state_code.as_deref()
    }

    pub fn is_open(&self) -> Option<bool> {
        self.is_open
    }

    pub fn search(&self) -> Option<&str> {
        self.search.as_deref()
    }
}

/// Builder for [`Predicate`]
///
/// Accepts raw caller values; blank strings are treated as "not applied".
#[derive(Debug, Clone, Default)]
pub struct PredicateBuilder {
    inner: Predicate,
}

impl PredicateBuilder {
    /// Substring match on chain name
    pub fn chain_name(mut self, value: impl AsRef<str>) -> Self {
        self.inner.chain_name = normalize_text(value.as_ref());
        self
    }

    /// Exact match on market area code
    pub fn dma(mut self, dma: u32) -> Self {
        self.inner.dma = Some(dma);
        self
    }

    /// Substring match on sub category
    pub fn sub_category(mut self, value: impl AsRef<str>) -> Self {
        self.inner.sub_category = normalize_text(value.as_ref());
        self
    }

    /// Substring match on city
    pub fn city(mut self, value: impl AsRef<str>) -> Self {
        self.inner.city = normalize_text(value.as_ref());
        self
    }

    /// Substring match on state code
    pub fn state_code(mut self, value: impl AsRef<str>) -> Self {
        self.inner.state_code = normalize_text(value.as_ref());
        self
    }

    /// Exact match on open status
    pub fn is_open(mut self, is_open: bool) -> Self {
        self.inner.is_open = Some(is_open);
        self
    }

    /// Free-text search across [`SEARCH_FIELDS`]
    pub fn search(mut self, value: impl AsRef<str>) -> Self {
        self.inner.search = normalize_text(value.as_ref());
        self
    }

    pub fn build(self) -> Predicate {
        self.inner
    }
}

fn normalize_text(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_lowercase())
    }
}

/// Case-insensitive literal containment. `needle` must already be lowercase.
pub(crate) fn contains_ci(haystack: &str, needle: &str) -> bool {
    if haystack.is_ascii() && needle.is_ascii() {
        let hay = haystack.as_bytes();
        let pat = needle.as_bytes();
        if pat.is_empty() {
            return true;
        }
        if pat.len() > hay.len() {
            return false;
        }
        return hay
            .windows(pat.len())
            .any(|w| w.eq_ignore_ascii_case(pat));
    }
    haystack.to_lowercase().contains(needle)
}
