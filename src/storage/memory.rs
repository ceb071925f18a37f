//! In-memory record store
//!
//! Holds every record in a `Vec` sorted by `entity_id`. Lookups are a binary
//! search; scans walk the vector in order.

use crate::storage::error::{StoreError, StoreResult};
use crate::storage::types::Poi;
use crate::storage::RecordStore;
use std::ops::ControlFlow;

/// Immutable in-memory store
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    records: Vec<Poi>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from records, rejecting duplicate identifiers
    pub fn from_records(mut records: Vec<Poi>) -> StoreResult<Self> {
        records.sort_by(|a, b| a.entity_id.cmp(&b.entity_id));

        if let Some(dup) = records
            .windows(2)
            .find(|pair| pair[0].entity_id == pair[1].entity_id)
        {
            return Err(StoreError::DuplicateEntity(dup[0].entity_id.clone()));
        }

        Ok(Self { records })
    }

    /// Borrow all records in identifier order
    pub fn records(&self) -> &[Poi] {
        &self.records
    }
}

impl RecordStore for MemoryStore {
    fn len(&self) -> StoreResult<usize> {
        Ok(self.records.len())
    }

    fn scan(&self, visit: &mut dyn FnMut(&Poi) -> ControlFlow<()>) -> StoreResult<()> {
        for poi in &self.records {
            if visit(poi).is_break() {
                break;
            }
        }
        Ok(())
    }

    fn get(&self, entity_id: &str) -> StoreResult<Option<Poi>> {
        Ok(self
            .records
            .binary_search_by(|p| p.entity_id.as_str().cmp(entity_id))
            .ok()
            .map(|idx| self.records[idx].clone()))
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_records_sorted_by_id() {
        let store = MemoryStore::from_records(vec![
            Poi::new("c", "Third"),
            Poi::new("a", "First"),
            Poi::new("b", "Second"),
        ])
        .unwrap();

        let mut seen = Vec::new();
        store
            .scan(&mut |p| {
                seen.push(p.entity_id.clone());
                ControlFlow::Continue(())
            })
            .unwrap();

        assert_eq!(seen, vec!["a", "b", "c"]);
        assert_eq!(store.len().unwrap(), 3);
    }

    #[test]
    fn test_duplicate_rejected() {
        let result = MemoryStore::from_records(vec![Poi::new("a", "One"), Poi::new("a", "Two")]);
        assert!(matches!(result, Err(StoreError::DuplicateEntity(id)) if id == "a"));
    }

    #[test]
    fn test_scan_stops_on_break() {
        let store = MemoryStore::from_records(vec![Poi::new("a", "A"), Poi::new("b", "B")]).unwrap();

        let mut visited = 0;
        store
            .scan(&mut |_| {
                visited += 1;
                ControlFlow::Break(())
            })
            .unwrap();

        assert_eq!(visited, 1);
    }

    #[test]
    fn test_get() {
        let store = MemoryStore::from_records(vec![Poi::new("a", "A"), Poi::new("b", "B")]).unwrap();
        assert_eq!(store.get("b").unwrap().map(|p| p.name), Some("B".to_string()));
        assert!(store.get("zz").unwrap().is_none());
        assert!(MemoryStore::new().is_empty().unwrap());
    }
}
