//! Autocomplete suggestions
//!
//! Given a partial text query and an optional field scope, return the
//! smallest distinct matching values, sorted ascending, at most
//! [`SUGGESTION_LIMIT`] of them.

use crate::query::{contains_ci, Predicate, QueryEngine};
use crate::storage::{Poi, StoreResult};
use std::collections::BTreeSet;
use std::ops::ControlFlow;

/// Maximum number of suggestions returned
pub const SUGGESTION_LIMIT: usize = 10;

/// A text field suggestions can come from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SuggestField {
    Name,
    Chain,
    City,
    State,
    StateCode,
    Address,
}

impl SuggestField {
    pub fn all() -> &'static [SuggestField] {
        &[
            SuggestField::Name,
            SuggestField::Chain,
            SuggestField::City,
            SuggestField::State,
            SuggestField::StateCode,
            SuggestField::Address,
        ]
    }

    /// Resolve a field name as accepted by the autocomplete endpoint
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "name" => Some(SuggestField::Name),
            "chain" => Some(SuggestField::Chain),
            "city" => Some(SuggestField::City),
            "state" => Some(SuggestField::State),
            "state_code" => Some(SuggestField::StateCode),
            "address" => Some(SuggestField::Address),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SuggestField::Name => "name",
            SuggestField::Chain => "chain",
            SuggestField::City => "city",
            SuggestField::State => "state",
            SuggestField::StateCode => "state_code",
            SuggestField::Address => "address",
        }
    }

    fn value<'a>(&self, poi: &'a Poi) -> &'a str {
        match self {
            SuggestField::Name => &poi.name,
            SuggestField::Chain => &poi.chain_name,
            SuggestField::City => &poi.city,
            SuggestField::State => &poi.state_name,
            SuggestField::StateCode => &poi.state_code,
            SuggestField::Address => &poi.street_address,
        }
    }
}

/// Suggest values containing `query`, case-insensitively.
///
/// An unknown or missing `field` searches every field. A blank query gives
/// no suggestions.
pub fn suggest(engine: &QueryEngine, query: &str, field: Option<&str>) -> StoreResult<Vec<String>> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return Ok(Vec::new());
    }

    let scoped = field.and_then(SuggestField::parse);
    let fields: &[SuggestField] = match &scoped {
        Some(one) => std::slice::from_ref(one),
        None => SuggestField::all(),
    };

    // Only the smallest SUGGESTION_LIMIT values can survive, so the set
    // never grows past that.
    let mut found: BTreeSet<String> = BTreeSet::new();

    engine.scan_matching(&Predicate::all(), &mut |poi| {
        for field in fields {
            let value = field.value(poi);
            if value.trim().is_empty() || !contains_ci(value, &needle) {
                continue;
            }
            if found.len() == SUGGESTION_LIMIT {
                match found.last() {
                    Some(largest) if value < largest.as_str() => {}
                    _ => continue,
                }
            }
            if found.insert(value.to_string()) && found.len() > SUGGESTION_LIMIT {
                found.pop_last();
            }
        }
        ControlFlow::Continue(())
    })?;

    Ok(found
        .into_iter()
        .filter(|value| contains_ci(value, &needle))
        .take(SUGGESTION_LIMIT)
        .collect())
}
