//! Filter-option facets
//!
//! The fixed allow-list of columns whose distinct values populate filter
//! pickers. Unknown names resolve to `None` and produce no options.

use crate::storage::Poi;

/// A column that can be enumerated for filter options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Facet {
    ChainName,
    City,
    StateCode,
    SubCategory,
    Dma,
}

impl Facet {
    /// All facets, in response order
    pub fn all() -> &'static [Facet] {
        &[
            Facet::ChainName,
            Facet::City,
            Facet::StateCode,
            Facet::SubCategory,
            Facet::Dma,
        ]
    }

    /// Resolve a column name. Returns `None` for anything off the allow-list.
    pub fn parse(column: &str) -> Option<Self> {
        match column {
            "chain_name" => Some(Facet::ChainName),
            "city" => Some(Facet::City),
            "state_code" => Some(Facet::StateCode),
            "sub_category" => Some(Facet::SubCategory),
            "dma" => Some(Facet::Dma),
            _ => None,
        }
    }

    /// Column name
    pub fn column(&self) -> &'static str {
        match self {
            Facet::ChainName => "chain_name",
            Facet::City => "city",
            Facet::StateCode => "state_code",
            Facet::SubCategory => "sub_category",
            Facet::Dma => "dma",
        }
    }

    /// Key used for the option list in API responses
    pub fn plural(&self) -> &'static str {
        match self {
            Facet::ChainName => "chains",
            Facet::City => "cities",
            Facet::StateCode => "states",
            Facet::SubCategory => "categories",
            Facet::Dma => "dmas",
        }
    }

    /// String form of this facet's value on a record, if present and non-blank
    pub fn value_of(&self, poi: &Poi) -> Option<String> {
        let text = match self {
            Facet::ChainName => poi.chain_name.as_str(),
            Facet::City => poi.city.as_str(),
            Facet::StateCode => poi.state_code.as_str(),
            Facet::SubCategory => poi.sub_category.as_str(),
            Facet::Dma => return poi.dma.map(|d| d.to_string()),
        };

        if text.trim().is_empty() {
            None
        } else {
            Some(text.to_string())
        }
    }
}

impl std::fmt::Display for Facet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.column())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_round_trips_column() {
        for facet in Facet::all() {
            assert_eq!(Facet::parse(facet.column()), Some(*facet));
        }
        assert_eq!(Facet::parse("street_address"), None);
        assert_eq!(Facet::parse("CHAIN_NAME"), None);
    }

    #[test]
    fn test_value_of_skips_blank_and_absent() {
        let poi = Poi::new("a", "A").chain("  ");
        assert_eq!(Facet::ChainName.value_of(&poi), None);
        assert_eq!(Facet::Dma.value_of(&poi), None);
        assert_eq!(Facet::Dma.value_of(&poi.dma(577)), Some("577".to_string()));
    }
}
