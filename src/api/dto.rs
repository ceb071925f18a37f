//! Data Transfer Objects
//!
//! Request and response types for the API endpoints.
//! These types are serialized/deserialized to/from JSON and query strings.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::analytics::{ChainPerformance, DmaDistribution};
use crate::api::error::{ApiError, ApiResult};
use crate::query::{Predicate, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
use crate::storage::Poi;

// ============================================
// REQUEST DTOs
// ============================================

/// Pagination query parameters
#[derive(Debug, Clone, Deserialize)]
pub struct PageParams {
    /// 1-based page number
    #[serde(default = "default_page")]
    pub page: usize,
    /// Items per page
    #[serde(default = "default_limit")]
    pub limit: usize,
}

fn default_page() -> usize {
    1
}

fn default_limit() -> usize {
    DEFAULT_PAGE_SIZE
}

impl Default for PageParams {
    fn default() -> Self {
        Self {
            page: default_page(),
            limit: default_limit(),
        }
    }
}

impl PageParams {
    /// Check ranges before anything reaches the engine
    pub fn validate(&self) -> ApiResult<()> {
        if self.page < 1 {
            return Err(ApiError::Validation("page must be at least 1".to_string()));
        }
        if self.limit < 1 || self.limit > MAX_PAGE_SIZE {
            return Err(ApiError::Validation(format!(
                "limit must be between 1 and {}",
                MAX_PAGE_SIZE
            )));
        }
        Ok(())
    }
}

/// Filter query parameters shared by listing, summary and export
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FilterParams {
    #[serde(default)]
    pub chain_name: Option<String>,
    #[serde(default)]
    pub dma: Option<u32>,
    #[serde(default)]
    pub sub_category: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub state_code: Option<String>,
    #[serde(default)]
    pub is_open: Option<bool>,
    #[serde(default)]
    pub search: Option<String>,
}

impl FilterParams {
    /// Map the parameters onto a predicate, one condition per present field
    pub fn to_predicate(&self) -> Predicate {
        let mut builder = Predicate::builder();

        if let Some(chain_name) = &self.chain_name {
            builder = builder.chain_name(chain_name);
        }
        if let Some(dma) = self.dma {
            builder = builder.dma(dma);
        }
        if let Some(sub_category) = &self.sub_category {
            builder = builder.sub_category(sub_category);
        }
        if let Some(city) = &self.city {
            builder = builder.city(city);
        }
        if let Some(state_code) = &self.state_code {
            builder = builder.state_code(state_code);
        }
        if let Some(is_open) = self.is_open {
            builder = builder.is_open(is_open);
        }
        if let Some(search) = &self.search {
            builder = builder.search(search);
        }

        builder.build()
    }
}

/// Autocomplete query parameters
#[derive(Debug, Clone, Deserialize)]
pub struct AutocompleteParams {
    /// Partial text to complete
    pub query: String,
    /// Optional field scope (name, chain, city, state, state_code, address)
    #[serde(default)]
    pub field: Option<String>,
}

// ============================================
// POI DTOs
// ============================================

/// One POI as listed by the API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoiResponse {
    pub entity_id: String,
    pub name: String,
    pub chain_name: String,
    pub sub_category: String,
    pub dma: Option<u32>,
    pub city: String,
    pub state_name: String,
    pub foot_traffic: u64,
    pub is_open: bool,
    pub sales: f64,
    pub avg_dwell_time_min: f64,
    pub area_sqft: f64,
    pub ft_per_sqft: f64,
    pub street_address: String,
    pub postal_code: String,
    pub date_opened: Option<NaiveDateTime>,
    pub date_closed: Option<NaiveDateTime>,
}

impl From<Poi> for PoiResponse {
    fn from(poi: Poi) -> Self {
        Self {
            entity_id: poi.entity_id,
            name: poi.name,
            chain_name: poi.chain_name,
            sub_category: poi.sub_category,
            dma: poi.dma,
            city: poi.city,
            state_name: poi.state_name,
            foot_traffic: poi.foot_traffic,
            is_open: poi.is_open,
            sales: poi.sales,
            avg_dwell_time_min: poi.avg_dwell_time_min,
            area_sqft: poi.area_sqft,
            ft_per_sqft: poi.ft_per_sqft,
            street_address: poi.street_address,
            postal_code: poi.postal_code,
            date_opened: poi.date_opened,
            date_closed: poi.date_closed,
        }
    }
}

// ============================================
// FILTER / SEARCH DTOs
// ============================================

/// Filter options keyed by the plural facet name, e.g. `{"chains": [...]}`
pub type FilterOptionsResponse = BTreeMap<&'static str, Vec<String>>;

/// Market-area filter options
#[derive(Debug, Serialize, Deserialize)]
pub struct DmaOptionsResponse {
    pub dmas: Vec<u32>,
}

/// Autocomplete response
#[derive(Debug, Serialize, Deserialize)]
pub struct SuggestionsResponse {
    pub suggestions: Vec<String>,
}

// ============================================
// ANALYTICS DTOs
// ============================================

#[derive(Debug, Serialize, Deserialize)]
pub struct ChainPerformanceResponse {
    pub chain_performance: Vec<ChainPerformance>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DmaDistributionResponse {
    pub dma_distribution: Vec<DmaDistribution>,
}

// ============================================
// SERVICE DTOs
// ============================================

/// Full health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Overall status: healthy or unhealthy
    pub status: String,
    /// Store status
    pub store: String,
    /// Store backend: memory or sqlite
    pub backend: String,
    /// Records loaded, when the store answers
    pub data_loaded: Option<usize>,
    /// Server uptime in seconds
    pub uptime_seconds: u64,
    /// Application version
    pub version: String,
}

/// Service index at `/`
#[derive(Debug, Serialize)]
pub struct RootResponse {
    pub message: String,
    pub version: String,
    pub endpoints: BTreeMap<&'static str, &'static str>,
}
