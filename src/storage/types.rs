//! Core data types for the footfall record store
//!
//! This module defines the single entity the store holds:
//! - `Poi`: one physical venue with identity, location and traffic metrics
//! - `EntityType`: classification of the record (always a venue today)
//!
//! Records are built once by [`crate::storage::normalize`] at load time and are
//! immutable afterwards. `is_open` is stored, never recomputed.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Kind of entity a record describes
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum EntityType {
    /// A physical store location
    #[default]
    Venue,
}

impl std::fmt::Display for EntityType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EntityType::Venue => write!(f, "venue"),
        }
    }
}

/// A single point-of-interest record
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Poi {
    /// Globally unique, stable identifier (primary key and ordering tie-break)
    pub entity_id: String,
    pub entity_type: EntityType,

    // Identity
    pub name: String,
    pub chain_name: String,
    pub chain_id: String,
    #[serde(default)]
    pub store_id: Option<String>,
    pub sub_category: String,

    // Location
    pub city: String,
    pub formatted_city: String,
    pub state_code: String,
    pub state_name: String,
    pub postal_code: String,
    pub street_address: String,
    /// Coordinate pair encoded as text, passed through untouched
    pub geolocation: String,
    pub country: String,
    /// Designated Market Area code; absent is distinct from zero
    #[serde(default)]
    pub dma: Option<u32>,
    /// Core-Based Statistical Area code
    #[serde(default)]
    pub cbsa: Option<u32>,

    // Metrics
    pub foot_traffic: u64,
    pub sales: f64,
    pub avg_dwell_time_min: f64,
    pub area_sqft: f64,
    /// foot_traffic / area_sqft as delivered by the source
    pub ft_per_sqft: f64,

    // Lifecycle
    #[serde(default)]
    pub date_opened: Option<NaiveDateTime>,
    #[serde(default)]
    pub date_closed: Option<NaiveDateTime>,
    /// Derived once from `date_closed` at load time
    pub is_open: bool,
}

impl Poi {
    /// Create a minimal open venue. Everything else defaults to blank/zero.
    ///
    /// Used by tests and benches; ingestion goes through
    /// [`crate::storage::normalize::PoiFields::into_poi`].
    pub fn new(entity_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            entity_id: entity_id.into(),
            entity_type: EntityType::Venue,
            name: name.into(),
            chain_name: String::new(),
            chain_id: String::new(),
            store_id: None,
            sub_category: String::new(),
            city: String::new(),
            formatted_city: String::new(),
            state_code: String::new(),
            state_name: String::new(),
            postal_code: String::new(),
            street_address: String::new(),
            geolocation: String::new(),
            country: String::new(),
            dma: None,
            cbsa: None,
            foot_traffic: 0,
            sales: 0.0,
            avg_dwell_time_min: 0.0,
            area_sqft: 0.0,
            ft_per_sqft: 0.0,
            date_opened: None,
            date_closed: None,
            is_open: true,
        }
    }

    /// Builder method: set chain name
    pub fn chain(mut self, chain_name: impl Into<String>) -> Self {
        self.chain_name = chain_name.into();
        self
    }

    /// Builder method: set city, state code and state name
    pub fn located(
        mut self,
        city: impl Into<String>,
        state_code: impl Into<String>,
        state_name: impl Into<String>,
    ) -> Self {
        self.city = city.into();
        self.formatted_city = self.city.clone();
        self.state_code = state_code.into();
        self.state_name = state_name.into();
        self
    }

    /// Builder method: set sub category
    pub fn category(mut self, sub_category: impl Into<String>) -> Self {
        self.sub_category = sub_category.into();
        self
    }

    /// Builder method: set market area
    pub fn dma(mut self, dma: u32) -> Self {
        self.dma = Some(dma);
        self
    }

    /// Builder method: set foot traffic
    pub fn foot_traffic(mut self, foot_traffic: u64) -> Self {
        self.foot_traffic = foot_traffic;
        self
    }

    /// Builder method: set sales
    pub fn sales(mut self, sales: f64) -> Self {
        self.sales = sales;
        self
    }

    /// Builder method: set average dwell time in minutes
    pub fn dwell(mut self, minutes: f64) -> Self {
        self.avg_dwell_time_min = minutes;
        self
    }

    /// Builder method: mark closed at the given time.
    ///
    /// Keeps `is_open` consistent with `date_closed`.
    pub fn closed_at(mut self, closed: NaiveDateTime) -> Self {
        self.date_closed = Some(closed);
        self.is_open = false;
        self
    }
}
