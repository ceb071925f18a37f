//! Value normalization
//!
//! Every coercion from raw source text into a [`Poi`] happens here, once, at
//! load time. The query engine only ever sees normalized records:
//!
//! - numeric metrics default to `0` / `0.0` when missing or malformed
//! - market codes (`dma`, `cbsa`) and `store_id` default to absent, never `0` or `""`
//! - `is_open` is derived from `date_closed` by [`is_open`] and stored

use crate::storage::types::{EntityType, Poi};
use chrono::{DateTime, NaiveDate, NaiveDateTime};

/// Country assumed when the source leaves it blank
pub const DEFAULT_COUNTRY: &str = "United States";

/// Derive the open flag. The only place this rule lives.
pub fn is_open(date_closed: Option<&NaiveDateTime>) -> bool {
    date_closed.is_none()
}

/// Parse a market-area code (DMA or CBSA).
///
/// Accepts integers and integral floats (`"577"`, `"577.0"`, `" 577 "`).
/// Blank, non-numeric, fractional and non-positive values are absent.
pub fn parse_market_code(raw: &str) -> Option<u32> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(code) = raw.parse::<i64>() {
        return u32::try_from(code).ok().filter(|c| *c > 0);
    }

    let value = raw.parse::<f64>().ok()?;
    if !value.is_finite() || value.fract() != 0.0 || value <= 0.0 || value > u32::MAX as f64 {
        return None;
    }
    Some(value as u32)
}

/// Parse many market codes, dropping anything unparseable, ascending and deduplicated
pub fn parse_market_codes<I, S>(raw: I) -> Vec<u32>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut codes: Vec<u32> = raw
        .into_iter()
        .filter_map(|s| parse_market_code(s.as_ref()))
        .collect();
    codes.sort_unstable();
    codes.dedup();
    codes
}

/// Parse a non-negative count such as foot traffic. Missing or malformed is `0`.
pub fn parse_count(raw: &str) -> u64 {
    let raw = raw.trim();
    if let Ok(n) = raw.parse::<u64>() {
        return n;
    }
    match raw.parse::<f64>() {
        Ok(v) if v.is_finite() && v > 0.0 => v.round() as u64,
        _ => 0,
    }
}

/// Parse a non-negative decimal metric. Missing, malformed or negative is `0.0`.
pub fn parse_amount(raw: &str) -> f64 {
    match raw.trim().parse::<f64>() {
        Ok(v) if v.is_finite() && v > 0.0 => v,
        _ => 0.0,
    }
}

/// Normalize a store id: blank is absent, `"1234.0"` becomes `"1234"`.
pub fn parse_store_id(raw: &str) -> Option<String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    match raw.parse::<f64>() {
        Ok(v) if v.is_finite() && v.fract() == 0.0 && v >= 0.0 => Some(format!("{}", v as u64)),
        _ => Some(raw.to_string()),
    }
}

/// Parse a lifecycle timestamp. Unparseable values are absent.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.naive_utc());
    }

    let formats = [
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S",
    ];
    for fmt in formats {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(dt);
        }
    }

    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

/// Raw, untyped field values for one record as they arrive from a source
#[derive(Debug, Clone, Default)]
pub struct PoiFields {
    pub entity_id: String,
    pub name: String,
    pub chain_name: String,
    pub chain_id: String,
    pub store_id: String,
    pub sub_category: String,
    pub city: String,
    pub formatted_city: String,
    pub state_code: String,
    pub state_name: String,
    pub postal_code: String,
    pub street_address: String,
    pub geolocation: String,
    pub country: String,
    pub dma: String,
    pub cbsa: String,
    pub foot_traffic: String,
    pub sales: String,
    pub avg_dwell_time_min: String,
    pub area_sqft: String,
    pub ft_per_sqft: String,
    pub date_opened: String,
    pub date_closed: String,
}

impl PoiFields {
    /// Set a field by its source column name. Unknown columns are ignored.
    pub fn set(&mut self, column: &str, value: &str) {
        let slot = match column.trim() {
            "entity_id" => &mut self.entity_id,
            "name" => &mut self.name,
            "chain_name" => &mut self.chain_name,
            "chain_id" => &mut self.chain_id,
            "store_id" => &mut self.store_id,
            "sub_category" => &mut self.sub_category,
            "city" => &mut self.city,
            "formatted_city" => &mut self.formatted_city,
            "state_code" => &mut self.state_code,
            "state_name" => &mut self.state_name,
            "postal_code" => &mut self.postal_code,
            "street_address" => &mut self.street_address,
            "geolocation" => &mut self.geolocation,
            "country" => &mut self.country,
            "dma" => &mut self.dma,
            "cbsa" => &mut self.cbsa,
            "foot_traffic" => &mut self.foot_traffic,
            "sales" => &mut self.sales,
            "avg_dwell_time_min" => &mut self.avg_dwell_time_min,
            "area_sqft" => &mut self.area_sqft,
            "ft_per_sqft" => &mut self.ft_per_sqft,
            "date_opened" => &mut self.date_opened,
            "date_closed" => &mut self.date_closed,
            _ => return,
        };
        *slot = value.to_string();
    }

    /// Normalize into a record. Returns `None` when the row has no identifier.
    pub fn into_poi(self) -> Option<Poi> {
        let entity_id = self.entity_id.trim().to_string();
        if entity_id.is_empty() {
            return None;
        }

        let city = self.city.trim().to_string();
        let formatted_city = match self.formatted_city.trim() {
            "" => city.clone(),
            other => other.to_string(),
        };
        let country = match self.country.trim() {
            "" => DEFAULT_COUNTRY.to_string(),
            other => other.to_string(),
        };
        let date_closed = parse_timestamp(&self.date_closed);

        Some(Poi {
            entity_id,
            entity_type: EntityType::Venue,
            name: self.name.trim().to_string(),
            chain_name: self.chain_name.trim().to_string(),
            chain_id: self.chain_id.trim().to_string(),
            store_id: parse_store_id(&self.store_id),
            sub_category: self.sub_category.trim().to_string(),
            city,
            formatted_city,
            state_code: self.state_code.trim().to_string(),
            state_name: self.state_name.trim().to_string(),
            postal_code: self.postal_code.trim().to_string(),
            street_address: self.street_address.trim().to_string(),
            geolocation: self.geolocation.trim().to_string(),
            country,
            dma: parse_market_code(&self.dma),
            cbsa: parse_market_code(&self.cbsa),
            foot_traffic: parse_count(&self.foot_traffic),
            sales: parse_amount(&self.sales),
            avg_dwell_time_min: parse_amount(&self.avg_dwell_time_min),
            area_sqft: parse_amount(&self.area_sqft),
            ft_per_sqft: parse_amount(&self.ft_per_sqft),
            date_opened: parse_timestamp(&self.date_opened),
            is_open: is_open(date_closed.as_ref()),
            date_closed,
        })
    }
}
