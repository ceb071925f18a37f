//! Single-pass aggregation
//!
//! [`Tally`] folds records one at a time into counts, sums and distinct sets.
//! Summary statistics, chain roll-ups and market-area roll-ups all use it, so
//! every number derived for a filtered view comes from the same pass.

use crate::storage::Poi;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Running aggregate over a set of records
#[derive(Debug, Clone, Default)]
pub struct Tally {
    venues: u64,
    open: u64,
    foot_traffic: u64,
    sales: f64,
    dwell_sum: f64,
    chains: HashSet<String>,
    dmas: HashSet<u32>,
}

impl Tally {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one record in
    pub fn add(&mut self, poi: &Poi) {
        self.venues += 1;
        if poi.is_open {
            self.open += 1;
        }
        self.foot_traffic = self.foot_traffic.saturating_add(poi.foot_traffic);
        self.sales += poi.sales;
        self.dwell_sum += poi.avg_dwell_time_min;

        if !poi.chain_name.is_empty() && !self.chains.contains(&poi.chain_name) {
            self.chains.insert(poi.chain_name.clone());
        }
        if let Some(dma) = poi.dma {
            self.dmas.insert(dma);
        }
    }

    pub fn venues(&self) -> u64 {
        self.venues
    }

    pub fn open(&self) -> u64 {
        self.open
    }

    pub fn closed(&self) -> u64 {
        self.venues - self.open
    }

    pub fn foot_traffic(&self) -> u64 {
        self.foot_traffic
    }

    pub fn sales(&self) -> f64 {
        self.sales
    }

    pub fn unique_chains(&self) -> u64 {
        self.chains.len() as u64
    }

    pub fn unique_dmas(&self) -> u64 {
        self.dmas.len() as u64
    }

    /// Mean foot traffic, `0` for an empty tally
    pub fn avg_foot_traffic(&self) -> f64 {
        self.mean(self.foot_traffic as f64)
    }

    /// Mean sales, `0` for an empty tally
    pub fn avg_sales(&self) -> f64 {
        self.mean(self.sales)
    }

    /// Mean dwell time in minutes, `0` for an empty tally
    pub fn avg_dwell_time(&self) -> f64 {
        self.mean(self.dwell_sum)
    }

    /// Sales per visit, `0` when there was no traffic
    pub fn sales_per_visitor(&self) -> f64 {
        if self.foot_traffic == 0 {
            0.0
        } else {
            self.sales / self.foot_traffic as f64
        }
    }

    fn mean(&self, sum: f64) -> f64 {
        if self.venues == 0 {
            0.0
        } else {
            sum / self.venues as f64
        }
    }

    /// Snapshot as summary statistics
    pub fn summary(&self) -> SummaryStats {
        SummaryStats {
            total_venues: self.venues,
            total_foot_traffic: self.foot_traffic,
            total_sales: self.sales,
            avg_dwell_time: self.avg_dwell_time(),
            open_venues: self.open,
            closed_venues: self.closed(),
            unique_chains: self.unique_chains(),
            unique_dmas: self.unique_dmas(),
        }
    }
}

/// Aggregate statistics over a filtered view
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SummaryStats {
    pub total_venues: u64,
    pub total_foot_traffic: u64,
    pub total_sales: f64,
    pub avg_dwell_time: f64,
    pub open_venues: u64,
    pub closed_venues: u64,
    pub unique_chains: u64,
    pub unique_dmas: u64,
}

/// Round to two decimal places for reporting
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
