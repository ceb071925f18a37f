//! Grouped analytics
//!
//! Whole-store group-by views: per chain and per market area (DMA). Each
//! group is folded with the same [`Tally`] the summary endpoint uses.

use crate::query::{round2, Predicate, QueryEngine, Tally};
use crate::storage::StoreResult;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::ops::ControlFlow;

/// Fixed reporting cap on market-area groups
pub const DMA_DISTRIBUTION_LIMIT: usize = 20;

/// Performance roll-up for one chain
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChainPerformance {
    pub chain_name: String,
    pub total_venues: u64,
    pub total_foot_traffic: u64,
    pub avg_foot_traffic: f64,
    pub total_sales: f64,
    pub avg_sales: f64,
    pub avg_dwell_time: f64,
    pub open_venues: u64,
    pub closed_venues: u64,
    pub avg_sales_per_visitor: f64,
}

impl ChainPerformance {
    fn from_tally(chain_name: String, tally: &Tally) -> Self {
        Self {
            chain_name,
            total_venues: tally.venues(),
            total_foot_traffic: tally.foot_traffic(),
            avg_foot_traffic: round2(tally.avg_foot_traffic()),
            total_sales: round2(tally.sales()),
            avg_sales: round2(tally.avg_sales()),
            avg_dwell_time: round2(tally.avg_dwell_time()),
            open_venues: tally.open(),
            closed_venues: tally.closed(),
            avg_sales_per_visitor: round2(tally.sales_per_visitor()),
        }
    }
}

/// Venue distribution for one market area
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DmaDistribution {
    pub dma: u32,
    pub venue_count: u64,
    pub total_foot_traffic: u64,
    pub total_sales: f64,
    pub unique_chains: u64,
}

/// Roll up every record by `chain_name`, ordered by chain name.
///
/// Records without a chain form their own group under the empty name, so
/// venue counts across groups add up to the store size.
pub fn chain_performance(engine: &QueryEngine) -> StoreResult<Vec<ChainPerformance>> {
    let mut groups: BTreeMap<String, Tally> = BTreeMap::new();

    engine.scan_matching(&Predicate::all(), &mut |poi| {
        match groups.get_mut(&poi.chain_name) {
            Some(tally) => tally.add(poi),
            None => {
                let mut tally = Tally::new();
                tally.add(poi);
                groups.insert(poi.chain_name.clone(), tally);
            }
        }
        ControlFlow::Continue(())
    })?;

    Ok(groups
        .into_iter()
        .map(|(chain, tally)| ChainPerformance::from_tally(chain, &tally))
        .collect())
}

/// Top market areas by foot traffic.
///
/// Records without a DMA are left out. Ties on traffic go to the lower code.
pub fn dma_distribution(engine: &QueryEngine) -> StoreResult<Vec<DmaDistribution>> {
    let mut groups: HashMap<u32, Tally> = HashMap::new();

    engine.scan_matching(&Predicate::all(), &mut |poi| {
        if let Some(dma) = poi.dma {
            groups.entry(dma).or_default().add(poi);
        }
        ControlFlow::Continue(())
    })?;

    let mut rows: Vec<DmaDistribution> = groups
        .into_iter()
        .map(|(dma, tally)| DmaDistribution {
            dma,
            venue_count: tally.venues(),
            total_foot_traffic: tally.foot_traffic(),
            total_sales: round2(tally.sales()),
            unique_chains: tally.unique_chains(),
        })
        .collect();

    rows.sort_by(|a, b| {
        b.total_foot_traffic
            .cmp(&a.total_foot_traffic)
            .then(a.dma.cmp(&b.dma))
    });
    rows.truncate(DMA_DISTRIBUTION_LIMIT);

    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{MemoryStore, Poi};
    use chrono::NaiveDate;
    use std::sync::Arc;

    fn engine(records: Vec<Poi>) -> QueryEngine {
        QueryEngine::new(Arc::new(MemoryStore::from_records(records).unwrap()))
    }

    #[test]
    fn test_chain_performance() {
        let closed = NaiveDate::from_ymd_opt(2021, 6, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();

        let engine = engine(vec![
            Poi::new("1", "W1").chain("Walmart").foot_traffic(100).sales(250.0).dwell(30.0),
            Poi::new("2", "W2").chain("Walmart").foot_traffic(300).sales(150.0).dwell(15.0).closed_at(closed),
            Poi::new("3", "T1").chain("Target").foot_traffic(0).sales(80.0),
            Poi::new("4", "Indie").foot_traffic(10),
        ]);

        let chains = chain_performance(&engine).unwrap();
        let names: Vec<&str> = chains.iter().map(|c| c.chain_name.as_str()).collect();
        assert_eq!(names, vec!["", "Target", "Walmart"]);

        let walmart = &chains[2];
        assert_eq!(walmart.total_venues, 2);
        assert_eq!(walmart.total_foot_traffic, 400);
        assert_eq!(walmart.avg_foot_traffic, 200.0);
        assert_eq!(walmart.total_sales, 400.0);
        assert_eq!(walmart.avg_sales, 200.0);
        assert_eq!(walmart.avg_dwell_time, 22.5);
        assert_eq!(walmart.open_venues, 1);
        assert_eq!(walmart.closed_venues, 1);
        assert_eq!(walmart.avg_sales_per_visitor, 1.0);

        // No traffic: ratio is zero, not a division fault
        assert_eq!(chains[1].avg_sales_per_visitor, 0.0);

        let venues: u64 = chains.iter().map(|c| c.total_venues).sum();
        assert_eq!(venues, 4);
    }

    #[test]
    fn test_dma_distribution_orders_and_excludes_absent() {
        let engine = engine(vec![
            Poi::new("1", "A").chain("X").dma(500).foot_traffic(10),
            Poi::new("2", "B").chain("Y").dma(500).foot_traffic(10),
            Poi::new("3", "C").chain("X").dma(400).foot_traffic(20),
            Poi::new("4", "D").chain("X").dma(600).foot_traffic(50),
            Poi::new("5", "E").chain("Z").foot_traffic(1_000),
        ]);

        let rows = dma_distribution(&engine).unwrap();
        let order: Vec<u32> = rows.iter().map(|r| r.dma).collect();
        assert_eq!(order, vec![600, 400, 500]);
        assert_eq!(rows[2].venue_count, 2);
        assert_eq!(rows[2].unique_chains, 2);
    }

    #[test]
    fn test_dma_distribution_is_capped() {
        let records = (1..=25u32)
            .map(|i| Poi::new(format!("p{i:02}"), "P").dma(i).foot_traffic(u64::from(i)))
            .collect();
        let rows = dma_distribution(&engine(records)).unwrap();
        assert_eq!(rows.len(), DMA_DISTRIBUTION_LIMIT);
        assert_eq!(rows[0].dma, 25);
        assert_eq!(rows[19].dma, 6);
    }

    #[test]
    fn test_empty_store() {
        let engine = engine(Vec::new());
        assert!(chain_performance(&engine).unwrap().is_empty());
        assert!(dma_distribution(&engine).unwrap().is_empty());
    }
}
