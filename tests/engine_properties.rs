//! Engine properties checked against both record stores.
//!
//! Every property runs once over `MemoryStore` and once over `SqliteStore`
//! loaded with the same records, and the two must agree exactly.

use chrono::NaiveDate;
use footfall::analytics::{chain_performance, dma_distribution};
use footfall::export::{project, project_chunks};
use footfall::ingest::{import_into_sqlite, PoiCsvReader};
use footfall::query::{Predicate, PredicateBuilder, QueryEngine, SummaryStats};
use footfall::search::suggest;
use footfall::storage::{MemoryStore, Poi, RecordStore, SqliteStore};
use std::collections::HashSet;
use std::ops::ControlFlow;
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

const CHAINS: [&str; 6] = [
    "Walmart Supercenter",
    "Walmart Neighborhood Market",
    "Target",
    "Costco",
    "Best Buy",
    "",
];

const CITIES: [(&str, &str, &str); 5] = [
    ("Springfield", "IL", "Illinois"),
    ("Chicago", "IL", "Illinois"),
    ("Austin", "TX", "Texas"),
    ("Portland", "OR", "Oregon"),
    ("Portland", "ME", "Maine"),
];

/// Deterministic generator so failures reproduce
struct Lcg(u64);

impl Lcg {
    fn next(&mut self) -> u64 {
        self.0 = self.0.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
        self.0 >> 33
    }

    fn below(&mut self, n: u64) -> u64 {
        self.next() % n
    }
}

fn dataset(count: usize) -> Vec<Poi> {
    let mut rng = Lcg(42);
    let closed = NaiveDate::from_ymd_opt(2021, 3, 15)
        .unwrap()
        .and_hms_opt(9, 30, 0)
        .unwrap();

    (0..count)
        .map(|i| {
            let chain = CHAINS[rng.below(CHAINS.len() as u64) as usize];
            let (city, code, state) = CITIES[rng.below(CITIES.len() as u64) as usize];
            // Coarse traffic buckets force plenty of ties
            let traffic = rng.below(12) * 100;

            let mut poi = Poi::new(format!("poi-{:04}", (i * 7919) % 10_000), format!("{} #{}", chain, i))
                .chain(chain)
                .located(city, code, state)
                .category(if i % 3 == 0 { "Warehouse Club" } else { "Discount Store" })
                .foot_traffic(traffic)
                .sales(rng.below(100_000) as f64 / 4.0)
                .dwell(rng.below(600) as f64 / 10.0);

            if rng.below(5) != 0 {
                poi = poi.dma(500 + rng.below(8) as u32);
            }
            if rng.below(4) == 0 {
                poi = poi.closed_at(closed);
            }
            poi
        })
        .collect()
}

fn engines(records: Vec<Poi>) -> Vec<(&'static str, QueryEngine)> {
    let sqlite = SqliteStore::open_in_memory().unwrap();
    import_into_sqlite(&sqlite, &records, false).unwrap();

    let memory = MemoryStore::from_records(records).unwrap();

    vec![
        ("memory", QueryEngine::new(Arc::new(memory))),
        ("sqlite", QueryEngine::new(Arc::new(sqlite))),
    ]
}

fn predicates() -> Vec<Predicate> {
    vec![
        Predicate::all(),
        Predicate::builder().chain_name("walmart").build(),
        Predicate::builder().chain_name("WALMART").is_open(true).build(),
        Predicate::builder().dma(503).build(),
        Predicate::builder().city("portland").state_code("me").build(),
        Predicate::builder().sub_category("club").is_open(false).build(),
        Predicate::builder().search("texas").build(),
        Predicate::builder().search("#1").dma(501).build(),
        Predicate::builder().chain_name("no such chain").build(),
    ]
}

/// Builder carrying every condition already set on `predicate`
fn rebuild(predicate: &Predicate) -> PredicateBuilder {
    let mut builder = Predicate::builder();
    if let Some(v) = predicate.chain_name() {
        builder = builder.chain_name(v);
    }
    if let Some(v) = predicate.dma() {
        builder = builder.dma(v);
    }
    if let Some(v) = predicate.sub_category() {
        builder = builder.sub_category(v);
    }
    if let Some(v) = predicate.city() {
        builder = builder.city(v);
    }
    if let Some(v) = predicate.state_code() {
        builder = builder.state_code(v);
    }
    if let Some(v) = predicate.is_open() {
        builder = builder.is_open(v);
    }
    if let Some(v) = predicate.search() {
        builder = builder.search(v);
    }
    builder
}

/// Walk every page until an empty one comes back
fn all_pages(engine: &QueryEngine, predicate: &Predicate, size: usize) -> Vec<Poi> {
    let mut out = Vec::new();
    let mut page = 1;
    loop {
        let result = engine.query(predicate, page, size).unwrap();
        if result.items.is_empty() {
            break;
        }
        out.extend(result.items);
        page += 1;
    }
    out
}

#[test]
fn test_paging_covers_every_match_once() {
    for (backend, engine) in engines(dataset(240)) {
        for predicate in predicates() {
            let total = engine.query(&predicate, 1, 7).unwrap().total;
            let rows = all_pages(&engine, &predicate, 7);

            assert_eq!(rows.len() as u64, total, "{backend}: {predicate:?}");
            assert_eq!(
                engine.summarize(&predicate).unwrap().total_venues,
                total,
                "{backend}: {predicate:?}"
            );

            let unique: HashSet<&str> = rows.iter().map(|p| p.entity_id.as_str()).collect();
            assert_eq!(unique.len(), rows.len(), "{backend}: duplicate across pages");

            for poi in &rows {
                assert!(predicate.matches(poi), "{backend}: non-matching row {}", poi.entity_id);
            }
        }
    }
}

#[test]
fn test_paging_is_contiguous_and_ordered() {
    for (backend, engine) in engines(dataset(240)) {
        for predicate in predicates() {
            let one_page = engine.query(&predicate, 1, 100).unwrap();
            let small_pages = all_pages(&engine, &predicate, 3);

            let big_pages = all_pages(&engine, &predicate, 100);
            assert_eq!(big_pages, small_pages, "{backend}: {predicate:?}");

            let prefix: Vec<&str> = small_pages
                .iter()
                .take(one_page.items.len())
                .map(|p| p.entity_id.as_str())
                .collect();
            let first: Vec<&str> = one_page.items.iter().map(|p| p.entity_id.as_str()).collect();
            assert_eq!(prefix, first, "{backend}: {predicate:?}");

            for pair in small_pages.windows(2) {
                let ordered = pair[0].foot_traffic > pair[1].foot_traffic
                    || (pair[0].foot_traffic == pair[1].foot_traffic
                        && pair[0].entity_id < pair[1].entity_id);
                assert!(ordered, "{backend}: {} before {}", pair[0].entity_id, pair[1].entity_id);
            }
        }
    }
}

#[test]
fn test_query_is_idempotent() {
    for (backend, engine) in engines(dataset(120)) {
        let predicate = Predicate::builder().chain_name("walmart").build();
        let first = engine.query(&predicate, 2, 5).unwrap();
        let second = engine.query(&predicate, 2, 5).unwrap();
        assert_eq!(first, second, "{backend}");
    }
}

#[test]
fn test_open_plus_closed_is_total() {
    for (backend, engine) in engines(dataset(240)) {
        for predicate in predicates() {
            let summary = engine.summarize(&predicate).unwrap();
            assert_eq!(
                summary.open_venues + summary.closed_venues,
                summary.total_venues,
                "{backend}: {predicate:?}"
            );
        }
    }
}

#[test]
fn test_extra_condition_never_widens() {
    for (backend, engine) in engines(dataset(240)) {
        for predicate in predicates() {
            let total = engine.query(&predicate, 1, 1).unwrap().total;
            assert_eq!(rebuild(&predicate).build(), predicate, "{backend}");

            let mut narrower = Vec::new();
            if predicate.is_open().is_none() {
                narrower.push(rebuild(&predicate).is_open(true).build());
            }
            if predicate.dma().is_none() {
                narrower.push(rebuild(&predicate).dma(501).build());
            }
            if predicate.city().is_none() {
                narrower.push(rebuild(&predicate).city("port").build());
            }
            if predicate.search().is_none() {
                narrower.push(rebuild(&predicate).search("walmart").build());
            }
            assert!(!narrower.is_empty());

            for narrowed in narrower {
                let narrowed_total = engine.query(&narrowed, 1, 1).unwrap().total;
                assert!(
                    narrowed_total <= total,
                    "{backend}: {narrowed:?} matched {narrowed_total}, {predicate:?} matched {total}"
                );
            }
        }
    }
}

#[test]
fn test_stalled_export_does_not_block_queries() {
    let dir = tempfile::tempdir().unwrap();
    let store = SqliteStore::open(dir.path().join("pois.db")).unwrap();
    import_into_sqlite(&store, &dataset(40), false).unwrap();
    let engine = QueryEngine::new(Arc::new(store));

    let (started_tx, started_rx) = mpsc::channel();
    let (release_tx, release_rx) = mpsc::channel::<()>();

    thread::scope(|scope| {
        let exporting = &engine;
        let exporter = scope.spawn(move || {
            let mut stalled = false;
            let mut timed_out = false;
            let rows = project_chunks(exporting, &Predicate::all(), 1, &mut |_chunk| {
                if !stalled {
                    stalled = true;
                    started_tx.send(()).unwrap();
                    // Hold the scan open until the query below has finished
                    timed_out = release_rx.recv_timeout(Duration::from_secs(5)).is_err();
                }
                ControlFlow::Continue(())
            })
            .unwrap();
            (rows, timed_out)
        });

        started_rx.recv().unwrap();
        let page = engine.query(&Predicate::all(), 1, 1).unwrap();
        release_tx.send(()).unwrap();

        assert_eq!(page.items.len(), 1);
        assert_eq!(page.total, 40);

        let (rows, timed_out) = exporter.join().unwrap();
        assert_eq!(rows, 40);
        assert!(!timed_out, "query waited for the export to finish");
    });
}

#[test]
fn test_chain_groups_cover_store() {
    for (backend, engine) in engines(dataset(240)) {
        let total = engine.summarize(&Predicate::all()).unwrap().total_venues;
        let grouped: u64 = chain_performance(&engine)
            .unwrap()
            .iter()
            .map(|c| c.total_venues)
            .sum();
        assert_eq!(grouped, total, "{backend}");
    }
}

#[test]
fn test_stores_agree() {
    let results: Vec<_> = engines(dataset(240))
        .into_iter()
        .map(|(_, engine)| {
            let pages: Vec<_> = predicates()
                .iter()
                .map(|p| engine.query(p, 2, 9).unwrap())
                .collect();
            let summaries: Vec<SummaryStats> = predicates()
                .iter()
                .map(|p| engine.summarize(p).unwrap())
                .collect();
            (
                pages,
                summaries,
                chain_performance(&engine).unwrap(),
                dma_distribution(&engine).unwrap(),
                engine.distinct_values("city").unwrap(),
                engine.distinct_dma_values().unwrap(),
                suggest(&engine, "port", None).unwrap(),
                project(&engine, &Predicate::builder().state_code("il").build()).unwrap(),
            )
        })
        .collect();

    assert_eq!(results.len(), 2);
    assert_eq!(results[0], results[1]);
}

#[test]
fn test_example_scenario() {
    let closed = NaiveDate::from_ymd_opt(2020, 1, 1)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap();
    let records = vec![
        Poi::new("A", "A").chain("Walmart Supercenter").dma(577).foot_traffic(500),
        Poi::new("B", "B")
            .chain("Walmart Supercenter")
            .dma(577)
            .foot_traffic(300)
            .closed_at(closed),
        Poi::new("C", "C").chain("Target").dma(900).foot_traffic(900),
    ];

    for (backend, engine) in engines(records) {
        let walmart = Predicate::builder().chain_name("walmart").build();

        let page = engine.query(&walmart, 1, 10).unwrap();
        let ids: Vec<&str> = page.items.iter().map(|p| p.entity_id.as_str()).collect();
        assert_eq!(ids, vec!["A", "B"], "{backend}");
        assert_eq!(page.total, 2, "{backend}");

        let summary = engine.summarize(&walmart).unwrap();
        assert_eq!(summary.total_venues, 2, "{backend}");
        assert_eq!(summary.open_venues, 1, "{backend}");
        assert_eq!(summary.closed_venues, 1, "{backend}");
        assert_eq!(summary.total_foot_traffic, 800, "{backend}");

        let page = engine.query(&Predicate::builder().dma(900).build(), 1, 10).unwrap();
        assert_eq!(page.items.len(), 1, "{backend}");
        assert_eq!(page.items[0].entity_id, "C", "{backend}");
        assert_eq!(page.total, 1, "{backend}");

        assert_eq!(engine.distinct_dma_values().unwrap(), vec![577, 900], "{backend}");
        assert_eq!(
            suggest(&engine, "wal", None).unwrap(),
            vec!["Walmart Supercenter".to_string()],
            "{backend}"
        );
    }
}

#[test]
fn test_empty_store() {
    for (backend, engine) in engines(Vec::new()) {
        assert!(engine.store().is_empty().unwrap(), "{backend}");

        let page = engine.query(&Predicate::builder().city("x").build(), 1, 20).unwrap();
        assert!(page.items.is_empty(), "{backend}");
        assert_eq!(page.total, 0, "{backend}");

        let summary = engine.summarize(&Predicate::all()).unwrap();
        assert_eq!(summary, SummaryStats::default(), "{backend}");
        assert_eq!(summary.avg_dwell_time, 0.0, "{backend}");

        assert!(chain_performance(&engine).unwrap().is_empty(), "{backend}");
        assert!(dma_distribution(&engine).unwrap().is_empty(), "{backend}");
        assert!(engine.distinct_values("chain_name").unwrap().is_empty(), "{backend}");
    }
}

#[test]
fn test_csv_to_both_stores() {
    let csv = "\
entity_id,name,chain_name,dma,foot_traffic,date_closed,city,state_code,state_name
x1,Costco #1,Costco,577.0,1200,,Austin,TX,Texas
x2,Costco #2,Costco,,800,2019-06-30 00:00:00,Austin,TX,Texas
x3,Target #1,Target,0,800,,Dallas,TX,Texas
";
    let parsed = PoiCsvReader::new().read_str(csv).unwrap();
    assert_eq!(parsed.report.rows_loaded, 3);

    for (backend, engine) in engines(parsed.records) {
        // Zero and blank market codes are both absent
        assert_eq!(engine.distinct_dma_values().unwrap(), vec![577], "{backend}");

        let page = engine.query(&Predicate::all(), 1, 10).unwrap();
        let ids: Vec<&str> = page.items.iter().map(|p| p.entity_id.as_str()).collect();
        assert_eq!(ids, vec!["x1", "x2", "x3"], "{backend}");

        let closed = engine.summarize(&Predicate::builder().is_open(false).build()).unwrap();
        assert_eq!(closed.total_venues, 1, "{backend}");
        assert_eq!(closed.unique_dmas, 0, "{backend}");
    }
}
