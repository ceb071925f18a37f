//! Footfall CLI
//!
//! Command-line interface for Footfall operations:
//! - Import a CSV into SQLite
//! - Summaries, listings and analytics straight from a store
//! - Autocomplete lookups
//! - CSV export
//! - Config file generation

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use footfall::analytics;
use footfall::config::{generate_default_config, init_tracing, Backend, Config};
use footfall::export;
use footfall::ingest::{self, open_store, PoiCsvReader};
use footfall::query::{Page, Predicate, QueryEngine, MAX_PAGE_SIZE};
use footfall::search;
use footfall::storage::{Poi, SqliteStore};
use serde::Serialize;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "footfall")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Retail point-of-interest analytics")]
#[command(long_about = "Footfall queries venue foot-traffic data.\nFilter, page, summarize and export POIs from a CSV file or a SQLite store.")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Config file (default: $FOOTFALL_CONFIG or the standard locations)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Source CSV, overriding the config
    #[arg(long, global = true)]
    pub csv: Option<PathBuf>,

    /// Store backend (memory, sqlite), overriding the config
    #[arg(long, global = true)]
    pub backend: Option<String>,

    /// SQLite database path, overriding the config
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    /// Output format (table, json)
    #[arg(short, long, default_value = "table", global = true)]
    pub format: String,

    /// Log at info level instead of warn
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Import a CSV file into the SQLite store
    Import {
        /// Keep existing rows instead of dropping the table first
        #[arg(long)]
        append: bool,
        /// Parse and report only, write nothing
        #[arg(long)]
        dry_run: bool,
    },

    /// Summary statistics for a filter
    Summary {
        #[command(flatten)]
        filters: FilterArgs,
    },

    /// List POIs, highest foot traffic first
    Pois {
        #[command(flatten)]
        filters: FilterArgs,
        /// Page number (1-based)
        #[arg(short, long, default_value = "1")]
        page: usize,
        /// Items per page (1-100)
        #[arg(short, long, default_value = "20")]
        limit: usize,
    },

    /// Performance by chain
    Chains,

    /// Top market areas by foot traffic
    Dmas,

    /// Autocomplete suggestions
    Suggest {
        /// Partial text
        query: String,
        /// Field scope (name, chain, city, state, state_code, address)
        #[arg(long)]
        field: Option<String>,
    },

    /// Export filtered POIs as CSV
    Export {
        #[command(flatten)]
        filters: FilterArgs,
        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Generate default config file
    Config {
        /// Output path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

/// Filter flags shared by listing, summary and export
#[derive(Args, Debug, Default)]
pub struct FilterArgs {
    /// Chain name contains
    #[arg(long)]
    pub chain: Option<String>,
    /// Market area code
    #[arg(long)]
    pub dma: Option<u32>,
    /// Sub category contains
    #[arg(long)]
    pub category: Option<String>,
    /// City contains
    #[arg(long)]
    pub city: Option<String>,
    /// State code contains
    #[arg(long)]
    pub state: Option<String>,
    /// Only open (true) or closed (false) venues
    #[arg(long)]
    pub open: Option<bool>,
    /// Free text across name, chain, city, state and address
    #[arg(short, long)]
    pub search: Option<String>,
}

impl FilterArgs {
    fn to_predicate(&self) -> Predicate {
        let mut builder = Predicate::builder();
        if let Some(chain) = &self.chain {
            builder = builder.chain_name(chain);
        }
        if let Some(dma) = self.dma {
            builder = builder.dma(dma);
        }
        if let Some(category) = &self.category {
            builder = builder.sub_category(category);
        }
        if let Some(city) = &self.city {
            builder = builder.city(city);
        }
        if let Some(state) = &self.state {
            builder = builder.state_code(state);
        }
        if let Some(open) = self.open {
            builder = builder.is_open(open);
        }
        if let Some(search) = &self.search {
            builder = builder.search(search);
        }
        builder.build()
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli)?;

    let mut logging = config.logging.clone();
    if !cli.verbose {
        logging.level = "warn".to_string();
    }
    init_tracing(&logging);

    let json = cli.format.eq_ignore_ascii_case("json");

    match cli.command {
        Commands::Import { append, dry_run } => {
            let csv_path = &config.data.csv_path;
            if !csv_path.exists() {
                bail!("CSV file not found: {}", csv_path.display());
            }

            let parsed = PoiCsvReader::new()
                .read_path(csv_path)
                .with_context(|| format!("reading {}", csv_path.display()))?;

            println!("Read {} rows from {}", parsed.report.rows_read, csv_path.display());
            println!("  Loaded:   {}", parsed.report.rows_loaded);
            println!("  Rejected: {}", parsed.report.rows_rejected);
            if !parsed.report.errors.is_empty() {
                println!();
                println!("Errors (first 10):");
                for error in parsed.report.errors.iter().take(10) {
                    println!("  {}", error);
                }
            }

            if dry_run {
                println!();
                println!("(Dry run - no data was imported)");
                return Ok(());
            }

            let store = SqliteStore::open(&config.data.db_path)
                .with_context(|| format!("opening {}", config.data.db_path.display()))?;
            let inserted = ingest::import_into_sqlite(&store, &parsed.records, !append)?;

            println!();
            println!("Imported {} records into {}", inserted, config.data.db_path.display());
        }

        Commands::Summary { filters } => {
            let engine = open_engine(&config)?;
            let summary = engine.summarize(&filters.to_predicate())?;

            if json {
                print_json(&summary)?;
            } else {
                println!("Venues:        {}", summary.total_venues);
                println!("  Open:        {}", summary.open_venues);
                println!("  Closed:      {}", summary.closed_venues);
                println!("Foot traffic:  {}", summary.total_foot_traffic);
                println!("Sales:         {:.2}", summary.total_sales);
                println!("Avg dwell:     {:.2} min", summary.avg_dwell_time);
                println!("Chains:        {}", summary.unique_chains);
                println!("DMAs:          {}", summary.unique_dmas);
            }
        }

        Commands::Pois {
            filters,
            page,
            limit,
        } => {
            if page < 1 {
                bail!("--page must be at least 1");
            }
            if !(1..=MAX_PAGE_SIZE).contains(&limit) {
                bail!("--limit must be between 1 and {}", MAX_PAGE_SIZE);
            }

            let engine = open_engine(&config)?;
            let result = engine.query(&filters.to_predicate(), page, limit)?;

            if json {
                print_json(&result)?;
            } else {
                print_pois(&result);
            }
        }

        Commands::Chains => {
            let engine = open_engine(&config)?;
            let chains = analytics::chain_performance(&engine)?;

            if json {
                print_json(&chains)?;
            } else {
                println!(
                    "{:<32} {:>8} {:>14} {:>12} {:>8}",
                    "Chain", "Venues", "Foot traffic", "Avg traffic", "Open"
                );
                println!("{}", "-".repeat(78));
                for chain in chains {
                    let name = if chain.chain_name.is_empty() { "(none)" } else { chain.chain_name.as_str() };
                    println!(
                        "{:<32} {:>8} {:>14} {:>12.2} {:>8}",
                        truncate(name, 32),
                        chain.total_venues,
                        chain.total_foot_traffic,
                        chain.avg_foot_traffic,
                        chain.open_venues
                    );
                }
            }
        }

        Commands::Dmas => {
            let engine = open_engine(&config)?;
            let rows = analytics::dma_distribution(&engine)?;

            if json {
                print_json(&rows)?;
            } else {
                println!("{:>6} {:>8} {:>14} {:>14} {:>8}", "DMA", "Venues", "Foot traffic", "Sales", "Chains");
                println!("{}", "-".repeat(54));
                for row in rows {
                    println!(
                        "{:>6} {:>8} {:>14} {:>14.2} {:>8}",
                        row.dma, row.venue_count, row.total_foot_traffic, row.total_sales, row.unique_chains
                    );
                }
            }
        }

        Commands::Suggest { query, field } => {
            let engine = open_engine(&config)?;
            let suggestions = search::suggest(&engine, &query, field.as_deref())?;

            if json {
                print_json(&suggestions)?;
            } else if suggestions.is_empty() {
                println!("No suggestions for {:?}", query);
            } else {
                for suggestion in suggestions {
                    println!("{}", suggestion);
                }
            }
        }

        Commands::Export { filters, output } => {
            let engine = open_engine(&config)?;
            let predicate = filters.to_predicate();
            let chunk_size = config.export.chunk_size;

            let rows = match &output {
                Some(path) => {
                    let file = std::fs::File::create(path)
                        .with_context(|| format!("creating {}", path.display()))?;
                    export::write_csv(&engine, &predicate, chunk_size, std::io::BufWriter::new(file))?
                }
                None => export::write_csv(&engine, &predicate, chunk_size, std::io::stdout().lock())?,
            };

            if let Some(path) = output {
                eprintln!("Exported {} rows to {}", rows, path.display());
            }
        }

        Commands::Config { output } => {
            let config_content = generate_default_config();
            match output {
                Some(path) => {
                    std::fs::write(&path, config_content)
                        .with_context(|| format!("writing {}", path.display()))?;
                    println!("Config written to {}", path.display());
                }
                None => print!("{}", config_content),
            }
        }
    }

    Ok(())
}

/// Config file plus environment, then command-line overrides
fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = match &cli.config {
        Some(path) => Config::load_with_env(path)?,
        None => Config::load_default(),
    };

    if let Some(csv) = &cli.csv {
        config.data.csv_path = csv.clone();
    }
    if let Some(backend) = &cli.backend {
        config.data.backend = match Backend::parse(backend) {
            Some(b) => b,
            None => bail!("unknown backend {:?} (expected memory or sqlite)", backend),
        };
    }
    if let Some(db) = &cli.db {
        config.data.db_path = db.clone();
    }

    Ok(config)
}

fn open_engine(config: &Config) -> Result<QueryEngine> {
    let store = open_store(&config.data).context("opening record store")?;
    Ok(QueryEngine::new(store))
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_pois(page: &Page<Poi>) {
    if page.items.is_empty() {
        println!("No POIs on page {} ({} matching)", page.page, page.total);
        return;
    }

    println!(
        "{:<14} {:<36} {:<24} {:<18} {:>12} {:>6}",
        "Entity ID", "Name", "Chain", "City", "Foot traffic", "Open"
    );
    println!("{}", "-".repeat(115));

    for poi in &page.items {
        println!(
            "{:<14} {:<36} {:<24} {:<18} {:>12} {:>6}",
            truncate(&poi.entity_id, 14),
            truncate(&poi.name, 36),
            truncate(&poi.chain_name, 24),
            truncate(&poi.city, 18),
            poi.foot_traffic,
            if poi.is_open { "yes" } else { "no" }
        );
    }

    println!();
    println!(
        "Page {} of {} ({} matching)",
        page.page, page.total_pages, page.total
    );
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max.saturating_sub(1)).collect();
        format!("{}…", cut)
    }
}
