//! CSV ingestion
//!
//! Reads POI rows from CSV, normalizes each one through
//! [`PoiFields::into_poi`](crate::storage::normalize::PoiFields::into_poi) and
//! loads the result into either store. Bad rows are counted and skipped; only
//! an unreadable file or a missing `entity_id` column fails the load.

use crate::config::{Backend, DataConfig};
use crate::storage::normalize::PoiFields;
use crate::storage::sqlite::INSERT_BATCH_SIZE;
use crate::storage::{MemoryStore, Poi, RecordStore, SqliteStore, StoreError};
use serde::Serialize;
use std::collections::HashSet;
use std::io::Read;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tracing::{info, warn};

/// Per-row error messages kept in a report
pub const MAX_REPORTED_ERRORS: usize = 100;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("missing required column: {0}")]
    MissingColumn(&'static str),
}

pub type IngestResult<T> = Result<T, IngestError>;

/// Outcome of reading a CSV source
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IngestReport {
    pub rows_read: usize,
    pub rows_loaded: usize,
    pub rows_rejected: usize,
    pub errors: Vec<String>,
}

impl IngestReport {
    fn reject(&mut self, line: usize, reason: impl std::fmt::Display) {
        self.rows_rejected += 1;
        if self.errors.len() < MAX_REPORTED_ERRORS {
            self.errors.push(format!("Line {}: {}", line, reason));
        }
    }
}

/// Records parsed from one source, with the report describing them
#[derive(Debug, Clone, Default)]
pub struct ParsedRows {
    pub records: Vec<Poi>,
    pub report: IngestReport,
}

/// CSV reader for POI files
#[derive(Debug, Clone, Copy)]
pub struct PoiCsvReader {
    delimiter: u8,
}

impl Default for PoiCsvReader {
    fn default() -> Self {
        Self::new()
    }
}

impl PoiCsvReader {
    pub fn new() -> Self {
        Self { delimiter: b',' }
    }

    /// Use a different field delimiter
    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Read a CSV file
    pub fn read_path(&self, path: &Path) -> IngestResult<ParsedRows> {
        let file = std::fs::File::open(path)?;
        self.read_from(std::io::BufReader::new(file))
    }

    /// Read CSV text
    pub fn read_str(&self, text: &str) -> IngestResult<ParsedRows> {
        self.read_from(text.as_bytes())
    }

    /// Read CSV from any reader
    pub fn read_from<R: Read>(&self, source: R) -> IngestResult<ParsedRows> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .delimiter(self.delimiter)
            .from_reader(source);

        let headers: Vec<String> = reader
            .headers()?
            .iter()
            .map(|h| h.trim().trim_start_matches('\u{feff}').to_string())
            .collect();

        if !headers.iter().any(|h| h == "entity_id") {
            return Err(IngestError::MissingColumn("entity_id"));
        }

        let mut parsed = ParsedRows::default();
        let mut seen: HashSet<String> = HashSet::new();

        for (index, result) in reader.records().enumerate() {
            let line = index + 2;
            parsed.report.rows_read += 1;

            let record = match result {
                Ok(r) => r,
                Err(e) => {
                    parsed.report.reject(line, e);
                    continue;
                }
            };

            let mut fields = PoiFields::default();
            for (column, value) in headers.iter().zip(record.iter()) {
                fields.set(column, value);
            }

            let Some(poi) = fields.into_poi() else {
                parsed.report.reject(line, "missing entity_id");
                continue;
            };

            if !seen.insert(poi.entity_id.clone()) {
                parsed
                    .report
                    .reject(line, format!("duplicate entity_id {}", poi.entity_id));
                continue;
            }

            parsed.records.push(poi);
        }

        parsed.report.rows_loaded = parsed.records.len();

        if parsed.report.rows_rejected > 0 {
            warn!(
                rejected = parsed.report.rows_rejected,
                first_error = parsed.report.errors.first().map(String::as_str).unwrap_or(""),
                "Rejected CSV rows"
            );
        }

        Ok(parsed)
    }
}

/// Load a CSV file into a fresh in-memory store
pub fn load_memory_store(path: &Path) -> IngestResult<(MemoryStore, IngestReport)> {
    let start = Instant::now();
    let parsed = PoiCsvReader::new().read_path(path)?;
    let store = MemoryStore::from_records(parsed.records)?;

    info!(
        path = %path.display(),
        records = parsed.report.rows_loaded,
        rejected = parsed.report.rows_rejected,
        elapsed_ms = start.elapsed().as_millis() as u64,
        "Loaded POI records into memory"
    );

    Ok((store, parsed.report))
}

/// Insert records into SQLite in batches, optionally dropping what is there.
///
/// Returns the number of records inserted.
pub fn import_into_sqlite(store: &SqliteStore, records: &[Poi], drop_existing: bool) -> IngestResult<usize> {
    if drop_existing {
        info!("Dropping existing POI table");
        store.reset()?;
    }

    let total = records.len();
    let mut inserted = 0;

    for batch in records.chunks(INSERT_BATCH_SIZE) {
        store.insert_batch(batch)?;
        inserted += batch.len();

        if inserted % (INSERT_BATCH_SIZE * 100) == 0 || inserted == total {
            info!(inserted, total, "Imported POI batch");
        }
    }

    Ok(inserted)
}

/// Read a CSV file and import it into SQLite
pub fn import_csv_into_sqlite(
    store: &SqliteStore,
    csv_path: &Path,
    drop_existing: bool,
) -> IngestResult<IngestReport> {
    let start = Instant::now();
    let parsed = PoiCsvReader::new().read_path(csv_path)?;
    let inserted = import_into_sqlite(store, &parsed.records, drop_existing)?;

    info!(
        path = %csv_path.display(),
        inserted,
        rejected = parsed.report.rows_rejected,
        elapsed_ms = start.elapsed().as_millis() as u64,
        "CSV import complete"
    );

    Ok(parsed.report)
}

/// Open the configured store.
///
/// The memory backend loads the CSV; a missing file gives an empty store
/// with a warning. The SQLite backend imports the CSV when the table is
/// empty and `import_if_empty` is set.
pub fn open_store(config: &DataConfig) -> IngestResult<Arc<dyn RecordStore>> {
    match config.backend {
        Backend::Memory => match load_memory_store(&config.csv_path) {
            Ok((store, _)) => Ok(Arc::new(store)),
            Err(IngestError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!(path = %config.csv_path.display(), "CSV not found, serving an empty store");
                Ok(Arc::new(MemoryStore::new()))
            }
            Err(e) => Err(e),
        },
        Backend::Sqlite => {
            let store = SqliteStore::open(&config.db_path)?;
            info!(path = %config.db_path.display(), "Opened SQLite store");

            if config.import_if_empty && store.is_empty()? {
                if config.csv_path.exists() {
                    info!(path = %config.csv_path.display(), "SQLite store is empty, importing CSV");
                    import_csv_into_sqlite(&store, &config.csv_path, false)?;
                } else {
                    warn!(path = %config.csv_path.display(), "SQLite store is empty and CSV not found");
                }
            }

            Ok(Arc::new(store))
        }
    }
}
