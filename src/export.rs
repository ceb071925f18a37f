//! Export projection
//!
//! Flattens the filtered view into fixed display columns and encodes it as
//! CSV. Rows are produced in chunks so large exports never sit in memory
//! all at once.

use crate::query::{Predicate, QueryEngine};
use crate::storage::{Poi, StoreError};
use chrono::NaiveDateTime;
use std::io::Write;
use std::ops::ControlFlow;
use thiserror::Error;
use tracing::debug;

/// Display columns, in output order
pub const EXPORT_COLUMNS: [&str; 17] = [
    "Entity ID",
    "Name",
    "Chain Name",
    "Category",
    "City",
    "State",
    "Postal Code",
    "Address",
    "DMA",
    "Foot Traffic",
    "Sales",
    "Avg Dwell Time (min)",
    "Area (sqft)",
    "Foot Traffic per sqft",
    "Is Open",
    "Date Opened",
    "Date Closed",
];

/// Rows per chunk when no size is configured
pub const DEFAULT_CHUNK_SIZE: usize = 1000;

const DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("CSV encoding error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// One exported row, values already rendered as text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportRow {
    cells: [String; 17],
}

impl ExportRow {
    /// Cell values in [`EXPORT_COLUMNS`] order
    pub fn cells(&self) -> &[String] {
        &self.cells
    }

    /// Value under a display column, if the column exists
    pub fn get(&self, column: &str) -> Option<&str> {
        EXPORT_COLUMNS
            .iter()
            .position(|c| *c == column)
            .map(|i| self.cells[i].as_str())
    }

    /// Column name and value pairs in order
    pub fn pairs(&self) -> impl Iterator<Item = (&'static str, &str)> {
        EXPORT_COLUMNS
            .iter()
            .copied()
            .zip(self.cells.iter().map(String::as_str))
    }
}

impl From<&Poi> for ExportRow {
    fn from(poi: &Poi) -> Self {
        Self {
            cells: [
                poi.entity_id.clone(),
                poi.name.clone(),
                poi.chain_name.clone(),
                poi.sub_category.clone(),
                poi.city.clone(),
                poi.state_name.clone(),
                poi.postal_code.clone(),
                poi.street_address.clone(),
                poi.dma.map(|d| d.to_string()).unwrap_or_default(),
                poi.foot_traffic.to_string(),
                poi.sales.to_string(),
                poi.avg_dwell_time_min.to_string(),
                poi.area_sqft.to_string(),
                poi.ft_per_sqft.to_string(),
                if poi.is_open { "True" } else { "False" }.to_string(),
                format_date(poi.date_opened.as_ref()),
                format_date(poi.date_closed.as_ref()),
            ],
        }
    }
}

fn format_date(value: Option<&NaiveDateTime>) -> String {
    value
        .map(|d| d.format(DATE_FORMAT).to_string())
        .unwrap_or_default()
}

/// Project the filtered view in `entity_id` order, handing rows to `sink`
/// in chunks of at most `chunk_size`.
///
/// The sink returns `ControlFlow::Break(())` to stop the export early.
pub fn project_chunks(
    engine: &QueryEngine,
    predicate: &Predicate,
    chunk_size: usize,
    sink: &mut dyn FnMut(Vec<ExportRow>) -> ControlFlow<()>,
) -> Result<u64, StoreError> {
    let chunk_size = chunk_size.max(1);
    let mut chunk = Vec::with_capacity(chunk_size);
    let mut rows: u64 = 0;
    let mut stopped = false;

    engine.scan_matching(predicate, &mut |poi| {
        chunk.push(ExportRow::from(poi));
        rows += 1;
        if chunk.len() == chunk_size {
            let full = std::mem::replace(&mut chunk, Vec::with_capacity(chunk_size));
            if sink(full).is_break() {
                stopped = true;
                return ControlFlow::Break(());
            }
        }
        ControlFlow::Continue(())
    })?;

    if !stopped && !chunk.is_empty() {
        let _ = sink(chunk);
    }

    debug!(predicate = ?predicate, rows, stopped, "export projected");
    Ok(rows)
}

/// Project the whole filtered view at once
pub fn project(engine: &QueryEngine, predicate: &Predicate) -> Result<Vec<ExportRow>, StoreError> {
    let mut out = Vec::new();
    project_chunks(engine, predicate, DEFAULT_CHUNK_SIZE, &mut |chunk| {
        out.extend(chunk);
        ControlFlow::Continue(())
    })?;
    Ok(out)
}

/// The CSV header line
pub fn header_bytes() -> Result<Vec<u8>, ExportError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(EXPORT_COLUMNS)?;
    finish(writer)
}

/// Encode rows as CSV lines without a header
pub fn encode_rows(rows: &[ExportRow]) -> Result<Vec<u8>, ExportError> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::with_capacity(rows.len() * 128));
    for row in rows {
        writer.write_record(row.cells())?;
    }
    finish(writer)
}

fn finish(writer: csv::Writer<Vec<u8>>) -> Result<Vec<u8>, ExportError> {
    writer
        .into_inner()
        .map_err(|e| ExportError::Io(e.into_error()))
}

/// Write the filtered view as CSV, header first. Returns the row count.
pub fn write_csv<W: Write>(
    engine: &QueryEngine,
    predicate: &Predicate,
    chunk_size: usize,
    mut out: W,
) -> Result<u64, ExportError> {
    out.write_all(&header_bytes()?)?;

    let mut failure: Option<ExportError> = None;
    let rows = project_chunks(engine, predicate, chunk_size, &mut |chunk| {
        let written = encode_rows(&chunk).and_then(|bytes| out.write_all(&bytes).map_err(ExportError::from));
        match written {
            Ok(()) => ControlFlow::Continue(()),
            Err(e) => {
                failure = Some(e);
                ControlFlow::Break(())
            }
        }
    })?;

    if let Some(e) = failure {
        return Err(e);
    }
    out.flush()?;
    Ok(rows)
}
