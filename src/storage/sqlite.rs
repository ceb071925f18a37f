//! SQLite record store
//!
//! Persists records in a single `pois` table keyed by `entity_id`. The serving
//! process only scans and looks up; `reset` and `insert_batch` exist for the
//! ingestion tooling.
//!
//! The writer connection lives behind a `std::sync::Mutex` because a SQLite
//! handle is not `Sync`. Reads against a database file open their own
//! read-only connection, so a long scan (a slow CSV download) never holds up
//! another request; WAL mode lets those readers run alongside each other. An
//! in-memory database has no file to reopen, so its reads share the writer
//! guard. Either way the connection is released on drop, whatever the exit
//! path.

use crate::storage::error::{StoreError, StoreResult};
use crate::storage::types::{EntityType, Poi};
use crate::storage::RecordStore;
use chrono::NaiveDateTime;
use rusqlite::{params, Connection, OpenFlags, Row};
use std::ops::ControlFlow;
use std::path::{Path, PathBuf};
use std::ops::Deref;
use std::sync::{Mutex, MutexGuard};

/// Rows committed per transaction during ingestion
pub const INSERT_BATCH_SIZE: usize = 100;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS pois (
        entity_id          TEXT PRIMARY KEY NOT NULL,
        entity_type        TEXT NOT NULL,
        name               TEXT NOT NULL,
        chain_name         TEXT NOT NULL,
        chain_id           TEXT NOT NULL,
        store_id           TEXT,
        sub_category       TEXT NOT NULL,
        city               TEXT NOT NULL,
        formatted_city     TEXT NOT NULL,
        state_code         TEXT NOT NULL,
        state_name         TEXT NOT NULL,
        postal_code        TEXT NOT NULL,
        street_address     TEXT NOT NULL,
        geolocation        TEXT NOT NULL,
        country            TEXT NOT NULL,
        dma                INTEGER,
        cbsa               INTEGER,
        foot_traffic       INTEGER NOT NULL,
        sales              REAL NOT NULL,
        avg_dwell_time_min REAL NOT NULL,
        area_sqft          REAL NOT NULL,
        ft_per_sqft        REAL NOT NULL,
        date_opened        TEXT,
        date_closed        TEXT,
        is_open            INTEGER NOT NULL
    );
";

const COLUMNS: &str = "entity_id, entity_type, name, chain_name, chain_id, store_id, sub_category,
    city, formatted_city, state_code, state_name, postal_code, street_address, geolocation,
    country, dma, cbsa, foot_traffic, sales, avg_dwell_time_min, area_sqft, ft_per_sqft,
    date_opened, date_closed, is_open";

/// SQLite-backed record store
pub struct SqliteStore {
    conn: Mutex<Connection>,
    path: Option<PathBuf>,
}

impl SqliteStore {
    /// Open an existing database, or create an empty one
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_WRITE
                | OpenFlags::SQLITE_OPEN_CREATE
                | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA cache_size = 10000;
            PRAGMA temp_store = MEMORY;
            ",
        )?;

        Self::init(conn, Some(path.to_path_buf()))
    }

    /// Open a private in-memory database (tests, dry runs)
    pub fn open_in_memory() -> StoreResult<Self> {
        Self::init(Connection::open_in_memory()?, None)
    }

    fn init(conn: Connection, path: Option<PathBuf>) -> StoreResult<Self> {
        conn.execute_batch(SCHEMA)?;

        Ok(Self {
            conn: Mutex::new(conn),
            path,
        })
    }

    fn conn(&self) -> StoreResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| StoreError::Lock(e.to_string()))
    }

    /// Connection for one read: a fresh read-only handle on the file, or the
    /// shared guard for an in-memory database.
    fn reader(&self) -> StoreResult<Reader<'_>> {
        match &self.path {
            Some(path) => {
                let conn = Connection::open_with_flags(
                    path,
                    OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
                )?;
                Ok(Reader::Own(conn))
            }
            None => Ok(Reader::Shared(self.conn()?)),
        }
    }

    /// Drop every record and recreate the table
    pub fn reset(&self) -> StoreResult<()> {
        let conn = self.conn()?;
        conn.execute_batch("DROP TABLE IF EXISTS pois;")?;
        conn.execute_batch(SCHEMA)?;
        Ok(())
    }

    /// Insert records in one transaction. Fails on a duplicate identifier.
    pub fn insert_batch(&self, records: &[Poi]) -> StoreResult<()> {
        if records.is_empty() {
            return Ok(());
        }

        let mut conn = self.conn()?;
        let tx = conn.transaction()?;

        {
            let mut stmt = tx.prepare_cached(&format!(
                "INSERT INTO pois ({COLUMNS}) VALUES
                 (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15,
                  ?16, ?17, ?18, ?19, ?20, ?21, ?22, ?23, ?24, ?25)"
            ))?;

            for poi in records {
                let foot_traffic = i64::try_from(poi.foot_traffic).unwrap_or(i64::MAX);
                let result = stmt.execute(params![
                    poi.entity_id,
                    poi.entity_type.to_string(),
                    poi.name,
                    poi.chain_name,
                    poi.chain_id,
                    poi.store_id,
                    poi.sub_category,
                    poi.city,
                    poi.formatted_city,
                    poi.state_code,
                    poi.state_name,
                    poi.postal_code,
                    poi.street_address,
                    poi.geolocation,
                    poi.country,
                    poi.dma,
                    poi.cbsa,
                    foot_traffic,
                    poi.sales,
                    poi.avg_dwell_time_min,
                    poi.area_sqft,
                    poi.ft_per_sqft,
                    poi.date_opened.map(format_timestamp),
                    poi.date_closed.map(format_timestamp),
                    poi.is_open,
                ]);

                if let Err(rusqlite::Error::SqliteFailure(err, _)) = &result {
                    if err.code == rusqlite::ErrorCode::ConstraintViolation {
                        return Err(StoreError::DuplicateEntity(poi.entity_id.clone()));
                    }
                }
                result?;
            }
        }

        tx.commit()?;
        Ok(())
    }

    /// Get the database file path (`None` for in-memory databases)
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}

impl RecordStore for SqliteStore {
    fn len(&self) -> StoreResult<usize> {
        let conn = self.reader()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM pois", [], |row| row.get(0))?;
        Ok(count.max(0) as usize)
    }

    fn scan(&self, visit: &mut dyn FnMut(&Poi) -> ControlFlow<()>) -> StoreResult<()> {
        let conn = self.reader()?;
        let mut stmt = conn.prepare_cached(&format!(
            "SELECT {COLUMNS} FROM pois ORDER BY entity_id ASC"
        ))?;
        let mut rows = stmt.query([])?;

        while let Some(row) = rows.next()? {
            let poi = row_to_poi(row)?;
            if visit(&poi).is_break() {
                break;
            }
        }

        Ok(())
    }

    fn get(&self, entity_id: &str) -> StoreResult<Option<Poi>> {
        let conn = self.reader()?;
        let mut stmt =
            conn.prepare_cached(&format!("SELECT {COLUMNS} FROM pois WHERE entity_id = ?1"))?;
        let mut rows = stmt.query(params![entity_id])?;

        let poi = match rows.next()? {
            Some(row) => Some(row_to_poi(row)?),
            None => None,
        };
        Ok(poi)
    }

    fn backend(&self) -> &'static str {
        "sqlite"
    }
}

/// Read connection handed out by [`SqliteStore::reader`]
enum Reader<'a> {
    Own(Connection),
    Shared(MutexGuard<'a, Connection>),
}

impl Deref for Reader<'_> {
    type Target = Connection;

    fn deref(&self) -> &Connection {
        match self {
            Reader::Own(conn) => conn,
            Reader::Shared(guard) => guard,
        }
    }
}

fn format_timestamp(ts: NaiveDateTime) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

fn parse_stored_timestamp(entity_id: &str, raw: Option<String>) -> StoreResult<Option<NaiveDateTime>> {
    raw.map(|s| {
        NaiveDateTime::parse_from_str(&s, TIMESTAMP_FORMAT).map_err(|e| StoreError::Corrupt {
            entity_id: entity_id.to_string(),
            reason: format!("invalid timestamp {s:?}: {e}"),
        })
    })
    .transpose()
}

fn row_to_poi(row: &Row<'_>) -> StoreResult<Poi> {
    let entity_id: String = row.get(0)?;
    let entity_type: String = row.get(1)?;
    let entity_type = match entity_type.as_str() {
        "venue" => EntityType::Venue,
        other => {
            return Err(StoreError::Corrupt {
                entity_id,
                reason: format!("unknown entity type {other:?}"),
            })
        }
    };
    let foot_traffic: i64 = row.get(17)?;
    let date_opened = parse_stored_timestamp(&entity_id, row.get(22)?)?;
    let date_closed = parse_stored_timestamp(&entity_id, row.get(23)?)?;

    Ok(Poi {
        entity_type,
        name: row.get(2)?,
        chain_name: row.get(3)?,
        chain_id: row.get(4)?,
        store_id: row.get(5)?,
        sub_category: row.get(6)?,
        city: row.get(7)?,
        formatted_city: row.get(8)?,
        state_code: row.get(9)?,
        state_name: row.get(10)?,
        postal_code: row.get(11)?,
        street_address: row.get(12)?,
        geolocation: row.get(13)?,
        country: row.get(14)?,
        dma: row.get(15)?,
        cbsa: row.get(16)?,
        foot_traffic: foot_traffic.max(0) as u64,
        sales: row.get(18)?,
        avg_dwell_time_min: row.get(19)?,
        area_sqft: row.get(20)?,
        ft_per_sqft: row.get(21)?,
        date_opened,
        date_closed,
        is_open: row.get(24)?,
        entity_id,
    })
}
