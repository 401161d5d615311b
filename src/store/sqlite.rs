use crate::error::{IngestError, Result};
use crate::process::date_parser::format_stored_date;
use crate::process::RateRecord;
use crate::store::{RateStore, StoredRecord};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, info};

/// Table shared with the web layer.
pub const TABLE: &str = "HistoricalDollar";

/// SQLite-backed store. Opened once by the host and passed to the pipeline.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let conn = Connection::open(path).map_err(read_err)?;
        let store = Self::init(conn)?;
        info!(path = %path.display(), "opened rate store");
        Ok(store)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory().map_err(read_err)?)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.execute_batch(&format!(
            "CREATE TABLE IF NOT EXISTS {TABLE} (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                date VARCHAR(50) NOT NULL,
                currency VARCHAR(3) NOT NULL,
                buybid REAL NOT NULL
            );"
        ))
        .map_err(write_err)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Every stored row in insertion order.
    pub fn all_records(&self) -> Result<Vec<StoredRecord>> {
        let conn = self.lock().map_err(IngestError::StorageRead)?;
        let mut stmt = conn
            .prepare(&format!(
                "SELECT id, date, currency, buybid FROM {TABLE} ORDER BY id ASC"
            ))
            .map_err(read_err)?;
        let rows = stmt
            .query_map([], row_to_record)
            .map_err(read_err)?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(read_err)?;
        Ok(rows)
    }

    fn lock(&self) -> std::result::Result<MutexGuard<'_, Connection>, String> {
        self.conn
            .lock()
            .map_err(|_| "connection mutex poisoned".to_string())
    }
}

impl RateStore for SqliteStore {
    fn latest_record(&self) -> Result<Option<StoredRecord>> {
        let conn = self.lock().map_err(IngestError::StorageRead)?;
        conn.query_row(
            &format!("SELECT id, date, currency, buybid FROM {TABLE} ORDER BY id DESC LIMIT 1"),
            [],
            row_to_record,
        )
        .optional()
        .map_err(read_err)
    }

    fn append(&self, rows: &[RateRecord]) -> Result<usize> {
        if rows.is_empty() {
            return Ok(0);
        }
        let mut conn = self.lock().map_err(IngestError::StorageWrite)?;
        let tx = conn.transaction().map_err(write_err)?;
        {
            let mut stmt = tx
                .prepare(&format!(
                    "INSERT INTO {TABLE} (date, currency, buybid) VALUES (?1, ?2, ?3)"
                ))
                .map_err(write_err)?;
            for r in rows {
                stmt.execute(params![format_stored_date(r.date), r.currency, r.buy_local])
                    .map_err(write_err)?;
            }
        }
        tx.commit().map_err(write_err)?;
        debug!(rows = rows.len(), "appended batch");
        Ok(rows.len())
    }
}

fn row_to_record(row: &rusqlite::Row<'_>) -> rusqlite::Result<StoredRecord> {
    Ok(StoredRecord {
        id: row.get(0)?,
        date: row.get(1)?,
        currency: row.get(2)?,
        buybid: row.get(3)?,
    })
}

fn read_err(e: rusqlite::Error) -> IngestError {
    IngestError::StorageRead(e.to_string())
}

fn write_err(e: rusqlite::Error) -> IngestError {
    IngestError::StorageWrite(e.to_string())
}
