// src/store/mod.rs

use crate::error::{IngestError, Result};
use crate::process::date_parser::parse_stored_date;
use crate::process::RateRecord;
use chrono::NaiveDate;

pub mod memory;
pub mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

/// A row as persisted. `id` is assigned by the store and never reused.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredRecord {
    pub id: i64,
    pub date: String,
    pub currency: String,
    pub buybid: f64,
}

impl StoredRecord {
    pub fn parsed_date(&self) -> Result<NaiveDate> {
        parse_stored_date(&self.date).ok_or_else(|| IngestError::InvalidStoredDate(self.date.clone()))
    }
}

/// Append-only rate storage shared with the read path.
///
/// Implementations never update or delete rows. `append` must be atomic
/// for the whole batch: either every row lands or none does.
pub trait RateStore: Send + Sync {
    /// Most recently inserted record, by descending id.
    fn latest_record(&self) -> Result<Option<StoredRecord>>;

    /// Append `rows` in the given order and return how many were written.
    fn append(&self, rows: &[RateRecord]) -> Result<usize>;
}
