use crate::error::{IngestError, Result};
use crate::process::date_parser::format_stored_date;
use crate::process::RateRecord;
use crate::store::{RateStore, StoredRecord};
use std::sync::Mutex;

/// In-process store with the same append-only contract as [`super::SqliteStore`].
#[derive(Default)]
pub struct MemoryStore {
    rows: Mutex<Vec<StoredRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a row with an arbitrary date string, as an older writer might have.
    pub fn insert_raw(&self, date: &str, currency: &str, buybid: f64) -> Result<i64> {
        let mut rows = self
            .rows
            .lock()
            .map_err(|_| IngestError::StorageWrite("memory store poisoned".into()))?;
        let id = rows.last().map_or(1, |r| r.id + 1);
        rows.push(StoredRecord {
            id,
            date: date.to_string(),
            currency: currency.to_string(),
            buybid,
        });
        Ok(id)
    }

    pub fn records(&self) -> Result<Vec<StoredRecord>> {
        let rows = self
            .rows
            .lock()
            .map_err(|_| IngestError::StorageRead("memory store poisoned".into()))?;
        Ok(rows.clone())
    }
}

impl RateStore for MemoryStore {
    fn latest_record(&self) -> Result<Option<StoredRecord>> {
        let rows = self
            .rows
            .lock()
            .map_err(|_| IngestError::StorageRead("memory store poisoned".into()))?;
        Ok(rows.iter().max_by_key(|r| r.id).cloned())
    }

    fn append(&self, batch: &[RateRecord]) -> Result<usize> {
        let mut rows = self
            .rows
            .lock()
            .map_err(|_| IngestError::StorageWrite("memory store poisoned".into()))?;
        let mut next = rows.last().map_or(1, |r| r.id + 1);
        for r in batch {
            rows.push(StoredRecord {
                id: next,
                date: format_stored_date(r.date),
                currency: r.currency.clone(),
                buybid: r.buy_local,
            });
            next += 1;
        }
        Ok(batch.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::sync::Arc;

    #[test]
    fn latest_is_highest_id() {
        let store = MemoryStore::new();
        store.insert_raw("2024-03-10 00:00:00", "USD", 36.0).unwrap();
        store
            .append(&[RateRecord {
                date: NaiveDate::from_ymd_opt(2024, 3, 11).unwrap(),
                currency: "USD".into(),
                buy_local: 36.1,
            }])
            .unwrap();

        let latest = store.latest_record().unwrap().unwrap();
        assert_eq!(latest.id, 2);
        assert_eq!(latest.date, "2024-03-11");
    }

    #[test]
    fn poisoned_lock_is_a_read_error() {
        let store = Arc::new(MemoryStore::new());
        store.insert_raw("2024-03-10", "USD", 36.0).unwrap();

        let s = Arc::clone(&store);
        let _ = std::thread::spawn(move || {
            let _held = s.rows.lock().unwrap();
            panic!("writer died holding the lock");
        })
        .join();

        assert!(matches!(store.records(), Err(IngestError::StorageRead(_))));
        assert!(store.latest_record().is_err());
    }
}
