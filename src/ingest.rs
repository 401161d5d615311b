use crate::error::{IngestError, Result};
use crate::fetch::RemoteFetcher;
use crate::process::{extract_usd_rates, normalize, read_workbook, RateRecord};
use crate::store::RateStore;
use chrono::NaiveDate;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{info, warn};

/// Outcome of one successful run.
#[derive(Debug)]
pub struct UpdateReport {
    pub workbook: PathBuf,
    /// USD rows that made it through extraction.
    pub extracted: usize,
    /// Rows excluded during extraction, with the reason for each.
    pub rejected: Vec<IngestError>,
    /// Latest stored date when the run compared against the store.
    pub last_stored: Option<NaiveDate>,
    pub appended: usize,
}

/// Fetches the latest workbook and appends rates newer than anything stored.
pub struct Ingestor {
    fetcher: RemoteFetcher,
    store: Arc<dyn RateStore>,
    // serialises runs so appends never interleave
    run_lock: Mutex<()>,
}

impl Ingestor {
    pub fn new(fetcher: RemoteFetcher, store: Arc<dyn RateStore>) -> Self {
        Self {
            fetcher,
            store,
            run_lock: Mutex::new(()),
        }
    }

    /// Fetch, parse, and append strictly-newer USD rates.
    ///
    /// A second call made while one is in flight waits for the first to finish.
    pub async fn run_update(&self) -> Result<UpdateReport> {
        let _running = self.run_lock.lock().await;
        let start = Instant::now();

        let path = self.fetcher.fetch_latest().await?;

        let store = Arc::clone(&self.store);
        let report = tokio::task::spawn_blocking(move || ingest_workbook(store.as_ref(), &path))
            .await??;

        info!(
            appended = report.appended,
            rejected = report.rejected.len(),
            elapsed = ?start.elapsed(),
            "update finished"
        );
        Ok(report)
    }
}

/// Parse a staged workbook and append its new rates to `store`.
///
/// Nothing is written unless every stage before the append succeeded.
pub fn ingest_workbook(store: &dyn RateStore, path: &Path) -> Result<UpdateReport> {
    let raw = read_workbook(path)?;
    let rows = normalize(&raw)?;
    let extracted = extract_usd_rates(&rows);
    for rejection in &extracted.rejected {
        warn!(error = %rejection, "excluded row");
    }

    let last_stored = match store.latest_record()? {
        Some(record) => Some(record.parsed_date()?),
        None => None,
    };
    let extracted_count = extracted.records.len();
    let fresh = select_new_rates(extracted.records, last_stored);

    let appended = if fresh.is_empty() {
        info!(last_stored = ?last_stored, "no new rates");
        0
    } else {
        store.append(&fresh)?
    };

    Ok(UpdateReport {
        workbook: path.to_path_buf(),
        extracted: extracted_count,
        rejected: extracted.rejected,
        last_stored,
        appended,
    })
}

/// Sort ascending by date and keep rows strictly after `last_stored`.
///
/// A row dated exactly `last_stored` counts as already present even if its
/// rate differs. Within the batch only the first row for each date is kept.
pub fn select_new_rates(
    mut records: Vec<RateRecord>,
    last_stored: Option<NaiveDate>,
) -> Vec<RateRecord> {
    records.sort_by_key(|r| r.date);
    records.dedup_by_key(|r| r.date);
    match last_stored {
        Some(last) => records.into_iter().filter(|r| r.date > last).collect(),
        None => records,
    }
}
