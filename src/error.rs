use std::path::PathBuf;
use thiserror::Error;

/// Everything that can go wrong between the publisher's page and the store.
///
/// Per-row variants (`DateParse`, `InvalidRate`) are collected into a run's
/// report and never abort the run. Every other variant fails the run.
#[derive(Debug, Error)]
pub enum IngestError {
    /// The status page or the linked workbook could not be retrieved.
    #[error("source unavailable: {url}: {source}")]
    SourceUnavailable {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The status page no longer has a workbook link where we expect one.
    #[error("no workbook link matched `{selector}` on {url}")]
    LinkNotFound { url: String, selector: String },

    #[error("malformed workbook {}: {reason}", path.display())]
    MalformedWorkbook { path: PathBuf, reason: String },

    /// A raw row carries fewer positional values than the canonical schema.
    #[error("row {row} of sheet `{sheet}` has {found} columns, expected at least {expected}")]
    SchemaMismatch {
        sheet: String,
        row: usize,
        found: usize,
        expected: usize,
    },

    #[error("row {row} of sheet `{sheet}`: `{value}` is not a DDMMYYYY date")]
    DateParse {
        sheet: String,
        row: usize,
        value: String,
    },

    #[error("row {row} of sheet `{sheet}` has no numeric local buy rate")]
    InvalidRate { sheet: String, row: usize },

    #[error("could not stage workbook at {}: {source}", path.display())]
    Staging {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to read from store: {0}")]
    StorageRead(String),

    #[error("failed to append to store: {0}")]
    StorageWrite(String),

    #[error("stored date `{0}` is not in a known layout")]
    InvalidStoredDate(String),

    /// The store holds no records yet, so no staleness can be computed.
    #[error("store has no records yet")]
    NoDataYet,

    /// The blocking parse/append task panicked or was cancelled.
    #[error("ingest task did not complete: {0}")]
    TaskFailed(#[from] tokio::task::JoinError),
}

pub type Result<T> = std::result::Result<T, IngestError>;
