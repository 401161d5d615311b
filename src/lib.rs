//! Scheduled ingestion of the published USD reference rate.
//!
//! A run fetches the publisher's latest workbook, reads the quote block of
//! every sheet, keeps the USD rows, and appends the ones dated after the newest
//! stored record.

pub mod config;
pub mod error;
pub mod fetch;
pub mod ingest;
pub mod process;
pub mod scheduler;
pub mod staleness;
pub mod store;

pub use config::Config;
pub use error::IngestError;
pub use fetch::RemoteFetcher;
pub use ingest::{Ingestor, UpdateReport};
pub use scheduler::{Scheduler, TaskState};
pub use staleness::{Staleness, StalenessChecker};
pub use store::{MemoryStore, RateStore, SqliteStore, StoredRecord};
