use crate::error::{IngestError, Result};
use crate::store::RateStore;
use chrono::{Local, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Gap between the newest stored observation and the clock.
#[derive(Debug, Clone, PartialEq)]
pub struct Staleness {
    pub last_date: NaiveDate,
    pub elapsed: TimeDelta,
}

impl Staleness {
    pub fn exceeds(&self, limit: Duration) -> bool {
        TimeDelta::from_std(limit).map_or(false, |limit| self.elapsed > limit)
    }
}

/// Absolute distance between the latest stored date (at midnight) and `now`.
pub fn check_staleness(store: &dyn RateStore, now: NaiveDateTime) -> Result<Staleness> {
    let latest = store.latest_record()?.ok_or(IngestError::NoDataYet)?;
    let last_date = latest.parsed_date()?;
    let elapsed = (now - last_date.and_time(NaiveTime::MIN)).abs();
    Ok(Staleness { last_date, elapsed })
}

/// Reports staleness through the log on each invocation. Never writes.
pub struct StalenessChecker {
    store: Arc<dyn RateStore>,
    stale_after: Duration,
}

impl StalenessChecker {
    pub fn new(store: Arc<dyn RateStore>, stale_after: Duration) -> Self {
        Self { store, stale_after }
    }

    pub fn run(&self) -> Result<Staleness> {
        let staleness = check_staleness(self.store.as_ref(), Local::now().naive_local())?;
        let hours = staleness.elapsed.num_hours();
        if staleness.exceeds(self.stale_after) {
            warn!(last_date = %staleness.last_date, hours, "rates are stale");
        } else {
            info!(last_date = %staleness.last_date, hours, "rates are current");
        }
        Ok(staleness)
    }
}
