use chrono::{NaiveDate, NaiveDateTime};
use once_cell::sync::Lazy;
use regex::Regex;

static COMPACT_DATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{2})(\d{2})(\d{4})$").expect("compact date regex"));

/// Layout the store uses for the `date` column.
pub const STORED_DATE_FORMAT: &str = "%Y-%m-%d";
const LEGACY_STORED_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Parse the publisher's `DDMMYYYY` layout. Anything other than exactly
/// eight digits forming a real calendar date is `None`.
pub fn parse_compact_date(s: &str) -> Option<NaiveDate> {
    let caps = COMPACT_DATE.captures(s.trim())?;
    let day: u32 = caps[1].parse().ok()?;
    let month: u32 = caps[2].parse().ok()?;
    let year: i32 = caps[3].parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}

/// Parse a `date` value read back from the store.
pub fn parse_stored_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    NaiveDate::parse_from_str(s, STORED_DATE_FORMAT)
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(s, LEGACY_STORED_FORMAT)
                .ok()
                .map(|dt| dt.date())
        })
}

pub fn format_stored_date(date: NaiveDate) -> String {
    date.format(STORED_DATE_FORMAT).to_string()
}
