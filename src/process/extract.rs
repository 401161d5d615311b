use crate::error::IngestError;
use crate::process::date_parser::parse_compact_date;
use crate::process::normalize::NormalizedRow;
use chrono::NaiveDate;

/// Currency we keep from the published table.
pub const TARGET_CURRENCY: &str = "USD";

/// One day's local-currency buy rate, ready to append.
#[derive(Debug, Clone, PartialEq)]
pub struct RateRecord {
    pub date: NaiveDate,
    pub currency: String,
    pub buy_local: f64,
}

/// Output of [`extract_usd_rates`]: the usable records plus the rows that were
/// excluded and why.
#[derive(Debug, Default)]
pub struct Extracted {
    pub records: Vec<RateRecord>,
    pub rejected: Vec<IngestError>,
}

/// Keep USD rows and narrow them to `(date, currency, buy_local)`.
///
/// A USD row with an unparseable date or a missing rate is excluded and
/// reported; the remaining rows still come through. Order follows the input.
pub fn extract_usd_rates(rows: &[NormalizedRow]) -> Extracted {
    let mut out = Extracted::default();

    for r in rows.iter().filter(|r| r.currency == TARGET_CURRENCY) {
        let Some(date) = parse_compact_date(&r.date) else {
            out.rejected.push(IngestError::DateParse {
                sheet: r.sheet.clone(),
                row: r.row,
                value: r.date.clone(),
            });
            continue;
        };
        let Some(buy_local) = r.buy_local else {
            out.rejected.push(IngestError::InvalidRate {
                sheet: r.sheet.clone(),
                row: r.row,
            });
            continue;
        };
        out.records.push(RateRecord {
            date,
            currency: r.currency.clone(),
            buy_local,
        });
    }

    out
}
