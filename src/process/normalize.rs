use crate::error::{IngestError, Result};
use crate::process::reader::RawRow;

/// Number of positional values every raw row must carry.
pub const CANONICAL_WIDTH: usize = 7;

/// Canonical column names, in positional order.
pub const COLUMNS: [&str; CANONICAL_WIDTH] = [
    "Date",
    "Currency",
    "Country",
    "Buy(USD BID)",
    "Sell(USD ASK)",
    "Buy(local BID)",
    "Sell(local ASK)",
];

/// A raw row with its first seven values given names.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedRow {
    pub sheet: String,
    pub row: usize,
    pub date: String,
    pub currency: String,
    pub country: String,
    pub buy_usd: Option<f64>,
    pub sell_usd: Option<f64>,
    pub buy_local: Option<f64>,
    pub sell_local: Option<f64>,
}

/// Name the positional fields of every raw row.
///
/// The width of every row is checked before any row is converted, so a short
/// row fails the dataset as a whole instead of surfacing later as a missing field.
/// Values past the seventh are ignored.
pub fn normalize(rows: &[RawRow]) -> Result<Vec<NormalizedRow>> {
    if let Some(short) = rows.iter().find(|r| r.values.len() < CANONICAL_WIDTH) {
        return Err(IngestError::SchemaMismatch {
            sheet: short.sheet.clone(),
            row: short.row,
            found: short.values.len(),
            expected: CANONICAL_WIDTH,
        });
    }

    Ok(rows
        .iter()
        .map(|r| {
            let v = &r.values;
            NormalizedRow {
                sheet: r.sheet.clone(),
                row: r.row,
                date: v[0].as_text(),
                currency: v[1].as_text(),
                country: v[2].as_text(),
                buy_usd: v[3].as_number(),
                sell_usd: v[4].as_number(),
                buy_local: v[5].as_number(),
                sell_local: v[6].as_number(),
            }
        })
        .collect())
}
