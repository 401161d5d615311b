use crate::error::{IngestError, Result};
use calamine::{open_workbook_auto, Data, Range, Reader};
use std::path::Path;
use tracing::debug;

/// First row (0-indexed) of the quote block on every sheet.
pub const FIRST_QUOTE_ROW: u32 = 10;
/// Last row (0-indexed, inclusive) of the quote block on every sheet.
pub const LAST_QUOTE_ROW: u32 = 30;

/// A single cell value, detached from the spreadsheet library.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Text(String),
    Number(f64),
}

impl Cell {
    /// Text form of the cell. Whole numbers print without a fractional part
    /// so that a numeric `15032024` reads back as `"15032024"`.
    pub fn as_text(&self) -> String {
        match self {
            Cell::Empty => String::new(),
            Cell::Text(s) => clean_text(s),
            Cell::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => format!("{:.0}", n),
            Cell::Number(n) => n.to_string(),
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Cell::Number(n) => Some(*n),
            Cell::Text(s) => clean_text(s).replace(',', ".").parse().ok(),
            Cell::Empty => None,
        }
    }
}

impl From<&Data> for Cell {
    fn from(data: &Data) -> Self {
        match data {
            Data::Int(i) => Cell::Number(*i as f64),
            Data::Float(f) => Cell::Number(*f),
            Data::String(s) | Data::DateTimeIso(s) | Data::DurationIso(s) => {
                Cell::Text(s.clone())
            }
            Data::Bool(b) => Cell::Text(b.to_string()),
            Data::DateTime(dt) => Cell::Number(dt.as_f64()),
            Data::Error(_) | Data::Empty => Cell::Empty,
        }
    }
}

/// One row of the quote block: the sheet label followed by the row's cells,
/// minus the blank legend column.
#[derive(Debug, Clone, PartialEq)]
pub struct RawRow {
    pub sheet: String,
    /// 0-indexed row inside the sheet, kept for error reporting.
    pub row: usize,
    /// `values[0]` is the sheet label.
    pub values: Vec<Cell>,
}

/// Trim whitespace and strip a pair of outer quotes if present.
pub fn clean_text(raw: &str) -> String {
    let trimmed = raw.trim();
    trimmed
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .unwrap_or(trimmed)
        .trim()
        .to_string()
}

/// Read every sheet of the workbook at `path` into raw rows.
///
/// Each sheet contributes rows `FIRST_QUOTE_ROW..=LAST_QUOTE_ROW`. A sheet that
/// stops short of `LAST_QUOTE_ROW` fails the whole read.
pub fn read_workbook(path: &Path) -> Result<Vec<RawRow>> {
    let malformed = |reason: String| IngestError::MalformedWorkbook {
        path: path.to_path_buf(),
        reason,
    };

    let mut workbook = open_workbook_auto(path).map_err(|e| malformed(e.to_string()))?;
    let sheet_names = workbook.sheet_names().to_vec();
    if sheet_names.is_empty() {
        return Err(malformed("workbook has no sheets".into()));
    }

    let mut out = Vec::with_capacity(sheet_names.len() * 21);
    for name in sheet_names {
        let range = workbook
            .worksheet_range(&name)
            .map_err(|e| malformed(format!("sheet `{}`: {}", name, e)))?;
        let rows = sheet_rows(&name, &range).map_err(malformed)?;
        debug!(sheet = %name, rows = rows.len(), "read sheet");
        out.extend(rows);
    }
    Ok(out)
}

fn sheet_rows(label: &str, range: &Range<Data>) -> std::result::Result<Vec<RawRow>, String> {
    let (last_row, last_col) = range
        .end()
        .ok_or_else(|| format!("sheet `{}` is empty", label))?;
    if last_row < LAST_QUOTE_ROW {
        return Err(format!(
            "sheet `{}` ends at row {}, expected rows {}..={}",
            label, last_row, FIRST_QUOTE_ROW, LAST_QUOTE_ROW
        ));
    }

    let rows = (FIRST_QUOTE_ROW..=LAST_QUOTE_ROW)
        .map(|r| {
            let mut values = Vec::with_capacity(last_col as usize + 1);
            values.push(Cell::Text(label.to_string()));
            // column 0 is the blank legend column
            values.extend(
                (1..=last_col).map(|c| range.get_value((r, c)).map_or(Cell::Empty, Cell::from)),
            );
            RawRow {
                sheet: label.to_string(),
                row: r as usize,
                values,
            }
        })
        .collect();
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_xlsxwriter::Workbook;
    use tempfile::tempdir;

    fn write_sheet(wb: &mut Workbook, name: &str, last_row: u32) {
        let ws = wb.add_worksheet();
        ws.set_name(name).unwrap();
        ws.write_string(0, 0, "Tipo de cambio de referencia").unwrap();
        for r in FIRST_QUOTE_ROW..=last_row.min(LAST_QUOTE_ROW) {
            ws.write_string(r, 1, "EUR").unwrap();
            ws.write_string(r, 2, "Unión Europea").unwrap();
            for c in 3..=6u16 {
                ws.write_number(r, c, f64::from(c) + 0.5).unwrap();
            }
        }
        if last_row > LAST_QUOTE_ROW {
            ws.write_string(last_row, 0, "footer").unwrap();
        }
    }

    #[test]
    fn reads_fixed_window_from_every_sheet() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("book.xlsx");
        let mut wb = Workbook::new();
        write_sheet(&mut wb, "14032024", 35);
        write_sheet(&mut wb, "15032024", 30);
        wb.save(&path).unwrap();

        let rows = read_workbook(&path).unwrap();
        assert_eq!(rows.len(), 42);

        let first = &rows[0];
        assert_eq!(first.sheet, "14032024");
        assert_eq!(first.row, 10);
        assert_eq!(first.values[0], Cell::Text("14032024".into()));
        assert_eq!(first.values[1], Cell::Text("EUR".into()));
        assert_eq!(first.values[3], Cell::Number(3.5));
        assert_eq!(first.values.len(), 7);

        assert_eq!(rows[41].sheet, "15032024");
        assert_eq!(rows[41].row, 30);
    }

    #[test]
    fn short_sheet_is_malformed() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("short.xlsx");
        let mut wb = Workbook::new();
        write_sheet(&mut wb, "15032024", 30);
        write_sheet(&mut wb, "16032024", 20);
        wb.save(&path).unwrap();

        let err = read_workbook(&path).unwrap_err();
        assert!(matches!(err, IngestError::MalformedWorkbook { .. }), "{err}");
    }

    #[test]
    fn missing_file_is_malformed() {
        let dir = tempdir().unwrap();
        let err = read_workbook(&dir.path().join("nope.xls")).unwrap_err();
        assert!(matches!(err, IngestError::MalformedWorkbook { .. }));
    }

    #[test]
    fn cell_text_and_number_forms() {
        assert_eq!(Cell::Number(15032024.0).as_text(), "15032024");
        assert_eq!(Cell::Text("  \"USD\" ".into()).as_text(), "USD");
        assert_eq!(Cell::Text("36,50".into()).as_number(), Some(36.5));
        assert_eq!(Cell::Empty.as_number(), None);
    }
}
