//! Fixture workbooks: write a small XLSX file from plain cell entries.
//!
//! Used to build documents for sessions and expectation workbooks without a
//! spreadsheet application. Formulas are written with an optional cached
//! result, since nothing here evaluates them. Error values are written as a
//! formula holding only the error constant, which is how they read back.

use std::path::Path;
use std::time::Instant;

use chrono::{Datelike, NaiveDateTime, Timelike};
use rust_xlsxwriter::{
    ExcelDateTime, Format, Formula, Note, Workbook as XlsxWorkbook, Worksheet, XlsxError,
};
use sheetcheck_engine::{CellAddress, ComputedValue};

use crate::error::FixtureError;

/// Number format for date entries that carry none.
pub const DEFAULT_DATE_FORMAT: &str = "yyyy-mm-dd hh:mm:ss";

#[derive(Debug, Clone, PartialEq)]
pub enum EntryValue {
    Text(String),
    Number(f64),
    Boolean(bool),
    Date(NaiveDateTime),
    /// Error code such as `#N/A` or `#DIV/0!`.
    Error(String),
    /// `formula` has no leading `=`.
    Formula {
        formula: String,
        result: Option<ComputedValue>,
    },
    Blank,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CellEntry {
    pub address: CellAddress,
    pub value: EntryValue,
    /// Number format code, e.g. `0.00%`.
    pub format: Option<String>,
    pub comment: Option<String>,
}

impl CellEntry {
    pub fn new(address: CellAddress, value: EntryValue) -> Self {
        Self {
            address,
            value,
            format: None,
            comment: None,
        }
    }

    pub fn text(address: CellAddress, text: impl Into<String>) -> Self {
        Self::new(address, EntryValue::Text(text.into()))
    }

    pub fn number(address: CellAddress, n: f64) -> Self {
        Self::new(address, EntryValue::Number(n))
    }

    pub fn boolean(address: CellAddress, b: bool) -> Self {
        Self::new(address, EntryValue::Boolean(b))
    }

    pub fn date(address: CellAddress, value: NaiveDateTime) -> Self {
        Self::new(address, EntryValue::Date(value))
    }

    pub fn error(address: CellAddress, code: impl Into<String>) -> Self {
        Self::new(address, EntryValue::Error(code.into()))
    }

    pub fn formula(address: CellAddress, formula: impl Into<String>, result: Option<ComputedValue>) -> Self {
        Self::new(
            address,
            EntryValue::Formula {
                formula: formula.into(),
                result,
            },
        )
    }

    pub fn blank(address: CellAddress) -> Self {
        Self::new(address, EntryValue::Blank)
    }

    pub fn with_format(mut self, code: impl Into<String>) -> Self {
        self.format = Some(code.into());
        self
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SheetEntry {
    pub name: String,
    pub cells: Vec<CellEntry>,
}

impl SheetEntry {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            cells: Vec::new(),
        }
    }

    pub fn cell(mut self, entry: CellEntry) -> Self {
        self.cells.push(entry);
        self
    }
}

/// Write `sheets` to an XLSX file at `path`, in order.
pub fn write_fixture(path: &Path, sheets: &[SheetEntry]) -> Result<(), FixtureError> {
    let start_time = Instant::now();
    let mut xlsx_workbook = XlsxWorkbook::new();
    let mut cells_written = 0;

    for sheet in sheets {
        let write_err = |e: XlsxError| FixtureError::Write {
            sheet: sheet.name.clone(),
            message: e.to_string(),
        };
        let worksheet = xlsx_workbook
            .add_worksheet()
            .set_name(&sheet.name)
            .map_err(write_err)?;

        for cell in &sheet.cells {
            write_cell(worksheet, cell).map_err(write_err)?;
            cells_written += 1;
        }
    }

    xlsx_workbook
        .save(path)
        .map_err(|e| FixtureError::Save(e.to_string()))?;

    log::debug!(
        "wrote fixture {} ({} sheet(s), {} cell(s)) in {} ms",
        path.display(),
        sheets.len(),
        cells_written,
        start_time.elapsed().as_millis()
    );
    Ok(())
}

fn write_cell(worksheet: &mut Worksheet, cell: &CellEntry) -> Result<(), XlsxError> {
    // rust_xlsxwriter uses 0-based row/col as u32/u16
    let row = u32::try_from(cell.address.row).map_err(|_| XlsxError::RowColumnLimitError)?;
    let col = u16::try_from(cell.address.col).map_err(|_| XlsxError::RowColumnLimitError)?;

    let format = match &cell.format {
        Some(code) => Format::new().set_num_format(code),
        None => Format::new(),
    };

    match &cell.value {
        EntryValue::Text(s) => {
            worksheet.write_string_with_format(row, col, s, &format)?;
        }
        EntryValue::Number(n) => {
            worksheet.write_number_with_format(row, col, *n, &format)?;
        }
        EntryValue::Boolean(b) => {
            worksheet.write_boolean_with_format(row, col, *b, &format)?;
        }
        EntryValue::Date(value) => {
            let format = match &cell.format {
                Some(_) => format,
                None => Format::new().set_num_format(DEFAULT_DATE_FORMAT),
            };
            worksheet.write_datetime_with_format(row, col, &excel_datetime(value)?, &format)?;
        }
        EntryValue::Error(code) => {
            let f = Formula::new(code.as_str()).set_result(code.as_str());
            worksheet.write_formula_with_format(row, col, f, &format)?;
        }
        EntryValue::Formula { formula, result } => {
            let mut f = Formula::new(formula.as_str());
            if let Some(result) = result {
                f = f.set_result(result_text(result));
            }
            worksheet.write_formula_with_format(row, col, f, &format)?;
        }
        EntryValue::Blank => {
            // A blank without a format is simply not written.
            if cell.format.is_some() {
                worksheet.write_blank(row, col, &format)?;
            }
        }
    }

    if let Some(comment) = &cell.comment {
        let note = Note::new(comment).add_author_prefix(false);
        worksheet.insert_note(row, col, &note)?;
    }
    Ok(())
}

fn excel_datetime(value: &NaiveDateTime) -> Result<ExcelDateTime, XlsxError> {
    let out_of_range = || XlsxError::DateTimeRangeError(value.to_string());
    let year = u16::try_from(value.year()).map_err(|_| out_of_range())?;
    let month = u8::try_from(value.month()).map_err(|_| out_of_range())?;
    let day = u8::try_from(value.day()).map_err(|_| out_of_range())?;
    let hour = u16::try_from(value.hour()).map_err(|_| out_of_range())?;
    let minute = u8::try_from(value.minute()).map_err(|_| out_of_range())?;
    let second = u8::try_from(value.second()).map_err(|_| out_of_range())?;
    let milli = u16::try_from(value.nanosecond() / 1_000_000).map_err(|_| out_of_range())?;

    ExcelDateTime::from_ymd(year, month, day)?.and_hms_milli(hour, minute, second, milli)
}

/// Cached formula result as stored in the `<v>` element.
fn result_text(value: &ComputedValue) -> String {
    match value {
        ComputedValue::Text(s) => s.clone(),
        ComputedValue::Number(n) => n.to_string(),
        ComputedValue::Boolean(b) => if *b { "TRUE" } else { "FALSE" }.to_string(),
        ComputedValue::Error(code) => code.clone(),
        ComputedValue::Blank => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(s: &str) -> CellAddress {
        CellAddress::parse(s).unwrap()
    }

    #[test]
    fn test_result_text() {
        assert_eq!(result_text(&ComputedValue::Number(2.0)), "2");
        assert_eq!(result_text(&ComputedValue::Number(0.5)), "0.5");
        assert_eq!(result_text(&ComputedValue::Boolean(false)), "FALSE");
        assert_eq!(result_text(&ComputedValue::Error("#N/A".into())), "#N/A");
        assert_eq!(result_text(&ComputedValue::Blank), "");
    }

    #[test]
    fn test_builders() {
        let sheet = SheetEntry::new("Data")
            .cell(CellEntry::number(addr("A1"), 0.25).with_format("0%"))
            .cell(CellEntry::blank(addr("B2")).with_comment("empty"));
        assert_eq!(sheet.cells.len(), 2);
        assert_eq!(sheet.cells[0].format.as_deref(), Some("0%"));
        assert_eq!(sheet.cells[1].value, EntryValue::Blank);
        assert_eq!(sheet.cells[1].comment.as_deref(), Some("empty"));
    }

    #[test]
    fn test_excel_datetime() {
        let value = chrono::NaiveDate::from_ymd_opt(2024, 1, 31)
            .unwrap()
            .and_hms_milli_opt(12, 0, 0, 250)
            .unwrap();
        let serial = excel_datetime(&value).unwrap().to_excel();
        assert!((serial - 45322.500_002_893).abs() < 1e-6, "{serial}");

        let ancient = chrono::NaiveDate::from_ymd_opt(1800, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        assert!(excel_datetime(&ancient).is_err());
    }

    #[test]
    fn test_invalid_sheet_name() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.xlsx");
        let sheets = [SheetEntry::new("bad[name]")];
        match write_fixture(&path, &sheets) {
            Err(FixtureError::Write { sheet, .. }) => assert_eq!(sheet, "bad[name]"),
            other => panic!("expected write error, got {other:?}"),
        }
    }
}
