use crate::address::CellAddress;
use crate::cell::NumberFormat;
use crate::document::{CellSnapshot, DisplayFormat, Document};
use crate::format::looks_like_date_format;
use crate::sheet::{is_valid_sheet_name, normalize_sheet_name, Sheet};

/// In-memory document: an ordered list of sheets.
#[derive(Debug, Clone)]
pub struct Workbook {
    sheets: Vec<Sheet>,
}

impl Default for Workbook {
    fn default() -> Self {
        Self::new()
    }
}

impl Workbook {
    /// Create a new workbook with one default sheet
    pub fn new() -> Self {
        Self {
            sheets: vec![Sheet::new("Sheet1")],
        }
    }

    /// A workbook with no sheets at all.
    pub fn empty() -> Self {
        Self { sheets: Vec::new() }
    }

    pub fn from_sheets(sheets: Vec<Sheet>) -> Self {
        Self { sheets }
    }

    /// Get the number of sheets
    pub fn sheet_count(&self) -> usize {
        self.sheets.len()
    }

    /// Get a reference to a sheet by index
    pub fn sheet(&self, index: usize) -> Option<&Sheet> {
        self.sheets.get(index)
    }

    /// Get a mutable reference to a sheet by index
    pub fn sheet_mut(&mut self, index: usize) -> Option<&mut Sheet> {
        self.sheets.get_mut(index)
    }

    pub fn sheets(&self) -> &[Sheet] {
        &self.sheets
    }

    /// Get all sheet names
    pub fn sheet_names(&self) -> Vec<&str> {
        self.sheets.iter().map(|s| s.name.as_str()).collect()
    }

    /// Add a new sheet with a specific name
    /// Returns None if name is invalid or already exists
    pub fn add_sheet_named(&mut self, name: &str) -> Option<usize> {
        if !is_valid_sheet_name(name) || self.sheet_name_exists(name) {
            return None;
        }
        self.sheets.push(Sheet::new(name));
        Some(self.sheets.len() - 1)
    }

    /// Check if a sheet name already exists (case-insensitive)
    pub fn sheet_name_exists(&self, name: &str) -> bool {
        self.sheet_index_by_name(name).is_some()
    }

    pub fn sheet_index_by_name(&self, name: &str) -> Option<usize> {
        let key = normalize_sheet_name(name);
        self.sheets.iter().position(|s| s.name_key() == key)
    }
}

impl Document for Workbook {
    fn sheet_count(&self) -> usize {
        self.sheets.len()
    }

    fn sheet_name(&self, index: usize) -> Option<&str> {
        self.sheets.get(index).map(|s| s.name.as_str())
    }

    fn sheet_index(&self, name: &str) -> Option<usize> {
        self.sheet_index_by_name(name)
    }

    fn cell(&self, sheet: usize, address: CellAddress) -> Option<CellSnapshot<'_>> {
        let cell = self.sheets.get(sheet)?.get_cell(address)?;
        let format = cell.format.clone().unwrap_or_else(NumberFormat::general);
        let is_date = looks_like_date_format(format.builtin_id, &format.code);
        log::debug!("snapshot sheet #{sheet} {address}: {:?}", cell.value.kind());

        let mut snapshot = CellSnapshot::new(cell.value.content()).with_format(DisplayFormat {
            code: format.code,
            is_date,
        });
        snapshot.comment = cell.comment.clone();
        Some(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::CellValue;
    use crate::document::{CellContent, CellKind, ComputedValue};

    fn addr(s: &str) -> CellAddress {
        CellAddress::parse(s).unwrap()
    }

    #[test]
    fn test_new_workbook() {
        let wb = Workbook::new();
        assert_eq!(wb.sheet_count(), 1);
        assert_eq!(wb.sheet(0).unwrap().name, "Sheet1");
        assert_eq!(Workbook::empty().sheet_count(), 0);
    }

    #[test]
    fn test_add_sheet_named() {
        let mut wb = Workbook::new();
        assert_eq!(wb.add_sheet_named("Data"), Some(1));
        assert_eq!(wb.add_sheet_named("data"), None);
        assert_eq!(wb.add_sheet_named("bad:name"), None);
        assert_eq!(wb.sheet_names(), vec!["Sheet1", "Data"]);
    }

    #[test]
    fn test_lookup_by_name_is_case_insensitive() {
        let mut wb = Workbook::new();
        wb.add_sheet_named("Summary");
        assert_eq!(wb.sheet_index("SUMMARY"), Some(1));
        assert_eq!(wb.sheet_index("missing"), None);
        assert_eq!(Document::sheet_name(&wb, 1), Some("Summary"));
    }

    #[test]
    fn test_snapshot_defaults_to_general() {
        let mut wb = Workbook::new();
        wb.sheet_mut(0).unwrap().set_value(addr("A1"), "2");

        let snap = wb.cell(0, addr("A1")).unwrap();
        assert_eq!(snap.content.kind(), CellKind::Numeric);
        let format = snap.format.unwrap();
        assert_eq!(format.code, "General");
        assert!(!format.is_date);
        assert!(snap.comment.is_none());

        assert!(wb.cell(0, addr("A2")).is_none());
        assert!(wb.cell(5, addr("A1")).is_none());
    }

    #[test]
    fn test_snapshot_date_format_and_comment() {
        let mut wb = Workbook::new();
        let sheet = wb.sheet_mut(0).unwrap();
        sheet.set_value(addr("B1"), "45000");
        sheet.set_format(addr("B1"), NumberFormat::builtin(14, "m/d/yy"));
        sheet.set_comment(addr("B1"), "due date");

        let snap = wb.cell(0, addr("B1")).unwrap();
        assert!(snap.format.as_ref().unwrap().is_date);
        assert_eq!(snap.comment.as_deref(), Some("due date"));
    }

    #[test]
    fn test_snapshot_formula_thunk() {
        let mut wb = Workbook::new();
        wb.sheet_mut(0).unwrap().set_cell_value(
            addr("C1"),
            CellValue::formula("A1*2", ComputedValue::Number(4.0)),
        );
        let snap = wb.cell(0, addr("C1")).unwrap();
        match &snap.content {
            CellContent::Formula(f) => {
                assert_eq!(f.text(), "A1*2");
                assert_eq!(f.evaluate(), ComputedValue::Number(4.0));
            }
            other => panic!("expected formula, got {other:?}"),
        }
    }
}
