//! File I/O: XLSX documents, fixture workbooks, expectation workbooks and
//! contract files.

pub mod contract_file;
pub mod error;
pub mod expectations;
pub mod fixture;
pub mod xlsx;
pub mod xlsx_comments;
pub mod xlsx_styles;

pub use contract_file::{ContractFile, ContractFileSpec};
pub use error::{ContractFileError, ExpectationsError, FixtureError};
pub use expectations::{apply_expectations, expectations_from_workbook, read_expectations};
pub use fixture::{write_fixture, CellEntry, EntryValue, SheetEntry, DEFAULT_DATE_FORMAT};

use sheetcheck_engine::{CellContract, Document, Session, SheetRef};

/// Contracts to register against one sheet.
#[derive(Debug, Clone, PartialEq)]
pub struct SheetContracts {
    pub sheet: SheetRef,
    pub contracts: Vec<CellContract>,
}

impl SheetContracts {
    /// Select the sheet and register every contract. Returns the number of
    /// contracts handed to the session.
    pub fn register<D: Document>(&self, session: &mut Session<D>) -> usize {
        session
            .select_sheet(self.sheet.clone())
            .register_all(self.contracts.iter().cloned());
        self.contracts.len()
    }
}
