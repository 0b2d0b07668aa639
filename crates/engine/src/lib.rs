//! Cell contracts and their evaluation against spreadsheet documents.
//!
//! A [`CellContract`] bundles the checks for one cell. A [`Session`] walks
//! the sheets of a [`Document`], evaluates each registered contract
//! immediately and defers every failure to one report at close.

pub mod address;
pub mod cell;
pub mod contract;
pub mod datetime;
pub mod document;
pub mod error;
pub mod evaluate;
pub mod failure;
pub mod format;
pub mod session;
pub mod sheet;
pub mod workbook;

pub use address::CellAddress;
pub use cell::{Cell, CellValue, NumberFormat};
pub use contract::{CellContract, ValueCheck};
pub use datetime::DateTimeCheck;
pub use document::{
    CellContent, CellKind, CellSnapshot, ComputedValue, DisplayFormat, Document, FormulaCell,
};
pub use error::{AddressError, DocumentError, SessionError};
pub use evaluate::evaluate;
pub use failure::{AggregateFailure, Failure, FailureLog};
pub use format::FormatCategory;
pub use session::{AuditRecord, Session, SheetRef};
pub use sheet::Sheet;
pub use workbook::Workbook;

pub use sheetcheck_predicate as predicate;
