use std::fmt;

use sheetcheck_engine::predicate::{CodecError, PredicateError};
use sheetcheck_engine::{AddressError, DocumentError};

/// Fixture workbook could not be written.
#[derive(Debug)]
pub enum FixtureError {
    /// Bad sheet name, bad format code, or a cell outside the grid.
    Write { sheet: String, message: String },
    /// Saving the workbook failed.
    Save(String),
}

impl fmt::Display for FixtureError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Write { sheet, message } => write!(f, "sheet '{sheet}': {message}"),
            Self::Save(msg) => write!(f, "failed to save fixture: {msg}"),
        }
    }
}

impl std::error::Error for FixtureError {}

/// Expectations workbook could not be turned into contracts.
#[derive(Debug)]
pub enum ExpectationsError {
    Document(DocumentError),
    /// A `matching` tag on text that is not a valid pattern.
    Pattern {
        sheet: String,
        address: String,
        error: PredicateError,
    },
}

impl fmt::Display for ExpectationsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Document(err) => write!(f, "{err}"),
            Self::Pattern {
                sheet,
                address,
                error,
            } => write!(f, "{sheet}!{address}: {error}"),
        }
    }
}

impl std::error::Error for ExpectationsError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Document(err) => Some(err),
            Self::Pattern { error, .. } => Some(error),
        }
    }
}

impl From<DocumentError> for ExpectationsError {
    fn from(err: DocumentError) -> Self {
        Self::Document(err)
    }
}

/// Contract file that failed to parse or validate.
#[derive(Debug)]
pub enum ContractFileError {
    /// TOML or JSON syntax / shape error.
    Parse(String),
    /// Sheet entry with neither or both of `name` and `index`.
    SheetSelector { sheet: usize },
    /// Cell entry with more than one value check.
    ValueChecks {
        sheet: usize,
        at: String,
        checks: Vec<&'static str>,
    },
    /// `empty = false` is not a check.
    EmptyFlag { sheet: usize, at: String },
    Address { sheet: usize, error: AddressError },
    /// A predicate field was not valid wire format.
    Predicate {
        sheet: usize,
        at: String,
        field: &'static str,
        error: CodecError,
    },
    /// Unknown `category` name.
    Category { sheet: usize, at: String, name: String },
    Io(String),
}

impl fmt::Display for ContractFileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Parse(msg) => write!(f, "contract file parse error: {msg}"),
            Self::SheetSelector { sheet } => {
                write!(f, "sheet #{sheet}: exactly one of 'name' or 'index' is required")
            }
            Self::ValueChecks { sheet, at, checks } => {
                write!(f, "sheet #{sheet}, cell {at}: at most one value check allowed, found {checks:?}")
            }
            Self::EmptyFlag { sheet, at } => {
                write!(f, "sheet #{sheet}, cell {at}: 'empty' can only be true")
            }
            Self::Address { sheet, error } => write!(f, "sheet #{sheet}: {error}"),
            Self::Predicate {
                sheet,
                at,
                field,
                error,
            } => write!(f, "sheet #{sheet}, cell {at}, '{field}': {error}"),
            Self::Category { sheet, at, name } => {
                write!(f, "sheet #{sheet}, cell {at}: unknown format category '{name}'")
            }
            Self::Io(msg) => write!(f, "IO error: {msg}"),
        }
    }
}

impl std::error::Error for ContractFileError {}
