//! The document collaborator: what the evaluation engine needs to see of a
//! spreadsheet, and nothing more.
//!
//! A [`CellSnapshot`] is produced per lookup. Formula cells carry a thunk so
//! the computed value is only produced when a check actually needs it.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::address::CellAddress;
use crate::error::DocumentError;

/// Runtime type of a cell or computed value, as reported in failure messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CellKind {
    String,
    Numeric,
    Boolean,
    Formula,
    Error,
    Blank,
}

impl fmt::Display for CellKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::String => "STRING",
            Self::Numeric => "NUMERIC",
            Self::Boolean => "BOOLEAN",
            Self::Formula => "FORMULA",
            Self::Error => "ERROR",
            Self::Blank => "BLANK",
        })
    }
}

/// Result of evaluating a formula.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ComputedValue {
    Text(String),
    Number(f64),
    Boolean(bool),
    /// Error code as displayed, e.g. `#DIV/0!`.
    Error(String),
    Blank,
}

impl ComputedValue {
    pub fn kind(&self) -> CellKind {
        match self {
            Self::Text(_) => CellKind::String,
            Self::Number(_) => CellKind::Numeric,
            Self::Boolean(_) => CellKind::Boolean,
            Self::Error(_) => CellKind::Error,
            Self::Blank => CellKind::Blank,
        }
    }
}

/// A formula cell: its source text and a deferred evaluation.
pub struct FormulaCell<'a> {
    text: String,
    evaluate: Box<dyn Fn() -> ComputedValue + 'a>,
}

impl<'a> FormulaCell<'a> {
    /// `text` is the formula without its leading `=`.
    pub fn new(text: impl Into<String>, evaluate: impl Fn() -> ComputedValue + 'a) -> Self {
        Self {
            text: text.into(),
            evaluate: Box::new(evaluate),
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Ask the document to compute this formula's value.
    pub fn evaluate(&self) -> ComputedValue {
        (self.evaluate)()
    }
}

impl fmt::Debug for FormulaCell<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FormulaCell")
            .field("text", &self.text)
            .finish_non_exhaustive()
    }
}

#[derive(Debug)]
pub enum CellContent<'a> {
    Text(String),
    Number(f64),
    Boolean(bool),
    Error(String),
    Blank,
    Formula(FormulaCell<'a>),
}

impl CellContent<'_> {
    pub fn kind(&self) -> CellKind {
        match self {
            Self::Text(_) => CellKind::String,
            Self::Number(_) => CellKind::Numeric,
            Self::Boolean(_) => CellKind::Boolean,
            Self::Error(_) => CellKind::Error,
            Self::Blank => CellKind::Blank,
            Self::Formula(_) => CellKind::Formula,
        }
    }
}

/// Display format of a cell: the format code plus the document's own
/// judgement of whether it formats dates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayFormat {
    pub code: String,
    pub is_date: bool,
}

/// Everything the engine may inspect about one existing cell.
#[derive(Debug)]
pub struct CellSnapshot<'a> {
    pub content: CellContent<'a>,
    pub format: Option<DisplayFormat>,
    pub comment: Option<String>,
}

impl<'a> CellSnapshot<'a> {
    pub fn new(content: CellContent<'a>) -> Self {
        Self {
            content,
            format: None,
            comment: None,
        }
    }

    pub fn with_format(mut self, format: DisplayFormat) -> Self {
        self.format = Some(format);
        self
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }
}

/// A readable spreadsheet.
///
/// `cell` returns `None` when nothing exists at the address; the engine
/// treats that as an absent cell.
pub trait Document {
    fn sheet_count(&self) -> usize;

    fn sheet_name(&self, index: usize) -> Option<&str>;

    fn sheet_index(&self, name: &str) -> Option<usize>;

    fn cell(&self, sheet: usize, address: CellAddress) -> Option<CellSnapshot<'_>>;

    /// Release underlying resources. Called exactly once by the session.
    fn close(&mut self) -> Result<(), DocumentError> {
        Ok(())
    }
}

impl<D: Document + ?Sized> Document for Box<D> {
    fn sheet_count(&self) -> usize {
        (**self).sheet_count()
    }

    fn sheet_name(&self, index: usize) -> Option<&str> {
        (**self).sheet_name(index)
    }

    fn sheet_index(&self, name: &str) -> Option<usize> {
        (**self).sheet_index(name)
    }

    fn cell(&self, sheet: usize, address: CellAddress) -> Option<CellSnapshot<'_>> {
        (**self).cell(sheet, address)
    }

    fn close(&mut self) -> Result<(), DocumentError> {
        (**self).close()
    }
}
