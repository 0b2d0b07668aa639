//! Cell contracts: every check that applies to one cell address.

use std::fmt;

use sheetcheck_predicate::{NumberPredicate, TextPredicate};

use crate::address::CellAddress;
use crate::datetime::DateTimeCheck;
use crate::error::AddressError;
use crate::format::FormatCategory;

// ============================================================================
// Value checks
// ============================================================================

/// What a contract asserts about the cell's value. At most one per contract.
#[derive(Debug, Clone, PartialEq)]
pub enum ValueCheck {
    /// NUMERIC cells.
    Number(NumberPredicate),
    /// STRING cells.
    Text(TextPredicate),
    /// BOOLEAN cells, compared for equality.
    Boolean(bool),
    /// FORMULA cells; the predicate sees the formula source without `=`.
    FormulaText(TextPredicate),
    /// ERROR cells; the predicate sees the error code, e.g. `#DIV/0!`.
    ErrorText(TextPredicate),
    /// NUMERIC cells read as date/time serials.
    DateTime(DateTimeCheck),
    /// Absent, BLANK, or whitespace-only STRING.
    Empty,
    /// No value check; only side checks run.
    Exists,
}

impl ValueCheck {
    /// Label used in failure messages.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Number(_) => "number",
            Self::Text(_) => "text",
            Self::Boolean(_) => "boolean",
            Self::FormulaText(_) => "formula text",
            Self::ErrorText(_) => "error text",
            Self::DateTime(_) => "datetime",
            Self::Empty => "empty cell",
            Self::Exists => "exists",
        }
    }
}

impl fmt::Display for ValueCheck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(p) => write!(f, "number {p}"),
            Self::Text(p) => write!(f, "text to {p}"),
            Self::Boolean(b) => write!(f, "boolean == {b}"),
            Self::FormulaText(p) => write!(f, "formula text to {p}"),
            Self::ErrorText(p) => write!(f, "error text to {p}"),
            Self::DateTime(c) => write!(f, "datetime {c}"),
            Self::Empty => write!(f, "is EMPTY"),
            Self::Exists => write!(f, "exists"),
        }
    }
}

// ============================================================================
// Contract
// ============================================================================

/// Checks for one cell.
///
/// Built by value:
///
/// ```ignore
/// let contract = CellContract::at("B2")?
///     .number(NumberPredicate::EqualTo(42.0))
///     .with_format_text("0.00")
///     .with_format_category(FormatCategory::Other);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct CellContract {
    address: CellAddress,
    value: ValueCheck,
    format: Option<TextPredicate>,
    category: Option<FormatCategory>,
    comment: Option<TextPredicate>,
}

impl CellContract {
    pub fn new(address: CellAddress, value: ValueCheck) -> Self {
        Self {
            address,
            value,
            format: None,
            category: None,
            comment: None,
        }
    }

    /// Contract at an A1 address, with no value check yet.
    pub fn at(address: &str) -> Result<Self, AddressError> {
        Ok(Self::new(CellAddress::parse(address)?, ValueCheck::Exists))
    }

    pub fn address(&self) -> CellAddress {
        self.address
    }

    pub fn value_check(&self) -> &ValueCheck {
        &self.value
    }

    pub fn format(&self) -> Option<&TextPredicate> {
        self.format.as_ref()
    }

    pub fn format_category(&self) -> Option<FormatCategory> {
        self.category
    }

    pub fn comment(&self) -> Option<&TextPredicate> {
        self.comment.as_ref()
    }

    /// Replace the value check.
    pub fn with_value(mut self, value: ValueCheck) -> Self {
        self.value = value;
        self
    }

    pub fn number(self, predicate: NumberPredicate) -> Self {
        self.with_value(ValueCheck::Number(predicate))
    }

    pub fn text(self, predicate: TextPredicate) -> Self {
        self.with_value(ValueCheck::Text(predicate))
    }

    pub fn boolean(self, expected: bool) -> Self {
        self.with_value(ValueCheck::Boolean(expected))
    }

    pub fn formula_text(self, predicate: TextPredicate) -> Self {
        self.with_value(ValueCheck::FormulaText(predicate))
    }

    pub fn error_text(self, predicate: TextPredicate) -> Self {
        self.with_value(ValueCheck::ErrorText(predicate))
    }

    pub fn date_time(self, check: DateTimeCheck) -> Self {
        self.with_value(ValueCheck::DateTime(check))
    }

    pub fn empty(self) -> Self {
        self.with_value(ValueCheck::Empty)
    }

    pub fn exists(self) -> Self {
        self.with_value(ValueCheck::Exists)
    }

    /// Check the cell's display-format code.
    pub fn with_format(mut self, predicate: TextPredicate) -> Self {
        self.format = Some(predicate);
        self
    }

    /// Case-sensitive equality on the display-format code.
    pub fn with_format_text(self, code: &str) -> Self {
        self.with_format(TextPredicate::equal_to(code))
    }

    pub fn with_format_category(mut self, category: FormatCategory) -> Self {
        self.category = Some(category);
        self
    }

    pub fn with_comment(mut self, predicate: TextPredicate) -> Self {
        self.comment = Some(predicate);
        self
    }

    /// Case-sensitive equality on the comment text.
    pub fn with_comment_text(self, text: &str) -> Self {
        self.with_comment(TextPredicate::equal_to(text))
    }
}

impl fmt::Display for CellContract {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.address, self.value)?;
        if let Some(p) = &self.format {
            write!(f, "; format to {p}")?;
        }
        if let Some(c) = self.category {
            write!(f, "; format category {c}")?;
        }
        if let Some(p) = &self.comment {
            write!(f, "; comment to {p}")?;
        }
        Ok(())
    }
}
