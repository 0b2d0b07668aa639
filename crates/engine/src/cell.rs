use serde::{Deserialize, Serialize};

use crate::document::{CellContent, CellKind, ComputedValue, FormulaCell};

/// Error literals recognised by [`CellValue::from_input`].
pub const ERROR_CODES: [&str; 10] = [
    "#NULL!",
    "#DIV/0!",
    "#VALUE!",
    "#REF!",
    "#NAME?",
    "#NUM!",
    "#N/A",
    "#GETTING_DATA",
    "#SPILL!",
    "#CALC!",
];

/// Number format attached to a cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NumberFormat {
    pub code: String,
    /// Built-in format id, when the format came from the built-in table.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub builtin_id: Option<u16>,
}

impl NumberFormat {
    pub fn new(code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            builtin_id: None,
        }
    }

    pub fn builtin(id: u16, code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            builtin_id: Some(id),
        }
    }

    pub fn general() -> Self {
        Self::builtin(0, "General")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub enum CellValue {
    #[default]
    Empty,
    Text(String),
    Number(f64),
    Boolean(bool),
    /// Error code as displayed, e.g. `#N/A`.
    Error(String),
    /// `source` has no leading `=`. `cached` is the last computed result
    /// supplied by whatever evaluated the workbook.
    Formula {
        source: String,
        cached: Option<ComputedValue>,
    },
}

impl CellValue {
    /// Interpret user-style input the way a spreadsheet entry line would.
    pub fn from_input(input: &str) -> Self {
        let trimmed = input.trim();

        if trimmed.is_empty() {
            return CellValue::Empty;
        }

        if let Some(source) = trimmed.strip_prefix('=') {
            return CellValue::Formula {
                source: source.to_string(),
                cached: None,
            };
        }

        if trimmed.eq_ignore_ascii_case("true") {
            return CellValue::Boolean(true);
        }
        if trimmed.eq_ignore_ascii_case("false") {
            return CellValue::Boolean(false);
        }

        let upper = trimmed.to_ascii_uppercase();
        if let Some(code) = ERROR_CODES.iter().find(|code| **code == upper) {
            return CellValue::Error(code.to_string());
        }

        if let Ok(num) = trimmed.parse::<f64>() {
            if num.is_finite() {
                return CellValue::Number(num);
            }
        }

        CellValue::Text(trimmed.to_string())
    }

    pub fn formula(source: impl Into<String>, cached: ComputedValue) -> Self {
        CellValue::Formula {
            source: source.into(),
            cached: Some(cached),
        }
    }

    pub fn kind(&self) -> CellKind {
        match self {
            CellValue::Empty => CellKind::Blank,
            CellValue::Text(_) => CellKind::String,
            CellValue::Number(_) => CellKind::Numeric,
            CellValue::Boolean(_) => CellKind::Boolean,
            CellValue::Error(_) => CellKind::Error,
            CellValue::Formula { .. } => CellKind::Formula,
        }
    }

    /// Snapshot content. Formula evaluation hands out the cached result, or
    /// BLANK when nothing was cached.
    pub(crate) fn content(&self) -> CellContent<'_> {
        match self {
            CellValue::Empty => CellContent::Blank,
            CellValue::Text(s) => CellContent::Text(s.clone()),
            CellValue::Number(n) => CellContent::Number(*n),
            CellValue::Boolean(b) => CellContent::Boolean(*b),
            CellValue::Error(code) => CellContent::Error(code.clone()),
            CellValue::Formula { source, cached } => {
                CellContent::Formula(FormulaCell::new(source.clone(), move || {
                    cached.clone().unwrap_or(ComputedValue::Blank)
                }))
            }
        }
    }
}

impl From<ComputedValue> for CellValue {
    fn from(value: ComputedValue) -> Self {
        match value {
            ComputedValue::Text(s) => CellValue::Text(s),
            ComputedValue::Number(n) => CellValue::Number(n),
            ComputedValue::Boolean(b) => CellValue::Boolean(b),
            ComputedValue::Error(code) => CellValue::Error(code),
            ComputedValue::Blank => CellValue::Empty,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Cell {
    pub value: CellValue,
    /// `None` means the default style ("General").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<NumberFormat>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

impl Cell {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, input: &str) {
        self.value = CellValue::from_input(input);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_input() {
        assert_eq!(CellValue::from_input(""), CellValue::Empty);
        assert_eq!(CellValue::from_input("   "), CellValue::Empty);
        assert_eq!(CellValue::from_input("42"), CellValue::Number(42.0));
        assert_eq!(CellValue::from_input("-1.5e2"), CellValue::Number(-150.0));
        assert_eq!(CellValue::from_input("TRUE"), CellValue::Boolean(true));
        assert_eq!(CellValue::from_input("false"), CellValue::Boolean(false));
        assert_eq!(
            CellValue::from_input("#div/0!"),
            CellValue::Error("#DIV/0!".into())
        );
        assert_eq!(
            CellValue::from_input("=SUM(A1:A3)"),
            CellValue::Formula {
                source: "SUM(A1:A3)".into(),
                cached: None
            }
        );
        assert_eq!(CellValue::from_input("hello"), CellValue::Text("hello".into()));
        // Non-finite spellings stay text.
        assert_eq!(CellValue::from_input("inf"), CellValue::Text("inf".into()));
        assert_eq!(CellValue::from_input("NaN"), CellValue::Text("NaN".into()));
    }

    #[test]
    fn test_kind() {
        assert_eq!(CellValue::Empty.kind(), CellKind::Blank);
        assert_eq!(CellValue::from_input("=1+1").kind(), CellKind::Formula);
        assert_eq!(CellValue::from_input("#N/A").kind(), CellKind::Error);
    }

    #[test]
    fn test_formula_content_uses_cache() {
        let value = CellValue::formula("1/0", ComputedValue::Error("#DIV/0!".into()));
        match value.content() {
            CellContent::Formula(f) => {
                assert_eq!(f.text(), "1/0");
                assert_eq!(f.evaluate(), ComputedValue::Error("#DIV/0!".into()));
            }
            other => panic!("expected formula, got {other:?}"),
        }

        match CellValue::from_input("=NOW()").content() {
            CellContent::Formula(f) => assert_eq!(f.evaluate(), ComputedValue::Blank),
            other => panic!("expected formula, got {other:?}"),
        }
    }
}
