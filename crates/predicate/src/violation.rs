use std::fmt;

/// A failed predicate application.
///
/// `expected` is the predicate's own description (its `Display` output), so
/// the same text serves as a failure message and as a context label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    expected: String,
    actual: String,
}

impl Violation {
    pub fn new(expected: impl Into<String>, actual: impl Into<String>) -> Self {
        Self {
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    pub fn expected(&self) -> &str {
        &self.expected
    }

    pub fn actual(&self) -> &str {
        &self.actual
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "expected [{}] but was {}", self.expected, self.actual)
    }
}

impl std::error::Error for Violation {}

/// Render a float the way predicate descriptions and the wire format do:
/// integral values keep a trailing `.0` (`2.0`, not `2`).
pub(crate) fn render_number(value: f64) -> String {
    format!("{value:?}")
}

/// Render an optional text operand for failure messages.
pub(crate) fn render_text(value: Option<&str>) -> String {
    match value {
        Some(s) => format!("{s:?}"),
        None => "null".to_string(),
    }
}
