//! Text predicates: exact equality, substring, and full-match pattern.

use std::fmt;

use once_cell::sync::OnceCell;
use regex::{Regex, RegexBuilder};

use crate::error::PredicateError;
use crate::violation::{render_text, Violation};

// ============================================================================
// Variants
// ============================================================================

/// Equality against an expected string, or against "no text" when
/// `expected` is `None`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EqualsText {
    expected: Option<String>,
    ignore_case: bool,
    ignore_newlines: bool,
}

impl EqualsText {
    pub fn new(expected: impl Into<String>) -> Self {
        Self::optional(Some(expected.into()))
    }

    /// Expect no text at all. Such a predicate can be applied but not encoded.
    pub fn absent() -> Self {
        Self::optional(None)
    }

    pub fn optional(expected: Option<String>) -> Self {
        Self {
            expected,
            ignore_case: false,
            ignore_newlines: false,
        }
    }

    pub fn ignore_case(mut self) -> Self {
        self.ignore_case = true;
        self
    }

    pub fn case_sensitive(mut self) -> Self {
        self.ignore_case = false;
        self
    }

    /// Collapse line breaks and surrounding whitespace runs to a single
    /// space, and trim both ends, before comparing.
    pub fn ignore_newlines(mut self) -> Self {
        self.ignore_newlines = true;
        self
    }

    pub fn respect_newlines(mut self) -> Self {
        self.ignore_newlines = false;
        self
    }

    pub fn expected(&self) -> Option<&str> {
        self.expected.as_deref()
    }

    pub fn is_ignore_case(&self) -> bool {
        self.ignore_case
    }

    pub fn is_ignore_newlines(&self) -> bool {
        self.ignore_newlines
    }

    fn test(&self, actual: Option<&str>) -> bool {
        match (self.expected.as_deref(), actual) {
            (None, None) => true,
            (Some(expected), Some(actual)) => {
                if self.ignore_newlines {
                    self.fold(&collapse_whitespace(expected))
                        == self.fold(&collapse_whitespace(actual))
                } else {
                    self.fold(expected) == self.fold(actual)
                }
            }
            _ => false,
        }
    }

    fn fold(&self, s: &str) -> String {
        if self.ignore_case {
            s.to_lowercase()
        } else {
            s.to_string()
        }
    }
}

/// Substring containment. Absent text never contains anything.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainsText {
    needle: String,
    ignore_case: bool,
}

impl ContainsText {
    pub fn new(needle: impl Into<String>) -> Self {
        Self {
            needle: needle.into(),
            ignore_case: false,
        }
    }

    pub fn ignore_case(mut self) -> Self {
        self.ignore_case = true;
        self
    }

    pub fn case_sensitive(mut self) -> Self {
        self.ignore_case = false;
        self
    }

    pub fn needle(&self) -> &str {
        &self.needle
    }

    pub fn is_ignore_case(&self) -> bool {
        self.ignore_case
    }

    fn test(&self, actual: Option<&str>) -> bool {
        let Some(actual) = actual else {
            return false;
        };
        if self.ignore_case {
            actual.to_lowercase().contains(&self.needle.to_lowercase())
        } else {
            actual.contains(&self.needle)
        }
    }
}

/// The whole actual text must match the pattern, not just a substring.
///
/// The pattern is validated when the predicate is built. The regex for the
/// final flags is compiled on first use and kept.
#[derive(Debug, Clone)]
pub struct MatchesPattern {
    pattern: String,
    ignore_case: bool,
    dot_all: bool,
    compiled: OnceCell<Regex>,
}

impl MatchesPattern {
    pub fn new(pattern: impl Into<String>) -> Result<Self, PredicateError> {
        let pattern = pattern.into();
        let regex = compile(&pattern, false, false)?;
        Ok(Self {
            pattern,
            ignore_case: false,
            dot_all: false,
            compiled: OnceCell::with_value(regex),
        })
    }

    pub fn ignore_case(mut self) -> Self {
        self.set_flags(true, self.dot_all);
        self
    }

    pub fn case_sensitive(mut self) -> Self {
        self.set_flags(false, self.dot_all);
        self
    }

    /// Let `.` match line terminators.
    pub fn dot_all(mut self) -> Self {
        self.set_flags(self.ignore_case, true);
        self
    }

    fn set_flags(&mut self, ignore_case: bool, dot_all: bool) {
        if (ignore_case, dot_all) != (self.ignore_case, self.dot_all) {
            self.ignore_case = ignore_case;
            self.dot_all = dot_all;
            self.compiled = OnceCell::new();
        }
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn is_ignore_case(&self) -> bool {
        self.ignore_case
    }

    pub fn is_dot_all(&self) -> bool {
        self.dot_all
    }

    fn test(&self, actual: Option<&str>) -> Result<bool, PredicateError> {
        let Some(actual) = actual else {
            return Ok(false);
        };
        let regex = self
            .compiled
            .get_or_try_init(|| compile(&self.pattern, self.ignore_case, self.dot_all))?;
        Ok(regex.is_match(actual))
    }
}

impl PartialEq for MatchesPattern {
    fn eq(&self, other: &Self) -> bool {
        self.pattern == other.pattern
            && self.ignore_case == other.ignore_case
            && self.dot_all == other.dot_all
    }
}

impl Eq for MatchesPattern {}

fn compile(pattern: &str, ignore_case: bool, dot_all: bool) -> Result<Regex, PredicateError> {
    RegexBuilder::new(&format!(r"\A(?:{pattern})\z"))
        .case_insensitive(ignore_case)
        .dot_matches_new_line(dot_all)
        .build()
        .map_err(|e| PredicateError::InvalidPattern {
            pattern: pattern.to_string(),
            message: e.to_string(),
        })
}

/// Line terminators plus ASCII whitespace.
fn is_collapsible(c: char) -> bool {
    matches!(
        c,
        ' ' | '\t' | '\n' | '\x0B' | '\x0C' | '\r' | '\u{85}' | '\u{2028}' | '\u{2029}'
    )
}

fn collapse_whitespace(s: &str) -> String {
    s.split(is_collapsible)
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

// ============================================================================
// Predicate
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TextPredicate {
    EqualsText(EqualsText),
    ContainsText(ContainsText),
    MatchesPattern(MatchesPattern),
}

impl TextPredicate {
    pub fn equal_to(expected: impl Into<String>) -> Self {
        Self::EqualsText(EqualsText::new(expected))
    }

    pub fn containing(needle: impl Into<String>) -> Self {
        Self::ContainsText(ContainsText::new(needle))
    }

    pub fn matching(pattern: impl Into<String>) -> Result<Self, PredicateError> {
        MatchesPattern::new(pattern).map(Self::MatchesPattern)
    }

    /// Applies to every variant.
    pub fn ignore_case(self) -> Self {
        match self {
            Self::EqualsText(p) => Self::EqualsText(p.ignore_case()),
            Self::ContainsText(p) => Self::ContainsText(p.ignore_case()),
            Self::MatchesPattern(p) => Self::MatchesPattern(p.ignore_case()),
        }
    }

    pub fn is_ignore_case(&self) -> bool {
        match self {
            Self::EqualsText(p) => p.ignore_case,
            Self::ContainsText(p) => p.ignore_case,
            Self::MatchesPattern(p) => p.ignore_case,
        }
    }

    pub fn test(&self, actual: Option<&str>) -> bool {
        match self {
            Self::EqualsText(p) => p.test(actual),
            Self::ContainsText(p) => p.test(actual),
            Self::MatchesPattern(p) => p.test(actual).unwrap_or(false),
        }
    }

    /// Apply to `actual`, where `None` means the cell carried no text.
    pub fn apply(&self, actual: Option<&str>) -> Result<(), Violation> {
        let passed = match self {
            Self::MatchesPattern(p) => p
                .test(actual)
                .map_err(|e| Violation::new(self.to_string(), e.to_string()))?,
            other => other.test(actual),
        };
        if passed {
            Ok(())
        } else {
            Err(Violation::new(self.to_string(), render_text(actual)))
        }
    }
}

impl From<EqualsText> for TextPredicate {
    fn from(p: EqualsText) -> Self {
        Self::EqualsText(p)
    }
}

impl From<ContainsText> for TextPredicate {
    fn from(p: ContainsText) -> Self {
        Self::ContainsText(p)
    }
}

impl From<MatchesPattern> for TextPredicate {
    fn from(p: MatchesPattern) -> Self {
        Self::MatchesPattern(p)
    }
}

fn case_label(ignore_case: bool) -> &'static str {
    if ignore_case {
        "ignoring case"
    } else {
        "case sensitive"
    }
}

impl fmt::Display for TextPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EqualsText(p) => {
                match &p.expected {
                    Some(expected) => write!(f, "equal '{expected}'")?,
                    None => write!(f, "equal null")?,
                }
                write!(
                    f,
                    " {}, {}",
                    case_label(p.ignore_case),
                    if p.ignore_newlines {
                        "ignoring new lines"
                    } else {
                        "respecting new lines"
                    }
                )
            }
            Self::ContainsText(p) => {
                write!(f, "contain '{}' {}", p.needle, case_label(p.ignore_case))
            }
            Self::MatchesPattern(p) => write!(
                f,
                "match '{}' {}, {}",
                p.pattern,
                case_label(p.ignore_case),
                if p.dot_all { "dotallMode" } else { "no dotallMode(default)" }
            ),
        }
    }
}
