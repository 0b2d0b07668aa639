//! Number format classification.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::document::DisplayFormat;

/// Coarse classification of a display format string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormatCategory {
    General,
    Percentage,
    Date,
    Time,
    Currency,
    Accounting,
    Scientific,
    Fraction,
    Text,
    Other,
}

impl FormatCategory {
    pub const ALL: [FormatCategory; 10] = [
        Self::General,
        Self::Percentage,
        Self::Date,
        Self::Time,
        Self::Currency,
        Self::Accounting,
        Self::Scientific,
        Self::Fraction,
        Self::Text,
        Self::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::General => "GENERAL",
            Self::Percentage => "PERCENTAGE",
            Self::Date => "DATE",
            Self::Time => "TIME",
            Self::Currency => "CURRENCY",
            Self::Accounting => "ACCOUNTING",
            Self::Scientific => "SCIENTIFIC",
            Self::Fraction => "FRACTION",
            Self::Text => "TEXT",
            Self::Other => "OTHER",
        }
    }
}

impl fmt::Display for FormatCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FormatCategory {
    type Err = String;

    /// Case-insensitive.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|c| c.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown format category: '{s}'"))
    }
}

impl Serialize for FormatCategory {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for FormatCategory {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Classify a cell's display format. First match wins; a cell without a
/// format is `Other`.
pub fn detect_category(format: Option<&DisplayFormat>) -> FormatCategory {
    let Some(format) = format else {
        return FormatCategory::Other;
    };
    let code = format.code.to_lowercase();

    if code == "general" {
        FormatCategory::General
    } else if code.contains('%') {
        FormatCategory::Percentage
    } else if format.is_date {
        FormatCategory::Date
    } else if code.contains('h') || code.contains('s') || code.contains("am/pm") {
        FormatCategory::Time
    } else if code.contains("#,##0") || code.contains("currency") {
        FormatCategory::Currency
    } else if code.contains("_($") || code.contains("accounting") {
        FormatCategory::Accounting
    } else if code.contains("e+") {
        FormatCategory::Scientific
    } else if code.contains("?/") {
        FormatCategory::Fraction
    } else if code.contains('@') {
        FormatCategory::Text
    } else {
        FormatCategory::Other
    }
}

// ============================================================================
// Date-format heuristic
// ============================================================================

/// Built-in number format ids that always format dates or times.
fn is_builtin_date_format(id: u16) -> bool {
    matches!(id, 14..=22 | 45..=47)
}

fn is_date_token_char(c: char) -> bool {
    matches!(
        c,
        'y' | 'Y' | 'm' | 'M' | 'd' | 'D' | 'h' | 'H' | 's' | 'S'
            | '-' | 'T' | '/' | ',' | '.' | ' ' | ':' | '0'
            | '年' | '月' | '日'
    )
}

/// `[h]`, `[mm]`, `[ss]` and friends: elapsed-time blocks.
fn is_elapsed_block(block: &str) -> bool {
    let mut chars = block.chars();
    match chars.next() {
        Some(first) if matches!(first.to_ascii_lowercase(), 'h' | 'm' | 's') => {
            chars.all(|c| c.eq_ignore_ascii_case(&first))
        }
        _ => false,
    }
}

/// Remove quoted literals, backslash escapes and bracketed blocks. Returns
/// `None` if an elapsed-time block was seen, which makes it a date format.
fn strip_literals(section: &str) -> Option<String> {
    let mut out = String::with_capacity(section.len());
    let mut chars = section.chars();
    while let Some(c) = chars.next() {
        match c {
            '"' => {
                for q in chars.by_ref() {
                    if q == '"' {
                        break;
                    }
                }
            }
            '\\' => {
                chars.next();
            }
            '[' => {
                let block: String = chars.by_ref().take_while(|&b| b != ']').collect();
                if is_elapsed_block(&block) {
                    return None;
                }
            }
            '_' | '*' => {
                // Padding directives consume the following character.
                chars.next();
            }
            _ => out.push(c),
        }
    }
    Some(out)
}

/// Heuristic used by documents to flag date formats.
pub fn looks_like_date_format(builtin_id: Option<u16>, code: &str) -> bool {
    if builtin_id.is_some_and(is_builtin_date_format) {
        return true;
    }

    let section = code.split(';').next().unwrap_or_default().trim();
    if section.is_empty() {
        return false;
    }

    let Some(stripped) = strip_literals(section) else {
        return true;
    };
    let lower = stripped.to_lowercase();
    let cleaned = lower.replace("am/pm", "").replace("a/p", "");

    let has_token = cleaned
        .chars()
        .any(|c| matches!(c, 'y' | 'm' | 'd' | 'h' | 's') || matches!(c, '年' | '月' | '日'));
    has_token && cleaned.chars().all(|c| is_date_token_char(c) || c == 't')
}
