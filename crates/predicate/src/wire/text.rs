use super::{WireObject, WireValue};
use crate::error::CodecError;
use crate::text::{ContainsText, EqualsText, MatchesPattern, TextPredicate};

const IGNORE_CASE: &str = "ignoreCase";
const IGNORE_NEW_LINES: &str = "ignoreNewLines";
const DOTALL: &str = "dotall";

/// Operation keys, grouped by variant. The first of each group is primary.
pub const TEXT_OPERATIONS: [&[&str]; 3] = [&["eq", "=", "=="], &["has", "∋"], &["like"]];

pub const TEXT_OPTIONS: [&str; 3] = [IGNORE_CASE, IGNORE_NEW_LINES, DOTALL];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TextOp {
    Equals,
    Contains,
    Matches,
}

impl TextOp {
    fn lookup(key: &str) -> Option<Self> {
        let index = TEXT_OPERATIONS
            .iter()
            .position(|aliases| aliases.contains(&key))?;
        Some(match index {
            0 => Self::Equals,
            1 => Self::Contains,
            _ => Self::Matches,
        })
    }

    fn primary(self) -> &'static str {
        match self {
            Self::Equals => TEXT_OPERATIONS[0][0],
            Self::Contains => TEXT_OPERATIONS[1][0],
            Self::Matches => TEXT_OPERATIONS[2][0],
        }
    }
}

#[derive(Default)]
struct Options {
    ignore_case: bool,
    ignore_newlines: bool,
    dot_all: bool,
}

// ============================================================================
// Decode
// ============================================================================

/// Decode a text predicate. Options that do not apply to the chosen
/// operation are accepted and ignored.
pub fn decode_text(object: WireObject) -> Result<TextPredicate, CodecError> {
    if object.is_empty() {
        return Err(CodecError::MissingDiscriminator);
    }

    let mut operations: Vec<(String, TextOp, WireValue)> = Vec::new();
    let mut options = Options::default();
    let mut seen_options: Vec<&'static str> = Vec::new();

    for (key, value) in object.into_fields() {
        if let Some(op) = TextOp::lookup(&key) {
            operations.push((key, op, value));
            continue;
        }
        let Some(option) = TEXT_OPTIONS.iter().copied().find(|o| *o == key) else {
            return Err(CodecError::UnknownField(key));
        };
        if seen_options.contains(&option) {
            return Err(CodecError::DuplicateField(key));
        }
        seen_options.push(option);
        let flag = expect_flag(&key, &value)?;
        match option {
            IGNORE_CASE => options.ignore_case = flag,
            IGNORE_NEW_LINES => options.ignore_newlines = flag,
            _ => options.dot_all = flag,
        }
    }

    if operations.len() != 1 {
        return Err(CodecError::OperationCount(
            operations.into_iter().map(|(key, _, _)| key).collect(),
        ));
    }
    let Some((key, op, value)) = operations.pop() else {
        return Err(CodecError::OperationCount(Vec::new()));
    };
    let operand = match value {
        WireValue::Text(s) => s,
        WireValue::Null => return Err(CodecError::NullOperand(key)),
        other => {
            return Err(CodecError::ExpectedString {
                key,
                found: other.kind(),
            })
        }
    };

    let predicate = match op {
        TextOp::Equals => {
            let mut p = EqualsText::new(operand);
            if options.ignore_newlines {
                p = p.ignore_newlines();
            }
            TextPredicate::from(p)
        }
        TextOp::Contains => TextPredicate::from(ContainsText::new(operand)),
        TextOp::Matches => {
            let mut p = MatchesPattern::new(operand)?;
            if options.dot_all {
                p = p.dot_all();
            }
            TextPredicate::from(p)
        }
    };
    Ok(if options.ignore_case {
        predicate.ignore_case()
    } else {
        predicate
    })
}

/// `null` reads as false.
fn expect_flag(key: &str, value: &WireValue) -> Result<bool, CodecError> {
    match value {
        WireValue::Bool(b) => Ok(*b),
        WireValue::Null => Ok(false),
        other => Err(CodecError::ExpectedBoolean {
            key: key.to_string(),
            found: other.kind(),
        }),
    }
}

// ============================================================================
// Encode
// ============================================================================

/// Operation first, then the variant's own flag, then `ignoreCase`. Only
/// flags that are set are written.
pub fn encode_text(predicate: &TextPredicate) -> Result<WireObject, CodecError> {
    let mut object = WireObject::new();
    match predicate {
        TextPredicate::EqualsText(p) => {
            let key = TextOp::Equals.primary();
            let expected = p
                .expected()
                .ok_or_else(|| CodecError::NullOperand(key.to_string()))?;
            object = object.with(key, WireValue::Text(expected.to_string()));
            if p.is_ignore_newlines() {
                object = object.with(IGNORE_NEW_LINES, WireValue::Bool(true));
            }
        }
        TextPredicate::ContainsText(p) => {
            object = object.with(
                TextOp::Contains.primary(),
                WireValue::Text(p.needle().to_string()),
            );
        }
        TextPredicate::MatchesPattern(p) => {
            object = object.with(
                TextOp::Matches.primary(),
                WireValue::Text(p.pattern().to_string()),
            );
            if p.is_dot_all() {
                object = object.with(DOTALL, WireValue::Bool(true));
            }
        }
    }
    if predicate.is_ignore_case() {
        object = object.with(IGNORE_CASE, WireValue::Bool(true));
    }
    Ok(object)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wire::{text_from_json, text_to_json};

    #[test]
    fn test_decode_operations() {
        assert_eq!(
            text_from_json(r#"{"==": "Header"}"#).unwrap(),
            TextPredicate::equal_to("Header")
        );
        assert_eq!(
            text_from_json(r#"{"∋": "fox", "ignoreCase": true}"#).unwrap(),
            TextPredicate::containing("fox").ignore_case()
        );
        assert_eq!(
            text_from_json(r#"{"like": "a.b", "dotall": true}"#).unwrap(),
            TextPredicate::from(MatchesPattern::new("a.b").unwrap().dot_all())
        );
    }

    #[test]
    fn test_decode_options_in_any_order() {
        let p = text_from_json(r#"{"ignoreCase": true, "ignoreNewLines": true, "eq": "x"}"#)
            .unwrap();
        assert_eq!(
            p,
            TextPredicate::from(EqualsText::new("x").ignore_newlines().ignore_case())
        );
    }

    #[test]
    fn test_decode_inapplicable_option_ignored() {
        let p = text_from_json(r#"{"has": "x", "dotall": true}"#).unwrap();
        assert_eq!(p, TextPredicate::containing("x"));
    }

    #[test]
    fn test_decode_null_option_is_false() {
        let p = text_from_json(r#"{"eq": "x", "ignoreCase": null}"#).unwrap();
        assert!(!p.is_ignore_case());
    }

    #[test]
    fn test_decode_errors() {
        assert_eq!(
            text_from_json(r#"{"eq": "a", "has": "b"}"#),
            Err(CodecError::OperationCount(vec!["eq".into(), "has".into()]))
        );
        assert_eq!(
            text_from_json(r#"{"ignoreCase": true}"#),
            Err(CodecError::OperationCount(vec![]))
        );
        assert_eq!(
            text_from_json(r#"{"eq": "a", "trim": true}"#),
            Err(CodecError::UnknownField("trim".into()))
        );
        assert_eq!(
            text_from_json(r#"{"eq": null}"#),
            Err(CodecError::NullOperand("eq".into()))
        );
        assert_eq!(
            text_from_json(r#"{"eq": "a", "ignoreCase": "yes"}"#),
            Err(CodecError::ExpectedBoolean {
                key: "ignoreCase".into(),
                found: "string"
            })
        );
        assert_eq!(
            text_from_json(r#"{"eq": "a", "ignoreCase": true, "ignoreCase": false}"#),
            Err(CodecError::DuplicateField("ignoreCase".into()))
        );
        assert!(matches!(
            text_from_json(r#"{"like": "("}"#),
            Err(CodecError::Invalid(_))
        ));
    }

    #[test]
    fn test_encode_field_order() {
        let p = TextPredicate::from(EqualsText::new("x").ignore_newlines().ignore_case());
        assert_eq!(
            text_to_json(&p).unwrap(),
            r#"{"eq":"x","ignoreNewLines":true,"ignoreCase":true}"#
        );
        let p = TextPredicate::from(MatchesPattern::new("y").unwrap().dot_all());
        assert_eq!(text_to_json(&p).unwrap(), r#"{"like":"y","dotall":true}"#);
        assert_eq!(
            text_to_json(&TextPredicate::containing("z")).unwrap(),
            r#"{"has":"z"}"#
        );
    }

    #[test]
    fn test_encode_absent_expected_fails() {
        assert_eq!(
            encode_text(&TextPredicate::from(EqualsText::absent())),
            Err(CodecError::NullOperand("eq".into()))
        );
    }
}
