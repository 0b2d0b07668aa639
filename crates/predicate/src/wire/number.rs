use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::Regex;

use super::{WireObject, WireValue};
use crate::error::CodecError;
use crate::number::{Closeness, NumberPredicate, Range};
use crate::violation::render_number;

/// Float literal accepted inside string operands. Whitespace is stripped
/// from the operand before matching.
const FLOAT: &str = r"[-+]?(?:\d+\.?\d*|\.\d+)(?:[eE][-+]?\d+)?";

static CLOSENESS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"^(?P<expected>{FLOAT})(?:±|\+-)(?P<tolerance>{FLOAT})(?P<percent>%)?$"
    ))
    .expect("closeness pattern")
});

static RANGE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"^(?P<open>[\[(])(?P<from>{FLOAT})\.\.(?P<to>{FLOAT})(?P<close>[\])])$"
    ))
    .expect("range pattern")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NumberTag {
    EqualTo,
    GreaterThan,
    GreaterOrEqual,
    LessThan,
    LessOrEqual,
    CloseToOffset,
    CloseToPercent,
    WithinRange,
    OutsideRange,
}

impl NumberTag {
    const ALL: [NumberTag; 9] = [
        Self::EqualTo,
        Self::GreaterThan,
        Self::GreaterOrEqual,
        Self::LessThan,
        Self::LessOrEqual,
        Self::CloseToOffset,
        Self::CloseToPercent,
        Self::WithinRange,
        Self::OutsideRange,
    ];

    /// Accepted field names; the first is what the encoder writes.
    fn aliases(self) -> &'static [&'static str] {
        match self {
            Self::EqualTo => &["eq", "==", "="],
            Self::GreaterThan => &["gt", ">"],
            Self::GreaterOrEqual => &["gte", ">="],
            Self::LessThan => &["lt", "<"],
            Self::LessOrEqual => &["lte", "<="],
            Self::CloseToOffset => &["close", "~", "≈"],
            Self::CloseToPercent => &["closePercent", "close%", "≈%", "~%"],
            Self::WithinRange => &["in", "∈", "within"],
            Self::OutsideRange => &["notIn", "∉", "out", "beyond"],
        }
    }

    fn primary(self) -> &'static str {
        self.aliases()[0]
    }

    fn of(predicate: &NumberPredicate) -> Self {
        match predicate {
            NumberPredicate::EqualTo(_) => Self::EqualTo,
            NumberPredicate::GreaterThan(_) => Self::GreaterThan,
            NumberPredicate::GreaterOrEqual(_) => Self::GreaterOrEqual,
            NumberPredicate::LessThan(_) => Self::LessThan,
            NumberPredicate::LessOrEqual(_) => Self::LessOrEqual,
            NumberPredicate::CloseToOffset(_) => Self::CloseToOffset,
            NumberPredicate::CloseToPercent(_) => Self::CloseToPercent,
            NumberPredicate::WithinRange(_) => Self::WithinRange,
            NumberPredicate::OutsideRange(_) => Self::OutsideRange,
        }
    }
}

static TAGS: Lazy<HashMap<&'static str, NumberTag>> = Lazy::new(|| {
    NumberTag::ALL
        .iter()
        .flat_map(|tag| tag.aliases().iter().map(move |alias| (*alias, *tag)))
        .collect()
});

/// Every accepted number discriminator, primary names first within each group.
pub static NUMBER_DISCRIMINATORS: Lazy<Vec<&'static str>> = Lazy::new(|| {
    NumberTag::ALL
        .iter()
        .flat_map(|tag| tag.aliases().iter().copied())
        .collect()
});

// ============================================================================
// Decode
// ============================================================================

pub fn decode_number(object: WireObject) -> Result<NumberPredicate, CodecError> {
    if object.len() > 1 {
        return Err(CodecError::ExtraFields(object.keys()));
    }
    let Some((key, value)) = object.into_fields().pop() else {
        return Err(CodecError::MissingDiscriminator);
    };
    let Some(tag) = TAGS.get(key.as_str()).copied() else {
        return Err(CodecError::UnknownDiscriminator(key));
    };

    let predicate = match tag {
        NumberTag::EqualTo => NumberPredicate::EqualTo(expect_number(&key, &value)?),
        NumberTag::GreaterThan => NumberPredicate::GreaterThan(expect_number(&key, &value)?),
        NumberTag::GreaterOrEqual => {
            NumberPredicate::GreaterOrEqual(expect_number(&key, &value)?)
        }
        NumberTag::LessThan => NumberPredicate::LessThan(expect_number(&key, &value)?),
        NumberTag::LessOrEqual => NumberPredicate::LessOrEqual(expect_number(&key, &value)?),
        NumberTag::CloseToOffset => {
            NumberPredicate::CloseToOffset(parse_closeness(&key, &value, false)?)
        }
        NumberTag::CloseToPercent => {
            NumberPredicate::CloseToPercent(parse_closeness(&key, &value, true)?)
        }
        NumberTag::WithinRange => NumberPredicate::WithinRange(parse_range(&key, &value)?),
        NumberTag::OutsideRange => NumberPredicate::OutsideRange(parse_range(&key, &value)?),
    };
    Ok(predicate)
}

fn expect_number(key: &str, value: &WireValue) -> Result<f64, CodecError> {
    match value {
        WireValue::Number(n) => Ok(*n),
        other => Err(CodecError::ExpectedNumber {
            key: key.to_string(),
            found: other.kind(),
        }),
    }
}

fn expect_string(key: &str, value: &WireValue) -> Result<String, CodecError> {
    match value {
        WireValue::Text(s) => Ok(s.chars().filter(|c| !c.is_whitespace()).collect()),
        other => Err(CodecError::ExpectedString {
            key: key.to_string(),
            found: other.kind(),
        }),
    }
}

fn parse_float(text: &str) -> Option<f64> {
    text.parse::<f64>().ok()
}

fn parse_closeness(key: &str, value: &WireValue, percent: bool) -> Result<Closeness, CodecError> {
    let text = expect_string(key, value)?;
    let malformed = || CodecError::MalformedCloseness {
        key: key.to_string(),
        text: text.clone(),
    };
    let caps = CLOSENESS.captures(&text).ok_or_else(malformed)?;
    if caps.name("percent").is_some() != percent {
        return Err(malformed());
    }
    let expected = parse_float(&caps["expected"]).ok_or_else(malformed)?;
    let tolerance = parse_float(&caps["tolerance"]).ok_or_else(malformed)?;
    Ok(Closeness::new(expected, tolerance)?)
}

fn parse_range(key: &str, value: &WireValue) -> Result<Range, CodecError> {
    let text = expect_string(key, value)?;
    let malformed = || CodecError::MalformedRange {
        key: key.to_string(),
        text: text.clone(),
    };
    let caps = RANGE.captures(&text).ok_or_else(malformed)?;
    let from = parse_float(&caps["from"]).ok_or_else(malformed)?;
    let to = parse_float(&caps["to"]).ok_or_else(malformed)?;
    let exclusive_from = &caps["open"] == "(";
    let exclusive_to = &caps["close"] == ")";
    Ok(Range::new(from, to, exclusive_from, exclusive_to)?)
}

// ============================================================================
// Encode
// ============================================================================

/// Encode under the primary discriminator. Fails only for non-finite operands.
pub fn encode_number(predicate: &NumberPredicate) -> Result<WireObject, CodecError> {
    let key = NumberTag::of(predicate).primary();
    let finite = |value: f64| {
        if value.is_finite() {
            Ok(value)
        } else {
            Err(CodecError::NonFinite { key, value })
        }
    };

    let value = match predicate {
        NumberPredicate::EqualTo(v)
        | NumberPredicate::GreaterThan(v)
        | NumberPredicate::GreaterOrEqual(v)
        | NumberPredicate::LessThan(v)
        | NumberPredicate::LessOrEqual(v) => WireValue::Number(finite(*v)?),
        NumberPredicate::CloseToOffset(c) => WireValue::Text(format!(
            "{}±{}",
            render_number(finite(c.expected())?),
            render_number(finite(c.tolerance())?)
        )),
        NumberPredicate::CloseToPercent(c) => WireValue::Text(format!(
            "{}±{}%",
            render_number(finite(c.expected())?),
            render_number(finite(c.tolerance())?)
        )),
        NumberPredicate::WithinRange(r) | NumberPredicate::OutsideRange(r) => {
            finite(r.from())?;
            finite(r.to())?;
            WireValue::Text(r.to_string())
        }
    };
    Ok(WireObject::new().with(key, value))
}
