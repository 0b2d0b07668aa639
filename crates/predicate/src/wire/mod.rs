//! Compact tagged wire format.
//!
//! A predicate is a single object. For numbers, the only field name is the
//! discriminator and its value is the operand:
//!
//! ```text
//! {"eq": 42.0}   {"close": "100.0±0.5"}   {"in": "[1.0..10.0)"}
//! ```
//!
//! For text, exactly one operation key carries the operand and the option
//! keys `ignoreCase`, `ignoreNewLines`, `dotall` carry booleans:
//!
//! ```text
//! {"eq": "Header", "ignoreCase": true}   {"like": "[A-Z]{3}-\\d+"}
//! ```
//!
//! The encoder always writes the primary discriminator; the decoder accepts
//! every alias. Decoding works on an ordered list of fields so the same
//! rules apply whether the object came from JSON or TOML.

mod number;
mod text;

use std::fmt;

use serde::de::{self, Deserializer, IgnoredAny, MapAccess, SeqAccess, Visitor};
use serde::ser::{self, SerializeMap, Serializer};
use serde::{Deserialize, Serialize};

use crate::error::CodecError;
use crate::number::NumberPredicate;
use crate::text::TextPredicate;

pub use number::{decode_number, encode_number, NUMBER_DISCRIMINATORS};
pub use text::{decode_text, encode_text, TEXT_OPERATIONS, TEXT_OPTIONS};

// ============================================================================
// Wire values
// ============================================================================

/// A field value as it appears on the wire.
#[derive(Debug, Clone, PartialEq)]
pub enum WireValue {
    Null,
    Bool(bool),
    Number(f64),
    Text(String),
    /// Array or object. Never valid as an operand; kept so errors can name it.
    Nested(&'static str),
}

impl WireValue {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "boolean",
            Self::Number(_) => "number",
            Self::Text(_) => "string",
            Self::Nested(kind) => kind,
        }
    }
}

impl<'de> Deserialize<'de> for WireValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct ValueVisitor;

        impl<'de> Visitor<'de> for ValueVisitor {
            type Value = WireValue;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a predicate operand")
            }

            fn visit_bool<E: de::Error>(self, v: bool) -> Result<WireValue, E> {
                Ok(WireValue::Bool(v))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<WireValue, E> {
                Ok(WireValue::Number(v as f64))
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<WireValue, E> {
                Ok(WireValue::Number(v as f64))
            }

            fn visit_f64<E: de::Error>(self, v: f64) -> Result<WireValue, E> {
                Ok(WireValue::Number(v))
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<WireValue, E> {
                Ok(WireValue::Text(v.to_owned()))
            }

            fn visit_string<E: de::Error>(self, v: String) -> Result<WireValue, E> {
                Ok(WireValue::Text(v))
            }

            fn visit_unit<E: de::Error>(self) -> Result<WireValue, E> {
                Ok(WireValue::Null)
            }

            fn visit_none<E: de::Error>(self) -> Result<WireValue, E> {
                Ok(WireValue::Null)
            }

            fn visit_some<D: Deserializer<'de>>(self, d: D) -> Result<WireValue, D::Error> {
                WireValue::deserialize(d)
            }

            fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<WireValue, A::Error> {
                while seq.next_element::<IgnoredAny>()?.is_some() {}
                Ok(WireValue::Nested("array"))
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<WireValue, A::Error> {
                while map.next_entry::<IgnoredAny, IgnoredAny>()?.is_some() {}
                Ok(WireValue::Nested("object"))
            }
        }

        deserializer.deserialize_any(ValueVisitor)
    }
}

impl Serialize for WireValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Null => serializer.serialize_unit(),
            Self::Bool(b) => serializer.serialize_bool(*b),
            Self::Number(n) => serializer.serialize_f64(*n),
            Self::Text(s) => serializer.serialize_str(s),
            Self::Nested(kind) => Err(ser::Error::custom(format!(
                "nested {kind} is not a predicate operand"
            ))),
        }
    }
}

// ============================================================================
// Wire objects
// ============================================================================

/// One predicate object: its fields, in input order, duplicates preserved.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WireObject {
    fields: Vec<(String, WireValue)>,
}

impl WireObject {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: WireValue) -> Self {
        self.fields.push((key.into(), value));
        self
    }

    pub fn fields(&self) -> &[(String, WireValue)] {
        &self.fields
    }

    pub fn into_fields(self) -> Vec<(String, WireValue)> {
        self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// First value stored under `key`.
    pub fn get(&self, key: &str) -> Option<&WireValue> {
        self.fields.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    fn keys(&self) -> Vec<String> {
        self.fields.iter().map(|(k, _)| k.clone()).collect()
    }
}

impl<'de> Deserialize<'de> for WireObject {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct ObjectVisitor;

        impl<'de> Visitor<'de> for ObjectVisitor {
            type Value = WireObject;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a predicate object")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<WireObject, A::Error> {
                let mut fields = Vec::with_capacity(map.size_hint().unwrap_or(2));
                while let Some((key, value)) = map.next_entry::<String, WireValue>()? {
                    fields.push((key, value));
                }
                Ok(WireObject { fields })
            }
        }

        deserializer.deserialize_map(ObjectVisitor)
    }
}

impl Serialize for WireObject {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (key, value) in &self.fields {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

// ============================================================================
// Serde integration
// ============================================================================

impl Serialize for NumberPredicate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        encode_number(self)
            .map_err(ser::Error::custom)?
            .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for NumberPredicate {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let object = WireObject::deserialize(deserializer)?;
        decode_number(object).map_err(de::Error::custom)
    }
}

impl Serialize for TextPredicate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        encode_text(self)
            .map_err(ser::Error::custom)?
            .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for TextPredicate {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let object = WireObject::deserialize(deserializer)?;
        decode_text(object).map_err(de::Error::custom)
    }
}

// ============================================================================
// JSON helpers
// ============================================================================

/// Parse a JSON object into a number predicate.
pub fn number_from_json(input: &str) -> Result<NumberPredicate, CodecError> {
    decode_number(parse_json(input)?)
}

pub fn number_to_json(predicate: &NumberPredicate) -> Result<String, CodecError> {
    write_json(&encode_number(predicate)?)
}

/// Parse a JSON object into a text predicate.
pub fn text_from_json(input: &str) -> Result<TextPredicate, CodecError> {
    decode_text(parse_json(input)?)
}

pub fn text_to_json(predicate: &TextPredicate) -> Result<String, CodecError> {
    write_json(&encode_text(predicate)?)
}

fn parse_json(input: &str) -> Result<WireObject, CodecError> {
    serde_json::from_str(input).map_err(|e| CodecError::Syntax(e.to_string()))
}

fn write_json(object: &WireObject) -> Result<String, CodecError> {
    serde_json::to_string(object).map_err(|e| CodecError::Syntax(e.to_string()))
}
