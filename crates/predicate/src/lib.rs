//! Number and text predicates plus their wire format.
//!
//! Predicates are immutable values. Applying one is pure: it returns
//! `Ok(())` or a [`Violation`] describing what was expected and what was
//! seen. No IO, no spreadsheet types.
//!
//! # Wire format
//!
//! ```ignore
//! use sheetcheck_predicate::{number_from_json, NumberPredicate};
//!
//! let p = number_from_json(r#"{"close": "100.0±0.5"}"#)?;
//! assert_eq!(p, NumberPredicate::close_to(100.0, 0.5)?);
//! ```

pub mod error;
pub mod number;
pub mod text;
pub mod violation;
pub mod wire;

pub use error::{CodecError, PredicateError};
pub use number::{Closeness, NumberPredicate, Range};
pub use text::{ContainsText, EqualsText, MatchesPattern, TextPredicate};
pub use violation::Violation;
pub use wire::{
    decode_number, decode_text, encode_number, encode_text, number_from_json, number_to_json,
    text_from_json, text_to_json, WireObject, WireValue,
};
