use std::fmt;

/// Invalid arguments passed to a predicate constructor.
///
/// Construction errors are never deferred: the caller gets them at the call
/// that built the predicate.
#[derive(Debug, Clone, PartialEq)]
pub enum PredicateError {
    /// Range upper bound is below the lower bound.
    InvertedRange { from: f64, to: f64 },
    /// Closeness tolerance (offset or percentage) is negative or NaN.
    InvalidTolerance(f64),
    /// Regular expression failed to compile.
    InvalidPattern { pattern: String, message: String },
}

impl fmt::Display for PredicateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvertedRange { from, to } => {
                write!(f, "range end {to:?} must be >= range start {from:?}")
            }
            Self::InvalidTolerance(value) => {
                write!(f, "tolerance must be a non-negative number, got {value:?}")
            }
            Self::InvalidPattern { pattern, message } => {
                write!(f, "invalid pattern '{pattern}': {message}")
            }
        }
    }
}

impl std::error::Error for PredicateError {}

/// Malformed wire input, or a predicate that has no wire representation.
#[derive(Debug, Clone, PartialEq)]
pub enum CodecError {
    /// Input was not syntactically valid, or was not an object.
    Syntax(String),
    /// Object had no fields at all.
    MissingDiscriminator,
    /// Number predicate object had more than one field.
    ExtraFields(Vec<String>),
    /// Field name is not a known discriminator alias.
    UnknownDiscriminator(String),
    /// Field name is outside the operation + option set of text predicates.
    UnknownField(String),
    /// Same field appeared twice in one object.
    DuplicateField(String),
    /// Text predicate object must carry exactly one operation key.
    OperationCount(Vec<String>),
    /// Operation key of a text predicate was `null`.
    NullOperand(String),
    ExpectedNumber { key: String, found: &'static str },
    ExpectedString { key: String, found: &'static str },
    ExpectedBoolean { key: String, found: &'static str },
    /// Closeness operand did not match `<float>(±|+-)<float>[%]`.
    MalformedCloseness { key: String, text: String },
    /// Range operand did not match `([|()<float>..<float>(]|))`.
    MalformedRange { key: String, text: String },
    /// NaN or infinity cannot be written to the wire.
    NonFinite { key: &'static str, value: f64 },
    /// Operand parsed but the predicate constructor rejected it.
    Invalid(PredicateError),
}

impl fmt::Display for CodecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Syntax(msg) => write!(f, "malformed predicate: {msg}"),
            Self::MissingDiscriminator => {
                write!(f, "expected a single field as discriminator, found none")
            }
            Self::ExtraFields(keys) => {
                write!(f, "expected a single discriminator field, found {keys:?}")
            }
            Self::UnknownDiscriminator(key) => write!(f, "unknown discriminator: '{key}'"),
            Self::UnknownField(key) => write!(f, "unknown field: '{key}'"),
            Self::DuplicateField(key) => write!(f, "duplicate field: '{key}'"),
            Self::OperationCount(keys) => {
                write!(f, "exactly one operation key must be present, found: {keys:?}")
            }
            Self::NullOperand(key) => write!(f, "the value for '{key}' must not be null"),
            Self::ExpectedNumber { key, found } => {
                write!(f, "'{key}': expected numeric value, found {found}")
            }
            Self::ExpectedString { key, found } => {
                write!(f, "'{key}': expected string value, found {found}")
            }
            Self::ExpectedBoolean { key, found } => {
                write!(f, "'{key}': expected boolean value, found {found}")
            }
            Self::MalformedCloseness { key, text } => {
                write!(f, "'{key}': invalid format for close-to pattern: '{text}'")
            }
            Self::MalformedRange { key, text } => {
                write!(f, "'{key}': invalid format for within/outside range: '{text}'")
            }
            Self::NonFinite { key, value } => {
                write!(f, "'{key}': {value:?} has no wire representation")
            }
            Self::Invalid(err) => write!(f, "invalid predicate: {err}"),
        }
    }
}

impl std::error::Error for CodecError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Invalid(err) => Some(err),
            _ => None,
        }
    }
}

impl From<PredicateError> for CodecError {
    fn from(err: PredicateError) -> Self {
        Self::Invalid(err)
    }
}
