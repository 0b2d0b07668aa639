use std::fmt;

use crate::failure::{AggregateFailure, Failure};

/// Cell address that could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddressError {
    /// Empty or whitespace-only address.
    Blank,
    /// Not of the form `<letters><digits>`.
    Malformed(String),
    /// Column beyond `XFD` or row outside `1..=1048576`.
    OutOfBounds(String),
}

impl fmt::Display for AddressError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Blank => write!(f, "cell address cannot be blank"),
            Self::Malformed(input) => write!(f, "invalid cell address: '{input}'"),
            Self::OutOfBounds(input) => write!(f, "cell address out of bounds: '{input}'"),
        }
    }
}

impl std::error::Error for AddressError {}

/// Resource errors from the document collaborator. Never deferred.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentError {
    /// Source could not be opened or read.
    Open { source: String, message: String },
    /// Source was read but its contents are not a valid document.
    Corrupt(String),
    /// Releasing the document failed.
    Close(String),
}

impl fmt::Display for DocumentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Open { source, message } => write!(f, "cannot open '{source}': {message}"),
            Self::Corrupt(msg) => write!(f, "corrupt document: {msg}"),
            Self::Close(msg) => write!(f, "failed to close document: {msg}"),
        }
    }
}

impl std::error::Error for DocumentError {}

/// Outcome of closing a session that did not pass cleanly.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionError {
    /// Releasing the document failed. Failures recorded before the release
    /// are carried along so none are lost.
    Release {
        error: DocumentError,
        failures: Vec<Failure>,
    },
    /// One or more checks failed.
    Failed(AggregateFailure),
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Release { error, failures } if failures.is_empty() => write!(f, "{error}"),
            Self::Release { error, failures } => {
                write!(f, "{error} ({} unreported failure(s))", failures.len())
            }
            Self::Failed(aggregate) => write!(f, "{aggregate}"),
        }
    }
}

impl std::error::Error for SessionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Release { error, .. } => Some(error),
            Self::Failed(aggregate) => Some(aggregate),
        }
    }
}
