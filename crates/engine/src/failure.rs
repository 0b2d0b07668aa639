//! Deferred failure collection.
//!
//! Evaluation never returns early on a failed check. Every failure is
//! recorded into a [`FailureLog`] and surfaces only when the log is
//! finalized, as one [`AggregateFailure`] listing all of them.

use std::fmt;

use crate::address::CellAddress;

/// One failed check, with the sheet and cell it was made against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Failure {
    pub sheet: String,
    /// `None` for sheet-level failures such as a missing sheet.
    pub address: Option<CellAddress>,
    pub message: String,
}

impl Failure {
    pub fn at_cell(sheet: impl Into<String>, address: CellAddress, message: impl Into<String>) -> Self {
        Self {
            sheet: sheet.into(),
            address: Some(address),
            message: message.into(),
        }
    }

    pub fn at_sheet(sheet: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            sheet: sheet.into(),
            address: None,
            message: message.into(),
        }
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.address {
            Some(address) => write!(f, "{}!{}: {}", self.sheet, address, self.message),
            None => write!(f, "{}: {}", self.sheet, self.message),
        }
    }
}

/// Ordered collector of failures.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FailureLog {
    failures: Vec<Failure>,
}

impl FailureLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, failure: Failure) {
        self.failures.push(failure);
    }

    pub fn len(&self) -> usize {
        self.failures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Failure> {
        self.failures.iter()
    }

    /// Take every recorded failure, leaving the log empty.
    pub fn take(&mut self) -> Vec<Failure> {
        std::mem::take(&mut self.failures)
    }

    pub fn into_failures(self) -> Vec<Failure> {
        self.failures
    }

    /// `Ok` when nothing was recorded.
    pub fn finalize(self) -> Result<(), AggregateFailure> {
        if self.failures.is_empty() {
            Ok(())
        } else {
            Err(AggregateFailure {
                failures: self.failures,
            })
        }
    }
}

impl<'a> IntoIterator for &'a FailureLog {
    type Item = &'a Failure;
    type IntoIter = std::slice::Iter<'a, Failure>;

    fn into_iter(self) -> Self::IntoIter {
        self.failures.iter()
    }
}

/// Every failure of a session, reported together. Never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregateFailure {
    failures: Vec<Failure>,
}

impl AggregateFailure {
    pub fn failures(&self) -> &[Failure] {
        &self.failures
    }

    pub fn len(&self) -> usize {
        self.failures.len()
    }

    pub fn into_failures(self) -> Vec<Failure> {
        self.failures
    }
}

impl fmt::Display for AggregateFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let plural = if self.failures.len() == 1 { "" } else { "s" };
        write!(f, "{} check{} failed:", self.failures.len(), plural)?;
        for (i, failure) in self.failures.iter().enumerate() {
            write!(f, "\n  {}) {}", i + 1, failure)?;
        }
        Ok(())
    }
}

impl std::error::Error for AggregateFailure {}
