//! Sheet-scoped validation session.
//!
//! A [`Session`] owns an opened document, a current-sheet pointer and the
//! failure log. Each registered contract is evaluated immediately against
//! the current sheet; failures are only reported when the session closes.

use std::fmt;

use crate::contract::CellContract;
use crate::document::Document;
use crate::error::{DocumentError, SessionError};
use crate::evaluate::evaluate;
use crate::failure::{Failure, FailureLog};

/// How a sheet was selected.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SheetRef {
    Index(usize),
    Name(String),
}

impl From<usize> for SheetRef {
    fn from(index: usize) -> Self {
        Self::Index(index)
    }
}

impl From<&str> for SheetRef {
    fn from(name: &str) -> Self {
        Self::Name(name.to_string())
    }
}

impl From<String> for SheetRef {
    fn from(name: String) -> Self {
        Self::Name(name)
    }
}

impl fmt::Display for SheetRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Index(i) => write!(f, "#{i}"),
            Self::Name(name) => write!(f, "'{name}'"),
        }
    }
}

/// A contract that was evaluated, and the sheet it was evaluated against.
#[derive(Debug, Clone, PartialEq)]
pub struct AuditRecord {
    pub contract: CellContract,
    pub sheet: SheetRef,
}

impl fmt::Display for AuditRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.sheet, self.contract)
    }
}

pub struct Session<D: Document> {
    /// `None` once released.
    document: Option<D>,
    current: Option<(usize, SheetRef)>,
    records: Vec<AuditRecord>,
    log: FailureLog,
}

impl<D: Document> Session<D> {
    /// Start a session on `document` with the first sheet selected.
    pub fn open(document: D) -> Self {
        let mut session = Self {
            document: Some(document),
            current: None,
            records: Vec::new(),
            log: FailureLog::new(),
        };
        session.select_sheet(0usize);
        session
    }

    /// Make `sheet` the target of subsequent registrations. A missing sheet
    /// is recorded as a failure and leaves no sheet selected.
    pub fn select_sheet(&mut self, sheet: impl Into<SheetRef>) -> &mut Self {
        let sheet = sheet.into();
        let Some(document) = self.document.as_ref() else {
            return self;
        };
        let index = match &sheet {
            SheetRef::Index(i) => Some(*i).filter(|i| *i < document.sheet_count()),
            SheetRef::Name(name) => document.sheet_index(name),
        };

        match index {
            Some(index) => {
                log::debug!("selected sheet {sheet} (#{index})");
                self.current = Some((index, sheet));
            }
            None => {
                let message = match &sheet {
                    SheetRef::Index(i) => format!("cannot find sheet with index {i}"),
                    SheetRef::Name(name) => format!("cannot find sheet with name '{name}'"),
                };
                log::warn!("{message}");
                self.log.record(Failure::at_sheet(sheet.to_string(), message));
                self.current = None;
            }
        }
        self
    }

    pub fn current_sheet(&self) -> Option<&SheetRef> {
        self.current.as_ref().map(|(_, sheet)| sheet)
    }

    /// Evaluate `contract` against the current sheet. Skipped when no sheet
    /// is selected.
    pub fn register(&mut self, contract: CellContract) -> &mut Self {
        let (Some(document), Some((index, sheet))) = (self.document.as_ref(), self.current.clone())
        else {
            log::debug!("no sheet selected, skipping {contract}");
            return self;
        };

        {
            let sheet_name = document
                .sheet_name(index)
                .map(str::to_string)
                .unwrap_or_else(|| sheet.to_string());
            // `snapshot` borrows `self.document`.
            let snapshot = document.cell(index, contract.address());
            evaluate(&contract, &sheet_name, snapshot.as_ref(), &mut self.log);
        }

        self.records.push(AuditRecord { contract, sheet });
        self
    }

    pub fn register_all<I>(&mut self, contracts: I) -> &mut Self
    where
        I: IntoIterator<Item = CellContract>,
    {
        for contract in contracts {
            self.register(contract);
        }
        self
    }

    /// Every contract evaluated so far, in registration order.
    pub fn records(&self) -> &[AuditRecord] {
        &self.records
    }

    /// Failures recorded so far.
    pub fn failures(&self) -> &FailureLog {
        &self.log
    }

    /// Release the document, then report every recorded failure.
    ///
    /// The document is released even when failures are pending. A release
    /// error takes precedence and carries the pending failures with it.
    pub fn close(mut self) -> Result<(), SessionError> {
        let released = self.release();
        let log = std::mem::take(&mut self.log);
        log::info!(
            "session closed: {} contract(s) checked, {} failure(s)",
            self.records.len(),
            log.len()
        );
        match released {
            Err(error) => Err(SessionError::Release {
                error,
                failures: log.into_failures(),
            }),
            Ok(()) => log.finalize().map_err(SessionError::Failed),
        }
    }

    fn release(&mut self) -> Result<(), DocumentError> {
        match self.document.take() {
            Some(mut document) => document.close(),
            None => Ok(()),
        }
    }
}

impl<D: Document> Drop for Session<D> {
    fn drop(&mut self) {
        if let Err(e) = self.release() {
            log::warn!("failed to release document: {e}");
        }
        if !self.log.is_empty() {
            log::warn!(
                "session dropped with {} unreported failure(s)",
                self.log.len()
            );
        }
    }
}
