//! Evaluation of a [`CellContract`] against one cell snapshot.
//!
//! Side checks (format, format category, comment) always run when
//! configured. The value check then dispatches on the cell's runtime type:
//! a matching literal is checked directly; a formula is computed on demand
//! and its result checked instead; anything else is an unsupported type.
//! Every failure goes to the [`FailureLog`].

use std::fmt;

use sheetcheck_predicate::Violation;

use crate::contract::{CellContract, ValueCheck};
use crate::document::{CellContent, CellKind, CellSnapshot, ComputedValue};
use crate::failure::{Failure, FailureLog};
use crate::format::detect_category;

/// A value as seen by a value check: either a literal or a computed result.
#[derive(Debug, Clone, Copy)]
enum Actual<'v> {
    Text(&'v str),
    Number(f64),
    Boolean(bool),
    Error(&'v str),
    Formula(&'v str),
    Blank,
}

impl<'v> Actual<'v> {
    fn from_content(content: &'v CellContent<'_>) -> Self {
        match content {
            CellContent::Text(s) => Self::Text(s),
            CellContent::Number(n) => Self::Number(*n),
            CellContent::Boolean(b) => Self::Boolean(*b),
            CellContent::Error(code) => Self::Error(code),
            CellContent::Blank => Self::Blank,
            CellContent::Formula(formula) => Self::Formula(formula.text()),
        }
    }

    fn from_computed(value: &'v ComputedValue) -> Self {
        match value {
            ComputedValue::Text(s) => Self::Text(s),
            ComputedValue::Number(n) => Self::Number(*n),
            ComputedValue::Boolean(b) => Self::Boolean(*b),
            ComputedValue::Error(code) => Self::Error(code),
            ComputedValue::Blank => Self::Blank,
        }
    }
}

impl fmt::Display for Actual<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(s) => write!(f, "{s:?}"),
            Self::Number(n) => write!(f, "{n:?}"),
            Self::Boolean(b) => write!(f, "{b}"),
            Self::Error(code) => f.write_str(code),
            Self::Formula(text) => write!(f, "={text}"),
            Self::Blank => f.write_str("BLANK"),
        }
    }
}

/// Apply a value check to one actual value. `None` means the check does not
/// support this kind of value.
fn run(check: &ValueCheck, actual: Actual<'_>) -> Option<Vec<Violation>> {
    let single =
        |result: Result<(), Violation>| -> Vec<Violation> { result.err().into_iter().collect() };
    match (check, actual) {
        (ValueCheck::Number(p), Actual::Number(n)) => Some(single(p.apply(n))),
        (ValueCheck::Text(p), Actual::Text(s)) => Some(single(p.apply(Some(s)))),
        (ValueCheck::Boolean(expected), Actual::Boolean(b)) => Some(if *expected == b {
            Vec::new()
        } else {
            vec![Violation::new(format!("== {expected}"), b.to_string())]
        }),
        (ValueCheck::FormulaText(p), Actual::Formula(text)) => Some(single(p.apply(Some(text)))),
        (ValueCheck::ErrorText(p), Actual::Error(code)) => Some(single(p.apply(Some(code)))),
        (ValueCheck::DateTime(check), Actual::Number(serial)) => Some(check.check(serial)),
        (ValueCheck::Empty, Actual::Blank) => Some(Vec::new()),
        (ValueCheck::Empty, Actual::Text(s)) if is_blank_text(s) => Some(Vec::new()),
        // Formula results are not invariant; emptiness is judged on the
        // computed value.
        (ValueCheck::Empty, Actual::Formula(_)) => None,
        (ValueCheck::Empty, other) => Some(vec![Violation::new("EMPTY", other.to_string())]),
        _ => None,
    }
}

/// Evaluate `contract` against the cell it addresses. `snapshot` is `None`
/// when no cell exists there. Returns the number of failures recorded.
pub fn evaluate(
    contract: &CellContract,
    sheet: &str,
    snapshot: Option<&CellSnapshot<'_>>,
    log: &mut FailureLog,
) -> usize {
    let address = contract.address();
    let before = log.len();
    let mut fail = |message: String| log.record(Failure::at_cell(sheet, address, message));

    // Side checks
    if let Some(predicate) = contract.format() {
        let code = snapshot.and_then(|s| s.format.as_ref()).map(|f| f.code.as_str());
        if let Err(v) = predicate.apply(code) {
            fail(format!("cell format: {v}"));
        }
    }
    if let Some(expected) = contract.format_category() {
        let detected = detect_category(snapshot.and_then(|s| s.format.as_ref()));
        if detected != expected {
            let v = Violation::new(expected.as_str(), detected.as_str());
            fail(format!("format category: {v}"));
        }
    }
    if let Some(predicate) = contract.comment() {
        let comment = snapshot.and_then(|s| s.comment.as_deref());
        if let Err(v) = predicate.apply(comment) {
            fail(format!("comment: {v}"));
        }
    }

    // Value check
    let check = contract.value_check();
    let name = check.name();
    match (check, snapshot) {
        (ValueCheck::Exists, _) => {}
        (ValueCheck::Empty, None) => {}
        (_, None) => fail(format!("{name} check: cell is <EMPTY>")),
        (_, Some(snapshot)) => {
            let violations = match run(check, Actual::from_content(&snapshot.content)) {
                Some(violations) => violations,
                None => match &snapshot.content {
                    CellContent::Formula(formula) => {
                        let computed = formula.evaluate();
                        match run(check, Actual::from_computed(&computed)) {
                            Some(violations) => violations,
                            None => {
                                fail(format!(
                                    "{name} check: formula '{}' computed unsupported type {}",
                                    formula.text(),
                                    computed.kind()
                                ));
                                Vec::new()
                            }
                        }
                    }
                    other => {
                        fail(unsupported(name, other.kind()));
                        Vec::new()
                    }
                },
            };
            for v in violations {
                fail(format!("{name}: {v}"));
            }
        }
    }

    let recorded = log.len() - before;
    log::debug!("{sheet}!{contract}: {recorded} failure(s)");
    recorded
}

/// Only ASCII control characters and spaces count as blank; NBSP and other
/// Unicode spaces are content.
fn is_blank_text(s: &str) -> bool {
    s.trim_matches(|c: char| c <= ' ').is_empty()
}

fn unsupported(name: &str, kind: CellKind) -> String {
    format!("{name} check: unsupported cell type {kind}")
}
