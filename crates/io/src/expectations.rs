//! Expectation workbooks: a spreadsheet whose cells are the expected values
//! of another document.
//!
//! Every non-empty cell becomes one [`CellContract`] at the same address.
//! The cell comment holds comma separated tags that pick the predicate:
//!
//! | cell | tags | contract |
//! |---|---|---|
//! | number | `=` `>` `>=` `<` `<=` | number comparison, `=` by default |
//! | number in a date format | | date/time equality |
//! | text | `equalTo` `containing` `matching` | text check, equality by default |
//! | boolean | | boolean check |
//! | error | | error text equality |
//! | formula | | formula text equality |
//! | blank | `empty` | empty check, exists otherwise |
//!
//! A number format other than `General` or `@` is asserted too; the tags
//! `format-equalTo`, `format-containing` and `format-matching` pick how.
//! Sheets named `#<n>` select the document sheet by index.

use std::collections::BTreeSet;
use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;
use sheetcheck_engine::datetime::serial_to_datetime;
use sheetcheck_engine::format::looks_like_date_format;
use sheetcheck_engine::predicate::{
    EqualsText, MatchesPattern, NumberPredicate, PredicateError, TextPredicate,
};
use sheetcheck_engine::{
    Cell, CellAddress, CellContract, CellValue, DateTimeCheck, Document, NumberFormat, Session,
    Sheet, SheetRef, ValueCheck, Workbook,
};

use crate::error::ExpectationsError;
use crate::SheetContracts;

static INDEX_SHEET_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^#(?P<number>\d+)$").expect("valid regex"));

/// Lowercased, trimmed comment tags.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Tags(BTreeSet<String>);

impl Tags {
    fn parse(comment: Option<&str>) -> Self {
        let tags = comment
            .unwrap_or("")
            .split(',')
            .map(|tag| tag.trim().to_lowercase())
            .filter(|tag| !tag.is_empty())
            .collect();
        Self(tags)
    }

    fn has(&self, tag: &str) -> bool {
        self.0.contains(tag)
    }
}

/// Read the expectations workbook at `path` and turn it into contracts.
pub fn read_expectations(path: &Path) -> Result<Vec<SheetContracts>, ExpectationsError> {
    let workbook = crate::xlsx::open(path)?;
    expectations_from_workbook(&workbook)
}

/// Contracts for every sheet of an already loaded expectations workbook.
pub fn expectations_from_workbook(
    workbook: &Workbook,
) -> Result<Vec<SheetContracts>, ExpectationsError> {
    workbook.sheets().iter().map(sheet_expectations).collect()
}

/// Select each expectations sheet in `session` and register its contracts.
/// Returns the number of contracts registered.
pub fn apply_expectations<D: Document>(
    session: &mut Session<D>,
    workbook: &Workbook,
) -> Result<usize, ExpectationsError> {
    let registered: usize = expectations_from_workbook(workbook)?
        .iter()
        .map(|sheet| sheet.register(session))
        .sum();
    log::debug!("applied {registered} expectation(s)");
    Ok(registered)
}

fn sheet_expectations(sheet: &Sheet) -> Result<SheetContracts, ExpectationsError> {
    let contracts = sheet
        .cells_iter()
        .map(|(address, cell)| {
            cell_contract(address, cell).map_err(|error| ExpectationsError::Pattern {
                sheet: sheet.name.clone(),
                address: address.to_string(),
                error,
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(SheetContracts {
        sheet: sheet_ref(&sheet.name),
        contracts,
    })
}

fn sheet_ref(name: &str) -> SheetRef {
    INDEX_SHEET_NAME
        .captures(name)
        .and_then(|caps| caps["number"].parse::<usize>().ok())
        .map(SheetRef::Index)
        .unwrap_or_else(|| SheetRef::Name(name.to_string()))
}

fn cell_contract(address: CellAddress, cell: &Cell) -> Result<CellContract, PredicateError> {
    let tags = Tags::parse(cell.comment.as_deref());
    let contract = CellContract::new(address, ValueCheck::Exists);

    let contract = match &cell.value {
        CellValue::Text(text) => contract.text(text_predicate(text, &tags, "")?),
        CellValue::Number(n) => match date_value(*n, cell.format.as_ref()) {
            Some(check) => contract.date_time(check),
            None => contract.number(number_predicate(*n, &tags)),
        },
        CellValue::Boolean(b) => contract.boolean(*b),
        CellValue::Error(code) => contract.error_text(loose_equals(code)),
        CellValue::Formula { source, .. } => contract.formula_text(loose_equals(source)),
        CellValue::Empty if tags.has("empty") => contract.empty(),
        CellValue::Empty => contract.exists(),
    };

    match cell.format.as_ref().map(|f| f.code.as_str()) {
        Some(code) if code != "General" && code != "@" => {
            Ok(contract.with_format(text_predicate(code, &tags, "format-")?))
        }
        _ => Ok(contract),
    }
}

fn number_predicate(expected: f64, tags: &Tags) -> NumberPredicate {
    if tags.has("=") {
        NumberPredicate::EqualTo(expected)
    } else if tags.has(">") {
        NumberPredicate::GreaterThan(expected)
    } else if tags.has(">=") {
        NumberPredicate::GreaterOrEqual(expected)
    } else if tags.has("<") {
        NumberPredicate::LessThan(expected)
    } else if tags.has("<=") {
        NumberPredicate::LessOrEqual(expected)
    } else {
        NumberPredicate::EqualTo(expected)
    }
}

/// Text predicate picked by `<prefix>equalto`, `<prefix>containing` or
/// `<prefix>matching`.
fn text_predicate(value: &str, tags: &Tags, prefix: &str) -> Result<TextPredicate, PredicateError> {
    if tags.has(&format!("{prefix}equalto")) {
        Ok(loose_equals(value))
    } else if tags.has(&format!("{prefix}containing")) {
        Ok(TextPredicate::containing(value).ignore_case())
    } else if tags.has(&format!("{prefix}matching")) {
        Ok(MatchesPattern::new(value)?.ignore_case().dot_all().into())
    } else {
        Ok(loose_equals(value))
    }
}

fn loose_equals(value: &str) -> TextPredicate {
    EqualsText::new(value).ignore_case().ignore_newlines().into()
}

/// Numbers shown in a date format are expected as timestamps.
fn date_value(serial: f64, format: Option<&NumberFormat>) -> Option<DateTimeCheck> {
    let format = format?;
    if !looks_like_date_format(format.builtin_id, &format.code) {
        return None;
    }
    serial_to_datetime(serial).map(|value| DateTimeCheck::new().equal_to(value))
}
