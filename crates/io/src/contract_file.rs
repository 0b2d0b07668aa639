//! Contract files: sheets and cell contracts declared in TOML or JSON.
//!
//! ```toml
//! [[sheet]]
//! name = "Summary"
//!
//! [[sheet.cell]]
//! at = "B2"
//! number = { ">" = 0 }
//! format = { has = "%" }
//! category = "percentage"
//!
//! [[sheet]]
//! index = 1
//!
//! [[sheet.cell]]
//! at = "A1"
//! text = { eq = "Total", ignoreCase = true }
//! ```
//!
//! Predicates use the same wire format as [`sheetcheck_engine::predicate`].

use std::path::Path;

use chrono::NaiveDateTime;
use serde::Deserialize;
use sheetcheck_engine::predicate::{decode_number, decode_text, CodecError, TextPredicate, WireObject};
use sheetcheck_engine::{
    CellAddress, CellContract, DateTimeCheck, Document, FormatCategory, Session, SheetRef,
    ValueCheck,
};

use crate::error::ContractFileError;
use crate::SheetContracts;

// ---------------------------------------------------------------------------
// File shape
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ContractFileSpec {
    #[serde(rename = "sheet", default)]
    pub sheets: Vec<SheetSpec>,
}

/// One sheet selector and its cells. Exactly one of `name` and `index`.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SheetSpec {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub index: Option<usize>,
    #[serde(rename = "cell", default)]
    pub cells: Vec<CellSpec>,
}

/// One cell contract. At most one value check; without one the cell only
/// has to exist.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CellSpec {
    pub at: String,
    #[serde(default)]
    pub number: Option<WireObject>,
    #[serde(default)]
    pub text: Option<WireObject>,
    #[serde(default)]
    pub boolean: Option<bool>,
    #[serde(default)]
    pub formula: Option<WireObject>,
    #[serde(default)]
    pub error: Option<WireObject>,
    #[serde(default)]
    pub empty: Option<bool>,
    #[serde(default)]
    pub datetime: Option<DateTimeSpec>,
    #[serde(default)]
    pub format: Option<WireObject>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub comment: Option<WireObject>,
}

/// Timestamps are ISO 8601 strings without offset, e.g. `"2024-01-31T12:00:00"`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DateTimeSpec {
    #[serde(default)]
    pub before: Option<NaiveDateTime>,
    #[serde(default)]
    pub after: Option<NaiveDateTime>,
    #[serde(default)]
    pub equal: Option<NaiveDateTime>,
    #[serde(default)]
    pub year: Option<i32>,
    #[serde(default)]
    pub month: Option<u32>,
    #[serde(default)]
    pub day: Option<u32>,
    #[serde(default)]
    pub hour: Option<u32>,
    #[serde(default)]
    pub minute: Option<u32>,
    #[serde(default)]
    pub second: Option<u32>,
}

impl DateTimeSpec {
    fn to_check(&self) -> DateTimeCheck {
        let mut check = DateTimeCheck::new();
        if let Some(v) = self.before {
            check = check.before(v);
        }
        if let Some(v) = self.after {
            check = check.after(v);
        }
        if let Some(v) = self.equal {
            check = check.equal_to(v);
        }
        if let Some(v) = self.year {
            check = check.year(v);
        }
        if let Some(v) = self.month {
            check = check.month(v);
        }
        if let Some(v) = self.day {
            check = check.day(v);
        }
        if let Some(v) = self.hour {
            check = check.hour(v);
        }
        if let Some(v) = self.minute {
            check = check.minute(v);
        }
        if let Some(v) = self.second {
            check = check.second(v);
        }
        check
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

impl ContractFileSpec {
    pub fn validate(&self) -> Result<(), ContractFileError> {
        self.build().map(|_| ())
    }

    /// Validate and turn every entry into a contract.
    pub fn build(&self) -> Result<ContractFile, ContractFileError> {
        let sheets = self
            .sheets
            .iter()
            .enumerate()
            .map(|(i, sheet)| sheet.build(i))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ContractFile { sheets })
    }
}

impl SheetSpec {
    fn build(&self, position: usize) -> Result<SheetContracts, ContractFileError> {
        let sheet = match (&self.name, self.index) {
            (Some(name), None) => SheetRef::Name(name.clone()),
            (None, Some(index)) => SheetRef::Index(index),
            _ => return Err(ContractFileError::SheetSelector { sheet: position }),
        };
        let contracts = self
            .cells
            .iter()
            .map(|cell| cell.build(position))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(SheetContracts { sheet, contracts })
    }
}

impl CellSpec {
    fn value_checks(&self) -> Vec<&'static str> {
        [
            ("number", self.number.is_some()),
            ("text", self.text.is_some()),
            ("boolean", self.boolean.is_some()),
            ("formula", self.formula.is_some()),
            ("error", self.error.is_some()),
            ("empty", self.empty.is_some()),
            ("datetime", self.datetime.is_some()),
        ]
        .into_iter()
        .filter_map(|(name, present)| present.then_some(name))
        .collect()
    }

    fn build(&self, sheet: usize) -> Result<CellContract, ContractFileError> {
        let address = CellAddress::parse(&self.at)
            .map_err(|error| ContractFileError::Address { sheet, error })?;

        let checks = self.value_checks();
        if checks.len() > 1 {
            return Err(ContractFileError::ValueChecks {
                sheet,
                at: self.at.clone(),
                checks,
            });
        }
        if self.empty == Some(false) {
            return Err(ContractFileError::EmptyFlag {
                sheet,
                at: self.at.clone(),
            });
        }

        let text = |field: &'static str, object: &WireObject| -> Result<TextPredicate, ContractFileError> {
            decode_text(object.clone()).map_err(|error| self.predicate_error(sheet, field, error))
        };

        let value = if let Some(object) = &self.number {
            let predicate = decode_number(object.clone())
                .map_err(|error| self.predicate_error(sheet, "number", error))?;
            ValueCheck::Number(predicate)
        } else if let Some(object) = &self.text {
            ValueCheck::Text(text("text", object)?)
        } else if let Some(expected) = self.boolean {
            ValueCheck::Boolean(expected)
        } else if let Some(object) = &self.formula {
            ValueCheck::FormulaText(text("formula", object)?)
        } else if let Some(object) = &self.error {
            ValueCheck::ErrorText(text("error", object)?)
        } else if let Some(spec) = &self.datetime {
            ValueCheck::DateTime(spec.to_check())
        } else if self.empty.is_some() {
            ValueCheck::Empty
        } else {
            ValueCheck::Exists
        };

        let mut contract = CellContract::new(address, value);
        if let Some(object) = &self.format {
            contract = contract.with_format(text("format", object)?);
        }
        if let Some(name) = &self.category {
            let category: FormatCategory =
                name.parse().map_err(|_| ContractFileError::Category {
                    sheet,
                    at: self.at.clone(),
                    name: name.clone(),
                })?;
            contract = contract.with_format_category(category);
        }
        if let Some(object) = &self.comment {
            contract = contract.with_comment(text("comment", object)?);
        }
        Ok(contract)
    }

    fn predicate_error(&self, sheet: usize, field: &'static str, error: CodecError) -> ContractFileError {
        ContractFileError::Predicate {
            sheet,
            at: self.at.clone(),
            field,
            error,
        }
    }
}

// ---------------------------------------------------------------------------
// Validated file
// ---------------------------------------------------------------------------

/// A parsed and validated contract file.
#[derive(Debug, Clone, PartialEq)]
pub struct ContractFile {
    sheets: Vec<SheetContracts>,
}

impl ContractFile {
    pub fn from_toml(input: &str) -> Result<Self, ContractFileError> {
        let spec: ContractFileSpec =
            toml::from_str(input).map_err(|e| ContractFileError::Parse(e.to_string()))?;
        spec.build()
    }

    pub fn from_json(input: &str) -> Result<Self, ContractFileError> {
        let spec: ContractFileSpec =
            serde_json::from_str(input).map_err(|e| ContractFileError::Parse(e.to_string()))?;
        spec.build()
    }

    /// Read a contract file; `.json` files are JSON, anything else TOML.
    pub fn from_path(path: &Path) -> Result<Self, ContractFileError> {
        let input = std::fs::read_to_string(path)
            .map_err(|e| ContractFileError::Io(format!("{}: {e}", path.display())))?;
        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        if is_json {
            Self::from_json(&input)
        } else {
            Self::from_toml(&input)
        }
    }

    pub fn sheets(&self) -> &[SheetContracts] {
        &self.sheets
    }

    pub fn contract_count(&self) -> usize {
        self.sheets.iter().map(|s| s.contracts.len()).sum()
    }

    /// Register every contract, sheet by sheet. Returns the number of
    /// contracts handed to the session.
    pub fn apply<D: Document>(&self, session: &mut Session<D>) -> usize {
        let registered: usize = self.sheets.iter().map(|sheet| sheet.register(session)).sum();
        log::debug!("applied {registered} contract(s) from file");
        registered
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sheetcheck_engine::predicate::NumberPredicate;

    const SAMPLE: &str = r#"
[[sheet]]
name = "Summary"

[[sheet.cell]]
at = "B2"
number = { ">" = 0 }
format = { has = "%" }
category = "percentage"

[[sheet.cell]]
at = "C3"
empty = true

[[sheet]]
index = 1

[[sheet.cell]]
at = "a1"
text = { eq = "Total", ignoreCase = true }
comment = { like = "^ok" }

[[sheet.cell]]
at = "A2"
"#;

    #[test]
    fn parse_valid_toml() {
        let file = ContractFile::from_toml(SAMPLE).unwrap();
        assert_eq!(file.sheets().len(), 2);
        assert_eq!(file.contract_count(), 4);

        let summary = &file.sheets()[0];
        assert_eq!(summary.sheet, SheetRef::Name("Summary".into()));
        let b2 = &summary.contracts[0];
        assert_eq!(b2.address().to_string(), "B2");
        assert_eq!(
            b2.value_check(),
            &ValueCheck::Number(NumberPredicate::GreaterThan(0.0))
        );
        assert_eq!(b2.format(), Some(&TextPredicate::containing("%")));
        assert_eq!(b2.format_category(), Some(FormatCategory::Percentage));
        assert_eq!(summary.contracts[1].value_check(), &ValueCheck::Empty);

        let second = &file.sheets()[1];
        assert_eq!(second.sheet, SheetRef::Index(1));
        assert_eq!(second.contracts[0].address().to_string(), "A1");
        assert!(second.contracts[0].comment().is_some());
        assert_eq!(second.contracts[1].value_check(), &ValueCheck::Exists);
    }

    #[test]
    fn parse_valid_json() {
        let json = r#"{"sheet": [{"name": "Data", "cell": [
            {"at": "A1", "number": {"≈": "2.0±0.01"}},
            {"at": "A2", "boolean": false},
            {"at": "A3", "datetime": {"equal": "2024-01-31T12:00:00", "year": 2024}}
        ]}]}"#;
        let file = ContractFile::from_json(json).unwrap();
        let contracts = &file.sheets()[0].contracts;
        assert_eq!(
            contracts[0].value_check(),
            &ValueCheck::Number(NumberPredicate::close_to(2.0, 0.01).unwrap())
        );
        assert_eq!(contracts[1].value_check(), &ValueCheck::Boolean(false));
        assert!(matches!(contracts[2].value_check(), ValueCheck::DateTime(_)));
    }

    #[test]
    fn rejects_missing_or_double_sheet_selector() {
        let neither = "[[sheet]]\n[[sheet.cell]]\nat = \"A1\"\n";
        assert!(matches!(
            ContractFile::from_toml(neither),
            Err(ContractFileError::SheetSelector { sheet: 0 })
        ));

        let both = "[[sheet]]\nname = \"X\"\nindex = 0\n";
        assert!(matches!(
            ContractFile::from_toml(both),
            Err(ContractFileError::SheetSelector { sheet: 0 })
        ));
    }

    #[test]
    fn rejects_two_value_checks() {
        let input = r#"
[[sheet]]
index = 0
[[sheet.cell]]
at = "A1"
number = { "=" = 1 }
boolean = true
"#;
        match ContractFile::from_toml(input) {
            Err(ContractFileError::ValueChecks { at, checks, .. }) => {
                assert_eq!(at, "A1");
                assert_eq!(checks, vec!["number", "boolean"]);
            }
            other => panic!("expected value check error, got {other:?}"),
        }
    }

    #[test]
    fn rejects_bad_address_predicate_and_category() {
        let bad_address = "[[sheet]]\nindex = 0\n[[sheet.cell]]\nat = \" \"\n";
        assert!(matches!(
            ContractFile::from_toml(bad_address),
            Err(ContractFileError::Address { .. })
        ));

        let bad_predicate = "[[sheet]]\nindex = 0\n[[sheet.cell]]\nat = \"A1\"\nnumber = { \"!=\" = 1 }\n";
        match ContractFile::from_toml(bad_predicate) {
            Err(ContractFileError::Predicate { field, error, .. }) => {
                assert_eq!(field, "number");
                assert_eq!(error, CodecError::UnknownDiscriminator("!=".into()));
            }
            other => panic!("expected predicate error, got {other:?}"),
        }

        let bad_category = "[[sheet]]\nindex = 0\n[[sheet.cell]]\nat = \"A1\"\ncategory = \"money\"\n";
        assert!(matches!(
            ContractFile::from_toml(bad_category),
            Err(ContractFileError::Category { .. })
        ));
    }

    #[test]
    fn rejects_unknown_keys_and_false_empty() {
        let unknown = "[[sheet]]\nindex = 0\n[[sheet.cell]]\nat = \"A1\"\nnumbr = { \"=\" = 1 }\n";
        assert!(matches!(
            ContractFile::from_toml(unknown),
            Err(ContractFileError::Parse(_))
        ));

        let false_empty = "[[sheet]]\nindex = 0\n[[sheet.cell]]\nat = \"A1\"\nempty = false\n";
        assert!(matches!(
            ContractFile::from_toml(false_empty),
            Err(ContractFileError::EmptyFlag { .. })
        ));
    }

    #[test]
    fn empty_file_is_valid() {
        let file = ContractFile::from_toml("").unwrap();
        assert!(file.sheets().is_empty());
        assert!(ContractFileSpec::default().validate().is_ok());
    }
}
