use std::cell::Cell;
use std::rc::Rc;

use sheetcheck_engine::predicate::{
    decode_number, number_from_json, EqualsText, NumberPredicate, Range, TextPredicate,
};
use sheetcheck_engine::{
    CellAddress, CellContent, CellContract, CellSnapshot, CellValue, ComputedValue, Document,
    DocumentError, FormatCategory, FormulaCell, NumberFormat, Session, SessionError, SheetRef,
    Sheet, Workbook,
};

fn addr(s: &str) -> CellAddress {
    CellAddress::parse(s).unwrap()
}

fn at(s: &str) -> CellContract {
    CellContract::at(s).unwrap()
}

/// Two-sheet document: literals on "Values", formulas on "Calc".
fn sample_workbook() -> Workbook {
    let mut values = Sheet::new("Values");
    values.set_value(addr("A1"), "2.0");
    values.set_value(addr("A2"), "Hello\r\nWorld");
    values.set_value(addr("A3"), "TRUE");
    values.set_value(addr("A4"), "0.25");
    values.set_format(addr("A4"), NumberFormat::builtin(9, "0%"));
    values.set_comment(addr("A4"), "ratio");

    let mut calc = Sheet::new("Calc");
    calc.set_cell_value(
        addr("B1"),
        CellValue::formula("SUM(Values!A1:A1)", ComputedValue::Number(2.0)),
    );
    calc.set_cell_value(
        addr("B2"),
        CellValue::formula("1/0", ComputedValue::Error("#DIV/0!".into())),
    );

    Workbook::from_sheets(vec![values, calc])
}

fn failure_lines(err: &SessionError) -> Vec<String> {
    match err {
        SessionError::Failed(aggregate) => {
            aggregate.failures().iter().map(|f| f.to_string()).collect()
        }
        SessionError::Release { failures, .. } => failures.iter().map(|f| f.to_string()).collect(),
    }
}

#[test]
fn end_to_end_numeric_scenario() {
    let mut session = Session::open(sample_workbook());

    session.register(at("A1").number(NumberPredicate::EqualTo(2.0)));
    assert!(session.failures().is_empty());

    session.register(at("A1").number(NumberPredicate::EqualTo(3.0)));
    assert_eq!(session.failures().len(), 1);
    let line = session.failures().iter().next().unwrap().to_string();
    assert!(line.contains("3.0"), "{line}");
    assert!(line.contains("2.0"), "{line}");

    session.register(at("A1").number(NumberPredicate::within(1.99, 2.01).unwrap()));
    assert_eq!(session.failures().len(), 1);

    let half_open = number_from_json(r#"{"in":"(1.0..2.0]"}"#).unwrap();
    assert_eq!(
        half_open,
        NumberPredicate::WithinRange(Range::new(1.0, 2.0, true, false).unwrap())
    );
    assert!(half_open.apply(2.0).is_ok());
    assert!(half_open.apply(1.0).is_err());

    let outside = number_from_json(r#"{"notIn":"[1.0..5.0]"}"#).unwrap();
    let violation = outside.apply(3.0).unwrap_err();
    assert!(violation.to_string().contains("∉ [1.0..5.0]"));

    let err = session.close().unwrap_err();
    assert_eq!(
        failure_lines(&err),
        vec!["Values!A1: number: expected [== 3.0] but was 2.0"]
    );
}

#[test]
fn every_check_on_a_contract_runs() {
    let mut session = Session::open(sample_workbook());
    session.register(
        at("A4")
            .number(NumberPredicate::GreaterThan(1.0))
            .with_format_text("0.00%")
            .with_format_category(FormatCategory::Percentage)
            .with_comment(TextPredicate::containing("RAT").ignore_case()),
    );
    let err = session.close().unwrap_err();
    let lines = failure_lines(&err);
    assert_eq!(lines.len(), 2);
    assert!(lines[0].starts_with("Values!A4: cell format: "));
    assert!(lines[1].starts_with("Values!A4: number: "));
}

#[test]
fn text_and_boolean_checks() {
    let mut session = Session::open(sample_workbook());
    session.register_all([
        at("A2").text(
            EqualsText::new("hello  world")
                .ignore_case()
                .ignore_newlines()
                .into(),
        ),
        at("A3").boolean(true),
        at("A2").text(TextPredicate::matching("Hello.World").unwrap()),
    ]);
    let err = session.close().unwrap_err();
    let lines = failure_lines(&err);
    // Without dotall `.` does not cross the line break.
    assert_eq!(lines.len(), 1, "{lines:?}");
    assert!(lines[0].starts_with("Values!A2: text: expected [match 'Hello.World'"));
}

#[test]
fn formula_results_are_checked() {
    let mut session = Session::open(sample_workbook());
    session.select_sheet("calc");
    session.register_all([
        at("B1").number(NumberPredicate::EqualTo(2.0)),
        at("B1").formula_text(TextPredicate::containing("SUM(")),
        at("B2").error_text(TextPredicate::equal_to("#DIV/0!")),
        at("B2").number(NumberPredicate::EqualTo(0.0)),
    ]);
    let err = session.close().unwrap_err();
    assert_eq!(
        failure_lines(&err),
        vec!["Calc!B2: number check: formula '1/0' computed unsupported type ERROR"]
    );
}

#[test]
fn missing_sheet_skips_registrations() {
    let mut session = Session::open(sample_workbook());
    session.register(at("A1").exists());
    session.select_sheet(7usize);
    session.register(at("A1").number(NumberPredicate::EqualTo(99.0)));
    session.register(at("A1").number(NumberPredicate::EqualTo(98.0)));
    session.select_sheet("Values");
    session.register(at("A1").number(NumberPredicate::LessThan(5.0)));

    assert_eq!(session.records().len(), 2);
    assert_eq!(session.records()[0].sheet, SheetRef::Index(0));
    assert_eq!(session.records()[1].sheet, SheetRef::Name("Values".into()));

    let err = session.close().unwrap_err();
    assert_eq!(
        failure_lines(&err),
        vec!["#7: cannot find sheet with index 7"]
    );
}

#[test]
fn absent_cells() {
    let mut session = Session::open(sample_workbook());
    session.register_all([
        at("Z99").empty(),
        at("Z99").exists(),
        at("Z99").text(TextPredicate::equal_to("x")),
    ]);
    let err = session.close().unwrap_err();
    assert_eq!(
        failure_lines(&err),
        vec!["Values!Z99: text check: cell is <EMPTY>"]
    );
}

#[test]
fn clean_session_closes_ok() {
    let mut session = Session::open(sample_workbook());
    session
        .register(at("A1").number(decode_wire(r#"{"≈":"2.0±0.01"}"#)))
        .register(at("A3").boolean(true));
    assert!(session.close().is_ok());
}

fn decode_wire(json: &str) -> NumberPredicate {
    decode_number(serde_json::from_str(json).unwrap()).unwrap()
}

// ============================================================================
// Instrumented document
// ============================================================================

/// One formula cell at A1; counts evaluations and releases.
struct Probe {
    evaluations: Rc<Cell<usize>>,
    closes: Rc<Cell<usize>>,
    fail_close: bool,
}

impl Probe {
    fn new(fail_close: bool) -> (Self, Rc<Cell<usize>>, Rc<Cell<usize>>) {
        let evaluations = Rc::new(Cell::new(0));
        let closes = Rc::new(Cell::new(0));
        let probe = Self {
            evaluations: evaluations.clone(),
            closes: closes.clone(),
            fail_close,
        };
        (probe, evaluations, closes)
    }
}

impl Document for Probe {
    fn sheet_count(&self) -> usize {
        1
    }

    fn sheet_name(&self, index: usize) -> Option<&str> {
        (index == 0).then_some("Probe")
    }

    fn sheet_index(&self, name: &str) -> Option<usize> {
        (name == "Probe").then_some(0)
    }

    fn cell(&self, _sheet: usize, address: CellAddress) -> Option<CellSnapshot<'_>> {
        let counter = self.evaluations.clone();
        match address.to_string().as_str() {
            "A1" => Some(CellSnapshot::new(CellContent::Formula(FormulaCell::new(
                "RAND()",
                move || {
                    counter.set(counter.get() + 1);
                    ComputedValue::Number(0.5)
                },
            )))),
            "A2" => Some(CellSnapshot::new(CellContent::Number(1.0))),
            _ => None,
        }
    }

    fn close(&mut self) -> Result<(), DocumentError> {
        self.closes.set(self.closes.get() + 1);
        if self.fail_close {
            Err(DocumentError::Close("disk went away".into()))
        } else {
            Ok(())
        }
    }
}

#[test]
fn evaluator_only_called_when_needed() {
    let (probe, evaluations, _) = Probe::new(false);
    let mut session = Session::open(probe);
    session.register_all([
        at("A1").formula_text(TextPredicate::equal_to("RAND()")),
        at("A1").exists(),
        at("A2").number(NumberPredicate::EqualTo(1.0)),
    ]);
    assert_eq!(evaluations.get(), 0);

    // Empty checks always look at the computed value.
    session.register(at("A1").empty());
    session.register(at("A1").empty());
    assert_eq!(evaluations.get(), 2);
    assert_eq!(session.failures().len(), 2);
    assert!(session.close().is_err());
}

#[test]
fn close_releases_before_reporting() {
    let (probe, _, closes) = Probe::new(false);
    let mut session = Session::open(probe);
    session.register(at("A2").number(NumberPredicate::EqualTo(2.0)));
    assert!(matches!(session.close(), Err(SessionError::Failed(_))));
    assert_eq!(closes.get(), 1);
}

#[test]
fn release_error_keeps_failures() {
    let (probe, _, closes) = Probe::new(true);
    let mut session = Session::open(probe);
    session.register(at("A2").number(NumberPredicate::EqualTo(2.0)));
    match session.close() {
        Err(SessionError::Release { error, failures }) => {
            assert_eq!(error, DocumentError::Close("disk went away".into()));
            assert_eq!(failures.len(), 1);
        }
        other => panic!("expected release error, got {other:?}"),
    }
    assert_eq!(closes.get(), 1);
}

#[test]
fn drop_releases_once() {
    let (probe, _, closes) = Probe::new(false);
    {
        let mut session = Session::open(probe);
        session.register(at("A2").number(NumberPredicate::EqualTo(1.0)));
    }
    assert_eq!(closes.get(), 1);
}
