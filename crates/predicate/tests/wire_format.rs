// Property tests for the predicate wire format.
// CI: 256 cases (default). Soak: PROPTEST_CASES=10000 cargo test --release

use proptest::prelude::*;
use sheetcheck_predicate::*;

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

fn config() -> ProptestConfig {
    ProptestConfig {
        cases: std::env::var("PROPTEST_CASES")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(256),
        failure_persistence: None,
        ..ProptestConfig::default()
    }
}

// ---------------------------------------------------------------------------
// Generators
// ---------------------------------------------------------------------------

fn arb_finite() -> BoxedStrategy<f64> {
    prop_oneof![
        3 => -1.0e9..1.0e9f64,
        1 => (-1000i32..1000).prop_map(f64::from),
        1 => prop::num::f64::NORMAL,
    ]
    .boxed()
}

/// Quarter steps survive any JSON float parser unchanged.
fn arb_quarter() -> BoxedStrategy<f64> {
    (-1_000_000i32..1_000_000)
        .prop_map(|n| f64::from(n) / 4.0)
        .boxed()
}

fn arb_range(value: BoxedStrategy<f64>) -> impl Strategy<Value = Range> {
    (value.clone(), value, any::<bool>(), any::<bool>()).prop_map(|(a, b, ef, et)| {
        let (from, to) = if a <= b { (a, b) } else { (b, a) };
        Range::new(from, to, ef, et).unwrap()
    })
}

fn arb_number_predicate(value: BoxedStrategy<f64>) -> impl Strategy<Value = NumberPredicate> {
    let tolerance = value.clone().prop_map(f64::abs);
    prop_oneof![
        value.clone().prop_map(NumberPredicate::EqualTo),
        value.clone().prop_map(NumberPredicate::GreaterThan),
        value.clone().prop_map(NumberPredicate::GreaterOrEqual),
        value.clone().prop_map(NumberPredicate::LessThan),
        value.clone().prop_map(NumberPredicate::LessOrEqual),
        (value.clone(), tolerance.clone())
            .prop_map(|(e, t)| NumberPredicate::close_to(e, t).unwrap()),
        (value.clone(), tolerance)
            .prop_map(|(e, p)| NumberPredicate::close_to_percent(e, p).unwrap()),
        arb_range(value.clone()).prop_map(NumberPredicate::WithinRange),
        arb_range(value).prop_map(NumberPredicate::OutsideRange),
    ]
}

fn arb_text_predicate() -> impl Strategy<Value = TextPredicate> {
    let operand = r"[a-zA-Z0-9 ]{0,12}";
    prop_oneof![
        (operand, any::<bool>(), any::<bool>()).prop_map(|(s, ic, nl)| {
            let mut p = EqualsText::new(s);
            if ic {
                p = p.ignore_case();
            }
            if nl {
                p = p.ignore_newlines();
            }
            TextPredicate::from(p)
        }),
        (operand, any::<bool>()).prop_map(|(s, ic)| {
            let p = ContainsText::new(s);
            TextPredicate::from(if ic { p.ignore_case() } else { p })
        }),
        (r"[a-z]{1,4}(\.\*)?[0-9]{0,2}", any::<bool>(), any::<bool>()).prop_map(
            |(s, ic, dot)| {
                let mut p = MatchesPattern::new(s).unwrap();
                if ic {
                    p = p.ignore_case();
                }
                if dot {
                    p = p.dot_all();
                }
                TextPredicate::from(p)
            }
        ),
    ]
}

// ---------------------------------------------------------------------------
// Round trips
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(config())]

    #[test]
    fn number_object_round_trip(p in arb_number_predicate(arb_finite())) {
        let object = encode_number(&p).unwrap();
        prop_assert_eq!(decode_number(object).unwrap(), p);
    }

    #[test]
    fn number_json_round_trip(p in arb_number_predicate(arb_quarter())) {
        let json = number_to_json(&p).unwrap();
        prop_assert_eq!(number_from_json(&json).unwrap(), p);
    }

    #[test]
    fn text_json_round_trip(p in arb_text_predicate()) {
        let json = text_to_json(&p).unwrap();
        prop_assert_eq!(text_from_json(&json).unwrap(), p);
    }

    #[test]
    fn encoder_writes_single_primary_key(p in arb_number_predicate(arb_finite())) {
        let object = encode_number(&p).unwrap();
        prop_assert_eq!(object.len(), 1);
        let primary = ["eq", "gt", "gte", "lt", "lte", "close", "closePercent", "in", "notIn"];
        prop_assert!(primary.contains(&object.fields()[0].0.as_str()));
    }

    #[test]
    fn apply_is_pure(p in arb_number_predicate(arb_finite()), actual in arb_finite()) {
        let first = p.apply(actual);
        let copy = p;
        prop_assert_eq!(p.apply(actual), first);
        prop_assert_eq!(copy, p);
    }

    #[test]
    fn within_and_outside_of_closed_range_partition(r in arb_range(arb_finite()), actual in arb_finite()) {
        let closed = Range::closed(r.from(), r.to()).unwrap();
        let within = NumberPredicate::WithinRange(closed).test(actual);
        let outside = NumberPredicate::OutsideRange(closed).test(actual);
        prop_assert!(within != outside);
    }
}

// ---------------------------------------------------------------------------
// Aliases
// ---------------------------------------------------------------------------

#[test]
fn every_number_alias_decodes_to_its_variant() {
    let cases: &[(&[&str], &str, NumberPredicate)] = &[
        (&["eq", "==", "="], "3.0", NumberPredicate::EqualTo(3.0)),
        (&["gt", ">"], "3.0", NumberPredicate::GreaterThan(3.0)),
        (&["gte", ">="], "3.0", NumberPredicate::GreaterOrEqual(3.0)),
        (&["lt", "<"], "3.0", NumberPredicate::LessThan(3.0)),
        (&["lte", "<="], "3.0", NumberPredicate::LessOrEqual(3.0)),
        (
            &["close", "~", "≈"],
            "\"3.0±0.1\"",
            NumberPredicate::close_to(3.0, 0.1).unwrap(),
        ),
        (
            &["closePercent", "close%", "≈%", "~%"],
            "\"3.0±10%\"",
            NumberPredicate::close_to_percent(3.0, 10.0).unwrap(),
        ),
        (
            &["in", "∈", "within"],
            "\"[1..3]\"",
            NumberPredicate::within(1.0, 3.0).unwrap(),
        ),
        (
            &["notIn", "∉", "out", "beyond"],
            "\"[1..3]\"",
            NumberPredicate::outside(1.0, 3.0).unwrap(),
        ),
    ];
    for (aliases, operand, expected) in cases {
        for alias in *aliases {
            let json = format!("{{\"{alias}\": {operand}}}");
            assert_eq!(&number_from_json(&json).unwrap(), expected, "alias {alias}");
        }
        // Re-encoding always picks the primary name.
        let encoded = number_to_json(expected).unwrap();
        assert!(encoded.starts_with(&format!("{{\"{}\"", aliases[0])), "{encoded}");
    }
}

#[test]
fn every_text_alias_decodes_to_its_variant() {
    for alias in ["eq", "=", "=="] {
        let json = format!("{{\"{alias}\": \"abc\"}}");
        assert_eq!(text_from_json(&json).unwrap(), TextPredicate::equal_to("abc"));
    }
    for alias in ["has", "∋"] {
        let json = format!("{{\"{alias}\": \"abc\"}}");
        assert_eq!(text_from_json(&json).unwrap(), TextPredicate::containing("abc"));
    }
    assert_eq!(
        text_from_json(r#"{"like": "abc"}"#).unwrap(),
        TextPredicate::matching("abc").unwrap()
    );
}

#[test]
fn literal_scenarios() {
    let p = number_from_json(r#"{"eq": 42.0}"#).unwrap();
    assert!(p.apply(42.0).is_ok());
    assert_eq!(p.to_string(), "== 42.0");

    let p = number_from_json(r#"{"close": "100.0±0.5"}"#).unwrap();
    assert!(p.apply(100.3).is_ok());
    assert!(p.apply(100.7).is_err());

    let p = number_from_json(r#"{"in": "[1.0..10.0)"}"#).unwrap();
    assert!(p.apply(10.0).is_err());
    assert!(p.apply(1.0).is_ok());

    let p = text_from_json(r#"{"eq": "Total", "ignoreCase": true}"#).unwrap();
    assert!(p.apply(Some("TOTAL")).is_ok());
}
