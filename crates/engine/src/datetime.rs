//! Date/time checks over spreadsheet serial numbers.

use std::fmt;

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, Timelike};
use sheetcheck_predicate::Violation;

const MILLIS_PER_DAY: f64 = 86_400_000.0;

/// Convert a 1900-system serial (whole days, fraction = time of day) to a
/// timestamp rounded to the millisecond. Negative, non-finite and
/// out-of-range serials have no timestamp.
///
/// Serial 1 is 1900-01-01. The 1900 system counts a 1900-02-29 that never
/// existed, so serials below 61 are one day behind the rest: 59 is
/// 1900-02-28 and both 60 and 61 land on 1900-03-01.
pub fn serial_to_datetime(serial: f64) -> Option<NaiveDateTime> {
    if !serial.is_finite() || serial < 0.0 {
        return None;
    }
    let millis = (serial * MILLIS_PER_DAY).round();
    if millis > i64::MAX as f64 {
        return None;
    }
    let epoch_day = if serial.floor() < 61.0 { 31 } else { 30 };
    let epoch = NaiveDate::from_ymd_opt(1899, 12, epoch_day)?.and_hms_opt(0, 0, 0)?;
    epoch.checked_add_signed(Duration::try_milliseconds(millis as i64)?)
}

/// Expectations about a date/time cell. Every configured part is checked on
/// its own and reports its own violation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DateTimeCheck {
    before: Option<NaiveDateTime>,
    after: Option<NaiveDateTime>,
    equal_to: Option<NaiveDateTime>,
    close_to: Option<(NaiveDateTime, Duration)>,
    year: Option<i32>,
    month: Option<u32>,
    day: Option<u32>,
    hour: Option<u32>,
    minute: Option<u32>,
    second: Option<u32>,
}

impl DateTimeCheck {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn before(mut self, value: NaiveDateTime) -> Self {
        self.before = Some(value);
        self
    }

    pub fn after(mut self, value: NaiveDateTime) -> Self {
        self.after = Some(value);
        self
    }

    pub fn equal_to(mut self, value: NaiveDateTime) -> Self {
        self.equal_to = Some(value);
        self
    }

    pub fn close_to(mut self, value: NaiveDateTime, tolerance: Duration) -> Self {
        self.close_to = Some((value, tolerance.abs()));
        self
    }

    pub fn year(mut self, year: i32) -> Self {
        self.year = Some(year);
        self
    }

    /// 1-based month.
    pub fn month(mut self, month: u32) -> Self {
        self.month = Some(month);
        self
    }

    pub fn day(mut self, day: u32) -> Self {
        self.day = Some(day);
        self
    }

    pub fn hour(mut self, hour: u32) -> Self {
        self.hour = Some(hour);
        self
    }

    pub fn minute(mut self, minute: u32) -> Self {
        self.minute = Some(minute);
        self
    }

    pub fn second(mut self, second: u32) -> Self {
        self.second = Some(second);
        self
    }

    /// Check a serial. Returns one violation per failed part.
    pub fn check(&self, serial: f64) -> Vec<Violation> {
        let Some(actual) = serial_to_datetime(serial) else {
            return vec![Violation::new(
                "a valid date/time serial",
                format!("{serial:?}"),
            )];
        };
        self.check_datetime(actual)
    }

    pub fn check_datetime(&self, actual: NaiveDateTime) -> Vec<Violation> {
        let mut violations = Vec::new();
        let mut expect = |ok: bool, expected: String, actual: String| {
            if !ok {
                violations.push(Violation::new(expected, actual));
            }
        };

        if let Some(limit) = self.before {
            expect(actual < limit, format!("before {limit}"), actual.to_string());
        }
        if let Some(limit) = self.after {
            expect(actual > limit, format!("after {limit}"), actual.to_string());
        }
        if let Some(expected) = self.equal_to {
            expect(actual == expected, format!("== {expected}"), actual.to_string());
        }
        if let Some((expected, tolerance)) = self.close_to {
            let diff = if actual >= expected {
                actual - expected
            } else {
                expected - actual
            };
            expect(
                diff <= tolerance,
                format!("~{expected}±{tolerance}"),
                actual.to_string(),
            );
        }
        if let Some(year) = self.year {
            expect(actual.year() == year, format!("year {year}"), actual.year().to_string());
        }
        if let Some(month) = self.month {
            expect(
                actual.month() == month,
                format!("month {month}"),
                actual.month().to_string(),
            );
        }
        if let Some(day) = self.day {
            expect(actual.day() == day, format!("day {day}"), actual.day().to_string());
        }
        if let Some(hour) = self.hour {
            expect(actual.hour() == hour, format!("hour {hour}"), actual.hour().to_string());
        }
        if let Some(minute) = self.minute {
            expect(
                actual.minute() == minute,
                format!("minute {minute}"),
                actual.minute().to_string(),
            );
        }
        if let Some(second) = self.second {
            expect(
                actual.second() == second,
                format!("second {second}"),
                actual.second().to_string(),
            );
        }
        violations
    }
}

impl fmt::Display for DateTimeCheck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();
        if let Some(v) = self.before {
            parts.push(format!("before {v}"));
        }
        if let Some(v) = self.after {
            parts.push(format!("after {v}"));
        }
        if let Some(v) = self.equal_to {
            parts.push(format!("== {v}"));
        }
        if let Some((v, tolerance)) = self.close_to {
            parts.push(format!("~{v}±{tolerance}"));
        }
        if let Some(v) = self.year {
            parts.push(format!("year {v}"));
        }
        if let Some(v) = self.month {
            parts.push(format!("month {v}"));
        }
        if let Some(v) = self.day {
            parts.push(format!("day {v}"));
        }
        if let Some(v) = self.hour {
            parts.push(format!("hour {v}"));
        }
        if let Some(v) = self.minute {
            parts.push(format!("minute {v}"));
        }
        if let Some(v) = self.second {
            parts.push(format!("second {v}"));
        }
        if parts.is_empty() {
            f.write_str("any date/time")
        } else {
            f.write_str(&parts.join(", "))
        }
    }
}
