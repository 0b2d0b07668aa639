//! Numeric predicates.
//!
//! A `NumberPredicate` is an immutable value: it can be cloned, compared,
//! and applied to any number of actuals without changing.

use std::fmt;

use crate::error::PredicateError;
use crate::violation::{render_number, Violation};

// ============================================================================
// Operands
// ============================================================================

/// Expected value plus a non-negative tolerance.
///
/// The same shape backs both closeness predicates; for `CloseToPercent` the
/// tolerance is a percentage of `expected`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Closeness {
    expected: f64,
    tolerance: f64,
}

impl Closeness {
    pub fn new(expected: f64, tolerance: f64) -> Result<Self, PredicateError> {
        // Written as a negated >= so NaN is rejected too.
        if !(tolerance >= 0.0) {
            return Err(PredicateError::InvalidTolerance(tolerance));
        }
        Ok(Self { expected, tolerance })
    }

    pub fn expected(&self) -> f64 {
        self.expected
    }

    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    fn within_offset(&self, actual: f64) -> bool {
        actual == self.expected || (actual - self.expected).abs() <= self.tolerance
    }

    fn within_percent(&self, actual: f64) -> bool {
        let allowed = (self.expected * self.tolerance / 100.0).abs();
        actual == self.expected || (actual - self.expected).abs() <= allowed
    }
}

/// Interval `from..to` with independently exclusive endpoints.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Range {
    from: f64,
    to: f64,
    exclusive_from: bool,
    exclusive_to: bool,
}

impl Range {
    pub fn new(
        from: f64,
        to: f64,
        exclusive_from: bool,
        exclusive_to: bool,
    ) -> Result<Self, PredicateError> {
        if to < from {
            return Err(PredicateError::InvertedRange { from, to });
        }
        Ok(Self {
            from,
            to,
            exclusive_from,
            exclusive_to,
        })
    }

    /// Both endpoints inclusive: `[from..to]`.
    pub fn closed(from: f64, to: f64) -> Result<Self, PredicateError> {
        Self::new(from, to, false, false)
    }

    pub fn from(&self) -> f64 {
        self.from
    }

    pub fn to(&self) -> f64 {
        self.to
    }

    pub fn exclusive_from(&self) -> bool {
        self.exclusive_from
    }

    pub fn exclusive_to(&self) -> bool {
        self.exclusive_to
    }

    pub fn contains(&self, actual: f64) -> bool {
        let above = if self.exclusive_from {
            actual > self.from
        } else {
            actual >= self.from
        };
        let below = if self.exclusive_to {
            actual < self.to
        } else {
            actual <= self.to
        };
        above && below
    }

    /// True when `actual` falls strictly outside the interval. An exclusive
    /// endpoint counts as outside, so `(1..5)` excludes both 1 and 5.
    pub fn excludes(&self, actual: f64) -> bool {
        let left = if self.exclusive_from {
            actual <= self.from
        } else {
            actual < self.from
        };
        let right = if self.exclusive_to {
            actual >= self.to
        } else {
            actual > self.to
        };
        left || right
    }
}

impl fmt::Display for Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}..{}{}",
            if self.exclusive_from { '(' } else { '[' },
            render_number(self.from),
            render_number(self.to),
            if self.exclusive_to { ')' } else { ']' },
        )
    }
}

// ============================================================================
// Predicate
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NumberPredicate {
    EqualTo(f64),
    GreaterThan(f64),
    GreaterOrEqual(f64),
    LessThan(f64),
    LessOrEqual(f64),
    /// `|actual - expected| <= tolerance`
    CloseToOffset(Closeness),
    /// `|actual - expected| <= |expected * percent / 100|`
    CloseToPercent(Closeness),
    WithinRange(Range),
    OutsideRange(Range),
}

impl NumberPredicate {
    pub fn close_to(expected: f64, tolerance: f64) -> Result<Self, PredicateError> {
        Closeness::new(expected, tolerance).map(Self::CloseToOffset)
    }

    pub fn close_to_percent(expected: f64, percent: f64) -> Result<Self, PredicateError> {
        Closeness::new(expected, percent).map(Self::CloseToPercent)
    }

    /// Inclusive on both ends.
    pub fn within(from: f64, to: f64) -> Result<Self, PredicateError> {
        Range::closed(from, to).map(Self::WithinRange)
    }

    /// Passes for values strictly below `from` or strictly above `to`.
    pub fn outside(from: f64, to: f64) -> Result<Self, PredicateError> {
        Range::closed(from, to).map(Self::OutsideRange)
    }

    pub fn test(&self, actual: f64) -> bool {
        match self {
            Self::EqualTo(expected) => actual == *expected,
            Self::GreaterThan(threshold) => actual > *threshold,
            Self::GreaterOrEqual(threshold) => actual >= *threshold,
            Self::LessThan(threshold) => actual < *threshold,
            Self::LessOrEqual(threshold) => actual <= *threshold,
            Self::CloseToOffset(c) => c.within_offset(actual),
            Self::CloseToPercent(c) => c.within_percent(actual),
            Self::WithinRange(r) => r.contains(actual),
            Self::OutsideRange(r) => r.excludes(actual),
        }
    }

    /// Apply to `actual`. Pure: no state is read or written.
    pub fn apply(&self, actual: f64) -> Result<(), Violation> {
        if self.test(actual) {
            Ok(())
        } else {
            Err(Violation::new(self.to_string(), render_number(actual)))
        }
    }
}

impl fmt::Display for NumberPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EqualTo(v) => write!(f, "== {}", render_number(*v)),
            Self::GreaterThan(v) => write!(f, "> {}", render_number(*v)),
            Self::GreaterOrEqual(v) => write!(f, ">= {}", render_number(*v)),
            Self::LessThan(v) => write!(f, "< {}", render_number(*v)),
            Self::LessOrEqual(v) => write!(f, "<= {}", render_number(*v)),
            Self::CloseToOffset(c) => write!(
                f,
                "~{}±{}",
                render_number(c.expected),
                render_number(c.tolerance)
            ),
            Self::CloseToPercent(c) => write!(
                f,
                "~{}±{}%",
                render_number(c.expected),
                render_number(c.tolerance)
            ),
            Self::WithinRange(r) => write!(f, "∈ {r}"),
            Self::OutsideRange(r) => write!(f, "∉ {r}"),
        }
    }
}
