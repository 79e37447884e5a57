//! Declarative conditions and the matcher engine.
//!
//! A [`Condition`] is a single testable criterion. The same type is used for
//! HTTP status codes and for values resolved out of a JSON body, so both are
//! compared as [`serde_json::Value`]s.
//!
//! | Variant | Matches when |
//! |---------|--------------|
//! | [`Condition::Exact`] | the value is structurally equal (numbers compare numerically) |
//! | [`Condition::Range`] | the value is a number within `start..=end` |
//! | [`Condition::Pattern`] | the rendered value matches the regex anywhere |
//! | [`Condition::Probe`] | the named query applies to the value and returns true |
//!
//! Integers are compared exactly, over the full `i64` and `u64` ranges. Only
//! a comparison that involves a float goes through `f64`.
//!
//! A missing value is treated as `null`. It only matches `Exact(null)` and
//! [`Probe::Nil`]; range and pattern conditions never match it.

use std::borrow::Cow;
use std::cmp::Ordering;
use std::fmt;
use std::ops::RangeInclusive;

use regex::Regex;
use serde_json::{Number, Value};
use smol_str::SmolStr;

/// Named zero-argument queries a value can be asked.
///
/// Probes are parsed from their name with [`Probe::named`]; a trailing `?`
/// is accepted (`"negative?"`). Names that are not recognized produce
/// [`Probe::Unknown`], which never matches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Probe {
    /// The value is absent or `null`.
    Nil,
    /// The value is an empty string, array or object.
    Empty,
    /// The value is a number below zero.
    Negative,
    /// The value is a number above zero.
    Positive,
    /// The value is a number equal to zero.
    Zero,
    /// The value is an even integer.
    Even,
    /// The value is an odd integer.
    Odd,
    /// 1xx (100-199) status code.
    Informational,
    /// 2xx (200-299) status code.
    Success,
    /// 3xx (300-399) status code.
    Redirection,
    /// 4xx (400-499) status code.
    ClientError,
    /// 5xx (500-599) status code.
    ServerError,
    /// A query nothing responds to.
    Unknown(SmolStr),
}

impl Probe {
    /// Looks up a probe by name.
    pub fn named(name: &str) -> Self {
        match name.strip_suffix('?').unwrap_or(name) {
            "nil" | "null" => Probe::Nil,
            "empty" => Probe::Empty,
            "negative" => Probe::Negative,
            "positive" => Probe::Positive,
            "zero" => Probe::Zero,
            "even" => Probe::Even,
            "odd" => Probe::Odd,
            "informational" => Probe::Informational,
            "success" => Probe::Success,
            "redirection" => Probe::Redirection,
            "client_error" => Probe::ClientError,
            "server_error" => Probe::ServerError,
            _ => Probe::Unknown(SmolStr::new(name)),
        }
    }

    /// Asks the value this probe's query.
    ///
    /// Returns `false` when the query does not apply to the value's type.
    pub fn test(&self, value: Option<&Value>) -> bool {
        let value = match value {
            None | Some(Value::Null) => return matches!(self, Probe::Nil),
            Some(value) => value,
        };
        match self {
            Probe::Nil | Probe::Unknown(_) => false,
            Probe::Empty => match value {
                Value::String(s) => s.is_empty(),
                Value::Array(items) => items.is_empty(),
                Value::Object(fields) => fields.is_empty(),
                _ => false,
            },
            Probe::Negative => value.as_f64().is_some_and(|n| n < 0.0),
            Probe::Positive => value.as_f64().is_some_and(|n| n > 0.0),
            Probe::Zero => value.as_f64().is_some_and(|n| n == 0.0),
            Probe::Even => integer(value).is_some_and(|n| n % 2 == 0),
            Probe::Odd => integer(value).is_some_and(|n| n % 2 != 0),
            Probe::Informational => status_in(value, 100..=199),
            Probe::Success => status_in(value, 200..=299),
            Probe::Redirection => status_in(value, 300..=399),
            Probe::ClientError => status_in(value, 400..=499),
            Probe::ServerError => status_in(value, 500..=599),
        }
    }
}

impl fmt::Display for Probe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Probe::Nil => "nil?",
            Probe::Empty => "empty?",
            Probe::Negative => "negative?",
            Probe::Positive => "positive?",
            Probe::Zero => "zero?",
            Probe::Even => "even?",
            Probe::Odd => "odd?",
            Probe::Informational => "informational?",
            Probe::Success => "success?",
            Probe::Redirection => "redirection?",
            Probe::ClientError => "client_error?",
            Probe::ServerError => "server_error?",
            Probe::Unknown(name) => name.as_str(),
        };
        f.write_str(name)
    }
}

fn integer(value: &Value) -> Option<i128> {
    value
        .as_i64()
        .map(i128::from)
        .or_else(|| value.as_u64().map(i128::from))
}

fn status_in(value: &Value, class: RangeInclusive<u64>) -> bool {
    value.as_u64().is_some_and(|code| class.contains(&code))
}

/// A JSON number that keeps integers exact.
#[derive(Debug, Clone, Copy)]
pub enum Numeric {
    /// Any `i64` or `u64`.
    Integer(i128),
    /// Anything with a fractional part or exponent.
    Float(f64),
}

impl Numeric {
    /// The numeric view of `value`, if it is a number.
    pub fn of(value: &Value) -> Option<Self> {
        value.as_number().map(Numeric::from)
    }
}

impl From<&Number> for Numeric {
    fn from(number: &Number) -> Self {
        if let Some(n) = number.as_i64() {
            Numeric::Integer(i128::from(n))
        } else if let Some(n) = number.as_u64() {
            Numeric::Integer(i128::from(n))
        } else {
            Numeric::Float(number.as_f64().unwrap_or(f64::NAN))
        }
    }
}

impl PartialOrd for Numeric {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (*self, *other) {
            (Numeric::Integer(left), Numeric::Integer(right)) => Some(left.cmp(&right)),
            (Numeric::Integer(left), Numeric::Float(right)) => (left as f64).partial_cmp(&right),
            (Numeric::Float(left), Numeric::Integer(right)) => left.partial_cmp(&(right as f64)),
            (Numeric::Float(left), Numeric::Float(right)) => left.partial_cmp(&right),
        }
    }
}

impl PartialEq for Numeric {
    fn eq(&self, other: &Self) -> bool {
        self.partial_cmp(other) == Some(Ordering::Equal)
    }
}

impl fmt::Display for Numeric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Numeric::Integer(n) => write!(f, "{n}"),
            Numeric::Float(n) => write!(f, "{n}"),
        }
    }
}

macro_rules! numeric_from {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Numeric {
                fn from(value: $ty) -> Self {
                    Numeric::Integer(i128::from(value))
                }
            }
        )*
    };
}

numeric_from!(u16, u32, u64, i32, i64);

impl From<f64> for Numeric {
    fn from(value: f64) -> Self {
        Numeric::Float(value)
    }
}

/// A single declarative criterion.
#[derive(Debug, Clone)]
pub enum Condition {
    /// Structural equality.
    Exact(Value),
    /// Numeric inclusion, both endpoints inclusive.
    Range {
        /// Lower bound.
        start: Numeric,
        /// Upper bound.
        end: Numeric,
    },
    /// Regex search over the value's string rendering.
    Pattern(Regex),
    /// Named query.
    Probe(Probe),
}

impl Condition {
    /// Creates an exact-match condition.
    pub fn exact(value: impl Into<Value>) -> Self {
        Condition::Exact(value.into())
    }

    /// Creates an inclusive range condition.
    pub fn range(start: impl Into<Numeric>, end: impl Into<Numeric>) -> Self {
        Condition::Range {
            start: start.into(),
            end: end.into(),
        }
    }

    /// Compiles a pattern condition.
    pub fn pattern(pattern: &str) -> Result<Self, regex::Error> {
        Regex::new(pattern).map(Condition::Pattern)
    }

    /// Creates a named-query condition.
    pub fn probe(name: &str) -> Self {
        Condition::Probe(Probe::named(name))
    }

    /// Evaluates the condition against a value. `None` stands for an absent value.
    pub fn matches(&self, value: Option<&Value>) -> bool {
        match self {
            Condition::Exact(expected) => match value {
                None => expected.is_null(),
                Some(actual) => structural_eq(expected, actual),
            },
            Condition::Range { start, end } => value
                .and_then(Numeric::of)
                .is_some_and(|n| *start <= n && n <= *end),
            Condition::Pattern(regex) => match value {
                None | Some(Value::Null) => false,
                Some(value) => regex.is_match(&render(value)),
            },
            Condition::Probe(probe) => probe.test(value),
        }
    }

    /// Evaluates the condition against an HTTP status code.
    pub fn matches_status(&self, status: http::StatusCode) -> bool {
        self.matches(Some(&Value::from(status.as_u16())))
    }
}

fn structural_eq(expected: &Value, actual: &Value) -> bool {
    match (expected, actual) {
        (Value::Number(left), Value::Number(right)) => Numeric::from(left) == Numeric::from(right),
        _ => expected == actual,
    }
}

fn render(value: &Value) -> Cow<'_, str> {
    match value {
        Value::String(s) => Cow::Borrowed(s.as_str()),
        other => Cow::Owned(other.to_string()),
    }
}

impl PartialEq for Condition {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Condition::Exact(left), Condition::Exact(right)) => left == right,
            (
                Condition::Range { start, end },
                Condition::Range {
                    start: other_start,
                    end: other_end,
                },
            ) => start == other_start && end == other_end,
            (Condition::Pattern(left), Condition::Pattern(right)) => {
                left.as_str() == right.as_str()
            }
            (Condition::Probe(left), Condition::Probe(right)) => left == right,
            _ => false,
        }
    }
}

macro_rules! exact_from {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Condition {
                fn from(value: $ty) -> Self {
                    Condition::Exact(Value::from(value))
                }
            }
        )*
    };
}

exact_from!(u16, u32, u64, i32, i64, f64, bool, &str, String);

macro_rules! range_from {
    ($($ty:ty),*) => {
        $(
            impl From<RangeInclusive<$ty>> for Condition {
                fn from(range: RangeInclusive<$ty>) -> Self {
                    let (start, end) = range.into_inner();
                    Condition::range(start, end)
                }
            }
        )*
    };
}

range_from!(u16, u32, u64, i32, i64, f64);

impl From<Value> for Condition {
    fn from(value: Value) -> Self {
        Condition::Exact(value)
    }
}

impl From<Regex> for Condition {
    fn from(regex: Regex) -> Self {
        Condition::Pattern(regex)
    }
}

impl From<Probe> for Condition {
    fn from(probe: Probe) -> Self {
        Condition::Probe(probe)
    }
}
