use super::comparison::{Comparison, parse_comparison};
use super::period::{end_of_day, start_of_day_str};
use super::wildcard::{RegexPattern, compile_wildcard};
use crate::config::MAX_SAFE_INTEGER;
use chrono::NaiveDate;
use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;

static DATE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[0-9]{4}-(0[1-9]|1[0-2])-(0[1-9]|[12][0-9]|3[01])$").expect("valid date regex")
});
static DATETIME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^[0-9]{4}-(0[1-9]|1[0-2])-(0[1-9]|[12][0-9]|3[01])T([01][0-9]|2[0-3]):[0-5][0-9]:[0-5][0-9]$",
    )
    .expect("valid datetime regex")
});

/// A raw query token after classification.
#[derive(Debug, Clone, PartialEq)]
pub enum TypedValue {
    /// `YYYY-MM-DD`; rendered as start of day
    Date(String),
    /// `YYYY-MM-DDThh:mm:ss`; rendered unchanged
    DateTime(String),
    Pattern(RegexPattern),
    Comparison(Comparison),
    /// The literal `now`; rendered as end of the current day
    Now,
    Integer(i64),
    Text(String),
}

impl TypedValue {
    /// Render as a document value. `today` is only read for [`TypedValue::Now`].
    pub fn to_json(&self, today: NaiveDate) -> Value {
        match self {
            TypedValue::Date(date) => Value::String(start_of_day_str(date)),
            TypedValue::DateTime(datetime) => Value::String(datetime.clone()),
            TypedValue::Pattern(pattern) => pattern.to_json(),
            TypedValue::Comparison(comparison) => comparison.to_json(today),
            TypedValue::Now => Value::String(end_of_day(today)),
            TypedValue::Integer(n) => Value::from(*n),
            TypedValue::Text(text) => Value::String(text.clone()),
        }
    }
}

/// Classify a single query token. The first matching rule wins:
///
/// 1. calendar date `YYYY-MM-DD`
/// 2. date-time `YYYY-MM-DDThh:mm:ss`
/// 3. contains `*` → wildcard pattern
/// 4. contains `:` → comparison (`gte:`, `gt:`, `lte:`, `lt:`), else literal text
/// 5. `now`
/// 6. canonical digits within the safe-integer range → integer
/// 7. anything else → text
pub fn classify(value: &str) -> TypedValue {
    if is_date(value) {
        return TypedValue::Date(value.to_string());
    }
    if is_datetime(value) {
        return TypedValue::DateTime(value.to_string());
    }
    if value.contains('*') {
        return TypedValue::Pattern(compile_wildcard(value));
    }
    if value.contains(':') {
        return match parse_comparison(value) {
            Some(comparison) => TypedValue::Comparison(comparison),
            None => TypedValue::Text(value.to_string()),
        };
    }
    if value == "now" {
        return TypedValue::Now;
    }
    if let Some(n) = parse_safe_integer(value) {
        return TypedValue::Integer(n);
    }
    TypedValue::Text(value.to_string())
}

pub(crate) fn is_date(value: &str) -> bool {
    DATE_RE.is_match(value)
}

pub(crate) fn is_datetime(value: &str) -> bool {
    DATETIME_RE.is_match(value)
}

/// Digits only, no leading zeros, and exactly representable as a double.
fn parse_safe_integer(value: &str) -> Option<i64> {
    if value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let n: u64 = value.parse().ok()?;
    if n > MAX_SAFE_INTEGER || n.to_string() != value {
        return None;
    }
    i64::try_from(n).ok()
}
