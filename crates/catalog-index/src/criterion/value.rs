//! Literal values carried by criterion leaves.

use std::fmt;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

/// A typed literal compared against a document field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CriterionValue {
    Int(i64),
    Double(f64),
    Date(DateTime<Utc>),
    Bool(bool),
    String(String),
}

impl CriterionValue {
    /// Short name of the literal kind, used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            CriterionValue::Int(_) => "an integer",
            CriterionValue::Double(_) => "a double",
            CriterionValue::Date(_) => "a date",
            CriterionValue::Bool(_) => "a boolean",
            CriterionValue::String(_) => "a string",
        }
    }

    /// Numeric view of the literal, if it is a number.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CriterionValue::Int(i) => Some(*i as f64),
            CriterionValue::Double(d) => Some(*d),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<DateTime<Utc>> {
        match self {
            CriterionValue::Date(d) => Some(*d),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            CriterionValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Engine representation of the literal.
    pub fn to_json(&self) -> Value {
        match self {
            CriterionValue::Int(i) => json!(i),
            CriterionValue::Double(d) => json!(d),
            CriterionValue::Date(d) => json!(format_date(d)),
            CriterionValue::Bool(b) => json!(b),
            CriterionValue::String(s) => json!(s),
        }
    }
}

/// Formats a date the way it is indexed: RFC 3339, UTC, millisecond precision.
pub fn format_date(date: &DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Millis, true)
}

impl fmt::Display for CriterionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CriterionValue::Int(i) => write!(f, "{}", i),
            CriterionValue::Double(d) => write!(f, "{}", d),
            CriterionValue::Date(d) => write!(f, "{}", format_date(d)),
            CriterionValue::Bool(b) => write!(f, "{}", b),
            CriterionValue::String(s) => write!(f, "{}", s),
        }
    }
}

impl From<i32> for CriterionValue {
    fn from(v: i32) -> Self {
        CriterionValue::Int(i64::from(v))
    }
}

impl From<i64> for CriterionValue {
    fn from(v: i64) -> Self {
        CriterionValue::Int(v)
    }
}

impl From<f64> for CriterionValue {
    fn from(v: f64) -> Self {
        CriterionValue::Double(v)
    }
}

impl From<bool> for CriterionValue {
    fn from(v: bool) -> Self {
        CriterionValue::Bool(v)
    }
}

impl From<&str> for CriterionValue {
    fn from(v: &str) -> Self {
        CriterionValue::String(v.to_string())
    }
}

impl From<String> for CriterionValue {
    fn from(v: String) -> Self {
        CriterionValue::String(v)
    }
}

impl From<DateTime<Utc>> for CriterionValue {
    fn from(v: DateTime<Utc>) -> Self {
        CriterionValue::Date(v)
    }
}

/// How a string literal is matched against a text field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StringMatchType {
    /// Exact, case-sensitive match on the whole stored value.
    #[default]
    Keyword,
    /// Match on the analysed value, token by token.
    FullText,
}

impl StringMatchType {
    pub(crate) fn full_text() -> Self {
        StringMatchType::FullText
    }
}
