//! Leaf clause builders, one module per declared value family.
//!
//! [`FieldRef`] pairs a field path with its registry declaration and checks
//! that the operator and literal fit the declared type before delegating to
//! the family module.

pub mod boolean;
pub mod date;
pub mod interval;
pub mod numeric;
pub mod string;

use chrono::{DateTime, Utc};
use serde_json::{Value, json};

use crate::criterion::{CriterionValue, StringMatchType};
use crate::error::CompileError;
use crate::model::{Shape, ValueFamily};
use crate::registry::FieldDefinition;

/// Comparison operators mapped onto `range` bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeOp {
    Gt,
    Ge,
    Lt,
    Le,
}

impl RangeOp {
    pub fn as_str(self) -> &'static str {
        match self {
            RangeOp::Gt => "gt",
            RangeOp::Ge => "gte",
            RangeOp::Lt => "lt",
            RangeOp::Le => "lte",
        }
    }

    fn operator_name(self) -> &'static str {
        match self {
            RangeOp::Gt => "gt",
            RangeOp::Ge => "ge",
            RangeOp::Lt => "lt",
            RangeOp::Le => "le",
        }
    }
}

/// What a field can be compared with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    Text,
    Number { floating: bool },
    Date,
    Bool,
    Interval(ValueFamily),
    Structured,
}

/// A resolved field: path plus declaration.
#[derive(Debug, Clone, Copy)]
pub struct FieldRef<'a> {
    pub path: &'a str,
    pub def: &'a FieldDefinition,
}

impl<'a> FieldRef<'a> {
    pub fn new(path: &'a str, def: &'a FieldDefinition) -> Self {
        Self { path, def }
    }

    /// Path for exact, whole-value matching.
    pub fn exact_path(&self) -> String {
        self.def.exact_path(self.path)
    }

    pub fn is_floating(&self) -> bool {
        self.def.property_type.family() == ValueFamily::Floating
    }

    fn kind(&self) -> Kind {
        let family = self.def.property_type.family();
        if self.def.property_type.shape() == Shape::Interval {
            return Kind::Interval(family);
        }
        match family {
            ValueFamily::Text => Kind::Text,
            ValueFamily::Integral => Kind::Number { floating: false },
            ValueFamily::Floating => Kind::Number { floating: true },
            ValueFamily::Temporal => Kind::Date,
            ValueFamily::Boolean => Kind::Bool,
            ValueFamily::Structured => Kind::Structured,
        }
    }

    pub fn eq(
        &self,
        value: &CriterionValue,
        tolerance: Option<f64>,
        match_type: StringMatchType,
    ) -> Result<Value, CompileError> {
        match self.kind() {
            Kind::Text => {
                self.reject_tolerance("eq", tolerance)?;
                Ok(string::eq(self, self.text(value)?, match_type))
            }
            Kind::Number { .. } => numeric::eq(self, self.number(value)?, tolerance),
            Kind::Date => {
                self.reject_tolerance("eq", tolerance)?;
                Ok(date::eq(self, self.date(value)?))
            }
            Kind::Bool => {
                self.reject_tolerance("eq", tolerance)?;
                Ok(boolean::eq(self, self.boolean(value)?))
            }
            Kind::Interval(_) | Kind::Structured => Err(self.unsupported("eq")),
        }
    }

    pub fn compare(&self, op: RangeOp, value: &CriterionValue) -> Result<Value, CompileError> {
        match self.kind() {
            Kind::Number { .. } => Ok(numeric::compare(self, op, self.number(value)?)),
            Kind::Date => Ok(date::compare(self, op, self.date(value)?)),
            Kind::Text | Kind::Bool | Kind::Interval(_) | Kind::Structured => {
                Err(self.unsupported(op.operator_name()))
            }
        }
    }

    pub fn between(
        &self,
        lower: &CriterionValue,
        upper: &CriterionValue,
    ) -> Result<Value, CompileError> {
        match self.kind() {
            Kind::Number { .. } => Ok(numeric::between(
                self,
                self.number(lower)?,
                self.number(upper)?,
            )),
            Kind::Date => Ok(date::between(self, self.date(lower)?, self.date(upper)?)),
            Kind::Text | Kind::Bool | Kind::Interval(_) | Kind::Structured => {
                Err(self.unsupported("between"))
            }
        }
    }

    pub fn any_of(
        &self,
        values: &[CriterionValue],
        tolerance: Option<f64>,
        match_type: StringMatchType,
    ) -> Result<Value, CompileError> {
        match self.kind() {
            Kind::Text => {
                self.reject_tolerance("in", tolerance)?;
                let texts = values
                    .iter()
                    .map(|v| self.text(v))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(string::any_of(self, &texts, match_type))
            }
            Kind::Number { .. } => {
                let numbers = values
                    .iter()
                    .map(|v| self.number(v))
                    .collect::<Result<Vec<_>, _>>()?;
                numeric::any_of(self, &numbers, tolerance)
            }
            Kind::Date => {
                self.reject_tolerance("in", tolerance)?;
                let dates = values
                    .iter()
                    .map(|v| self.date(v))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(date::any_of(self, &dates))
            }
            Kind::Bool => {
                self.reject_tolerance("in", tolerance)?;
                let flags = values
                    .iter()
                    .map(|v| self.boolean(v))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(boolean::any_of(self, &flags))
            }
            Kind::Interval(_) | Kind::Structured => Err(self.unsupported("in")),
        }
    }

    pub fn starts_with(&self, text: &str, match_type: StringMatchType) -> Result<Value, CompileError> {
        match self.kind() {
            Kind::Text => Ok(string::starts_with(self, text, match_type)),
            _ => Err(self.unsupported("startsWith")),
        }
    }

    pub fn ends_with(&self, text: &str, match_type: StringMatchType) -> Result<Value, CompileError> {
        match self.kind() {
            Kind::Text => Ok(string::ends_with(self, text, match_type)),
            _ => Err(self.unsupported("endsWith")),
        }
    }

    pub fn regexp(&self, pattern: &str, match_type: StringMatchType) -> Result<Value, CompileError> {
        match self.kind() {
            Kind::Text => string::regexp(self, pattern, match_type),
            _ => Err(self.unsupported("regexp")),
        }
    }

    /// Array membership. Scalars behave as one-element arrays.
    pub fn contains(
        &self,
        value: &CriterionValue,
        tolerance: Option<f64>,
    ) -> Result<Value, CompileError> {
        match self.kind() {
            Kind::Interval(_) | Kind::Structured => Err(self.unsupported("contains")),
            _ => self.eq(value, tolerance, StringMatchType::Keyword),
        }
    }

    pub fn contains_date_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Value, CompileError> {
        match self.kind() {
            Kind::Date => Ok(date::between(self, start, end)),
            _ => Err(self.unsupported("containsDateBetween")),
        }
    }

    pub fn into_range(&self, value: &CriterionValue) -> Result<Value, CompileError> {
        match self.kind() {
            Kind::Interval(family) => Ok(interval::into_range(self, self.bound(family, value)?)),
            _ => Err(self.unsupported("into")),
        }
    }

    pub fn intersects(
        &self,
        lower: &CriterionValue,
        upper: &CriterionValue,
    ) -> Result<Value, CompileError> {
        match self.kind() {
            Kind::Interval(family) => Ok(interval::intersects(
                self,
                self.bound(family, lower)?,
                self.bound(family, upper)?,
            )),
            _ => Err(self.unsupported("intersects")),
        }
    }

    pub fn exists(&self) -> Value {
        json!({ "exists": { "field": self.path } })
    }

    /// Whether a literal can be compared with this field by equality.
    pub fn accepts_equality(&self, value: &CriterionValue) -> bool {
        match (self.kind(), value) {
            (Kind::Text, CriterionValue::String(_)) => true,
            (Kind::Number { floating: false }, CriterionValue::Int(_)) => true,
            (Kind::Date, CriterionValue::Date(_)) => true,
            (Kind::Bool, CriterionValue::Bool(_)) => true,
            (Kind::Interval(ValueFamily::Integral), CriterionValue::Int(_)) => true,
            (
                Kind::Interval(ValueFamily::Floating),
                CriterionValue::Int(_) | CriterionValue::Double(_),
            ) => true,
            (Kind::Interval(ValueFamily::Temporal), CriterionValue::Date(_)) => true,
            _ => false,
        }
    }

    /// Whether the field holds intervals.
    pub fn is_interval(&self) -> bool {
        matches!(self.kind(), Kind::Interval(_))
    }

    fn text<'v>(&self, value: &'v CriterionValue) -> Result<&'v str, CompileError> {
        value
            .as_str()
            .ok_or_else(|| self.mismatch("a string", value))
    }

    fn number<'v>(&self, value: &'v CriterionValue) -> Result<&'v CriterionValue, CompileError> {
        match value {
            CriterionValue::Int(_) | CriterionValue::Double(_) => Ok(value),
            _ => Err(self.mismatch("a number", value)),
        }
    }

    fn date(&self, value: &CriterionValue) -> Result<DateTime<Utc>, CompileError> {
        value.as_date().ok_or_else(|| self.mismatch("a date", value))
    }

    fn boolean(&self, value: &CriterionValue) -> Result<bool, CompileError> {
        match value {
            CriterionValue::Bool(b) => Ok(*b),
            _ => Err(self.mismatch("a boolean", value)),
        }
    }

    fn bound(&self, family: ValueFamily, value: &CriterionValue) -> Result<Value, CompileError> {
        match family {
            ValueFamily::Temporal => Ok(CriterionValue::Date(self.date(value)?).to_json()),
            _ => Ok(self.number(value)?.to_json()),
        }
    }

    fn reject_tolerance(&self, operator: &str, tolerance: Option<f64>) -> Result<(), CompileError> {
        match tolerance {
            Some(_) => Err(self.unsupported(&format!("{} with tolerance", operator))),
            None => Ok(()),
        }
    }

    pub(crate) fn unsupported(&self, operator: &str) -> CompileError {
        CompileError::UnsupportedOperator {
            operator: operator.to_string(),
            field: self.path.to_string(),
            property_type: self.def.property_type.to_string(),
        }
    }

    fn mismatch(&self, expected: &str, value: &CriterionValue) -> CompileError {
        CompileError::ValueTypeMismatch {
            field: self.path.to_string(),
            expected: expected.to_string(),
            found: value.kind().to_string(),
        }
    }
}

/// `{"term": {path: value}}`
pub fn term(path: &str, value: Value) -> Value {
    json!({ "term": { path: value } })
}

/// `{"terms": {path: [values]}}` with duplicates removed.
pub fn terms(path: &str, values: Vec<Value>) -> Value {
    let mut unique: Vec<Value> = Vec::with_capacity(values.len());
    for value in values {
        if !unique.contains(&value) {
            unique.push(value);
        }
    }
    json!({ "terms": { path: unique } })
}

pub fn range(path: &str, op: RangeOp, value: Value) -> Value {
    json!({ "range": { path: { op.as_str(): value } } })
}

/// Inclusive range.
pub fn range_between(path: &str, lower: Value, upper: Value) -> Value {
    json!({ "range": { path: { "gte": lower, "lte": upper } } })
}

pub fn match_all() -> Value {
    json!({ "match_all": {} })
}

pub fn match_none() -> Value {
    json!({ "match_none": {} })
}

/// Disjunction; no clause matches nothing.
pub fn any_of(clauses: Vec<Value>) -> Value {
    if clauses.is_empty() {
        return match_none();
    }
    json!({ "bool": { "should": clauses, "minimum_should_match": 1 } })
}

/// Conjunction; no clause matches everything.
pub fn all_of(clauses: Vec<Value>) -> Value {
    if clauses.is_empty() {
        return match_all();
    }
    json!({ "bool": { "must": clauses } })
}

pub fn negate(clause: Value) -> Value {
    json!({ "bool": { "must_not": [clause] } })
}
