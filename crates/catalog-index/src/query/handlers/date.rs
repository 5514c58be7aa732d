//! Date clause builders.

use chrono::{DateTime, Utc};
use serde_json::{Value, json};

use crate::criterion::format_date;

use super::{FieldRef, RangeOp, range, range_between, term, terms};

pub fn eq(field: &FieldRef<'_>, date: DateTime<Utc>) -> Value {
    term(field.path, json!(format_date(&date)))
}

pub fn compare(field: &FieldRef<'_>, op: RangeOp, date: DateTime<Utc>) -> Value {
    range(field.path, op, json!(format_date(&date)))
}

/// Inclusive on both ends. On array fields, matches when any element is inside.
pub fn between(field: &FieldRef<'_>, start: DateTime<Utc>, end: DateTime<Utc>) -> Value {
    range_between(
        field.path,
        json!(format_date(&start)),
        json!(format_date(&end)),
    )
}

pub fn any_of(field: &FieldRef<'_>, dates: &[DateTime<Utc>]) -> Value {
    if dates.is_empty() {
        return super::match_none();
    }
    terms(
        field.path,
        dates.iter().map(|d| json!(format_date(d))).collect(),
    )
}
