//! Boolean clause builders.

use serde_json::{Value, json};

use super::{FieldRef, term};

pub fn eq(field: &FieldRef<'_>, flag: bool) -> Value {
    term(field.path, json!(flag))
}

pub fn any_of(field: &FieldRef<'_>, flags: &[bool]) -> Value {
    match (flags.contains(&true), flags.contains(&false)) {
        (true, true) => json!({ "exists": { "field": field.path } }),
        (true, false) => eq(field, true),
        (false, true) => eq(field, false),
        (false, false) => super::match_none(),
    }
}
