//! String clause builders.
//!
//! Analysed text fields are matched token by token in `FULL_TEXT` mode; the
//! `KEYWORD` mode targets the exact `.keyword` sub-field. Fields indexed as
//! keywords only are always matched on the whole value.

use serde_json::{Value, json};

use crate::criterion::StringMatchType;
use crate::error::CompileError;

use super::{FieldRef, term, terms};

/// Target path and whether it holds tokens.
fn target(field: &FieldRef<'_>, match_type: StringMatchType) -> (String, bool) {
    if match_type == StringMatchType::FullText && field.def.analyzed {
        (field.path.to_string(), true)
    } else {
        (field.exact_path(), false)
    }
}

pub fn eq(field: &FieldRef<'_>, text: &str, match_type: StringMatchType) -> Value {
    match target(field, match_type) {
        (path, true) => json!({
            "match": { path: { "query": text, "operator": "and" } }
        }),
        (path, false) => term(&path, json!(text)),
    }
}

pub fn any_of(field: &FieldRef<'_>, texts: &[&str], match_type: StringMatchType) -> Value {
    if texts.is_empty() {
        return super::match_none();
    }
    match target(field, match_type) {
        (_, true) => super::any_of(texts.iter().map(|t| eq(field, t, match_type)).collect()),
        (path, false) => terms(&path, texts.iter().map(|t| json!(t)).collect()),
    }
}

/// Prefix match. Tokens are stored lower-cased, so the prefix is too.
pub fn starts_with(field: &FieldRef<'_>, text: &str, match_type: StringMatchType) -> Value {
    let (path, tokenized) = target(field, match_type);
    let value = if tokenized {
        text.to_lowercase()
    } else {
        text.to_string()
    };
    json!({ "prefix": { path: { "value": value } } })
}

pub fn ends_with(field: &FieldRef<'_>, text: &str, match_type: StringMatchType) -> Value {
    let (path, tokenized) = target(field, match_type);
    let suffix = if tokenized {
        escape_wildcard(&text.to_lowercase())
    } else {
        escape_wildcard(text)
    };
    json!({ "wildcard": { path: { "value": format!("*{}", suffix) } } })
}

pub fn regexp(
    field: &FieldRef<'_>,
    pattern: &str,
    match_type: StringMatchType,
) -> Result<Value, CompileError> {
    if pattern.is_empty() {
        return Err(CompileError::InvalidPattern {
            field: field.path.to_string(),
            message: "pattern is empty".to_string(),
        });
    }
    regex::Regex::new(pattern).map_err(|e| CompileError::InvalidPattern {
        field: field.path.to_string(),
        message: e.to_string(),
    })?;
    let (path, _) = target(field, match_type);
    Ok(json!({ "regexp": { path: { "value": pattern } } }))
}

/// Escapes the wildcard query metacharacters.
fn escape_wildcard(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '*' | '?' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
