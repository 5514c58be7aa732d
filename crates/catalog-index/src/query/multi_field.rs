//! One value searched across several fields.

use crate::criterion::{Criterion, CriterionValue, StringMatchType};
use crate::error::CompileError;
use crate::registry::FieldTypeRegistry;

use super::handlers::FieldRef;

/// Builds the disjunction used by multi-field search.
///
/// Patterns ending in `*` expand to every registered field under the prefix;
/// expanded fields whose type cannot hold `value` are skipped. A field named
/// explicitly must exist and accept the value. Text fields match per token.
pub fn multi_field_criterion<S: AsRef<str>>(
    registry: &FieldTypeRegistry,
    value: &CriterionValue,
    patterns: &[S],
) -> Result<Criterion, CompileError> {
    let mut leaves = Vec::new();
    let mut seen: Vec<&str> = Vec::new();

    for pattern in patterns {
        let pattern = pattern.as_ref();
        let wildcard = pattern.ends_with('*');
        let expanded = registry.expand(pattern);
        if expanded.is_empty() && !wildcard {
            return Err(CompileError::UnknownField {
                field: pattern.to_string(),
            });
        }

        for (path, def) in expanded {
            if seen.contains(&path) {
                continue;
            }
            let field = FieldRef::new(path, def);
            if !field.accepts_equality(value) {
                if wildcard {
                    continue;
                }
                return Err(CompileError::ValueTypeMismatch {
                    field: path.to_string(),
                    expected: def.property_type.to_string(),
                    found: value.kind().to_string(),
                });
            }
            seen.push(path);
            leaves.push(leaf(&field, value));
        }
    }

    Ok(Criterion::Or(leaves))
}

fn leaf(field: &FieldRef<'_>, value: &CriterionValue) -> Criterion {
    if field.is_interval() {
        return Criterion::into_range(field.path, value.clone());
    }
    let match_type = match value {
        CriterionValue::String(_) => StringMatchType::FullText,
        _ => StringMatchType::Keyword,
    };
    Criterion::Eq {
        field: field.path.to_string(),
        value: value.clone(),
        tolerance: None,
        match_type,
    }
}
