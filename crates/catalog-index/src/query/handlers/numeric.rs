//! Numeric clause builders for integral and floating fields.

use serde_json::{Value, json};

use crate::criterion::CriterionValue;
use crate::error::CompileError;

use super::{FieldRef, RangeOp, range, range_between, term, terms};

/// Equality. Floating fields require a tolerance, which turns the match into
/// the inclusive range `[value - tolerance, value + tolerance]`.
pub fn eq(
    field: &FieldRef<'_>,
    value: &CriterionValue,
    tolerance: Option<f64>,
) -> Result<Value, CompileError> {
    match tolerance {
        Some(tolerance) => Ok(tolerance_range(field.path, value, tolerance)),
        None if field.is_floating() => Err(CompileError::MissingTolerance {
            field: field.path.to_string(),
        }),
        None => Ok(term(field.path, value.to_json())),
    }
}

pub fn compare(field: &FieldRef<'_>, op: RangeOp, value: &CriterionValue) -> Value {
    range(field.path, op, value.to_json())
}

/// Inclusive on both ends.
pub fn between(field: &FieldRef<'_>, lower: &CriterionValue, upper: &CriterionValue) -> Value {
    range_between(field.path, lower.to_json(), upper.to_json())
}

pub fn any_of(
    field: &FieldRef<'_>,
    values: &[&CriterionValue],
    tolerance: Option<f64>,
) -> Result<Value, CompileError> {
    if values.is_empty() {
        return Ok(super::match_none());
    }
    match tolerance {
        Some(tolerance) => Ok(super::any_of(
            values
                .iter()
                .map(|v| tolerance_range(field.path, v, tolerance))
                .collect(),
        )),
        None if field.is_floating() => Err(CompileError::MissingTolerance {
            field: field.path.to_string(),
        }),
        None => Ok(terms(field.path, values.iter().map(|v| v.to_json()).collect())),
    }
}

fn tolerance_range(path: &str, value: &CriterionValue, tolerance: f64) -> Value {
    let center = value.as_f64().unwrap_or_default();
    let tolerance = tolerance.abs();
    range_between(path, json!(center - tolerance), json!(center + tolerance))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::PropertyType;
    use crate::registry::FieldDefinition;

    #[test]
    fn test_integer_eq_is_term() {
        let def = FieldDefinition::of(PropertyType::Integer);
        let clause = eq(&FieldRef::new("size", &def), &CriterionValue::Int(5), None).unwrap();
        assert_eq!(clause, json!({ "term": { "size": 5 } }));
    }

    #[test]
    fn test_floating_eq_requires_tolerance() {
        let def = FieldDefinition::of(PropertyType::Double);
        let field = FieldRef::new("weight", &def);
        assert_eq!(
            eq(&field, &CriterionValue::Double(5.0), None).unwrap_err(),
            CompileError::MissingTolerance {
                field: "weight".to_string()
            }
        );

        let clause = eq(&field, &CriterionValue::Double(5.0), Some(0.1)).unwrap();
        let s = serde_json::to_string(&clause).unwrap();
        assert!(s.contains("\"gte\":4.9"));
        assert!(s.contains("\"lte\":5.1"));
    }

    #[test]
    fn test_gt() {
        let def = FieldDefinition::of(PropertyType::Long);
        let clause = compare(&FieldRef::new("size", &def), RangeOp::Gt, &CriterionValue::Int(5));
        let s = serde_json::to_string(&clause).unwrap();
        assert!(s.contains("\"gt\":5"));
    }

    #[test]
    fn test_between_is_inclusive() {
        let def = FieldDefinition::of(PropertyType::Integer);
        let clause = between(
            &FieldRef::new("size", &def),
            &CriterionValue::Int(2),
            &CriterionValue::Int(4),
        );
        assert_eq!(clause, json!({ "range": { "size": { "gte": 2, "lte": 4 } } }));
    }

    #[test]
    fn test_in_values() {
        let def = FieldDefinition::of(PropertyType::IntegerArray);
        let field = FieldRef::new("size", &def);
        let values = [
            CriterionValue::Int(1),
            CriterionValue::Int(3),
            CriterionValue::Int(3),
        ];
        let refs: Vec<&CriterionValue> = values.iter().collect();
        assert_eq!(
            any_of(&field, &refs, None).unwrap(),
            json!({ "terms": { "size": [1, 3] } })
        );
        assert_eq!(any_of(&field, &[], None).unwrap(), json!({ "match_none": {} }));
    }

    #[test]
    fn test_in_floating_with_tolerance() {
        let def = FieldDefinition::of(PropertyType::Double);
        let field = FieldRef::new("weight", &def);
        let values = [CriterionValue::Double(1.0), CriterionValue::Double(2.0)];
        let refs: Vec<&CriterionValue> = values.iter().collect();
        assert!(any_of(&field, &refs, None).is_err());
        let clause = any_of(&field, &refs, Some(0.5)).unwrap();
        assert_eq!(clause["bool"]["should"].as_array().unwrap().len(), 2);
    }
}
