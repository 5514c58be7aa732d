//! Clause builders for interval fields stored as `{lowerBound, upperBound}`.

use serde_json::Value;

use crate::model::{LOWER_BOUND, UPPER_BOUND};

use super::{FieldRef, RangeOp, all_of, range};

fn bound_path(field: &FieldRef<'_>, bound: &str) -> String {
    format!("{}.{}", field.path, bound)
}

/// `lowerBound <= value AND upperBound >= value`
pub fn into_range(field: &FieldRef<'_>, value: Value) -> Value {
    all_of(vec![
        range(&bound_path(field, LOWER_BOUND), RangeOp::Le, value.clone()),
        range(&bound_path(field, UPPER_BOUND), RangeOp::Ge, value),
    ])
}

/// `lowerBound <= upper AND upperBound >= lower`
pub fn intersects(field: &FieldRef<'_>, lower: Value, upper: Value) -> Value {
    all_of(vec![
        range(&bound_path(field, LOWER_BOUND), RangeOp::Le, upper),
        range(&bound_path(field, UPPER_BOUND), RangeOp::Ge, lower),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::PropertyType;
    use crate::registry::FieldDefinition;
    use serde_json::json;

    #[test]
    fn test_into() {
        let def = FieldDefinition::of(PropertyType::IntegerInterval);
        let clause = into_range(&FieldRef::new("feature.range", &def), json!(7));
        assert_eq!(
            clause,
            json!({ "bool": { "must": [
                { "range": { "feature.range.lowerBound": { "lte": 7 } } },
                { "range": { "feature.range.upperBound": { "gte": 7 } } }
            ] } })
        );
    }

    #[test]
    fn test_intersects() {
        let def = FieldDefinition::of(PropertyType::DoubleInterval);
        let clause = intersects(&FieldRef::new("r", &def), json!(1.5), json!(3.0));
        let must = clause["bool"]["must"].as_array().unwrap();
        assert_eq!(must[0], json!({ "range": { "r.lowerBound": { "lte": 3.0 } } }));
        assert_eq!(must[1], json!({ "range": { "r.upperBound": { "gte": 1.5 } } }));
    }
}
