//! Sort clause compilation.

use serde_json::{Value, json};

use crate::error::CompileError;
use crate::model::{DOC_ID_FIELD, Shape, Sort, SortDirection, TYPE_FIELD, ValueFamily};
use crate::registry::FieldTypeRegistry;

/// Compiles an ordered sort into the engine `sort` array.
///
/// Text fields sort on their exact path. `type` and `docId` are appended
/// ascending when absent so that equal keys still come back in a stable
/// order, which `search_after` paging relies on.
pub fn compile_sort(sort: &Sort, registry: &FieldTypeRegistry) -> Result<Vec<Value>, CompileError> {
    let mut clauses = Vec::with_capacity(sort.orders().len() + 2);
    for order in sort.orders() {
        let def = registry.resolve(&order.field)?;
        if def.property_type.shape() == Shape::Interval
            || def.property_type.family() == ValueFamily::Structured
        {
            return Err(CompileError::UnsupportedOperator {
                operator: "sort".to_string(),
                field: order.field.clone(),
                property_type: def.property_type.to_string(),
            });
        }
        clauses.push(sort_clause(&def.exact_path(&order.field), order.direction));
    }
    for field in [TYPE_FIELD, DOC_ID_FIELD] {
        if !sort.orders().iter().any(|o| o.field == field) {
            clauses.push(sort_clause(field, SortDirection::Ascending));
        }
    }
    Ok(clauses)
}

/// The tie-breaker keys alone.
pub fn tie_breakers() -> Vec<Value> {
    vec![
        sort_clause(TYPE_FIELD, SortDirection::Ascending),
        sort_clause(DOC_ID_FIELD, SortDirection::Ascending),
    ]
}

fn sort_clause(path: &str, direction: SortDirection) -> Value {
    json!({ path: { "order": direction.as_str() } })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::PropertyType;

    fn registry() -> FieldTypeRegistry {
        let mut registry = FieldTypeRegistry::with_envelope();
        registry.register_type("feature.label", PropertyType::String);
        registry.register_type("feature.size", PropertyType::Integer);
        registry.register_type("feature.period", PropertyType::DateInterval);
        registry
    }

    #[test]
    fn test_sort_keeps_order_and_adds_tie_breakers() {
        let sort = Sort::desc("feature.size").then("feature.label", SortDirection::Ascending);
        let clauses = compile_sort(&sort, &registry()).unwrap();
        assert_eq!(
            clauses,
            vec![
                json!({ "feature.size": { "order": "desc" } }),
                json!({ "feature.label.keyword": { "order": "asc" } }),
                json!({ "type": { "order": "asc" } }),
                json!({ "docId": { "order": "asc" } }),
            ]
        );
    }

    #[test]
    fn test_explicit_doc_id_is_not_repeated() {
        let sort = Sort::desc("docId");
        let clauses = compile_sort(&sort, &registry()).unwrap();
        assert_eq!(clauses.len(), 2);
        assert_eq!(clauses[0], json!({ "docId": { "order": "desc" } }));
    }

    #[test]
    fn test_unsorted_uses_tie_breakers() {
        assert_eq!(
            compile_sort(&Sort::unsorted(), &registry()).unwrap(),
            tie_breakers()
        );
    }

    #[test]
    fn test_unknown_and_interval_fields_rejected() {
        let registry = registry();
        assert!(matches!(
            compile_sort(&Sort::asc("feature.missing"), &registry),
            Err(CompileError::UnknownField { .. })
        ));
        assert!(matches!(
            compile_sort(&Sort::asc("feature.period"), &registry),
            Err(CompileError::UnsupportedOperator { .. })
        ));
    }
}
