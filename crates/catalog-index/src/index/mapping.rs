//! Attribute model to engine mapping.
//!
//! Model attributes live under the `feature` object of a document. Each one
//! becomes an [`AttributeDescription`]; a JSON attribute constrained by a JSON
//! schema (and without an explicit mapping) is flattened into one description
//! per leaf of the schema. Descriptions are then merged into a single
//! `{"properties": {...}}` body sent as one additive mapping update.

use serde_json::{Map, Value, json};

use crate::error::MappingError;
use crate::model::{
    AttributeDescription, DOC_ID_FIELD, LOWER_BOUND, ModelAttribute, PropertyType, Restriction,
    Shape, TAGS_FIELD, TYPE_FIELD, UPPER_BOUND,
};
use crate::registry::KEYWORD_SUBFIELD;

/// Root object of model attributes in a document.
pub const FEATURE_ROOT: &str = "feature";

/// Mapping of the fields every document carries.
pub fn envelope_mapping() -> Value {
    json!({
        "properties": {
            TYPE_FIELD: { "type": "keyword" },
            DOC_ID_FIELD: { "type": "keyword" },
            TAGS_FIELD: { "type": "keyword" },
        }
    })
}

/// Field holding a document footprint, mapped as a `geo_shape`.
pub const GEOMETRY_FIELD: &str = "geometry";

/// Dynamic template mapping every unmapped floating number as `double`
/// instead of the engine's default `float`.
pub fn automatic_double_mapping() -> Value {
    json!({
        "dynamic_templates": [{
            "doubles": {
                "match_mapping_type": "double",
                "mapping": { "type": "double" }
            }
        }]
    })
}

/// Mapping of the [`GEOMETRY_FIELD`].
pub fn geometry_mapping() -> Value {
    json!({ "properties": { GEOMETRY_FIELD: { "type": "geo_shape" } } })
}

/// Default mapping of one field.
pub fn field_mapping(property_type: PropertyType) -> Value {
    let engine_type = property_type.engine_type();
    match property_type.shape() {
        Shape::Interval => json!({
            "properties": {
                LOWER_BOUND: { "type": engine_type },
                UPPER_BOUND: { "type": engine_type },
            }
        }),
        _ if engine_type == "text" => json!({
            "type": "text",
            "fields": { KEYWORD_SUBFIELD: { "type": "keyword", "ignore_above": 256 } }
        }),
        _ => json!({ "type": engine_type }),
    }
}

/// Mapping of one description: the explicit override if any, else the default.
///
/// Non-indexed leaves are kept in the mapping with `"index": false`.
pub fn description_mapping(description: &AttributeDescription) -> Value {
    let mut mapping = description
        .es_mapping
        .clone()
        .unwrap_or_else(|| field_mapping(description.property_type));
    if !description.indexed
        && let Some(object) = mapping.as_object_mut()
        && object
            .get("type")
            .and_then(Value::as_str)
            .is_some_and(|t| t != "object" && t != "nested")
    {
        object.insert("index".to_string(), Value::Bool(false));
        object.remove("fields");
    }
    mapping
}

/// Merges descriptions into one `{"properties": {...}}` mapping body.
pub fn build_mapping(descriptions: &[AttributeDescription]) -> Result<Value, MappingError> {
    let mut root = Map::new();
    for description in descriptions {
        insert_path(&mut root, &description.path, description_mapping(description))?;
    }
    Ok(json!({ "properties": Value::Object(root) }))
}

fn insert_path(root: &mut Map<String, Value>, path: &str, leaf: Value) -> Result<(), MappingError> {
    let segments: Vec<&str> = path.split('.').collect();
    if segments.iter().any(|s| s.is_empty()) {
        return Err(MappingError::InvalidPath {
            path: path.to_string(),
        });
    }

    let Some((last, parents)) = segments.split_last() else {
        return Err(MappingError::InvalidPath {
            path: path.to_string(),
        });
    };

    let mut current = root;
    for segment in parents {
        let node = current
            .entry(segment.to_string())
            .or_insert_with(|| json!({ "properties": {} }));
        // A typed leaf cannot also hold sub-fields.
        if node.get("type").is_some_and(|t| t != "object") {
            return Err(MappingError::InvalidPath {
                path: path.to_string(),
            });
        }
        let object = node.as_object_mut().ok_or_else(|| MappingError::InvalidPath {
            path: path.to_string(),
        })?;
        current = object
            .entry("properties")
            .or_insert_with(|| Value::Object(Map::new()))
            .as_object_mut()
            .ok_or_else(|| MappingError::InvalidPath {
                path: path.to_string(),
            })?;
    }
    current.insert(last.to_string(), leaf);
    Ok(())
}

/// Turns model attributes into descriptions under `feature.`.
pub fn describe_attributes(
    attributes: &[ModelAttribute],
) -> Result<Vec<AttributeDescription>, MappingError> {
    let mut descriptions = Vec::with_capacity(attributes.len());
    for attribute in attributes {
        let path = format!("{}.{}", FEATURE_ROOT, attribute.json_path);
        match (&attribute.restriction, &attribute.es_mapping) {
            (Restriction::JsonSchema { schema }, None)
                if attribute.property_type == PropertyType::Json =>
            {
                let before = descriptions.len();
                flatten_schema(&path, schema, attribute.indexed, &mut descriptions)?;
                tracing::debug!(
                    attribute = %attribute.json_path,
                    leaves = descriptions.len() - before,
                    "Flattened JSON schema attribute"
                );
            }
            _ => descriptions.push(describe_one(&path, attribute)?),
        }
    }
    Ok(descriptions)
}

fn describe_one(path: &str, attribute: &ModelAttribute) -> Result<AttributeDescription, MappingError> {
    let es_mapping = attribute
        .es_mapping
        .as_deref()
        .map(|raw| {
            serde_json::from_str::<Value>(raw).map_err(|e| MappingError::InvalidOverride {
                path: path.to_string(),
                message: e.to_string(),
            })
        })
        .transpose()?;
    Ok(AttributeDescription {
        path: path.to_string(),
        property_type: attribute.property_type,
        restriction: attribute.restriction.clone(),
        properties: attribute.properties.clone(),
        es_mapping,
        indexed: attribute.indexed,
    })
}

/// Emits one description per leaf of an object schema.
fn flatten_schema(
    path: &str,
    schema: &Value,
    indexed: bool,
    out: &mut Vec<AttributeDescription>,
) -> Result<(), MappingError> {
    let properties = schema
        .get("properties")
        .and_then(Value::as_object)
        .ok_or_else(|| MappingError::InvalidSchema {
            attribute: path.to_string(),
            message: "expected an object schema with properties".to_string(),
        })?;

    for (name, child) in properties {
        let child_path = format!("{}.{}", path, name);
        match schema_type(child) {
            Some("object") => flatten_schema(&child_path, child, indexed, out)?,
            Some("array") => {
                let items = child.get("items").unwrap_or(&Value::Null);
                match schema_type(items) {
                    Some("object") => flatten_schema(&child_path, items, indexed, out)?,
                    item_type => {
                        if let Some(property_type) = item_type.and_then(|t| leaf_type(t, items, true))
                        {
                            out.push(schema_leaf(&child_path, property_type, indexed));
                        }
                    }
                }
            }
            Some(leaf) => {
                if let Some(property_type) = leaf_type(leaf, child, false) {
                    out.push(schema_leaf(&child_path, property_type, indexed));
                }
            }
            None => {}
        }
    }
    Ok(())
}

fn schema_type(schema: &Value) -> Option<&str> {
    match schema.get("type") {
        Some(Value::String(t)) => Some(t.as_str()),
        // ["string", "null"] style unions: first non-null type.
        Some(Value::Array(types)) => types.iter().filter_map(Value::as_str).find(|t| *t != "null"),
        _ if schema.get("properties").is_some() => Some("object"),
        _ => None,
    }
}

fn leaf_type(schema_type: &str, schema: &Value, array: bool) -> Option<PropertyType> {
    let is_date = schema
        .get("format")
        .and_then(Value::as_str)
        .is_some_and(|f| f == "date-time" || f == "date");
    let property_type = match (schema_type, array) {
        ("string", false) if is_date => PropertyType::Date,
        ("string", true) if is_date => PropertyType::DateArray,
        ("string", false) => PropertyType::String,
        ("string", true) => PropertyType::StringArray,
        ("integer", false) => PropertyType::Long,
        ("integer", true) => PropertyType::LongArray,
        ("number", false) => PropertyType::Double,
        ("number", true) => PropertyType::DoubleArray,
        ("boolean", false) => PropertyType::Boolean,
        _ => return None,
    };
    Some(property_type)
}

fn schema_leaf(path: &str, property_type: PropertyType, indexed: bool) -> AttributeDescription {
    let mut description = AttributeDescription::new(path, property_type);
    description.indexed = indexed;
    description
}
