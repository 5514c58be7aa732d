//! Field type registry.
//!
//! Maps every searchable field path of a tenant index to its declared
//! [`PropertyType`]. The query compiler dispatches on these declarations,
//! never on the runtime type of a criterion literal.
//!
//! A registry starts with the document envelope fields (`type`, `docId`,
//! `tags`) and grows additively as mappings are configured. Registries can
//! also be rebuilt from the mapping an index reports.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use parking_lot::RwLock;
use serde_json::Value;

use crate::error::CompileError;
use crate::model::{
    AttributeDescription, DOC_ID_FIELD, LOWER_BOUND, PropertyType, TAGS_FIELD, TYPE_FIELD,
    UPPER_BOUND,
};
use crate::tenant::TenantId;

/// Sub-field holding the exact value of an analysed text field.
pub const KEYWORD_SUBFIELD: &str = "keyword";

/// How one field is declared and indexed.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDefinition {
    pub property_type: PropertyType,
    /// True when the field is analysed text (tokenized, lower-cased).
    pub analyzed: bool,
    /// True when an exact `.keyword` sub-field exists.
    pub keyword_subfield: bool,
}

impl FieldDefinition {
    /// Default indexing for a property type.
    pub fn of(property_type: PropertyType) -> Self {
        let analyzed = property_type.engine_type() == "text";
        Self {
            property_type,
            analyzed,
            keyword_subfield: analyzed,
        }
    }

    /// An exact-only string field.
    pub fn keyword(property_type: PropertyType) -> Self {
        Self {
            property_type,
            analyzed: false,
            keyword_subfield: false,
        }
    }

    /// Derives the definition from an attribute, honouring an explicit mapping override.
    pub fn from_description(description: &AttributeDescription) -> Self {
        let mut definition = Self::of(description.property_type);
        if let Some(mapping) = &description.es_mapping {
            let engine_type = mapping.get("type").and_then(Value::as_str);
            definition.analyzed = engine_type == Some("text");
            definition.keyword_subfield = mapping
                .pointer(&format!("/fields/{}", KEYWORD_SUBFIELD))
                .is_some();
        }
        definition
    }

    /// Path used for exact matching, sorting and terms aggregations.
    pub fn exact_path(&self, path: &str) -> String {
        if self.analyzed && self.keyword_subfield {
            format!("{}.{}", path, KEYWORD_SUBFIELD)
        } else {
            path.to_string()
        }
    }
}

/// Field path to declaration map for one index.
#[derive(Debug, Clone, Default)]
pub struct FieldTypeRegistry {
    fields: BTreeMap<String, FieldDefinition>,
}

impl FieldTypeRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding the document envelope fields.
    pub fn with_envelope() -> Self {
        let mut registry = Self::new();
        registry.register(TYPE_FIELD, FieldDefinition::keyword(PropertyType::String));
        registry.register(DOC_ID_FIELD, FieldDefinition::keyword(PropertyType::String));
        registry.register(TAGS_FIELD, FieldDefinition::keyword(PropertyType::StringArray));
        registry
    }

    /// Adds or replaces a field.
    pub fn register(&mut self, path: impl Into<String>, definition: FieldDefinition) {
        self.fields.insert(path.into(), definition);
    }

    /// Adds a field with the default indexing of its type.
    pub fn register_type(&mut self, path: impl Into<String>, property_type: PropertyType) {
        self.register(path, FieldDefinition::of(property_type));
    }

    /// Adds every indexed attribute. Non-indexed attributes are not searchable.
    pub fn extend_from_descriptions<'a>(
        &mut self,
        descriptions: impl IntoIterator<Item = &'a AttributeDescription>,
    ) {
        for description in descriptions {
            if description.indexed {
                self.register(
                    description.path.clone(),
                    FieldDefinition::from_description(description),
                );
            }
        }
    }

    pub fn get(&self, path: &str) -> Option<&FieldDefinition> {
        self.fields.get(path)
    }

    /// Looks a field up, failing with [`CompileError::UnknownField`].
    pub fn resolve(&self, path: &str) -> Result<&FieldDefinition, CompileError> {
        self.fields.get(path).ok_or_else(|| CompileError::UnknownField {
            field: path.to_string(),
        })
    }

    /// Expands a field pattern.
    ///
    /// A pattern ending in `*` designates every registered field below the
    /// prefix; any other pattern designates at most the field itself.
    pub fn expand(&self, pattern: &str) -> Vec<(&str, &FieldDefinition)> {
        match pattern.strip_suffix('*') {
            Some(prefix) => self
                .fields
                .range(prefix.to_string()..)
                .take_while(|(path, _)| path.starts_with(prefix))
                .map(|(path, def)| (path.as_str(), def))
                .collect(),
            None => self
                .fields
                .get_key_value(pattern)
                .map(|(path, def)| (path.as_str(), def))
                .into_iter()
                .collect(),
        }
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Rebuilds a registry from an index mapping (`{"properties": {...}}`).
    ///
    /// Arrays cannot be told apart from scalars in a mapping, so array fields
    /// come back with their scalar type. Objects made of `lowerBound` and
    /// `upperBound` come back as intervals.
    pub fn from_mapping(mapping: &Value) -> Self {
        let mut registry = Self::with_envelope();
        if let Some(properties) = mapping.get("properties").and_then(Value::as_object) {
            for (name, field) in properties {
                registry.collect_mapping(name, field);
            }
        }
        registry
    }

    fn collect_mapping(&mut self, path: &str, field: &Value) {
        if let Some(properties) = field.get("properties").and_then(Value::as_object) {
            let lower = properties.get(LOWER_BOUND).and_then(|v| v.get("type"));
            let upper = properties.get(UPPER_BOUND).and_then(|v| v.get("type"));
            if properties.len() == 2
                && lower.is_some()
                && lower == upper
                && let Some(interval) = lower.and_then(Value::as_str).and_then(interval_type)
            {
                self.register_type(path, interval);
                return;
            }
            for (name, child) in properties {
                self.collect_mapping(&format!("{}.{}", path, name), child);
            }
            return;
        }

        let engine_type = field.get("type").and_then(Value::as_str).unwrap_or("object");
        let property_type = match engine_type {
            "text" => PropertyType::String,
            "keyword" => PropertyType::Url,
            "integer" | "short" | "byte" => PropertyType::Integer,
            "long" => PropertyType::Long,
            "double" | "float" | "half_float" | "scaled_float" => PropertyType::Double,
            "boolean" => PropertyType::Boolean,
            "date" => PropertyType::Date,
            _ => PropertyType::Object,
        };
        let keyword_subfield = field
            .pointer(&format!("/fields/{}", KEYWORD_SUBFIELD))
            .is_some();
        // Envelope fields keep their built-in declaration.
        if self.fields.contains_key(path) {
            return;
        }
        self.register(
            path,
            FieldDefinition {
                property_type,
                analyzed: engine_type == "text",
                keyword_subfield,
            },
        );
    }
}

fn interval_type(engine_type: &str) -> Option<PropertyType> {
    match engine_type {
        "integer" => Some(PropertyType::IntegerInterval),
        "long" => Some(PropertyType::LongInterval),
        "double" => Some(PropertyType::DoubleInterval),
        "date" => Some(PropertyType::DateInterval),
        _ => None,
    }
}

/// Per-tenant registries, shared between the mapping manager and searches.
///
/// Readers get an immutable snapshot; updates replace the snapshot so no lock
/// is held while a query runs.
#[derive(Debug, Default)]
pub struct TenantRegistries {
    /// Keyed by index name: tenants differing only by case share one index.
    registries: RwLock<HashMap<String, Arc<FieldTypeRegistry>>>,
}

impl TenantRegistries {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current registry of a tenant; envelope fields only if nothing was configured.
    pub fn snapshot(&self, tenant: &TenantId) -> Arc<FieldTypeRegistry> {
        if let Some(registry) = self.registries.read().get(&tenant.index_name()) {
            return Arc::clone(registry);
        }
        Arc::new(FieldTypeRegistry::with_envelope())
    }

    /// Applies an update on top of the tenant's current registry.
    pub fn update<F>(&self, tenant: &TenantId, apply: F) -> Arc<FieldTypeRegistry>
    where
        F: FnOnce(&mut FieldTypeRegistry),
    {
        let key = tenant.index_name();
        let mut registries = self.registries.write();
        let mut next = registries
            .get(&key)
            .map(|r| FieldTypeRegistry::clone(r))
            .unwrap_or_else(FieldTypeRegistry::with_envelope);
        apply(&mut next);
        let next = Arc::new(next);
        registries.insert(key, Arc::clone(&next));
        next
    }

    /// Replaces the tenant's registry.
    pub fn replace(&self, tenant: &TenantId, registry: FieldTypeRegistry) {
        self.registries
            .write()
            .insert(tenant.index_name(), Arc::new(registry));
    }

    /// Forgets the tenant's registry, e.g. after its index was deleted.
    pub fn remove(&self, tenant: &TenantId) {
        self.registries.write().remove(&tenant.index_name());
    }
}
