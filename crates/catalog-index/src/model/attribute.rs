//! Attribute model types consumed by the mapping configurator.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Declared value type of an indexed field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PropertyType {
    String,
    Url,
    Integer,
    Long,
    Double,
    Boolean,
    Date,
    StringArray,
    IntegerArray,
    LongArray,
    DoubleArray,
    DateArray,
    IntegerInterval,
    LongInterval,
    DoubleInterval,
    DateInterval,
    Json,
    Object,
}

/// The kind of literal a field holds, regardless of cardinality.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueFamily {
    Text,
    Integral,
    Floating,
    Temporal,
    Boolean,
    Structured,
}

/// How values are laid out in the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    Scalar,
    Array,
    /// An object with `lowerBound` and `upperBound` members.
    Interval,
}

/// Member holding the lower end of an interval field.
pub const LOWER_BOUND: &str = "lowerBound";
/// Member holding the upper end of an interval field.
pub const UPPER_BOUND: &str = "upperBound";

impl PropertyType {
    pub fn family(self) -> ValueFamily {
        match self {
            PropertyType::String | PropertyType::Url | PropertyType::StringArray => {
                ValueFamily::Text
            }
            PropertyType::Integer
            | PropertyType::Long
            | PropertyType::IntegerArray
            | PropertyType::LongArray
            | PropertyType::IntegerInterval
            | PropertyType::LongInterval => ValueFamily::Integral,
            PropertyType::Double | PropertyType::DoubleArray | PropertyType::DoubleInterval => {
                ValueFamily::Floating
            }
            PropertyType::Date | PropertyType::DateArray | PropertyType::DateInterval => {
                ValueFamily::Temporal
            }
            PropertyType::Boolean => ValueFamily::Boolean,
            PropertyType::Json | PropertyType::Object => ValueFamily::Structured,
        }
    }

    pub fn shape(self) -> Shape {
        match self {
            PropertyType::StringArray
            | PropertyType::IntegerArray
            | PropertyType::LongArray
            | PropertyType::DoubleArray
            | PropertyType::DateArray => Shape::Array,
            PropertyType::IntegerInterval
            | PropertyType::LongInterval
            | PropertyType::DoubleInterval
            | PropertyType::DateInterval => Shape::Interval,
            _ => Shape::Scalar,
        }
    }

    /// Engine field type of a single value (or of each interval bound).
    pub fn engine_type(self) -> &'static str {
        match self {
            PropertyType::String | PropertyType::StringArray => "text",
            PropertyType::Url => "keyword",
            PropertyType::Integer | PropertyType::IntegerArray | PropertyType::IntegerInterval => {
                "integer"
            }
            PropertyType::Long | PropertyType::LongArray | PropertyType::LongInterval => "long",
            PropertyType::Double | PropertyType::DoubleArray | PropertyType::DoubleInterval => {
                "double"
            }
            PropertyType::Date | PropertyType::DateArray | PropertyType::DateInterval => "date",
            PropertyType::Boolean => "boolean",
            PropertyType::Json | PropertyType::Object => "object",
        }
    }
}

impl fmt::Display for PropertyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PropertyType::String => "STRING",
            PropertyType::Url => "URL",
            PropertyType::Integer => "INTEGER",
            PropertyType::Long => "LONG",
            PropertyType::Double => "DOUBLE",
            PropertyType::Boolean => "BOOLEAN",
            PropertyType::Date => "DATE_ISO8601",
            PropertyType::StringArray => "STRING_ARRAY",
            PropertyType::IntegerArray => "INTEGER_ARRAY",
            PropertyType::LongArray => "LONG_ARRAY",
            PropertyType::DoubleArray => "DOUBLE_ARRAY",
            PropertyType::DateArray => "DATE_ARRAY",
            PropertyType::IntegerInterval => "INTEGER_INTERVAL",
            PropertyType::LongInterval => "LONG_INTERVAL",
            PropertyType::DoubleInterval => "DOUBLE_INTERVAL",
            PropertyType::DateInterval => "DATE_INTERVAL",
            PropertyType::Json => "JSON",
            PropertyType::Object => "OBJECT",
        };
        write!(f, "{}", name)
    }
}

/// Restriction attached to an attribute in the external model.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Restriction {
    #[default]
    NoRestriction,
    Pattern {
        pattern: String,
    },
    Enumeration {
        values: Vec<String>,
    },
    IntegerRange {
        min: i64,
        max: i64,
    },
    DoubleRange {
        min: f64,
        max: f64,
    },
    JsonSchema {
        schema: Value,
    },
}

/// An attribute as published by the model-management collaborator.
///
/// `json_path` is relative to the document's `feature` object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelAttribute {
    pub json_path: String,
    pub property_type: PropertyType,
    #[serde(default)]
    pub restriction: Restriction,
    #[serde(default)]
    pub properties: BTreeMap<String, String>,
    /// Explicit engine mapping, as raw JSON text.
    #[serde(default)]
    pub es_mapping: Option<String>,
    #[serde(default = "default_indexed")]
    pub indexed: bool,
}

impl ModelAttribute {
    pub fn new(json_path: impl Into<String>, property_type: PropertyType) -> Self {
        Self {
            json_path: json_path.into(),
            property_type,
            restriction: Restriction::NoRestriction,
            properties: BTreeMap::new(),
            es_mapping: None,
            indexed: true,
        }
    }

    pub fn with_restriction(mut self, restriction: Restriction) -> Self {
        self.restriction = restriction;
        self
    }

    pub fn with_es_mapping(mut self, mapping: impl Into<String>) -> Self {
        self.es_mapping = Some(mapping.into());
        self
    }
}

/// One indexed field, ready to be turned into an engine mapping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttributeDescription {
    pub path: String,
    pub property_type: PropertyType,
    #[serde(default)]
    pub restriction: Restriction,
    #[serde(default)]
    pub properties: BTreeMap<String, String>,
    #[serde(default)]
    pub es_mapping: Option<Value>,
    #[serde(default = "default_indexed")]
    pub indexed: bool,
}

fn default_indexed() -> bool {
    true
}

impl AttributeDescription {
    pub fn new(path: impl Into<String>, property_type: PropertyType) -> Self {
        Self {
            path: path.into(),
            property_type,
            restriction: Restriction::NoRestriction,
            properties: BTreeMap::new(),
            es_mapping: None,
            indexed: true,
        }
    }

    pub fn with_es_mapping(mut self, mapping: Value) -> Self {
        self.es_mapping = Some(mapping);
        self
    }

    pub fn not_indexed(mut self) -> Self {
        self.indexed = false;
        self
    }
}
