//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use catalog_index::model::{Indexable, ModelAttribute, PropertyType};
use catalog_index::registry::FieldTypeRegistry;
use serde::{Deserialize, Serialize};

pub const DATA_TYPE: &str = "DATA";
pub const DATASET_TYPE: &str = "DATASET";

/// Model attributes of the test documents, relative to `feature`.
pub fn data_attributes() -> Vec<ModelAttribute> {
    vec![
        ModelAttribute::new("size", PropertyType::Integer),
        ModelAttribute::new("weight", PropertyType::Double),
        ModelAttribute::new("text", PropertyType::String),
        ModelAttribute::new("values", PropertyType::DoubleArray),
        ModelAttribute::new("range", PropertyType::LongInterval),
        ModelAttribute::new("created", PropertyType::Date),
    ]
}

/// Registry declaring [`data_attributes`] the way the mapping manager does.
pub fn data_registry() -> FieldTypeRegistry {
    let mut registry = FieldTypeRegistry::with_envelope();
    for attribute in data_attributes() {
        registry.register_type(
            format!("feature.{}", attribute.json_path),
            attribute.property_type,
        );
    }
    registry
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Interval {
    #[serde(rename = "lowerBound")]
    pub lower_bound: i64,
    #[serde(rename = "upperBound")]
    pub upper_bound: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    pub size: i64,
    pub weight: f64,
    pub text: String,
    pub values: Vec<f64>,
    pub range: Interval,
    pub created: String,
}

/// A searchable document of type `DATA`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Data {
    #[serde(rename = "docId")]
    pub doc_id: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub feature: Feature,
}

impl Indexable for Data {
    fn doc_id(&self) -> &str {
        &self.doc_id
    }

    fn doc_type(&self) -> &str {
        DATA_TYPE
    }
}

/// Document `n` of the ten-document corpus: `size` is `n`, `weight` is `n`
/// as a double, `range` is `[n, n + 2]`, created on day `n` of January 2024.
/// Odd documents mention "Lorem" in their text.
pub fn data(n: i64) -> Data {
    let text = if n % 2 == 1 {
        format!("Lorem ipsum number {}", n)
    } else {
        format!("dolor sit amet {}", n)
    };
    Data {
        doc_id: format!("data-{:02}", n),
        tags: Vec::new(),
        feature: Feature {
            size: n,
            weight: n as f64,
            text,
            values: vec![n as f64 * 0.5, n as f64 * 1.5],
            range: Interval {
                lower_bound: n,
                upper_bound: n + 2,
            },
            created: format!("2024-01-{:02}T12:00:00.000Z", n),
        },
    }
}

/// The ten-document corpus, sizes 1 to 10.
pub fn corpus() -> Vec<Data> {
    (1..=10).map(data).collect()
}

/// A join target of type `DATASET`; its id is the URN other documents tag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    #[serde(rename = "docId")]
    pub urn: String,
    pub label: String,
}

impl Indexable for Dataset {
    fn doc_id(&self) -> &str {
        &self.urn
    }

    fn doc_type(&self) -> &str {
        DATASET_TYPE
    }
}

pub fn dataset_urn(tenant: &str, n: u8) -> String {
    format!(
        "URN:AIP:DATASET:{}:0f2b7c1e-3c35-4a8e-9d1f-2b1b6b7e9a{:02}:V1",
        tenant, n
    )
}
