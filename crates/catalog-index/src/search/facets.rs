//! Facet aggregations.
//!
//! A facet request is planned against the field registry first: fields that
//! are unknown or whose type cannot produce the requested facet are recorded
//! as failures and left out, the others become aggregations attached to the
//! criterion-filtered search. Numeric facets need the observed value range,
//! so they are computed in two passes: a `stats` pass and then a `range`
//! pass with equal-width buckets.

use std::collections::BTreeMap;

use chrono::DateTime;
use serde_json::{Map, Value, json};

use crate::error::SearchError;
use crate::model::{
    DateBucket, DateFacet, Facet, FacetFailure, FacetType, NumericBucket, NumericFacet, Shape,
    StringFacet, ValueFamily,
};
use crate::registry::FieldTypeRegistry;

/// Requested facets keyed by field path.
pub type FacetRequests = BTreeMap<String, FacetType>;

/// Sizes of the facet aggregations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FacetSettings {
    /// Number of values returned by a string facet.
    pub string_size: usize,
    /// Number of buckets of a numeric facet.
    pub numeric_buckets: usize,
}

impl Default for FacetSettings {
    fn default() -> Self {
        Self {
            string_size: 50,
            numeric_buckets: 10,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
struct PlannedFacet {
    field: String,
    path: String,
    facet_type: FacetType,
}

impl PlannedFacet {
    fn name(&self, position: usize) -> String {
        format!("facet_{}", position)
    }
}

/// The facets that can be computed, and the ones that cannot.
#[derive(Debug, Clone, Default)]
pub(crate) struct FacetPlan {
    facets: Vec<PlannedFacet>,
    failures: Vec<FacetFailure>,
    settings: FacetSettings,
}

impl FacetPlan {
    pub(crate) fn new(
        registry: &FieldTypeRegistry,
        requests: &FacetRequests,
        settings: FacetSettings,
    ) -> Self {
        let mut plan = Self {
            settings,
            ..Default::default()
        };
        for (field, &facet_type) in requests {
            match plan_facet(registry, field, facet_type) {
                Ok(path) => plan.facets.push(PlannedFacet {
                    field: field.clone(),
                    path,
                    facet_type,
                }),
                Err(e) => {
                    tracing::warn!(field = %field, facet_type = %facet_type, error = %e, "Facet skipped");
                    plan.failures.push(FacetFailure {
                        field: field.clone(),
                        facet_type,
                        reason: e.to_string(),
                    });
                }
            }
        }
        plan
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.facets.is_empty()
    }

    /// `stats` aggregations of the numeric facets, `None` when there are none.
    pub(crate) fn stats_aggregations(&self) -> Option<Value> {
        let mut aggs = Map::new();
        for (position, facet) in self.facets.iter().enumerate() {
            if facet.facet_type == FacetType::Numeric {
                aggs.insert(
                    facet.name(position),
                    json!({ "stats": { "field": facet.path } }),
                );
            }
        }
        (!aggs.is_empty()).then_some(Value::Object(aggs))
    }

    /// Aggregations of the main search.
    ///
    /// `stats` is the aggregation part of the stats pass response; numeric
    /// facets with no observed value get no aggregation.
    pub(crate) fn aggregations(&self, stats: Option<&Value>) -> Value {
        let mut aggs = Map::new();
        for (position, facet) in self.facets.iter().enumerate() {
            let name = facet.name(position);
            let aggregation = match facet.facet_type {
                FacetType::String => Some(json!({
                    "terms": { "field": facet.path, "size": self.settings.string_size }
                })),
                FacetType::Date => Some(json!({
                    "date_histogram": {
                        "field": facet.path,
                        "calendar_interval": "1d",
                        "min_doc_count": 1
                    }
                })),
                FacetType::Numeric => stats
                    .and_then(|s| s.get(&name))
                    .and_then(observed_range)
                    .map(|(min, max)| {
                        json!({
                            "range": {
                                "field": facet.path,
                                "ranges": numeric_ranges(min, max, self.settings.numeric_buckets)
                            }
                        })
                    }),
            };
            if let Some(aggregation) = aggregation {
                aggs.insert(name, aggregation);
            }
        }
        Value::Object(aggs)
    }

    /// Shapes the aggregation results into facets.
    ///
    /// Facets whose aggregation is missing or has no bucket are left out.
    pub(crate) fn decode(
        self,
        aggregations: Option<&Value>,
        stats: Option<&Value>,
    ) -> (BTreeMap<String, Facet>, Vec<FacetFailure>) {
        let mut facets = BTreeMap::new();
        for (position, planned) in self.facets.iter().enumerate() {
            let name = planned.name(position);
            let Some(result) = aggregations.and_then(|a| a.get(&name)) else {
                continue;
            };
            let facet = match planned.facet_type {
                FacetType::String => decode_terms(result, self.settings.string_size),
                FacetType::Date => decode_histogram(result),
                FacetType::Numeric => stats
                    .and_then(|s| s.get(&name))
                    .and_then(observed_range)
                    .and_then(|(_, max)| decode_ranges(result, max)),
            };
            if let Some(facet) = facet {
                facets.insert(planned.field.clone(), facet);
            }
        }
        (facets, self.failures)
    }
}

fn plan_facet(
    registry: &FieldTypeRegistry,
    field: &str,
    facet_type: FacetType,
) -> Result<String, SearchError> {
    let unsupported = |reason: &str| SearchError::UnsupportedFacetField {
        field: field.to_string(),
        facet_type: facet_type.to_string(),
        reason: reason.to_string(),
    };
    let def = registry
        .get(field)
        .ok_or_else(|| unsupported("field is not registered"))?;
    let property_type = def.property_type;
    if property_type.shape() == Shape::Interval {
        return Err(unsupported(&format!("{} fields cannot be faceted", property_type)));
    }
    let compatible = match facet_type {
        FacetType::String => property_type.family() == ValueFamily::Text,
        FacetType::Numeric => matches!(
            property_type.family(),
            ValueFamily::Integral | ValueFamily::Floating
        ),
        FacetType::Date => property_type.family() == ValueFamily::Temporal,
    };
    if !compatible {
        return Err(unsupported(&format!("field is of type {}", property_type)));
    }
    if facet_type == FacetType::String && def.analyzed && !def.keyword_subfield {
        return Err(unsupported("analysed text without an exact sub-field"));
    }
    Ok(def.exact_path(field))
}

/// `(min, max)` of a stats result, `None` when no value was observed.
fn observed_range(stats: &Value) -> Option<(f64, f64)> {
    if stats.get("count").and_then(Value::as_u64).unwrap_or(0) == 0 {
        return None;
    }
    let min = stats.get("min").and_then(Value::as_f64)?;
    let max = stats.get("max").and_then(Value::as_f64)?;
    Some((min, max))
}

/// Equal-width `[from, to)` ranges between `min` and `max`; the last range is
/// left open so that `max` itself falls in it.
fn numeric_ranges(min: f64, max: f64, buckets: usize) -> Vec<Value> {
    let buckets = buckets.max(1);
    if max <= min {
        return vec![json!({ "from": min })];
    }
    let width = (max - min) / buckets as f64;
    (0..buckets)
        .map(|i| {
            let from = min + width * i as f64;
            if i + 1 == buckets {
                json!({ "from": from })
            } else {
                json!({ "from": from, "to": min + width * (i + 1) as f64 })
            }
        })
        .collect()
}

fn buckets(result: &Value) -> &[Value] {
    result
        .get("buckets")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default()
}

fn decode_terms(result: &Value, size: usize) -> Option<Facet> {
    let values: Vec<(String, u64)> = buckets(result)
        .iter()
        .filter_map(|bucket| {
            let key = match bucket.get("key_as_string").or_else(|| bucket.get("key"))? {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            Some((key, bucket.get("doc_count")?.as_u64()?))
        })
        .take(size)
        .collect();
    if values.is_empty() {
        return None;
    }
    Some(Facet::String(StringFacet {
        values,
        others: result
            .get("sum_other_doc_count")
            .and_then(Value::as_u64)
            .unwrap_or(0),
    }))
}

fn decode_histogram(result: &Value) -> Option<Facet> {
    let buckets: Vec<DateBucket> = buckets(result)
        .iter()
        .filter_map(|bucket| {
            let millis = bucket.get("key").and_then(Value::as_i64)?;
            let count = bucket.get("doc_count").and_then(Value::as_u64)?;
            (count > 0).then_some(DateBucket {
                day: DateTime::from_timestamp_millis(millis)?.date_naive(),
                count,
            })
        })
        .collect();
    (!buckets.is_empty()).then_some(Facet::Date(DateFacet { buckets }))
}

fn decode_ranges(result: &Value, max: f64) -> Option<Facet> {
    let buckets: Vec<NumericBucket> = buckets(result)
        .iter()
        .filter_map(|bucket| {
            Some(NumericBucket {
                from: bucket.get("from").and_then(Value::as_f64)?,
                to: bucket.get("to").and_then(Value::as_f64).unwrap_or(max),
                count: bucket.get("doc_count").and_then(Value::as_u64)?,
            })
        })
        .collect();
    (!buckets.is_empty()).then_some(Facet::Numeric(NumericFacet { buckets }))
}
