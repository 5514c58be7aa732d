//! Criterion algebra.
//!
//! A [`Criterion`] is an immutable predicate tree over document fields. Leaves
//! compare one field with a literal; `And`, `Or` and `Not` combine them. The
//! set of variants is closed so the query compiler matches it exhaustively.
//!
//! # Example
//!
//! ```
//! use catalog_index::criterion::Criterion;
//!
//! let criterion = Criterion::and([
//!     Criterion::between("feature.size", 2, 4),
//!     Criterion::not(Criterion::eq("feature.name", "draft")),
//! ]);
//! assert_eq!(criterion.fields(), vec!["feature.size", "feature.name"]);
//! ```

mod value;

pub use value::{CriterionValue, StringMatchType, format_date};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A typed predicate or boolean combinator.
///
/// Bounds of `Between`, `Ge` and `Le` are inclusive; an exclusive bound is
/// expressed by wrapping the opposite comparison in `Not`. An empty `And`
/// matches every document and an empty `Or` matches none.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Criterion {
    All,
    And(Vec<Criterion>),
    Or(Vec<Criterion>),
    Not(Box<Criterion>),
    #[serde(rename_all = "camelCase")]
    Eq {
        field: String,
        value: CriterionValue,
        #[serde(default)]
        tolerance: Option<f64>,
        #[serde(default)]
        match_type: StringMatchType,
    },
    #[serde(rename_all = "camelCase")]
    Ne {
        field: String,
        value: CriterionValue,
        #[serde(default)]
        tolerance: Option<f64>,
        #[serde(default)]
        match_type: StringMatchType,
    },
    Gt {
        field: String,
        value: CriterionValue,
    },
    Ge {
        field: String,
        value: CriterionValue,
    },
    Lt {
        field: String,
        value: CriterionValue,
    },
    Le {
        field: String,
        value: CriterionValue,
    },
    Between {
        field: String,
        lower: CriterionValue,
        upper: CriterionValue,
    },
    #[serde(rename_all = "camelCase")]
    In {
        field: String,
        values: Vec<CriterionValue>,
        #[serde(default)]
        tolerance: Option<f64>,
        #[serde(default)]
        match_type: StringMatchType,
    },
    #[serde(rename_all = "camelCase")]
    StartsWith {
        field: String,
        text: String,
        #[serde(default = "StringMatchType::full_text")]
        match_type: StringMatchType,
    },
    #[serde(rename_all = "camelCase")]
    EndsWith {
        field: String,
        text: String,
        #[serde(default = "StringMatchType::full_text")]
        match_type: StringMatchType,
    },
    /// Array membership: at least one element equals `value`.
    Contains {
        field: String,
        value: CriterionValue,
        #[serde(default)]
        tolerance: Option<f64>,
    },
    /// At least one date of an array field falls inside `[start, end]`.
    ContainsDateBetween {
        field: String,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },
    /// The scalar falls inside a stored `[lowerBound, upperBound]` interval.
    Into {
        field: String,
        value: CriterionValue,
    },
    /// The stored interval overlaps `[lower, upper]`.
    Intersects {
        field: String,
        lower: CriterionValue,
        upper: CriterionValue,
    },
    /// The field holds at least one value.
    Exists {
        field: String,
    },
    #[serde(rename_all = "camelCase")]
    Regexp {
        field: String,
        pattern: String,
        #[serde(default)]
        match_type: StringMatchType,
    },
}

impl Criterion {
    pub fn all() -> Self {
        Criterion::All
    }

    pub fn and(criteria: impl IntoIterator<Item = Criterion>) -> Self {
        Criterion::And(criteria.into_iter().collect())
    }

    pub fn or(criteria: impl IntoIterator<Item = Criterion>) -> Self {
        Criterion::Or(criteria.into_iter().collect())
    }

    pub fn not(criterion: Criterion) -> Self {
        Criterion::Not(Box::new(criterion))
    }

    /// Whole-value equality. Strings are compared as keywords.
    pub fn eq(field: impl Into<String>, value: impl Into<CriterionValue>) -> Self {
        Criterion::Eq {
            field: field.into(),
            value: value.into(),
            tolerance: None,
            match_type: StringMatchType::Keyword,
        }
    }

    /// Equality on an analysed text field: every token of `text` must match.
    pub fn eq_full_text(field: impl Into<String>, text: impl Into<String>) -> Self {
        Criterion::Eq {
            field: field.into(),
            value: CriterionValue::String(text.into()),
            tolerance: None,
            match_type: StringMatchType::FullText,
        }
    }

    /// Floating equality: matches values in `[value - tolerance, value + tolerance]`.
    pub fn eq_with_tolerance(field: impl Into<String>, value: f64, tolerance: f64) -> Self {
        Criterion::Eq {
            field: field.into(),
            value: CriterionValue::Double(value),
            tolerance: Some(tolerance),
            match_type: StringMatchType::Keyword,
        }
    }

    pub fn ne(field: impl Into<String>, value: impl Into<CriterionValue>) -> Self {
        Criterion::Ne {
            field: field.into(),
            value: value.into(),
            tolerance: None,
            match_type: StringMatchType::Keyword,
        }
    }

    pub fn ne_with_tolerance(field: impl Into<String>, value: f64, tolerance: f64) -> Self {
        Criterion::Ne {
            field: field.into(),
            value: CriterionValue::Double(value),
            tolerance: Some(tolerance),
            match_type: StringMatchType::Keyword,
        }
    }

    pub fn gt(field: impl Into<String>, value: impl Into<CriterionValue>) -> Self {
        Criterion::Gt {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn ge(field: impl Into<String>, value: impl Into<CriterionValue>) -> Self {
        Criterion::Ge {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn lt(field: impl Into<String>, value: impl Into<CriterionValue>) -> Self {
        Criterion::Lt {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn le(field: impl Into<String>, value: impl Into<CriterionValue>) -> Self {
        Criterion::Le {
            field: field.into(),
            value: value.into(),
        }
    }

    /// Inclusive range on both ends.
    pub fn between(
        field: impl Into<String>,
        lower: impl Into<CriterionValue>,
        upper: impl Into<CriterionValue>,
    ) -> Self {
        Criterion::Between {
            field: field.into(),
            lower: lower.into(),
            upper: upper.into(),
        }
    }

    pub fn in_values<V: Into<CriterionValue>>(
        field: impl Into<String>,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        Criterion::In {
            field: field.into(),
            values: values.into_iter().map(Into::into).collect(),
            tolerance: None,
            match_type: StringMatchType::Keyword,
        }
    }

    pub fn in_with_tolerance(
        field: impl Into<String>,
        values: impl IntoIterator<Item = f64>,
        tolerance: f64,
    ) -> Self {
        Criterion::In {
            field: field.into(),
            values: values.into_iter().map(CriterionValue::Double).collect(),
            tolerance: Some(tolerance),
            match_type: StringMatchType::Keyword,
        }
    }

    /// Per-token prefix match: any word of the field starting with `text`.
    pub fn starts_with(field: impl Into<String>, text: impl Into<String>) -> Self {
        Criterion::StartsWith {
            field: field.into(),
            text: text.into(),
            match_type: StringMatchType::FullText,
        }
    }

    /// Whole-value prefix match.
    pub fn starts_with_keyword(field: impl Into<String>, text: impl Into<String>) -> Self {
        Criterion::StartsWith {
            field: field.into(),
            text: text.into(),
            match_type: StringMatchType::Keyword,
        }
    }

    /// Per-token suffix match: any word of the field ending with `text`.
    pub fn ends_with(field: impl Into<String>, text: impl Into<String>) -> Self {
        Criterion::EndsWith {
            field: field.into(),
            text: text.into(),
            match_type: StringMatchType::FullText,
        }
    }

    pub fn ends_with_keyword(field: impl Into<String>, text: impl Into<String>) -> Self {
        Criterion::EndsWith {
            field: field.into(),
            text: text.into(),
            match_type: StringMatchType::Keyword,
        }
    }

    pub fn contains(field: impl Into<String>, value: impl Into<CriterionValue>) -> Self {
        Criterion::Contains {
            field: field.into(),
            value: value.into(),
            tolerance: None,
        }
    }

    pub fn contains_with_tolerance(field: impl Into<String>, value: f64, tolerance: f64) -> Self {
        Criterion::Contains {
            field: field.into(),
            value: CriterionValue::Double(value),
            tolerance: Some(tolerance),
        }
    }

    pub fn contains_date_between(
        field: impl Into<String>,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Self {
        Criterion::ContainsDateBetween {
            field: field.into(),
            start,
            end,
        }
    }

    /// The value lies inside the interval stored in `field`.
    pub fn into_range(field: impl Into<String>, value: impl Into<CriterionValue>) -> Self {
        Criterion::Into {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn intersects(
        field: impl Into<String>,
        lower: impl Into<CriterionValue>,
        upper: impl Into<CriterionValue>,
    ) -> Self {
        Criterion::Intersects {
            field: field.into(),
            lower: lower.into(),
            upper: upper.into(),
        }
    }

    pub fn exists(field: impl Into<String>) -> Self {
        Criterion::Exists {
            field: field.into(),
        }
    }

    pub fn regexp(field: impl Into<String>, pattern: impl Into<String>) -> Self {
        Criterion::Regexp {
            field: field.into(),
            pattern: pattern.into(),
            match_type: StringMatchType::Keyword,
        }
    }

    /// Returns true for a tree that matches every document.
    pub fn is_all(&self) -> bool {
        match self {
            Criterion::All => true,
            Criterion::And(children) => children.iter().all(Criterion::is_all),
            _ => false,
        }
    }

    /// Field path of a leaf, `None` for combinators.
    pub fn field(&self) -> Option<&str> {
        match self {
            Criterion::All | Criterion::And(_) | Criterion::Or(_) | Criterion::Not(_) => None,
            Criterion::Eq { field, .. }
            | Criterion::Ne { field, .. }
            | Criterion::Gt { field, .. }
            | Criterion::Ge { field, .. }
            | Criterion::Lt { field, .. }
            | Criterion::Le { field, .. }
            | Criterion::Between { field, .. }
            | Criterion::In { field, .. }
            | Criterion::StartsWith { field, .. }
            | Criterion::EndsWith { field, .. }
            | Criterion::Contains { field, .. }
            | Criterion::ContainsDateBetween { field, .. }
            | Criterion::Into { field, .. }
            | Criterion::Intersects { field, .. }
            | Criterion::Exists { field }
            | Criterion::Regexp { field, .. } => Some(field),
        }
    }

    /// Direct children of a combinator.
    pub fn children(&self) -> &[Criterion] {
        match self {
            Criterion::And(children) | Criterion::Or(children) => children,
            Criterion::Not(child) => std::slice::from_ref(child.as_ref()),
            _ => &[],
        }
    }

    /// Visits every node depth-first, parents before children.
    pub fn visit<F: FnMut(&Criterion)>(&self, visitor: &mut F) {
        visitor(self);
        for child in self.children() {
            child.visit(visitor);
        }
    }

    /// Every field path referenced by the tree, in first-seen order.
    pub fn fields(&self) -> Vec<&str> {
        let mut fields: Vec<&str> = Vec::new();
        self.collect_fields(&mut fields);
        fields
    }

    fn collect_fields<'a>(&'a self, fields: &mut Vec<&'a str>) {
        if let Some(field) = self.field()
            && !fields.contains(&field)
        {
            fields.push(field);
        }
        for child in self.children() {
            child.collect_fields(fields);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_builders_default_match_types() {
        match Criterion::starts_with("label", "Lor") {
            Criterion::StartsWith { match_type, .. } => {
                assert_eq!(match_type, StringMatchType::FullText)
            }
            other => panic!("unexpected {:?}", other),
        }
        match Criterion::eq("label", "Lorem") {
            Criterion::Eq {
                match_type,
                tolerance,
                ..
            } => {
                assert_eq!(match_type, StringMatchType::Keyword);
                assert!(tolerance.is_none());
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_is_all() {
        assert!(Criterion::all().is_all());
        assert!(Criterion::and([]).is_all());
        assert!(Criterion::and([Criterion::all(), Criterion::and([])]).is_all());
        assert!(!Criterion::or([]).is_all());
        assert!(!Criterion::eq("a", 1).is_all());
    }

    #[test]
    fn test_fields_are_deduplicated_in_order() {
        let criterion = Criterion::or([
            Criterion::gt("size", 5),
            Criterion::not(Criterion::le("weight", 2.0)),
            Criterion::and([Criterion::lt("size", 9), Criterion::exists("tags")]),
        ]);
        assert_eq!(criterion.fields(), vec!["size", "weight", "tags"]);
    }

    #[test]
    fn test_visit_counts_nodes() {
        let criterion = Criterion::and([
            Criterion::eq("a", 1),
            Criterion::not(Criterion::eq("b", 2)),
        ]);
        let mut count = 0;
        criterion.visit(&mut |_| count += 1);
        assert_eq!(count, 4);
    }

    #[test]
    fn test_serde_round_trip_shape() {
        let criterion = Criterion::and([
            Criterion::gt("feature.size", 5),
            Criterion::starts_with("feature.label", "Lor"),
        ]);
        let json = serde_json::to_value(&criterion).unwrap();
        assert_eq!(json["and"][0]["gt"]["field"], "feature.size");
        assert_eq!(json["and"][0]["gt"]["value"], json!({ "int": 5 }));
        assert_eq!(json["and"][1]["startsWith"]["matchType"], "FULL_TEXT");

        let back: Criterion = serde_json::from_value(json).unwrap();
        assert_eq!(back, criterion);
    }

    #[test]
    fn test_deserialize_applies_defaults() {
        let criterion: Criterion = serde_json::from_value(json!({
            "endsWith": { "field": "label", "text": "sum" }
        }))
        .unwrap();
        assert_eq!(criterion, Criterion::ends_with("label", "sum"));

        let all: Criterion = serde_json::from_value(json!("all")).unwrap();
        assert!(all.is_all());
    }
}
