//! Facet request and response types.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Kind of facet requested for a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FacetType {
    /// Most frequent values with their occurrence count.
    String,
    /// Equal-width histogram over the observed value range.
    Numeric,
    /// One bucket per calendar day.
    Date,
}

impl fmt::Display for FacetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FacetType::String => "STRING",
            FacetType::Numeric => "NUMERIC",
            FacetType::Date => "DATE",
        };
        write!(f, "{}", name)
    }
}

/// A facet computed over the documents matching a search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Facet {
    String(StringFacet),
    Numeric(NumericFacet),
    Date(DateFacet),
}

impl Facet {
    pub fn facet_type(&self) -> FacetType {
        match self {
            Facet::String(_) => FacetType::String,
            Facet::Numeric(_) => FacetType::Numeric,
            Facet::Date(_) => FacetType::Date,
        }
    }

    pub fn as_string(&self) -> Option<&StringFacet> {
        match self {
            Facet::String(f) => Some(f),
            _ => None,
        }
    }

    pub fn as_numeric(&self) -> Option<&NumericFacet> {
        match self {
            Facet::Numeric(f) => Some(f),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<&DateFacet> {
        match self {
            Facet::Date(f) => Some(f),
            _ => None,
        }
    }
}

/// Value to occurrence-count table, most frequent first.
///
/// On array fields a document contributes once per distinct element, so the
/// counts add up to occurrences rather than documents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StringFacet {
    pub values: Vec<(String, u64)>,
    /// Occurrences of values that did not make it into `values`.
    #[serde(default)]
    pub others: u64,
}

impl StringFacet {
    /// Sum of all occurrences, including the ones beyond the returned values.
    pub fn total_occurrences(&self) -> u64 {
        self.values.iter().map(|(_, count)| count).sum::<u64>() + self.others
    }

    pub fn count_of(&self, value: &str) -> Option<u64> {
        self.values
            .iter()
            .find(|(v, _)| v == value)
            .map(|(_, count)| *count)
    }
}

/// Half-open bucket `[from, to)`; the last bucket of a facet is closed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NumericBucket {
    pub from: f64,
    pub to: f64,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NumericFacet {
    pub buckets: Vec<NumericBucket>,
}

impl NumericFacet {
    pub fn total_count(&self) -> u64 {
        self.buckets.iter().map(|b| b.count).sum()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DateBucket {
    pub day: NaiveDate,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DateFacet {
    pub buckets: Vec<DateBucket>,
}

impl DateFacet {
    pub fn total_count(&self) -> u64 {
        self.buckets.iter().map(|b| b.count).sum()
    }
}

/// A requested facet that was left out of the result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FacetFailure {
    pub field: String,
    pub facet_type: FacetType,
    pub reason: String,
}
