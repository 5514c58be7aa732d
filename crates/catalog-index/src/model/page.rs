//! Page requests and result pages.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::facet::{Facet, FacetFailure};

/// Default number of items per page.
pub const DEFAULT_PAGE_SIZE: u64 = 20;

/// A zero-based page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    /// Zero-based page number.
    pub page: u64,
    /// Number of items per page.
    pub size: u64,
}

impl PageRequest {
    pub fn new(page: u64, size: u64) -> Self {
        Self { page, size }
    }

    /// First page of the given size.
    pub fn of_size(size: u64) -> Self {
        Self { page: 0, size }
    }

    /// Index of the first item of this page.
    pub fn offset(&self) -> u64 {
        self.page.saturating_mul(self.size)
    }

    /// The following page.
    pub fn next(&self) -> Self {
        Self {
            page: self.page.saturating_add(1),
            size: self.size,
        }
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::of_size(DEFAULT_PAGE_SIZE)
    }
}

/// A page of search results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    /// The items in this page.
    pub content: Vec<T>,

    /// The request this page answers.
    pub request: PageRequest,

    /// Total number of matching items across all pages.
    pub total: u64,
}

impl<T> Page<T> {
    pub fn new(content: Vec<T>, request: PageRequest, total: u64) -> Self {
        Self {
            content,
            request,
            total,
        }
    }

    /// Creates an empty page for the request.
    pub fn empty(request: PageRequest) -> Self {
        Self::new(Vec::new(), request, 0)
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    pub fn len(&self) -> usize {
        self.content.len()
    }

    /// Number of pages needed to hold `total` items.
    pub fn total_pages(&self) -> u64 {
        if self.request.size == 0 {
            0
        } else {
            self.total.div_ceil(self.request.size)
        }
    }

    /// Returns true if items remain after this page.
    pub fn has_next(&self) -> bool {
        self.request
            .offset()
            .saturating_add(self.content.len() as u64)
            < self.total
    }

    /// Maps the items to a different type.
    pub fn map<U, F>(self, f: F) -> Page<U>
    where
        F: FnMut(T) -> U,
    {
        Page {
            content: self.content.into_iter().map(f).collect(),
            request: self.request,
            total: self.total,
        }
    }
}

/// A page augmented with the facets computed over the same matches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FacetPage<T> {
    /// The page of results.
    pub page: Page<T>,

    /// Facets keyed by requested field path.
    pub facets: BTreeMap<String, Facet>,

    /// Requested facets that could not be computed.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub facet_failures: Vec<FacetFailure>,
}

impl<T> FacetPage<T> {
    pub fn without_facets(page: Page<T>) -> Self {
        Self {
            page,
            facets: BTreeMap::new(),
            facet_failures: Vec::new(),
        }
    }

    pub fn content(&self) -> &[T] {
        &self.page.content
    }

    pub fn total(&self) -> u64 {
        self.page.total
    }

    pub fn facet(&self, field: &str) -> Option<&Facet> {
        self.facets.get(field)
    }

    pub fn into_page(self) -> Page<T> {
        self.page
    }
}
