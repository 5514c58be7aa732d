//! Search execution, facet aggregation and join resolution.

mod executor;
mod facets;
mod join;

pub use executor::SearchExecutor;
pub use facets::{FacetRequests, FacetSettings};
pub use join::{JoinPolicy, JoinResolver};
