//! Catalog Index
//!
//! Criterion search, faceting and per-tenant indexing core backed by
//! Elasticsearch. Callers describe what they look for with a typed
//! [`Criterion`] tree; the core compiles it against the declared field types
//! of the tenant index, runs it, decodes hits into typed entities and shapes
//! aggregations into facets.
//!
//! # Architecture
//!
//! - [`criterion`] - The predicate algebra
//! - [`registry`] - Declared type of every searchable field, per tenant
//! - [`query`] - Criterion and sort compilation to the Query DSL
//! - [`index`] - Index lifecycle, mappings and document writes
//! - [`search`] - Paged search, facets, metrics and join resolution
//! - [`backend`] - The engine seam and its Elasticsearch implementation
//! - [`service`] - Façade wiring the components together
//!
//! # Multitenancy
//!
//! Each tenant owns one index named after its lower-cased identifier. Every
//! operation takes the [`TenantId`](tenant::TenantId) explicitly.
//!
//! # Compiling a criterion
//!
//! ```
//! use catalog_index::criterion::Criterion;
//! use catalog_index::model::PropertyType;
//! use catalog_index::query::QueryCompiler;
//! use catalog_index::registry::FieldTypeRegistry;
//!
//! let mut registry = FieldTypeRegistry::with_envelope();
//! registry.register_type("feature.size", PropertyType::Integer);
//!
//! let criterion = Criterion::and([
//!     Criterion::between("feature.size", 2, 4),
//!     Criterion::eq("type", "DATA"),
//! ]);
//! let query = QueryCompiler::new(&registry).compile(&criterion).unwrap();
//! assert_eq!(query["bool"]["must"][0]["range"]["feature.size"]["gte"], 2);
//!
//! // Fields must be declared before they can be searched
//! assert!(QueryCompiler::new(&registry)
//!     .compile(&Criterion::eq("feature.unknown", 1))
//!     .is_err());
//! ```
//!
//! # Feature Flags
//!
//! - `cli` - Builds the `catalog-index-admin` binary
//! - `docker-tests` - Integration tests against an Elasticsearch container

pub mod backend;
pub mod config;
pub mod criterion;
pub mod error;
pub mod index;
#[cfg(feature = "cli")]
pub mod logging;
pub mod model;
pub mod query;
pub mod registry;
pub mod search;
pub mod service;
pub mod tenant;

pub use config::IndexerConfig;
pub use criterion::{Criterion, CriterionValue};
pub use error::{IndexerError, IndexerResult};
pub use service::IndexerService;
pub use tenant::TenantId;
