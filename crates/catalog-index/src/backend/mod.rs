//! Search engine seam.
//!
//! Every component talks to the engine through [`EngineClient`], which
//! exposes the handful of index, document and search calls the core needs
//! with request and response bodies as raw JSON. [`ElasticsearchClient`] is
//! the production implementation.

mod elasticsearch;
#[cfg(test)]
pub(crate) mod testing;

pub use self::elasticsearch::{ElasticsearchAuth, ElasticsearchClient, ElasticsearchConfig};

use std::fmt::Debug;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::BackendError;

/// Result type for engine calls.
pub type BackendResult<T> = Result<T, BackendError>;

/// Engine operations used by the lifecycle, bulk and search components.
///
/// Implementations are shared between tasks, so they must be `Send + Sync`
/// and must not hold locks across calls.
#[async_trait]
pub trait EngineClient: Send + Sync + Debug {
    async fn index_exists(&self, index: &str) -> BackendResult<bool>;

    /// Creates an index. Returns `false` when it already existed.
    async fn create_index(&self, index: &str, body: Value) -> BackendResult<bool>;

    /// Deletes an index. Returns `false` when it did not exist.
    async fn delete_index(&self, index: &str) -> BackendResult<bool>;

    /// Additive mapping update (`{"properties": {...}}`).
    async fn put_mapping(&self, index: &str, mapping: Value) -> BackendResult<()>;

    /// The index mapping (`{"properties": {...}}`).
    async fn get_mapping(&self, index: &str) -> BackendResult<Value>;

    async fn refresh(&self, index: &str) -> BackendResult<()>;

    /// Indexes one document and returns the raw response (`result` is
    /// `created` or `updated` on success).
    async fn index_document(&self, index: &str, id: &str, source: Value) -> BackendResult<Value>;

    /// Sends bulk operations (action and source lines) and returns the raw response.
    async fn bulk(&self, index: &str, operations: Vec<Value>) -> BackendResult<Value>;

    /// `_source` of a document, `None` when it does not exist.
    async fn get_document(&self, index: &str, id: &str) -> BackendResult<Option<Value>>;

    /// `_source` of several documents in request order; misses are `None`.
    async fn multi_get(&self, index: &str, ids: &[String]) -> BackendResult<Vec<Option<Value>>>;

    /// Returns `false` when the document did not exist.
    async fn delete_document(&self, index: &str, id: &str) -> BackendResult<bool>;

    /// Runs a search request body and returns the raw response.
    async fn search(&self, index: &str, body: Value) -> BackendResult<Value>;

    async fn count(&self, index: &str, query: Value) -> BackendResult<u64>;

    /// Returns the number of deleted documents.
    async fn delete_by_query(&self, index: &str, query: Value) -> BackendResult<u64>;
}
