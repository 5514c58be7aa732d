//! Error types for the indexing and search core.
//!
//! Errors are grouped by the layer that raises them: the search engine
//! transport, criterion compilation, search execution, mapping management and
//! document handling. [`IndexerError`] wraps all of them.

// Error enum variant fields are self-documenting via their #[error(...)] messages
#![allow(missing_docs)]

use thiserror::Error;

/// The primary error type for all indexer operations.
#[derive(Error, Debug)]
pub enum IndexerError {
    /// Search engine and transport errors
    #[error(transparent)]
    Backend(#[from] BackendError),

    /// Criterion compilation errors
    #[error(transparent)]
    Compile(#[from] CompileError),

    /// Search execution errors
    #[error(transparent)]
    Search(#[from] SearchError),

    /// Mapping configuration errors
    #[error(transparent)]
    Mapping(#[from] MappingError),

    /// Document encoding errors
    #[error(transparent)]
    Document(#[from] DocumentError),
}

/// Errors originating from the search engine or its transport.
#[derive(Error, Debug)]
pub enum BackendError {
    /// The targeted index does not exist.
    #[error("index not found: {index}")]
    IndexNotFound { index: String },

    /// The engine could not be reached or did not answer in time.
    #[error("search engine unavailable: {message}")]
    Unavailable { message: String },

    /// The client could not be built from configuration.
    #[error("invalid engine configuration: {message}")]
    Configuration { message: String },

    /// The engine answered with a non-success status.
    #[error("engine request on '{index}' failed with status {status}: {message}")]
    Request {
        index: String,
        status: u16,
        message: String,
    },

    /// The engine answered with a body that could not be decoded.
    #[error("unexpected engine response: {message}")]
    InvalidResponse { message: String },
}

/// Errors raised while compiling a criterion into an engine query.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CompileError {
    /// The criterion references a field that has no declared type.
    #[error("invalid criterion field: '{field}' is not registered")]
    UnknownField { field: String },

    /// A floating point equality was requested without a tolerance.
    #[error("criterion on floating field '{field}' requires an explicit tolerance")]
    MissingTolerance { field: String },

    /// The operator is meaningless for the declared field type.
    #[error("operator '{operator}' is not supported on field '{field}' of type {property_type}")]
    UnsupportedOperator {
        operator: String,
        field: String,
        property_type: String,
    },

    /// The literal does not match the declared field type.
    #[error("field '{field}' expects {expected} but criterion value is {found}")]
    ValueTypeMismatch {
        field: String,
        expected: String,
        found: String,
    },

    /// A regular expression could not be parsed.
    #[error("invalid pattern for field '{field}': {message}")]
    InvalidPattern { field: String, message: String },
}

/// Errors related to search execution and result decoding.
#[derive(Error, Debug)]
pub enum SearchError {
    /// A hit carries a type tag that no decoder is registered for.
    #[error("invalid result type: no decoder registered for '{type_tag}'")]
    InvalidResultType { type_tag: String },

    /// A hit could not be decoded into the registered result type.
    #[error("failed to decode '{type_tag}' document {doc_id}: {message}")]
    DecodeFailed {
        type_tag: String,
        doc_id: String,
        message: String,
    },

    /// The requested page lies beyond the engine's result window.
    #[error("result window exceeded: from {from} + size {size} is above {max}")]
    ResultWindowExceeded { from: u64, size: u64, max: u64 },

    /// A facet was requested on a field that cannot produce it.
    #[error("unsupported facet field '{field}' for {facet_type}: {reason}")]
    UnsupportedFacetField {
        field: String,
        facet_type: String,
        reason: String,
    },
}

/// Errors related to mapping configuration.
#[derive(Error, Debug)]
pub enum MappingError {
    /// An attribute's JSON schema could not be flattened.
    #[error("invalid JSON schema for attribute '{attribute}': {message}")]
    InvalidSchema { attribute: String, message: String },

    /// An explicit engine mapping override is not valid JSON.
    #[error("invalid mapping override for '{path}': {message}")]
    InvalidOverride { path: String, message: String },

    /// The attribute path is empty or malformed.
    #[error("invalid attribute path '{path}'")]
    InvalidPath { path: String },
}

/// Errors related to document encoding.
#[derive(Error, Debug)]
pub enum DocumentError {
    /// The entity did not serialize to a JSON object.
    #[error("document {doc_type}/{doc_id} must serialize to a JSON object")]
    NotAnObject { doc_type: String, doc_id: String },

    /// Serialization/deserialization error.
    #[error("serialization error: {message}")]
    Serialization { message: String },
}

/// Result type alias for indexer operations.
pub type IndexerResult<T> = Result<T, IndexerError>;

impl From<serde_json::Error> for IndexerError {
    fn from(err: serde_json::Error) -> Self {
        IndexerError::Document(DocumentError::Serialization {
            message: err.to_string(),
        })
    }
}

impl IndexerError {
    /// Returns true when the error means the index does not exist.
    pub fn is_index_not_found(&self) -> bool {
        matches!(self, IndexerError::Backend(BackendError::IndexNotFound { .. }))
    }

    /// Returns true when the engine could not be reached.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, IndexerError::Backend(BackendError::Unavailable { .. }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compile_error_display() {
        let err = CompileError::UnknownField {
            field: "feature.size".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "invalid criterion field: 'feature.size' is not registered"
        );
    }

    #[test]
    fn test_transparent_wrapping() {
        let err: IndexerError = SearchError::InvalidResultType {
            type_tag: "DATASET".to_string(),
        }
        .into();
        assert!(err.to_string().contains("DATASET"));
        assert!(!err.is_index_not_found());
    }

    #[test]
    fn test_index_not_found_predicate() {
        let err: IndexerError = BackendError::IndexNotFound {
            index: "project1".to_string(),
        }
        .into();
        assert!(err.is_index_not_found());
        assert!(!err.is_unavailable());
    }

    #[test]
    fn test_serde_json_conversion() {
        let parse = serde_json::from_str::<serde_json::Value>("{");
        let err: IndexerError = parse.unwrap_err().into();
        assert!(matches!(
            err,
            IndexerError::Document(DocumentError::Serialization { .. })
        ));
    }
}
