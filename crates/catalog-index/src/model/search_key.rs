//! Search keys and the result-type registry.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::SearchError;
use crate::tenant::TenantId;

use super::document::{DOC_ID_FIELD, TYPE_FIELD};

type Decoder<T> = Arc<dyn Fn(Value) -> Result<T, String> + Send + Sync>;

/// Maps entity type tags to the decoder producing the result type.
///
/// Populated once at startup. A hit whose tag has no decoder is rejected with
/// [`SearchError::InvalidResultType`].
pub struct ResultTypeRegistry<T> {
    decoders: BTreeMap<String, Decoder<T>>,
}

impl<T> ResultTypeRegistry<T> {
    pub fn new() -> Self {
        Self {
            decoders: BTreeMap::new(),
        }
    }

    /// Registers a type whose source deserializes into `U`, then converts to `T`.
    ///
    /// For a single result type use `U = T`; for polymorphic searches `T` is
    /// usually an enum with one `From<U>` per searched type.
    pub fn register<U>(self, type_tag: impl Into<String>) -> Self
    where
        U: DeserializeOwned + Into<T> + 'static,
    {
        self.register_with(type_tag, |source| {
            serde_json::from_value::<U>(source)
                .map(Into::into)
                .map_err(|e| e.to_string())
        })
    }

    /// Registers a custom decoding function.
    pub fn register_with<F>(mut self, type_tag: impl Into<String>, decoder: F) -> Self
    where
        F: Fn(Value) -> Result<T, String> + Send + Sync + 'static,
    {
        self.decoders.insert(type_tag.into(), Arc::new(decoder));
        self
    }

    pub fn contains(&self, type_tag: &str) -> bool {
        self.decoders.contains_key(type_tag)
    }

    /// Registered tags, sorted.
    pub fn type_tags(&self) -> Vec<String> {
        self.decoders.keys().cloned().collect()
    }

    /// Decodes a stored source according to its `type` field.
    pub fn decode(&self, source: Value) -> Result<T, SearchError> {
        let type_tag = source
            .get(TYPE_FIELD)
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let decoder = self
            .decoders
            .get(&type_tag)
            .ok_or_else(|| SearchError::InvalidResultType {
                type_tag: type_tag.clone(),
            })?;
        let doc_id = source
            .get(DOC_ID_FIELD)
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        decoder(source).map_err(|message| SearchError::DecodeFailed {
            type_tag,
            doc_id,
            message,
        })
    }
}

impl<T> Default for ResultTypeRegistry<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for ResultTypeRegistry<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResultTypeRegistry")
            .field("type_tags", &self.decoders.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Identifies what a search runs against and how hits are decoded.
#[derive(Debug)]
pub struct SearchKey<T> {
    tenant: TenantId,
    search_types: Vec<String>,
    registry: Arc<ResultTypeRegistry<T>>,
}

impl<T> Clone for SearchKey<T> {
    fn clone(&self) -> Self {
        Self {
            tenant: self.tenant.clone(),
            search_types: self.search_types.clone(),
            registry: Arc::clone(&self.registry),
        }
    }
}

impl<T> SearchKey<T> {
    /// Searches every type the registry knows about.
    pub fn new(tenant: TenantId, registry: ResultTypeRegistry<T>) -> Self {
        Self::with_shared_registry(tenant, Arc::new(registry))
    }

    pub fn with_shared_registry(tenant: TenantId, registry: Arc<ResultTypeRegistry<T>>) -> Self {
        Self {
            tenant,
            search_types: registry.type_tags(),
            registry,
        }
    }

    /// Restricts the searched types. Tags outside the registry still fail at decoding.
    pub fn with_search_types<I, S>(mut self, types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.search_types = types.into_iter().map(Into::into).collect();
        self
    }

    pub fn tenant(&self) -> &TenantId {
        &self.tenant
    }

    pub fn index(&self) -> String {
        self.tenant.index_name()
    }

    pub fn search_types(&self) -> &[String] {
        &self.search_types
    }

    pub fn registry(&self) -> &ResultTypeRegistry<T> {
        &self.registry
    }
}

impl<T: DeserializeOwned + 'static> SearchKey<T> {
    /// Key for a single entity type decoded straight into `T`.
    pub fn for_type(tenant: TenantId, type_tag: impl Into<String>) -> Self {
        Self::new(tenant, ResultTypeRegistry::new().register::<T>(type_tag))
    }
}

/// Search over some entity types whose results are the entities their tags reference.
#[derive(Debug)]
pub struct JoinSearchKey<R> {
    tenant: TenantId,
    search_types: Vec<String>,
    result_type: String,
    registry: Arc<ResultTypeRegistry<R>>,
}

impl<R> Clone for JoinSearchKey<R> {
    fn clone(&self) -> Self {
        Self {
            tenant: self.tenant.clone(),
            search_types: self.search_types.clone(),
            result_type: self.result_type.clone(),
            registry: Arc::clone(&self.registry),
        }
    }
}

impl<R> JoinSearchKey<R> {
    pub fn new<I, S>(
        tenant: TenantId,
        search_types: I,
        result_type: impl Into<String>,
        registry: ResultTypeRegistry<R>,
    ) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            tenant,
            search_types: search_types.into_iter().map(Into::into).collect(),
            result_type: result_type.into(),
            registry: Arc::new(registry),
        }
    }

    pub fn tenant(&self) -> &TenantId {
        &self.tenant
    }

    pub fn index(&self) -> String {
        self.tenant.index_name()
    }

    pub fn search_types(&self) -> &[String] {
        &self.search_types
    }

    pub fn result_type(&self) -> &str {
        &self.result_type
    }

    pub fn registry(&self) -> &ResultTypeRegistry<R> {
        &self.registry
    }
}

impl<R: DeserializeOwned + 'static> JoinSearchKey<R> {
    /// Join key decoding the result type straight into `R`.
    pub fn for_types<I, S>(tenant: TenantId, search_types: I, result_type: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let result_type = result_type.into();
        let registry = ResultTypeRegistry::new().register::<R>(result_type.clone());
        Self::new(tenant, search_types, result_type, registry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Dataset {
        #[serde(rename = "docId")]
        doc_id: String,
        label: String,
    }

    #[derive(Debug, Deserialize, PartialEq)]
    struct Collection {
        #[serde(rename = "docId")]
        doc_id: String,
    }

    #[derive(Debug, PartialEq)]
    enum Entity {
        Dataset(Dataset),
        Collection(Collection),
    }

    impl From<Dataset> for Entity {
        fn from(d: Dataset) -> Self {
            Entity::Dataset(d)
        }
    }

    impl From<Collection> for Entity {
        fn from(c: Collection) -> Self {
            Entity::Collection(c)
        }
    }

    #[test]
    fn test_polymorphic_decode() {
        let registry = ResultTypeRegistry::<Entity>::new()
            .register::<Dataset>("DATASET")
            .register::<Collection>("COLLECTION");

        let decoded = registry
            .decode(json!({ "type": "COLLECTION", "docId": "c1" }))
            .unwrap();
        assert_eq!(
            decoded,
            Entity::Collection(Collection {
                doc_id: "c1".to_string()
            })
        );
        assert_eq!(registry.type_tags(), vec!["COLLECTION", "DATASET"]);
    }

    #[test]
    fn test_unknown_type_is_invalid_result_type() {
        let registry = ResultTypeRegistry::<Dataset>::new().register::<Dataset>("DATASET");
        let err = registry
            .decode(json!({ "type": "DATA", "docId": "d1" }))
            .unwrap_err();
        assert!(matches!(err, SearchError::InvalidResultType { type_tag } if type_tag == "DATA"));
    }

    #[test]
    fn test_decode_failure_reports_document() {
        let registry = ResultTypeRegistry::<Dataset>::new().register::<Dataset>("DATASET");
        let err = registry
            .decode(json!({ "type": "DATASET", "docId": "d1" }))
            .unwrap_err();
        assert!(matches!(err, SearchError::DecodeFailed { doc_id, .. } if doc_id == "d1"));
    }

    #[test]
    fn test_search_key_types_follow_registry() {
        let key = SearchKey::<Dataset>::for_type(TenantId::new("Project1"), "DATASET");
        assert_eq!(key.search_types(), &["DATASET".to_string()]);
        assert_eq!(key.index(), "project1");

        let narrowed = key.clone().with_search_types(["DATASET", "COLLECTION"]);
        assert_eq!(narrowed.search_types().len(), 2);
    }

    #[test]
    fn test_join_key() {
        let key = JoinSearchKey::<Dataset>::for_types(TenantId::new("p"), ["DATA"], "DATASET");
        assert_eq!(key.result_type(), "DATASET");
        assert!(key.registry().contains("DATASET"));
        assert_eq!(key.search_types(), &["DATA".to_string()]);
    }
}
