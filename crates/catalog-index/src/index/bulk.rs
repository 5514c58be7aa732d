//! Document writes.
//!
//! Single writes go straight to the engine and are not refreshed; callers that
//! need to read their own write must call [`BulkIndexer::refresh`]. Bulk
//! writes are split into chunks of at most `bulk_max_batch` documents and
//! refresh the index once all chunks were sent.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::{Value, json};

use crate::backend::EngineClient;
use crate::criterion::Criterion;
use crate::error::IndexerResult;
use crate::model::document::to_source;
use crate::model::{Indexable, engine_id};
use crate::query::QueryCompiler;
use crate::registry::TenantRegistries;
use crate::tenant::TenantId;

#[derive(Debug, Clone)]
pub struct BulkIndexer {
    client: Arc<dyn EngineClient>,
    registries: Arc<TenantRegistries>,
    max_batch: usize,
}

impl BulkIndexer {
    pub fn new(
        client: Arc<dyn EngineClient>,
        registries: Arc<TenantRegistries>,
        max_batch: usize,
    ) -> Self {
        Self {
            client,
            registries,
            max_batch: max_batch.max(1),
        }
    }

    /// Indexes one entity. The index is not refreshed.
    ///
    /// Returns 1 when the engine created or updated the document, 0 otherwise.
    pub async fn save_entity<T: Indexable>(&self, tenant: &TenantId, entity: &T) -> IndexerResult<usize> {
        let source = to_source(entity)?;
        let id = engine_id(entity.doc_type(), entity.doc_id());
        let response = self
            .client
            .index_document(&tenant.index_name(), &id, source)
            .await?;
        let saved = matches!(
            response.get("result").and_then(Value::as_str),
            Some("created" | "updated")
        );
        Ok(usize::from(saved))
    }

    /// Indexes entities in chunks and refreshes the index.
    ///
    /// Every entity is serialized before the first request, so a document
    /// that cannot be stored fails the call with nothing written. Returns the
    /// number of documents the engine accepted. A chunk whose request fails
    /// is logged and counts as zero; the other chunks are still sent. A
    /// failed refresh is logged and does not change the count.
    pub async fn save_bulk_entities<T: Indexable>(
        &self,
        tenant: &TenantId,
        entities: &[T],
    ) -> IndexerResult<usize> {
        if entities.is_empty() {
            return Ok(0);
        }
        let index = tenant.index_name();
        let documents = entities
            .iter()
            .map(|entity| -> IndexerResult<(String, Value)> {
                let id = engine_id(entity.doc_type(), entity.doc_id());
                Ok((id, to_source(entity)?))
            })
            .collect::<IndexerResult<Vec<(String, Value)>>>()?;
        let mut saved = 0;

        for (chunk_number, chunk) in documents.chunks(self.max_batch).enumerate() {
            let mut operations = Vec::with_capacity(chunk.len() * 2);
            for (id, source) in chunk {
                operations.push(json!({ "index": { "_id": id } }));
                operations.push(source.clone());
            }

            match self.client.bulk(&index, operations).await {
                Ok(response) => {
                    let accepted = accepted_items(&response);
                    if accepted < chunk.len() {
                        tracing::warn!(
                            tenant = %tenant,
                            chunk = chunk_number,
                            requested = chunk.len(),
                            accepted,
                            "Bulk chunk partially indexed"
                        );
                    }
                    saved += accepted;
                }
                Err(e) => {
                    tracing::warn!(
                        tenant = %tenant,
                        chunk = chunk_number,
                        size = chunk.len(),
                        error = %e,
                        "Bulk chunk failed"
                    );
                }
            }
        }

        if let Err(e) = self.client.refresh(&index).await {
            tracing::warn!(tenant = %tenant, saved, error = %e, "Refresh after bulk failed");
        }
        tracing::debug!(tenant = %tenant, requested = entities.len(), saved, "Bulk indexing done");
        Ok(saved)
    }

    /// Makes every write so far visible to searches.
    pub async fn refresh(&self, tenant: &TenantId) -> IndexerResult<()> {
        Ok(self.client.refresh(&tenant.index_name()).await?)
    }

    /// Reads one document back.
    pub async fn get<T: DeserializeOwned>(
        &self,
        tenant: &TenantId,
        doc_type: &str,
        doc_id: &str,
    ) -> IndexerResult<Option<T>> {
        let source = self
            .client
            .get_document(&tenant.index_name(), &engine_id(doc_type, doc_id))
            .await?;
        Ok(source.map(serde_json::from_value).transpose()?)
    }

    /// Returns `false` when the document did not exist.
    pub async fn delete(&self, tenant: &TenantId, doc_type: &str, doc_id: &str) -> IndexerResult<bool> {
        Ok(self
            .client
            .delete_document(&tenant.index_name(), &engine_id(doc_type, doc_id))
            .await?)
    }

    /// Deletes every document matching the criterion; returns how many were deleted.
    pub async fn delete_by_query(&self, tenant: &TenantId, criterion: &Criterion) -> IndexerResult<u64> {
        let registry = self.registries.snapshot(tenant);
        let query = QueryCompiler::new(&registry).compile(criterion)?;
        let deleted = self
            .client
            .delete_by_query(&tenant.index_name(), query)
            .await?;
        tracing::info!(tenant = %tenant, deleted, "Deleted documents by query");
        Ok(deleted)
    }

    /// Empties the tenant index, keeping its settings and mapping.
    pub async fn delete_all(&self, tenant: &TenantId) -> IndexerResult<u64> {
        self.delete_by_query(tenant, &Criterion::all()).await
    }
}

/// Number of bulk items answered with a 2xx status.
fn accepted_items(response: &Value) -> usize {
    response
        .get("items")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|item| item.as_object()?.values().next()?.get("status")?.as_u64())
                .filter(|status| (200..300).contains(status))
                .count()
        })
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::testing::MockEngine;
    use crate::error::{BackendError, DocumentError};
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Data {
        #[serde(rename = "docId")]
        id: String,
        size: i64,
        tags: Vec<String>,
    }

    impl Indexable for Data {
        fn doc_id(&self) -> &str {
            &self.id
        }

        fn doc_type(&self) -> &str {
            "DATA"
        }
    }

    fn data(n: i64) -> Data {
        Data {
            id: format!("d{}", n),
            size: n,
            tags: vec![],
        }
    }

    fn indexer(engine: &MockEngine, max_batch: usize) -> BulkIndexer {
        BulkIndexer::new(
            Arc::new(engine.clone()),
            Arc::new(TenantRegistries::new()),
            max_batch,
        )
    }

    #[tokio::test]
    async fn test_save_entity_does_not_refresh() {
        let engine = MockEngine::with_indices(&["p1"]);
        let indexer = indexer(&engine, 10);
        let tenant = TenantId::new("P1");

        assert_eq!(indexer.save_entity(&tenant, &data(1)).await.unwrap(), 1);
        assert!(engine.requests_of("refresh").is_empty());

        let stored = engine.document("p1", "DATA_d1").unwrap();
        assert_eq!(stored["type"], "DATA");
        assert_eq!(stored["docId"], "d1");
    }

    #[tokio::test]
    async fn test_bulk_is_chunked_and_refreshed() {
        let engine = MockEngine::with_indices(&["p1"]);
        let indexer = indexer(&engine, 4);
        let tenant = TenantId::new("p1");
        let entities: Vec<Data> = (1..=10).map(data).collect();

        let saved = indexer.save_bulk_entities(&tenant, &entities).await.unwrap();
        assert_eq!(saved, 10);
        assert_eq!(engine.requests_of("bulk").len(), 3);
        assert_eq!(engine.requests_of("refresh").len(), 1);
        assert_eq!(engine.document_count("p1"), 10);
    }

    #[tokio::test]
    async fn test_bulk_counts_only_accepted_items() {
        let engine = MockEngine::with_indices(&["p1"]);
        engine.fail_next_bulk_items(2);
        let indexer = indexer(&engine, 5);
        let entities: Vec<Data> = (1..=10).map(data).collect();

        let saved = indexer
            .save_bulk_entities(&TenantId::new("p1"), &entities)
            .await
            .unwrap();
        assert_eq!(saved, 8);
    }

    #[tokio::test]
    async fn test_failed_chunk_does_not_stop_the_others() {
        let engine = MockEngine::with_indices(&["p1"]);
        engine.fail_bulk_call(1);
        let indexer = indexer(&engine, 4);
        let entities: Vec<Data> = (1..=10).map(data).collect();

        let saved = indexer
            .save_bulk_entities(&TenantId::new("p1"), &entities)
            .await
            .unwrap();
        // chunks of 4, 4 and 2; the second one is lost
        assert_eq!(saved, 6);
        assert_eq!(engine.requests_of("bulk").len(), 3);
        assert_eq!(engine.requests_of("refresh").len(), 1);
        assert_eq!(engine.document_count("p1"), 6);
        assert!(engine.document("p1", "DATA_d5").is_none());
        assert!(engine.document("p1", "DATA_d9").is_some());
    }

    #[derive(Serialize)]
    #[serde(untagged)]
    enum Entry {
        Object {
            #[serde(rename = "docId")]
            id: String,
        },
        Scalar(String),
    }

    impl Indexable for Entry {
        fn doc_id(&self) -> &str {
            match self {
                Entry::Object { id } | Entry::Scalar(id) => id,
            }
        }

        fn doc_type(&self) -> &str {
            "DATA"
        }
    }

    #[tokio::test]
    async fn test_unstorable_entity_in_later_chunk_writes_nothing() {
        let engine = MockEngine::with_indices(&["p1"]);
        let indexer = indexer(&engine, 1);
        let entities = vec![
            Entry::Object { id: "a".to_string() },
            Entry::Scalar("b".to_string()),
        ];

        let err = indexer
            .save_bulk_entities(&TenantId::new("p1"), &entities)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            crate::error::IndexerError::Document(DocumentError::NotAnObject { .. })
        ));
        assert!(engine.requests_of("bulk").is_empty());
        assert_eq!(engine.document_count("p1"), 0);
    }

    #[tokio::test]
    async fn test_failed_refresh_keeps_the_count() {
        let engine = MockEngine::with_indices(&["p1"]);
        engine.fail_next_refresh();
        let indexer = indexer(&engine, 4);
        let entities: Vec<Data> = (1..=5).map(data).collect();

        let saved = indexer
            .save_bulk_entities(&TenantId::new("p1"), &entities)
            .await
            .unwrap();
        assert_eq!(saved, 5);
        assert_eq!(engine.requests_of("refresh").len(), 1);
    }

    #[tokio::test]
    async fn test_save_entity_twice_updates() {
        let engine = MockEngine::with_indices(&["p1"]);
        let indexer = indexer(&engine, 4);
        let tenant = TenantId::new("p1");
        assert_eq!(indexer.save_entity(&tenant, &data(1)).await.unwrap(), 1);
        assert_eq!(indexer.save_entity(&tenant, &data(1)).await.unwrap(), 1);
        assert_eq!(engine.document_count("p1"), 1);
    }

    #[tokio::test]
    async fn test_empty_bulk_sends_nothing() {
        let engine = MockEngine::with_indices(&["p1"]);
        let indexer = indexer(&engine, 5);
        let saved = indexer
            .save_bulk_entities::<Data>(&TenantId::new("p1"), &[])
            .await
            .unwrap();
        assert_eq!(saved, 0);
        assert!(engine.requests().is_empty());
    }

    #[tokio::test]
    async fn test_get_and_delete_round_trip() {
        let engine = MockEngine::with_indices(&["p1"]);
        let indexer = indexer(&engine, 5);
        let tenant = TenantId::new("p1");
        let entity = Data {
            id: "x".to_string(),
            size: 3,
            tags: vec!["URN:AIP:DATA:p1:abc".to_string()],
        };

        indexer.save_entity(&tenant, &entity).await.unwrap();
        let read: Option<Data> = indexer.get(&tenant, "DATA", "x").await.unwrap();
        assert_eq!(read, Some(entity));

        assert!(indexer.delete(&tenant, "DATA", "x").await.unwrap());
        assert!(!indexer.delete(&tenant, "DATA", "x").await.unwrap());
        let read: Option<Data> = indexer.get(&tenant, "DATA", "x").await.unwrap();
        assert!(read.is_none());
    }

    #[tokio::test]
    async fn test_delete_all() {
        let engine = MockEngine::with_indices(&["p1"]);
        let indexer = indexer(&engine, 5);
        let tenant = TenantId::new("p1");
        let entities: Vec<Data> = (1..=3).map(data).collect();
        indexer.save_bulk_entities(&tenant, &entities).await.unwrap();

        assert_eq!(indexer.delete_all(&tenant).await.unwrap(), 3);
        assert_eq!(
            engine.requests_of("delete_by_query")[0].body,
            json!({ "match_all": {} })
        );
    }

    #[tokio::test]
    async fn test_unknown_field_in_delete_query_sends_nothing() {
        let engine = MockEngine::with_indices(&["p1"]);
        let indexer = indexer(&engine, 5);
        assert!(indexer
            .delete_by_query(&TenantId::new("p1"), &Criterion::eq("feature.nope", 1))
            .await
            .is_err());
        assert!(engine.requests_of("delete_by_query").is_empty());
    }

    #[tokio::test]
    async fn test_unavailable_engine() {
        let engine = MockEngine::with_indices(&["p1"]);
        engine.set_unavailable(true);
        let indexer = indexer(&engine, 5);
        let err = indexer
            .save_entity(&TenantId::new("p1"), &data(1))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            crate::error::IndexerError::Backend(BackendError::Unavailable { .. })
        ));
    }

    #[test]
    fn test_accepted_items() {
        let response = json!({ "items": [
            { "index": { "status": 201 } },
            { "index": { "status": 200 } },
            { "index": { "status": 429 } }
        ] });
        assert_eq!(accepted_items(&response), 2);
        assert_eq!(accepted_items(&json!({})), 0);
    }
}
