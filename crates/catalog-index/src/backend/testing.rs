//! In-memory [`EngineClient`] double for unit tests.
//!
//! Indices, mappings and documents are kept in memory. Search responses are
//! scripted; every call is recorded so tests can assert on request bodies.

use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{Value, json};

use crate::error::BackendError;

use super::{BackendResult, EngineClient};

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct RecordedRequest {
    pub op: &'static str,
    pub index: String,
    pub body: Value,
}

#[derive(Debug, Default)]
struct MockState {
    indices: HashSet<String>,
    mappings: HashMap<String, Value>,
    documents: BTreeMap<(String, String), Value>,
    search_responses: VecDeque<Value>,
    bulk_failures: VecDeque<usize>,
    failing_bulk_calls: HashSet<usize>,
    bulk_calls: usize,
    refresh_failures: usize,
    unavailable: bool,
    requests: Vec<RecordedRequest>,
}

#[derive(Debug, Clone, Default)]
pub(crate) struct MockEngine {
    state: Arc<Mutex<MockState>>,
}

impl MockEngine {
    pub fn with_indices(indices: &[&str]) -> Self {
        let engine = Self::default();
        {
            let mut state = engine.state.lock().unwrap();
            state.indices = indices.iter().map(|i| (*i).to_string()).collect();
        }
        engine
    }

    /// Queues the response of the next search call.
    pub fn push_search_response(&self, response: Value) {
        self.state.lock().unwrap().search_responses.push_back(response);
    }

    /// Makes the next bulk call reject its first `count` items with status 400.
    pub fn fail_next_bulk_items(&self, count: usize) {
        self.state.lock().unwrap().bulk_failures.push_back(count);
    }

    /// Makes the bulk call number `call` (0-based) fail at the transport level.
    pub fn fail_bulk_call(&self, call: usize) {
        self.state.lock().unwrap().failing_bulk_calls.insert(call);
    }

    /// Makes the next refresh call fail at the transport level.
    pub fn fail_next_refresh(&self) {
        self.state.lock().unwrap().refresh_failures += 1;
    }

    /// Every call fails with `Unavailable` while set.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.state.lock().unwrap().unavailable = unavailable;
    }

    pub fn insert_document(&self, index: &str, id: &str, source: Value) {
        self.state
            .lock()
            .unwrap()
            .documents
            .insert((index.to_string(), id.to_string()), source);
    }

    pub fn document(&self, index: &str, id: &str) -> Option<Value> {
        self.state
            .lock()
            .unwrap()
            .documents
            .get(&(index.to_string(), id.to_string()))
            .cloned()
    }

    pub fn document_count(&self, index: &str) -> usize {
        let state = self.state.lock().unwrap();
        state.documents.keys().filter(|(i, _)| i == index).count()
    }

    pub fn has_index(&self, index: &str) -> bool {
        self.state.lock().unwrap().indices.contains(index)
    }

    pub fn mapping(&self, index: &str) -> Option<Value> {
        self.state.lock().unwrap().mappings.get(index).cloned()
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.lock().unwrap().requests.clone()
    }

    pub fn requests_of(&self, op: &str) -> Vec<RecordedRequest> {
        self.requests().into_iter().filter(|r| r.op == op).collect()
    }

    fn record(&self, op: &'static str, index: &str, body: Value) -> BackendResult<()> {
        let mut state = self.state.lock().unwrap();
        state.requests.push(RecordedRequest {
            op,
            index: index.to_string(),
            body,
        });
        if state.unavailable {
            return Err(BackendError::Unavailable {
                message: "connection refused".to_string(),
            });
        }
        Ok(())
    }

    fn require_index(&self, index: &str) -> BackendResult<()> {
        if self.has_index(index) {
            Ok(())
        } else {
            Err(BackendError::IndexNotFound {
                index: index.to_string(),
            })
        }
    }
}

/// A search response holding `sources` as hits, with `type`/`docId` sort values.
pub(crate) fn search_response(total: u64, sources: Vec<Value>) -> Value {
    let hits: Vec<Value> = sources
        .into_iter()
        .map(|source| {
            let sort = json!([source["type"], source["docId"]]);
            json!({ "_source": source, "sort": sort })
        })
        .collect();
    json!({ "hits": { "total": { "value": total, "relation": "eq" }, "hits": hits } })
}

#[async_trait]
impl EngineClient for MockEngine {
    async fn index_exists(&self, index: &str) -> BackendResult<bool> {
        self.record("index_exists", index, Value::Null)?;
        Ok(self.has_index(index))
    }

    async fn create_index(&self, index: &str, body: Value) -> BackendResult<bool> {
        self.record("create_index", index, body.clone())?;
        let mut state = self.state.lock().unwrap();
        if !state.indices.insert(index.to_string()) {
            return Ok(false);
        }
        if let Some(mappings) = body.get("mappings") {
            state.mappings.insert(index.to_string(), mappings.clone());
        }
        Ok(true)
    }

    async fn delete_index(&self, index: &str) -> BackendResult<bool> {
        self.record("delete_index", index, Value::Null)?;
        let mut state = self.state.lock().unwrap();
        state.mappings.remove(index);
        state.documents.retain(|(i, _), _| i != index);
        Ok(state.indices.remove(index))
    }

    async fn put_mapping(&self, index: &str, mapping: Value) -> BackendResult<()> {
        self.record("put_mapping", index, mapping.clone())?;
        self.require_index(index)?;
        let mut state = self.state.lock().unwrap();
        let current = state
            .mappings
            .entry(index.to_string())
            .or_insert_with(|| json!({ "properties": {} }));
        if let (Some(target), Some(added)) = (
            current.get_mut("properties").and_then(Value::as_object_mut),
            mapping.get("properties").and_then(Value::as_object),
        ) {
            for (name, field) in added {
                target.insert(name.clone(), field.clone());
            }
        }
        Ok(())
    }

    async fn get_mapping(&self, index: &str) -> BackendResult<Value> {
        self.record("get_mapping", index, Value::Null)?;
        self.require_index(index)?;
        Ok(self
            .mapping(index)
            .unwrap_or_else(|| json!({ "properties": {} })))
    }

    async fn refresh(&self, index: &str) -> BackendResult<()> {
        self.record("refresh", index, Value::Null)?;
        {
            let mut state = self.state.lock().unwrap();
            if state.refresh_failures > 0 {
                state.refresh_failures -= 1;
                return Err(BackendError::Unavailable {
                    message: "refresh timed out".to_string(),
                });
            }
        }
        self.require_index(index)
    }

    async fn index_document(&self, index: &str, id: &str, source: Value) -> BackendResult<Value> {
        self.record("index_document", index, source.clone())?;
        let existed = self.document(index, id).is_some();
        self.insert_document(index, id, source);
        let result = if existed { "updated" } else { "created" };
        Ok(json!({ "_id": id, "result": result }))
    }

    async fn bulk(&self, index: &str, operations: Vec<Value>) -> BackendResult<Value> {
        self.record("bulk", index, Value::Array(operations.clone()))?;
        let failures = {
            let mut state = self.state.lock().unwrap();
            let call = state.bulk_calls;
            state.bulk_calls += 1;
            if state.failing_bulk_calls.contains(&call) {
                return Err(BackendError::Unavailable {
                    message: "bulk request timed out".to_string(),
                });
            }
            state.bulk_failures.pop_front().unwrap_or(0)
        };
        let mut items = Vec::new();
        for (position, pair) in operations.chunks(2).enumerate() {
            let id = pair[0]["index"]["_id"].as_str().unwrap_or_default().to_string();
            if position < failures {
                items.push(json!({ "index": { "_id": id, "status": 400 } }));
                continue;
            }
            if let Some(source) = pair.get(1) {
                self.insert_document(index, &id, source.clone());
            }
            items.push(json!({ "index": { "_id": id, "status": 201 } }));
        }
        Ok(json!({ "errors": failures > 0, "items": items }))
    }

    async fn get_document(&self, index: &str, id: &str) -> BackendResult<Option<Value>> {
        self.record("get_document", index, json!(id))?;
        Ok(self.document(index, id))
    }

    async fn multi_get(&self, index: &str, ids: &[String]) -> BackendResult<Vec<Option<Value>>> {
        self.record("multi_get", index, json!(ids))?;
        Ok(ids.iter().map(|id| self.document(index, id)).collect())
    }

    async fn delete_document(&self, index: &str, id: &str) -> BackendResult<bool> {
        self.record("delete_document", index, json!(id))?;
        let mut state = self.state.lock().unwrap();
        Ok(state
            .documents
            .remove(&(index.to_string(), id.to_string()))
            .is_some())
    }

    async fn search(&self, index: &str, body: Value) -> BackendResult<Value> {
        self.record("search", index, body)?;
        let scripted = self.state.lock().unwrap().search_responses.pop_front();
        Ok(scripted.unwrap_or_else(|| search_response(0, Vec::new())))
    }

    async fn count(&self, index: &str, query: Value) -> BackendResult<u64> {
        self.record("count", index, query)?;
        Ok(self.document_count(index) as u64)
    }

    async fn delete_by_query(&self, index: &str, query: Value) -> BackendResult<u64> {
        self.record("delete_by_query", index, query)?;
        let mut state = self.state.lock().unwrap();
        let before = state.documents.len();
        state.documents.retain(|(i, _), _| i != index);
        Ok((before - state.documents.len()) as u64)
    }
}
