//! Elasticsearch implementation of the engine seam.

use std::fmt::Debug;
use std::time::Duration;

use async_trait::async_trait;
use elasticsearch::auth::Credentials;
use elasticsearch::cert::CertificateValidation;
use elasticsearch::http::request::JsonBody;
use elasticsearch::http::response::Response;
use elasticsearch::http::transport::{SingleNodeConnectionPool, TransportBuilder};
use elasticsearch::indices::{
    IndicesCreateParts, IndicesDeleteParts, IndicesExistsParts, IndicesGetMappingParts,
    IndicesPutMappingParts, IndicesRefreshParts,
};
use elasticsearch::{
    BulkParts, CountParts, DeleteByQueryParts, DeleteParts, Elasticsearch, GetParts, IndexParts,
    MgetParts, SearchParts,
};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::config::humantime_serde;
use crate::error::BackendError;

use super::{BackendResult, EngineClient};

const INDEX_NOT_FOUND: &str = "index_not_found_exception";
const ALREADY_EXISTS: &str = "resource_already_exists_exception";

/// Authentication configuration for Elasticsearch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ElasticsearchAuth {
    /// Basic username/password authentication.
    Basic { username: String, password: String },
    /// Bearer token authentication.
    Bearer { token: String },
}

/// Connection settings for the Elasticsearch cluster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElasticsearchConfig {
    /// Node URLs. Only the first node is used (single-node connection pool).
    #[serde(default = "default_nodes")]
    pub nodes: Vec<String>,

    /// Optional authentication.
    #[serde(default)]
    pub auth: Option<ElasticsearchAuth>,

    /// Upper bound for every engine call (default: 30s).
    #[serde(default = "default_request_timeout", with = "humantime_serde")]
    pub request_timeout: Duration,

    /// Only use for development/testing.
    #[serde(default)]
    pub disable_certificate_validation: bool,

    /// Largest `from + size` a paged search may reach (default: 10000).
    #[serde(default = "default_max_result_window")]
    pub max_result_window: u64,
}

fn default_nodes() -> Vec<String> {
    vec!["http://localhost:9200".to_string()]
}

fn default_request_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_max_result_window() -> u64 {
    10_000
}

impl Default for ElasticsearchConfig {
    fn default() -> Self {
        Self {
            nodes: default_nodes(),
            auth: None,
            request_timeout: default_request_timeout(),
            disable_certificate_validation: false,
            max_result_window: default_max_result_window(),
        }
    }
}

/// [`EngineClient`] over the official Elasticsearch client.
///
/// The underlying client pools HTTP connections and is safe to share; one
/// instance serves every tenant.
#[derive(Clone)]
pub struct ElasticsearchClient {
    client: Elasticsearch,
    config: ElasticsearchConfig,
}

impl Debug for ElasticsearchClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ElasticsearchClient")
            .field("nodes", &self.config.nodes)
            .field("request_timeout", &self.config.request_timeout)
            .finish_non_exhaustive()
    }
}

impl ElasticsearchClient {
    pub fn new(config: ElasticsearchConfig) -> BackendResult<Self> {
        let client = Self::build_client(&config)?;
        Ok(Self { client, config })
    }

    fn build_client(config: &ElasticsearchConfig) -> BackendResult<Elasticsearch> {
        let url = config
            .nodes
            .first()
            .cloned()
            .unwrap_or_else(|| "http://localhost:9200".to_string());

        let parsed_url: elasticsearch::http::Url =
            url.parse().map_err(|e| BackendError::Configuration {
                message: format!("Invalid URL '{}': {}", url, e),
            })?;

        let conn_pool = SingleNodeConnectionPool::new(parsed_url);
        let mut builder = TransportBuilder::new(conn_pool).timeout(config.request_timeout);

        if config.disable_certificate_validation {
            builder = builder.cert_validation(CertificateValidation::None);
        }

        if let Some(ref auth) = config.auth {
            builder = match auth {
                ElasticsearchAuth::Basic { username, password } => {
                    builder.auth(Credentials::Basic(username.clone(), password.clone()))
                }
                ElasticsearchAuth::Bearer { token } => {
                    builder.auth(Credentials::Bearer(token.clone()))
                }
            };
        }

        let transport = builder.build().map_err(|e| BackendError::Configuration {
            message: format!("Failed to build transport: {}", e),
        })?;

        Ok(Elasticsearch::new(transport))
    }

    pub fn config(&self) -> &ElasticsearchConfig {
        &self.config
    }
}

fn unavailable(index: &str, e: elasticsearch::Error) -> BackendError {
    tracing::warn!(index, error = %e, "Elasticsearch request failed");
    BackendError::Unavailable {
        message: e.to_string(),
    }
}

/// Maps a non-success response to an error.
async fn failure(index: &str, response: Response) -> BackendError {
    let status = response.status_code().as_u16();
    let body = response.text().await.unwrap_or_default();
    if status == 404 && body.contains(INDEX_NOT_FOUND) {
        return BackendError::IndexNotFound {
            index: index.to_string(),
        };
    }
    BackendError::Request {
        index: index.to_string(),
        status,
        message: body,
    }
}

async fn json_body(response: Response) -> BackendResult<Value> {
    response
        .json::<Value>()
        .await
        .map_err(|e| BackendError::InvalidResponse {
            message: e.to_string(),
        })
}

/// Checks the status and decodes the body.
async fn success_json(index: &str, response: Response) -> BackendResult<Value> {
    if !response.status_code().is_success() {
        return Err(failure(index, response).await);
    }
    json_body(response).await
}

#[async_trait]
impl EngineClient for ElasticsearchClient {
    async fn index_exists(&self, index: &str) -> BackendResult<bool> {
        let response = self
            .client
            .indices()
            .exists(IndicesExistsParts::Index(&[index]))
            .send()
            .await
            .map_err(|e| unavailable(index, e))?;
        match response.status_code().as_u16() {
            200 => Ok(true),
            404 => Ok(false),
            _ => Err(failure(index, response).await),
        }
    }

    async fn create_index(&self, index: &str, body: Value) -> BackendResult<bool> {
        let response = self
            .client
            .indices()
            .create(IndicesCreateParts::Index(index))
            .body(body)
            .send()
            .await
            .map_err(|e| unavailable(index, e))?;
        if response.status_code().is_success() {
            return Ok(true);
        }
        match failure(index, response).await {
            BackendError::Request { message, .. } if message.contains(ALREADY_EXISTS) => Ok(false),
            other => Err(other),
        }
    }

    async fn delete_index(&self, index: &str) -> BackendResult<bool> {
        let response = self
            .client
            .indices()
            .delete(IndicesDeleteParts::Index(&[index]))
            .send()
            .await
            .map_err(|e| unavailable(index, e))?;
        if response.status_code().is_success() {
            return Ok(true);
        }
        match failure(index, response).await {
            BackendError::IndexNotFound { .. } => Ok(false),
            other => Err(other),
        }
    }

    async fn put_mapping(&self, index: &str, mapping: Value) -> BackendResult<()> {
        let response = self
            .client
            .indices()
            .put_mapping(IndicesPutMappingParts::Index(&[index]))
            .body(mapping)
            .send()
            .await
            .map_err(|e| unavailable(index, e))?;
        success_json(index, response).await.map(|_| ())
    }

    async fn get_mapping(&self, index: &str) -> BackendResult<Value> {
        let response = self
            .client
            .indices()
            .get_mapping(IndicesGetMappingParts::Index(&[index]))
            .send()
            .await
            .map_err(|e| unavailable(index, e))?;
        let body = success_json(index, response).await?;
        // The response is keyed by the concrete index name.
        body.as_object()
            .and_then(|indices| indices.values().next())
            .and_then(|entry| entry.get("mappings"))
            .cloned()
            .ok_or_else(|| BackendError::InvalidResponse {
                message: format!("no mapping returned for '{}'", index),
            })
    }

    async fn refresh(&self, index: &str) -> BackendResult<()> {
        let response = self
            .client
            .indices()
            .refresh(IndicesRefreshParts::Index(&[index]))
            .send()
            .await
            .map_err(|e| unavailable(index, e))?;
        success_json(index, response).await.map(|_| ())
    }

    async fn index_document(&self, index: &str, id: &str, source: Value) -> BackendResult<Value> {
        let response = self
            .client
            .index(IndexParts::IndexId(index, id))
            .body(source)
            .send()
            .await
            .map_err(|e| unavailable(index, e))?;
        success_json(index, response).await
    }

    async fn bulk(&self, index: &str, operations: Vec<Value>) -> BackendResult<Value> {
        let body: Vec<JsonBody<Value>> = operations.into_iter().map(JsonBody::new).collect();
        let response = self
            .client
            .bulk(BulkParts::Index(index))
            .body(body)
            .send()
            .await
            .map_err(|e| unavailable(index, e))?;
        success_json(index, response).await
    }

    async fn get_document(&self, index: &str, id: &str) -> BackendResult<Option<Value>> {
        let response = self
            .client
            .get(GetParts::IndexId(index, id))
            .send()
            .await
            .map_err(|e| unavailable(index, e))?;
        if response.status_code().as_u16() == 404 {
            return match failure(index, response).await {
                err @ BackendError::IndexNotFound { .. } => Err(err),
                _ => Ok(None),
            };
        }
        let body = success_json(index, response).await?;
        Ok(body.get("_source").cloned())
    }

    async fn multi_get(&self, index: &str, ids: &[String]) -> BackendResult<Vec<Option<Value>>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let response = self
            .client
            .mget(MgetParts::Index(index))
            .body(json!({ "ids": ids }))
            .send()
            .await
            .map_err(|e| unavailable(index, e))?;
        let body = success_json(index, response).await?;
        let docs = body
            .get("docs")
            .and_then(Value::as_array)
            .ok_or_else(|| BackendError::InvalidResponse {
                message: "mget response has no docs".to_string(),
            })?;
        Ok(docs
            .iter()
            .map(|doc| {
                if doc.get("found").and_then(Value::as_bool) == Some(true) {
                    doc.get("_source").cloned()
                } else {
                    None
                }
            })
            .collect())
    }

    async fn delete_document(&self, index: &str, id: &str) -> BackendResult<bool> {
        let response = self
            .client
            .delete(DeleteParts::IndexId(index, id))
            .send()
            .await
            .map_err(|e| unavailable(index, e))?;
        match response.status_code().as_u16() {
            404 => Ok(false),
            _ => success_json(index, response).await.map(|_| true),
        }
    }

    async fn search(&self, index: &str, body: Value) -> BackendResult<Value> {
        let response = self
            .client
            .search(SearchParts::Index(&[index]))
            .body(body)
            .send()
            .await
            .map_err(|e| unavailable(index, e))?;
        success_json(index, response).await
    }

    async fn count(&self, index: &str, query: Value) -> BackendResult<u64> {
        let response = self
            .client
            .count(CountParts::Index(&[index]))
            .body(json!({ "query": query }))
            .send()
            .await
            .map_err(|e| unavailable(index, e))?;
        let body = success_json(index, response).await?;
        body.get("count")
            .and_then(Value::as_u64)
            .ok_or_else(|| BackendError::InvalidResponse {
                message: "count response has no count".to_string(),
            })
    }

    async fn delete_by_query(&self, index: &str, query: Value) -> BackendResult<u64> {
        let response = self
            .client
            .delete_by_query(DeleteByQueryParts::Index(&[index]))
            .body(json!({ "query": query }))
            .refresh(true)
            .send()
            .await
            .map_err(|e| unavailable(index, e))?;
        let body = success_json(index, response).await?;
        Ok(body.get("deleted").and_then(Value::as_u64).unwrap_or(0))
    }
}
