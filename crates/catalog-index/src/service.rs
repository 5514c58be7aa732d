//! Indexer façade.
//!
//! [`IndexerService`] wires one engine client and one set of tenant field
//! registries into the lifecycle, bulk, search and join components. It holds
//! no per-request state: every operation takes the tenant explicitly.

use std::sync::Arc;

use crate::backend::{ElasticsearchClient, EngineClient};
use crate::config::IndexerConfig;
use crate::error::{BackendError, IndexerResult};
use crate::index::{BulkIndexer, IndexManager};
use crate::model::{TagResolver, UrnTagResolver};
use crate::registry::TenantRegistries;
use crate::search::{JoinResolver, SearchExecutor};
use crate::tenant::TenantId;

/// Entry point to the indexing and search components.
#[derive(Debug, Clone)]
pub struct IndexerService {
    config: IndexerConfig,
    indices: IndexManager,
    indexer: BulkIndexer,
    searcher: SearchExecutor,
    joins: JoinResolver,
}

impl IndexerService {
    /// Connects to the configured Elasticsearch cluster.
    pub fn from_config(config: IndexerConfig) -> IndexerResult<Self> {
        config
            .validate()
            .map_err(|errors| BackendError::Configuration {
                message: errors.join("; "),
            })?;
        let client = ElasticsearchClient::new(config.elasticsearch.clone())?;
        Ok(Self::with_client(Arc::new(client), config))
    }

    /// Builds the service over any engine client, resolving join tags as URNs.
    pub fn with_client(client: Arc<dyn EngineClient>, config: IndexerConfig) -> Self {
        Self::with_tag_resolver(client, config, Arc::new(UrnTagResolver))
    }

    pub fn with_tag_resolver(
        client: Arc<dyn EngineClient>,
        config: IndexerConfig,
        tags: Arc<dyn TagResolver>,
    ) -> Self {
        let registries = Arc::new(TenantRegistries::new());
        let indices = IndexManager::new(Arc::clone(&client), Arc::clone(&registries), &config);
        let indexer = BulkIndexer::new(
            Arc::clone(&client),
            Arc::clone(&registries),
            config.bulk_max_batch,
        );
        let searcher = SearchExecutor::new(Arc::clone(&client), Arc::clone(&registries), &config);
        let joins = JoinResolver::new(client, searcher.clone(), tags, config.join_policy);
        Self {
            config,
            indices,
            indexer,
            searcher,
            joins,
        }
    }

    /// Handles the "tenant ready" event: makes sure the tenant index exists
    /// and its field registry is loaded.
    ///
    /// Returns `true` when the index was created.
    pub async fn on_tenant_ready(&self, tenant: &TenantId) -> IndexerResult<bool> {
        let created = self.indices.bootstrap_tenant(tenant).await?;
        tracing::info!(tenant = %tenant, created, "Tenant ready");
        Ok(created)
    }

    pub fn config(&self) -> &IndexerConfig {
        &self.config
    }

    /// Index and mapping lifecycle.
    pub fn indices(&self) -> &IndexManager {
        &self.indices
    }

    /// Document writes.
    pub fn indexer(&self) -> &BulkIndexer {
        &self.indexer
    }

    /// Searches, facets and metrics.
    pub fn searcher(&self) -> &SearchExecutor {
        &self.searcher
    }

    /// Join searches.
    pub fn joins(&self) -> &JoinResolver {
        &self.joins
    }
}
