//! Per-tenant index and mapping lifecycle.
//!
//! Each tenant owns one index named after the lower-cased tenant id. Index
//! creation and deletion are idempotent and rely on the engine's own
//! create-if-absent semantics; mappings only ever grow.

use std::sync::Arc;

use serde_json::{Value, json};

use crate::backend::EngineClient;
use crate::config::IndexerConfig;
use crate::error::IndexerResult;
use crate::model::{AttributeDescription, ModelAttribute};
use crate::registry::{FieldTypeRegistry, TenantRegistries};
use crate::tenant::TenantId;

use super::mapping::{
    automatic_double_mapping, build_mapping, describe_attributes, envelope_mapping,
    geometry_mapping,
};
use super::settings::CreateIndexConfiguration;

/// Creates, deletes and maps tenant indices.
#[derive(Debug, Clone)]
pub struct IndexManager {
    client: Arc<dyn EngineClient>,
    registries: Arc<TenantRegistries>,
    default_settings: CreateIndexConfiguration,
    max_result_window: u64,
}

impl IndexManager {
    pub fn new(
        client: Arc<dyn EngineClient>,
        registries: Arc<TenantRegistries>,
        config: &IndexerConfig,
    ) -> Self {
        Self {
            client,
            registries,
            default_settings: config.index.clone(),
            max_result_window: config.elasticsearch.max_result_window,
        }
    }

    /// Creates the tenant index with the given settings.
    ///
    /// Returns `false` when the index already existed.
    pub async fn create_index(
        &self,
        tenant: &TenantId,
        settings: &CreateIndexConfiguration,
    ) -> IndexerResult<bool> {
        let index = tenant.index_name();
        let body = json!({
            "settings": settings.to_settings(self.max_result_window),
            "mappings": envelope_mapping(),
        });
        let created = self.client.create_index(&index, body).await?;
        if created {
            tracing::info!(
                tenant = %tenant,
                index = %index,
                shards = settings.number_of_shards,
                replicas = settings.number_of_replicas,
                "Created tenant index"
            );
        } else {
            tracing::debug!(tenant = %tenant, index = %index, "Tenant index already exists");
        }
        Ok(created)
    }

    /// Deletes the tenant index. Returns `false` when there was nothing to delete.
    pub async fn delete_index(&self, tenant: &TenantId) -> IndexerResult<bool> {
        let index = tenant.index_name();
        let deleted = self.client.delete_index(&index).await?;
        self.registries.remove(tenant);
        if deleted {
            tracing::info!(tenant = %tenant, index = %index, "Deleted tenant index");
        }
        Ok(deleted)
    }

    pub async fn index_exists(&self, tenant: &TenantId) -> IndexerResult<bool> {
        Ok(self.client.index_exists(&tenant.index_name()).await?)
    }

    /// Makes sure the tenant index exists, creating it with the default
    /// settings if needed. The field registry of an existing index is
    /// rebuilt from its mapping.
    ///
    /// Returns `true` when the index was created.
    pub async fn bootstrap_tenant(&self, tenant: &TenantId) -> IndexerResult<bool> {
        if self.index_exists(tenant).await? {
            self.load_registry(tenant).await?;
            return Ok(false);
        }
        let settings = self.default_settings.clone();
        let created = self.create_index(tenant, &settings).await?;
        if !created {
            // Another caller won the race.
            self.load_registry(tenant).await?;
        }
        Ok(created)
    }

    /// Drops and recreates the tenant index with custom settings.
    ///
    /// All documents and mappings are lost.
    pub async fn recreate_index(
        &self,
        tenant: &TenantId,
        settings: &CreateIndexConfiguration,
    ) -> IndexerResult<()> {
        self.delete_index(tenant).await?;
        self.create_index(tenant, settings).await?;
        Ok(())
    }

    /// Adds the mapping of every model attribute under `feature.` and
    /// registers the resulting fields for search.
    pub async fn configure_mappings(
        &self,
        tenant: &TenantId,
        attributes: &[ModelAttribute],
    ) -> IndexerResult<Vec<AttributeDescription>> {
        let descriptions = describe_attributes(attributes)?;
        self.put_mappings(tenant, &descriptions).await?;
        Ok(descriptions)
    }

    /// Sends one additive mapping update for all descriptions.
    pub async fn put_mappings(
        &self,
        tenant: &TenantId,
        descriptions: &[AttributeDescription],
    ) -> IndexerResult<()> {
        if descriptions.is_empty() {
            return Ok(());
        }
        let index = tenant.index_name();
        let mapping = build_mapping(descriptions)?;
        self.client.put_mapping(&index, mapping).await?;
        self.registries
            .update(tenant, |registry| registry.extend_from_descriptions(descriptions));
        tracing::info!(
            tenant = %tenant,
            index = %index,
            fields = descriptions.len(),
            "Updated tenant mapping"
        );
        Ok(())
    }

    /// Maps every floating number added later without a declared type as `double`.
    pub async fn set_automatic_double_mapping(&self, tenant: &TenantId) -> IndexerResult<()> {
        let index = tenant.index_name();
        self.client
            .put_mapping(&index, automatic_double_mapping())
            .await?;
        tracing::info!(tenant = %tenant, index = %index, "Enabled automatic double mapping");
        Ok(())
    }

    /// Maps the `geometry` field as a geo shape.
    pub async fn set_geometry_mapping(&self, tenant: &TenantId) -> IndexerResult<()> {
        let index = tenant.index_name();
        self.client.put_mapping(&index, geometry_mapping()).await?;
        tracing::info!(tenant = %tenant, index = %index, "Enabled geometry mapping");
        Ok(())
    }

    /// The current mapping of the tenant index.
    pub async fn get_mapping(&self, tenant: &TenantId) -> IndexerResult<Value> {
        Ok(self.client.get_mapping(&tenant.index_name()).await?)
    }

    /// Registers the fields found in the index mapping that are not declared yet.
    ///
    /// Declared fields win: a mapping cannot tell arrays from scalars.
    pub async fn load_registry(&self, tenant: &TenantId) -> IndexerResult<Arc<FieldTypeRegistry>> {
        let mapping = self.get_mapping(tenant).await?;
        let discovered = FieldTypeRegistry::from_mapping(&mapping);
        let registry = self.registries.update(tenant, |registry| {
            for path in discovered.paths() {
                if registry.get(path).is_none()
                    && let Some(definition) = discovered.get(path)
                {
                    registry.register(path, definition.clone());
                }
            }
        });
        tracing::debug!(tenant = %tenant, fields = registry.len(), "Loaded field registry");
        Ok(registry)
    }

    /// Snapshot of the tenant's field registry.
    pub fn registry(&self, tenant: &TenantId) -> Arc<FieldTypeRegistry> {
        self.registries.snapshot(tenant)
    }
}
