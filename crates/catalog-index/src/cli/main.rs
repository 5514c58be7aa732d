//! Catalog index admin tool
//!
//! Manages tenant indices and runs ad-hoc searches from the command line.
//!
//! # Usage
//!
//! ```bash
//! # Create the index of a tenant if it does not exist
//! catalog-index-admin bootstrap PROJECT1
//!
//! # Add model attributes to the mapping
//! catalog-index-admin configure-mappings PROJECT1 --attributes attributes.json
//!
//! # Search with a JSON criterion
//! catalog-index-admin search PROJECT1 --types DATA \
//!     --criterion '{"ge": {"field": "feature.size", "value": {"int": 3}}}'
//! ```
//!
//! # Environment Variables
//!
//! Every `CATALOG_INDEX_*` variable read by `IndexerConfig::from_env` applies
//! when no `--config` file is given.

use std::path::PathBuf;

use anyhow::Context;
use catalog_index::criterion::Criterion;
use catalog_index::index::CreateIndexConfiguration;
use catalog_index::logging::init_logging;
use catalog_index::model::{ModelAttribute, PageRequest, ResultTypeRegistry, SearchKey, Sort};
use catalog_index::{IndexerConfig, IndexerService, TenantId};
use clap::{Parser, Subcommand};
use serde_json::Value;
use tracing::info;

#[derive(Debug, Parser)]
#[command(name = "catalog-index-admin")]
#[command(about = "Tenant index administration and search")]
struct Cli {
    /// JSON configuration file; environment variables are used otherwise
    #[arg(short, long, env = "CATALOG_INDEX_CONFIG")]
    config: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, env = "CATALOG_INDEX_LOG_LEVEL")]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Creates the tenant index with the default settings if it does not exist
    Bootstrap { tenant: String },

    /// Deletes the tenant index and every document in it
    DeleteIndex { tenant: String },

    /// Deletes and recreates the tenant index with custom settings
    Recreate {
        tenant: String,
        #[arg(long, default_value = "1")]
        shards: u32,
        #[arg(long, default_value = "1")]
        replicas: u32,
        #[arg(long, default_value = "1s")]
        refresh_interval: String,
    },

    /// Prints the tenant mapping
    Mapping { tenant: String },

    /// Adds the attributes of a JSON file (array of model attributes) to the mapping
    ConfigureMappings {
        tenant: String,
        #[arg(long)]
        attributes: PathBuf,
    },

    /// Prints one page of matching documents
    Search {
        tenant: String,
        /// Searched entity types
        #[arg(long, value_delimiter = ',', required = true)]
        types: Vec<String>,
        /// Criterion as JSON; every document matches when omitted
        #[arg(long)]
        criterion: Option<String>,
        #[arg(long, default_value = "0")]
        page: u64,
        #[arg(long, default_value = "20")]
        size: u64,
    },

    /// Prints the number of matching documents
    Count {
        tenant: String,
        #[arg(long, value_delimiter = ',', required = true)]
        types: Vec<String>,
        #[arg(long)]
        criterion: Option<String>,
    },
}

fn load_config(cli: &Cli) -> anyhow::Result<IndexerConfig> {
    let mut config = match &cli.config {
        Some(path) => IndexerConfig::from_json_file(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?,
        None => IndexerConfig::from_env(),
    };
    if let Some(level) = &cli.log_level {
        config.log_level = level.clone();
    }
    Ok(config)
}

fn parse_criterion(raw: Option<&str>) -> anyhow::Result<Criterion> {
    match raw {
        Some(raw) => serde_json::from_str(raw).context("Invalid criterion"),
        None => Ok(Criterion::all()),
    }
}

/// Key decoding every searched type as raw JSON.
fn raw_key(tenant: TenantId, types: &[String]) -> SearchKey<Value> {
    let registry = types
        .iter()
        .fold(ResultTypeRegistry::<Value>::new(), |registry, type_tag| {
            registry.register::<Value>(type_tag.clone())
        });
    SearchKey::new(tenant, registry)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli)?;
    init_logging(&config.log_level);

    if let Err(errors) = config.validate() {
        for error in &errors {
            eprintln!("Configuration error: {}", error);
        }
        std::process::exit(1);
    }

    info!(nodes = ?config.elasticsearch.nodes, "Connecting to Elasticsearch");
    let service = IndexerService::from_config(config)?;

    match cli.command {
        Command::Bootstrap { tenant } => {
            let tenant = TenantId::new(tenant);
            let created = service.on_tenant_ready(&tenant).await?;
            println!(
                "{}",
                if created { "created" } else { "already exists" }
            );
        }
        Command::DeleteIndex { tenant } => {
            let deleted = service.indices().delete_index(&TenantId::new(tenant)).await?;
            println!("{}", if deleted { "deleted" } else { "not found" });
        }
        Command::Recreate {
            tenant,
            shards,
            replicas,
            refresh_interval,
        } => {
            let settings =
                CreateIndexConfiguration::new(shards, replicas).with_refresh_interval(refresh_interval);
            service
                .indices()
                .recreate_index(&TenantId::new(tenant), &settings)
                .await?;
        }
        Command::Mapping { tenant } => {
            let mapping = service.indices().get_mapping(&TenantId::new(tenant)).await?;
            println!("{}", serde_json::to_string_pretty(&mapping)?);
        }
        Command::ConfigureMappings { tenant, attributes } => {
            let content = std::fs::read_to_string(&attributes)
                .with_context(|| format!("Failed to read {}", attributes.display()))?;
            let attributes: Vec<ModelAttribute> =
                serde_json::from_str(&content).context("Invalid attribute list")?;
            let tenant = TenantId::new(tenant);
            service.indices().load_registry(&tenant).await?;
            let descriptions = service
                .indices()
                .configure_mappings(&tenant, &attributes)
                .await?;
            for description in descriptions {
                println!("{}\t{}", description.path, description.property_type);
            }
        }
        Command::Search {
            tenant,
            types,
            criterion,
            page,
            size,
        } => {
            let tenant = TenantId::new(tenant);
            service.indices().load_registry(&tenant).await?;
            let criterion = parse_criterion(criterion.as_deref())?;
            let result = service
                .searcher()
                .search_page(
                    &raw_key(tenant, &types),
                    PageRequest::new(page, size),
                    &criterion,
                    &Sort::unsorted(),
                )
                .await?;
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        Command::Count {
            tenant,
            types,
            criterion,
        } => {
            let tenant = TenantId::new(tenant);
            service.indices().load_registry(&tenant).await?;
            let criterion = parse_criterion(criterion.as_deref())?;
            let count = service
                .searcher()
                .count(&raw_key(tenant, &types), &criterion)
                .await?;
            println!("{}", count);
        }
    }

    Ok(())
}
