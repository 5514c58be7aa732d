//! Indexer configuration.
//!
//! [`IndexerConfig`] groups the engine connection settings, the settings of
//! newly created indices and the knobs of the bulk, facet and join
//! components. It can be read from JSON (every field is optional) or from
//! `CATALOG_INDEX_*` environment variables.
//!
//! # Example
//!
//! ```
//! use catalog_index::config::IndexerConfig;
//!
//! let config: IndexerConfig = serde_json::from_str(r#"{
//!     "elasticsearch": { "nodes": ["http://es:9200"], "request_timeout": "10s" },
//!     "bulk_max_batch": 500
//! }"#).unwrap();
//! assert_eq!(config.bulk_max_batch, 500);
//! assert_eq!(config.string_facet_size, 50);
//! ```

use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::backend::{ElasticsearchAuth, ElasticsearchConfig};
use crate::index::CreateIndexConfiguration;
use crate::search::JoinPolicy;

/// Configuration of the whole indexing core.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexerConfig {
    /// Engine connection settings.
    #[serde(default)]
    pub elasticsearch: ElasticsearchConfig,

    /// Settings applied when a tenant index is bootstrapped.
    #[serde(default)]
    pub index: CreateIndexConfiguration,

    /// Maximum number of documents per bulk request (default: 10000).
    #[serde(default = "default_bulk_max_batch")]
    pub bulk_max_batch: usize,

    /// Number of values returned by a string facet (default: 50).
    #[serde(default = "default_string_facet_size")]
    pub string_facet_size: usize,

    /// Number of equal-width buckets of a numeric facet (default: 10).
    #[serde(default = "default_numeric_facet_buckets")]
    pub numeric_facet_buckets: usize,

    /// Page size used when walking a whole result set (default: 1000).
    #[serde(default = "default_scan_page_size")]
    pub scan_page_size: usize,

    /// Maximum number of distinct values returned by `unique_values` (default: 10000).
    #[serde(default = "default_unique_values_limit")]
    pub unique_values_limit: usize,

    /// How joined entities are counted and paged.
    #[serde(default)]
    pub join_policy: JoinPolicy,

    /// Log level of the admin tool (default: "info").
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_bulk_max_batch() -> usize {
    10_000
}

fn default_string_facet_size() -> usize {
    50
}

fn default_numeric_facet_buckets() -> usize {
    10
}

fn default_scan_page_size() -> usize {
    1_000
}

fn default_unique_values_limit() -> usize {
    10_000
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for IndexerConfig {
    fn default() -> Self {
        Self {
            elasticsearch: ElasticsearchConfig::default(),
            index: CreateIndexConfiguration::default(),
            bulk_max_batch: default_bulk_max_batch(),
            string_facet_size: default_string_facet_size(),
            numeric_facet_buckets: default_numeric_facet_buckets(),
            scan_page_size: default_scan_page_size(),
            unique_values_limit: default_unique_values_limit(),
            join_policy: JoinPolicy::default(),
            log_level: default_log_level(),
        }
    }
}

/// Errors raised while loading a configuration file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read configuration file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse configuration: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid configuration: {}", .0.join("; "))]
    Invalid(Vec<String>),
}

impl IndexerConfig {
    /// Creates a configuration from environment variables, falling back to
    /// defaults for anything unset or unparsable.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`IndexerConfig::from_env`] over an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let nodes = lookup("CATALOG_INDEX_ES_NODES")
            .map(|v| {
                v.split(',')
                    .map(str::trim)
                    .filter(|n| !n.is_empty())
                    .map(String::from)
                    .collect::<Vec<_>>()
            })
            .filter(|nodes| !nodes.is_empty())
            .unwrap_or(defaults.elasticsearch.nodes);

        let auth = match (
            lookup("CATALOG_INDEX_ES_USERNAME"),
            lookup("CATALOG_INDEX_ES_PASSWORD"),
            lookup("CATALOG_INDEX_ES_TOKEN"),
        ) {
            (Some(username), Some(password), _) => {
                Some(ElasticsearchAuth::Basic { username, password })
            }
            (_, _, Some(token)) => Some(ElasticsearchAuth::Bearer { token }),
            _ => None,
        };

        let request_timeout = lookup("CATALOG_INDEX_REQUEST_TIMEOUT")
            .and_then(|v| humantime::parse_duration(v.trim()).ok())
            .unwrap_or(defaults.elasticsearch.request_timeout);

        Self {
            elasticsearch: ElasticsearchConfig {
                nodes,
                auth,
                request_timeout,
                disable_certificate_validation: lookup("CATALOG_INDEX_ES_INSECURE")
                    .map(|v| v.to_lowercase() == "true" || v == "1")
                    .unwrap_or(false),
                max_result_window: parse_var(&lookup, "CATALOG_INDEX_MAX_RESULT_WINDOW")
                    .unwrap_or(defaults.elasticsearch.max_result_window),
            },
            index: CreateIndexConfiguration {
                number_of_shards: parse_var(&lookup, "CATALOG_INDEX_SHARDS")
                    .unwrap_or(defaults.index.number_of_shards),
                number_of_replicas: parse_var(&lookup, "CATALOG_INDEX_REPLICAS")
                    .unwrap_or(defaults.index.number_of_replicas),
                refresh_interval: lookup("CATALOG_INDEX_REFRESH_INTERVAL")
                    .unwrap_or(defaults.index.refresh_interval),
            },
            bulk_max_batch: parse_var(&lookup, "CATALOG_INDEX_BULK_MAX_BATCH")
                .unwrap_or(defaults.bulk_max_batch),
            string_facet_size: parse_var(&lookup, "CATALOG_INDEX_STRING_FACET_SIZE")
                .unwrap_or(defaults.string_facet_size),
            numeric_facet_buckets: parse_var(&lookup, "CATALOG_INDEX_NUMERIC_FACET_BUCKETS")
                .unwrap_or(defaults.numeric_facet_buckets),
            scan_page_size: parse_var(&lookup, "CATALOG_INDEX_SCAN_PAGE_SIZE")
                .unwrap_or(defaults.scan_page_size),
            unique_values_limit: parse_var(&lookup, "CATALOG_INDEX_UNIQUE_VALUES_LIMIT")
                .unwrap_or(defaults.unique_values_limit),
            join_policy: parse_var(&lookup, "CATALOG_INDEX_JOIN_POLICY")
                .unwrap_or(defaults.join_policy),
            log_level: lookup("CATALOG_INDEX_LOG_LEVEL").unwrap_or(defaults.log_level),
        }
    }

    /// Reads a JSON configuration file and validates it.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        config.validate().map_err(ConfigError::Invalid)?;
        Ok(config)
    }

    /// Validates the configuration and returns errors if any.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.elasticsearch.nodes.is_empty() {
            errors.push("At least one Elasticsearch node is required".to_string());
        }
        if self.elasticsearch.request_timeout == Duration::ZERO {
            errors.push("Request timeout cannot be 0".to_string());
        }
        if self.elasticsearch.max_result_window == 0 {
            errors.push("Max result window cannot be 0".to_string());
        }
        if self.index.number_of_shards == 0 {
            errors.push("Number of shards cannot be 0".to_string());
        }
        if self.bulk_max_batch == 0 {
            errors.push("Bulk max batch cannot be 0".to_string());
        }
        if self.numeric_facet_buckets == 0 {
            errors.push("Numeric facet buckets cannot be 0".to_string());
        }
        if self.scan_page_size == 0 {
            errors.push("Scan page size cannot be 0".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

fn parse_var<T, F>(lookup: &F, key: &str) -> Option<T>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    lookup(key).and_then(|v| v.trim().parse().ok())
}

/// Serde adapter for `Duration` written as a human readable string ("30s", "1m 30s").
pub(crate) mod humantime_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&humantime::format_duration(*duration).to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        humantime::parse_duration(&s).map_err(serde::de::Error::custom)
    }
}
