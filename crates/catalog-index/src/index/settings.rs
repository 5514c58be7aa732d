//! Index creation settings.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

/// Shards, replicas and refresh interval of a new index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateIndexConfiguration {
    /// Number of primary shards (default: 1).
    #[serde(default = "default_shards")]
    pub number_of_shards: u32,

    /// Number of replica shards (default: 1).
    #[serde(default = "default_replicas")]
    pub number_of_replicas: u32,

    /// Refresh interval (default: "1s").
    #[serde(default = "default_refresh_interval")]
    pub refresh_interval: String,
}

fn default_shards() -> u32 {
    1
}

fn default_replicas() -> u32 {
    1
}

fn default_refresh_interval() -> String {
    "1s".to_string()
}

impl Default for CreateIndexConfiguration {
    fn default() -> Self {
        Self {
            number_of_shards: default_shards(),
            number_of_replicas: default_replicas(),
            refresh_interval: default_refresh_interval(),
        }
    }
}

impl CreateIndexConfiguration {
    pub fn new(number_of_shards: u32, number_of_replicas: u32) -> Self {
        Self {
            number_of_shards,
            number_of_replicas,
            ..Default::default()
        }
    }

    pub fn with_refresh_interval(mut self, refresh_interval: impl Into<String>) -> Self {
        self.refresh_interval = refresh_interval.into();
        self
    }

    /// The `settings` object of an index creation request.
    pub fn to_settings(&self, max_result_window: u64) -> Value {
        json!({
            "number_of_shards": self.number_of_shards,
            "number_of_replicas": self.number_of_replicas,
            "refresh_interval": self.refresh_interval,
            "index.max_result_window": max_result_window,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_configuration() {
        let config = CreateIndexConfiguration::default();
        assert_eq!(config.number_of_shards, 1);
        assert_eq!(config.number_of_replicas, 1);
        assert_eq!(config.refresh_interval, "1s");
    }

    #[test]
    fn test_settings_body() {
        let settings = CreateIndexConfiguration::new(3, 0)
            .with_refresh_interval("-1")
            .to_settings(20_000);
        assert_eq!(settings["number_of_shards"], 3);
        assert_eq!(settings["number_of_replicas"], 0);
        assert_eq!(settings["refresh_interval"], "-1");
        assert_eq!(settings["index.max_result_window"], 20_000);
    }

    #[test]
    fn test_partial_deserialize() {
        let config: CreateIndexConfiguration =
            serde_json::from_str(r#"{"number_of_shards": 2}"#).unwrap();
        assert_eq!(config.number_of_shards, 2);
        assert_eq!(config.number_of_replicas, 1);
    }
}
