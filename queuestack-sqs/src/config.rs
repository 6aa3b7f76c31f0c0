//! Broker configuration

use queuestack_core::BrokerError;
use serde::Deserialize;

/// Broker-wide settings and the defaults applied to newly created queues
#[derive(Debug, Clone, Deserialize)]
pub struct BrokerConfig {
    /// Prefix of every generated queue URL
    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_account_id")]
    pub account_id: String,

    #[serde(default = "default_visibility_timeout")]
    pub default_visibility_timeout_seconds: u32,

    #[serde(default)]
    pub default_delay_seconds: u32,

    #[serde(default = "default_maximum_message_size")]
    pub default_maximum_message_size: u32,

    /// Upper bound on the number of queues a single listing returns
    #[serde(default = "default_max_list_queues")]
    pub max_list_queues: usize,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            account_id: default_account_id(),
            default_visibility_timeout_seconds: default_visibility_timeout(),
            default_delay_seconds: 0,
            default_maximum_message_size: default_maximum_message_size(),
            max_list_queues: default_max_list_queues(),
        }
    }
}

fn default_base_url() -> String {
    "http://localhost:4566".to_string()
}

fn default_account_id() -> String {
    "000000000000".to_string()
}

fn default_visibility_timeout() -> u32 {
    30
}

fn default_maximum_message_size() -> u32 {
    262_144 // 256KB
}

fn default_max_list_queues() -> usize {
    1000
}

impl BrokerConfig {
    /// Load configuration from an optional `queuestack` file and `QUEUESTACK_*` environment
    pub fn load() -> Result<Self, BrokerError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("queuestack").required(false))
            .add_source(config::Environment::with_prefix("QUEUESTACK"))
            .build()
            .map_err(|e| BrokerError::Config(e.to_string()))?;

        config
            .try_deserialize::<BrokerConfig>()
            .map_err(|e| BrokerError::Config(e.to_string()))
    }

    /// Parse configuration from a TOML document
    pub fn from_toml_str(source: &str) -> Result<Self, BrokerError> {
        toml::from_str(source).map_err(|e| BrokerError::Config(e.to_string()))
    }
}
