//! Queue records

use crate::config::BrokerConfig;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Mutable settings of a queue, replaced as a whole
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueAttributes {
    /// Delay applied to sends that do not ask for one
    pub delay_seconds: u32,
    pub visibility_timeout_seconds: u32,
    pub maximum_message_size: u32,
}

impl QueueAttributes {
    pub fn from_config(config: &BrokerConfig) -> Self {
        Self {
            delay_seconds: config.default_delay_seconds,
            visibility_timeout_seconds: config.default_visibility_timeout_seconds,
            maximum_message_size: config.default_maximum_message_size,
        }
    }

    pub fn with_delay_seconds(mut self, delay_seconds: u32) -> Self {
        self.delay_seconds = delay_seconds;
        self
    }

    pub fn with_visibility_timeout_seconds(mut self, visibility_timeout_seconds: u32) -> Self {
        self.visibility_timeout_seconds = visibility_timeout_seconds;
        self
    }

    pub fn with_maximum_message_size(mut self, maximum_message_size: u32) -> Self {
        self.maximum_message_size = maximum_message_size;
        self
    }
}

impl Default for QueueAttributes {
    fn default() -> Self {
        Self::from_config(&BrokerConfig::default())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Queue {
    pub name: String,
    pub url: String,
    pub created_time: DateTime<Utc>,
    pub attributes: QueueAttributes,
}

impl Queue {
    pub fn new(
        name: String,
        url: String,
        attributes: QueueAttributes,
        created_time: DateTime<Utc>,
    ) -> Self {
        Self {
            name,
            url,
            created_time,
            attributes,
        }
    }

    pub fn with_attributes(&self, attributes: QueueAttributes) -> Self {
        Self {
            attributes,
            ..self.clone()
        }
    }

    /// Whether a body of this size fits the queue's limit
    pub fn accepts_body(&self, body: &str) -> bool {
        body.len() <= self.attributes.maximum_message_size as usize
    }
}

/// Build a fresh queue URL. The trailing UUID keeps URLs unique across re-creations
/// of the same name.
pub fn generate_queue_url(config: &BrokerConfig, name: &str) -> String {
    format!(
        "{}/{}/{}/{}",
        config.base_url.trim_end_matches('/'),
        config.account_id,
        name,
        Uuid::new_v4().simple()
    )
}
