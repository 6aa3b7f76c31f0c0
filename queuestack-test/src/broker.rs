//! Broker fixture

use queuestack_core::{BrokerCounters, CountersSnapshot, SystemClock};
use queuestack_sqs::{BrokerConfig, Database, Message};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;

/// A broker with counters attached, running on the current tokio runtime
pub struct TestBroker {
    db: Arc<Database>,
    counters: Arc<BrokerCounters>,
}

impl TestBroker {
    /// Start a broker with default configuration.
    ///
    /// Panics outside a tokio runtime.
    pub fn start() -> Self {
        Self::start_with(BrokerConfig::default())
    }

    pub fn start_with(config: BrokerConfig) -> Self {
        crate::init_tracing();

        let counters = Arc::new(BrokerCounters::new());
        let db = Database::with_components(config, Arc::new(SystemClock), counters.clone())
            .unwrap_or_else(|e| panic!("Failed to start test broker: {}", e));

        info!("Started test broker");
        Self {
            db: Arc::new(db),
            counters,
        }
    }

    pub fn db(&self) -> &Database {
        &self.db
    }

    /// Shared handle for use across threads and tasks
    pub fn shared(&self) -> Arc<Database> {
        Arc::clone(&self.db)
    }

    pub fn counters(&self) -> CountersSnapshot {
        self.counters.snapshot()
    }

    /// Create `name` with default attributes and return its URL
    pub fn queue(&self, name: &str) -> String {
        self.db
            .create_queue(name, self.db.default_queue_attributes())
            .unwrap_or_else(|| panic!("Queue {} already exists", name))
            .url
    }

    /// Send `body` without attributes or delay
    pub fn send(&self, url: &str, body: &str) -> Message {
        self.db
            .send_message(url, body.to_string(), HashMap::new(), None)
            .unwrap_or_else(|| panic!("Queue {} does not exist", url))
    }
}
