//! Queue registry: name, URL and message store of every live queue
//!
//! Three independent concurrent maps (`name -> Queue`, `url -> name`,
//! `url -> MessageStore`) mutated only through single-key atomic operations.
//! No guard on one map is held while taking a guard on another, with one exception:
//! creation keeps the name slot locked while it publishes the reverse mapping and the
//! store. Nothing locks those maps first and then the name map.

use crate::config::BrokerConfig;
use crate::queue::{generate_queue_url, Queue, QueueAttributes};
use crate::store::MessageStore;
use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::Arc;
use tracing::{debug, info};

#[derive(Debug)]
pub struct QueueRegistry {
    config: BrokerConfig,
    queues: DashMap<String, Queue>,
    urls: DashMap<String, String>,
    stores: DashMap<String, Arc<MessageStore>>,
}

impl QueueRegistry {
    pub fn new(config: BrokerConfig) -> Self {
        Self {
            config,
            queues: DashMap::new(),
            urls: DashMap::new(),
            stores: DashMap::new(),
        }
    }

    /// Register `name` unless it already exists.
    ///
    /// Returns `None` when another caller owns the name; the URL generated for this
    /// call is then discarded.
    pub fn create_queue(
        &self,
        name: &str,
        attributes: QueueAttributes,
        now: DateTime<Utc>,
    ) -> Option<Queue> {
        let url = generate_queue_url(&self.config, name);

        match self.queues.entry(name.to_string()) {
            Entry::Occupied(existing) => {
                debug!(name = %name, url = %existing.get().url, "Queue already exists");
                None
            }
            Entry::Vacant(slot) => {
                let queue = Queue::new(name.to_string(), url.clone(), attributes, now);
                self.stores.insert(url.clone(), Arc::new(MessageStore::new()));
                self.urls.insert(url.clone(), name.to_string());
                slot.insert(queue.clone());

                info!(name = %name, url = %url, "Created queue");
                Some(queue)
            }
        }
    }

    pub fn get_queue_by_name(&self, name: &str) -> Option<Queue> {
        self.queues.get(name).map(|q| q.value().clone())
    }

    /// Resolve a URL through the reverse map. A reverse entry whose queue is not
    /// (or no longer) registered under the same URL is reported as not found.
    pub fn get_queue_by_url(&self, url: &str) -> Option<Queue> {
        let name = self.urls.get(url).map(|n| n.value().clone())?;
        self.get_queue_by_name(&name).filter(|q| q.url == url)
    }

    /// Replace the attributes of the queue at `url`.
    ///
    /// The swap only happens if the stored record is still the one the new value was
    /// derived from; otherwise the record currently stored is returned unchanged and
    /// the caller may retry.
    pub fn set_queue_attributes(&self, url: &str, attributes: QueueAttributes) -> Option<Queue> {
        let current = self.get_queue_by_url(url)?;
        let updated = current.with_attributes(attributes);

        let mut stored = self.queues.get_mut(&current.name)?;
        if *stored != current {
            debug!(url = %url, "Queue changed concurrently, attributes not applied");
            return Some(stored.clone());
        }

        *stored = updated.clone();
        drop(stored);

        info!(url = %url, "Updated queue attributes");
        Some(updated)
    }

    /// Remove the queue at `url`. Only the caller that removes the reverse mapping
    /// goes on to drop the queue record and its store.
    pub fn delete_queue(&self, url: &str) -> bool {
        let Some((_, name)) = self.urls.remove(url) else {
            return false;
        };

        self.queues.remove_if(&name, |_, q| q.url == url);
        self.stores.remove(url);

        info!(name = %name, url = %url, "Deleted queue");
        true
    }

    /// Snapshot of registered queues ordered by name, optionally filtered by prefix
    pub fn list_queues(&self, prefix: Option<&str>) -> Vec<Queue> {
        let mut queues: Vec<Queue> = self
            .queues
            .iter()
            .filter(|q| prefix.map_or(true, |p| q.key().starts_with(p)))
            .map(|q| q.value().clone())
            .collect();

        queues.sort_by(|a, b| a.name.cmp(&b.name));
        queues.truncate(self.config.max_list_queues);
        queues
    }

    /// Message store of the queue at `url`, if the queue is still registered
    pub fn store(&self, url: &str) -> Option<Arc<MessageStore>> {
        self.stores.get(url).map(|s| Arc::clone(s.value()))
    }

    pub fn config(&self) -> &BrokerConfig {
        &self.config
    }
}
