//! The broker's single entry point
//!
//! `Database` composes the queue registry, the per-queue message stores, the in-flight
//! tracker and the visibility scheduler. Every operation is total: unknown queues,
//! unknown receipt handles and lost races come back as `None`, `false` or an empty
//! list, and the service layer decides whether that is an error.

use crate::config::BrokerConfig;
use crate::inflight::{ExpiryHook, InFlightTracker};
use crate::message::{Message, SendEntry};
use crate::queue::{Queue, QueueAttributes};
use crate::registry::QueueRegistry;
use crate::scheduler::VisibilityScheduler;
use queuestack_core::{ids, BrokerError, BrokerMetrics, Clock, NoopMetrics, SystemClock};
use std::collections::HashMap;
use std::sync::{Arc, Weak};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Approximate message counts of a queue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct QueueDepth {
    /// Pending and receivable now
    pub visible: usize,
    /// Received and not yet deleted or returned
    pub in_flight: usize,
    /// Sent with a delay that has not elapsed
    pub delayed: usize,
}

/// Outcome of one entry of a batched delete or visibility change
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchEntryResult {
    pub receipt_handle: String,
    pub succeeded: bool,
}

pub struct Database {
    registry: Arc<QueueRegistry>,
    in_flight: Arc<InFlightTracker>,
    scheduler: VisibilityScheduler,
    clock: Arc<dyn Clock>,
    metrics: Arc<dyn BrokerMetrics>,
}

impl Database {
    /// Create a broker on the current tokio runtime
    pub fn new(config: BrokerConfig) -> Result<Self, BrokerError> {
        Self::with_components(config, Arc::new(SystemClock), Arc::new(NoopMetrics))
    }

    /// Create a broker with an explicit clock and metrics sink
    pub fn with_components(
        config: BrokerConfig,
        clock: Arc<dyn Clock>,
        metrics: Arc<dyn BrokerMetrics>,
    ) -> Result<Self, BrokerError> {
        let scheduler = VisibilityScheduler::new()?;
        let in_flight = Arc::new(InFlightTracker::new(scheduler.clone(), metrics.clone()));

        Ok(Self {
            registry: Arc::new(QueueRegistry::new(config)),
            in_flight,
            scheduler,
            clock,
            metrics,
        })
    }

    pub fn config(&self) -> &BrokerConfig {
        self.registry.config()
    }

    /// Attributes a queue gets when the caller has no preference
    pub fn default_queue_attributes(&self) -> QueueAttributes {
        QueueAttributes::from_config(self.config())
    }

    // === Queues ===

    /// Create `name`. `None` if the name is already taken, in which case the existing
    /// queue can be looked up with [`Database::get_queue_by_name`].
    pub fn create_queue(&self, name: &str, attributes: QueueAttributes) -> Option<Queue> {
        let queue = self
            .registry
            .create_queue(name, attributes, self.clock.now())?;
        self.metrics.queue_created();
        Some(queue)
    }

    pub fn get_queue_by_name(&self, name: &str) -> Option<Queue> {
        self.registry.get_queue_by_name(name)
    }

    pub fn get_queue_by_url(&self, url: &str) -> Option<Queue> {
        self.registry.get_queue_by_url(url)
    }

    pub fn set_queue_attributes(&self, url: &str, attributes: QueueAttributes) -> Option<Queue> {
        self.registry.set_queue_attributes(url, attributes)
    }

    /// Delete the queue at `url` along with its pending messages. Messages in flight
    /// are left to their timers, which find the queue gone and drop them.
    pub fn delete_queue(&self, url: &str) -> bool {
        let deleted = self.registry.delete_queue(url);
        if deleted {
            self.metrics.queue_deleted();
        }
        deleted
    }

    pub fn list_queues(&self, prefix: Option<&str>) -> Vec<Queue> {
        self.registry.list_queues(prefix)
    }

    /// Drop every pending message of the queue. In-flight messages are untouched and
    /// come back when their visibility timeout lapses.
    pub fn purge_queue(&self, url: &str) -> bool {
        let Some(store) = self.registry.store(url) else {
            return false;
        };

        let purged = store.purge();
        info!(url = %url, purged, "Purged queue");
        true
    }

    pub fn queue_depth(&self, url: &str) -> Option<QueueDepth> {
        let store = self.registry.store(url)?;
        Some(QueueDepth {
            visible: store.len(),
            in_flight: self.in_flight.in_flight_for(url),
            delayed: store.delayed(),
        })
    }

    // === Sending ===

    /// Send one message.
    ///
    /// `delay_seconds` overrides the queue's default delay when positive. A delayed
    /// message is returned right away but only becomes receivable once the delay
    /// elapses. `None` if the queue does not exist or the body exceeds its size limit.
    pub fn send_message(
        &self,
        url: &str,
        body: String,
        attributes: HashMap<String, String>,
        delay_seconds: Option<u32>,
    ) -> Option<Message> {
        let queue = self.registry.get_queue_by_url(url)?;
        let store = self.registry.store(url)?;

        if !queue.accepts_body(&body) {
            warn!(
                url = %url,
                size = body.len(),
                limit = queue.attributes.maximum_message_size,
                "Message body exceeds queue size limit"
            );
            return None;
        }

        let message = Message::new(body, attributes, self.clock.now());
        let delay = delay_seconds
            .filter(|d| *d > 0)
            .unwrap_or(queue.attributes.delay_seconds);

        if delay == 0 {
            store.offer_back(message.clone());
        } else {
            store.delayed_started();
            let registry: Weak<QueueRegistry> = Arc::downgrade(&self.registry);
            let queue_url = url.to_string();
            let pending = message.clone();
            self.scheduler
                .schedule(Duration::from_secs(u64::from(delay)), move || {
                    make_visible(&registry, &queue_url, pending);
                });
        }

        self.metrics.message_sent();
        debug!(url = %url, message_id = %message.message_id, delay, "Sent message");
        Some(message)
    }

    /// Send each entry in order. An unknown queue yields an empty list for the whole
    /// batch; otherwise entries that fail individually are left out.
    pub fn send_message_batch(&self, url: &str, entries: Vec<SendEntry>) -> Vec<Message> {
        if self.registry.get_queue_by_url(url).is_none() {
            return Vec::new();
        }

        entries
            .into_iter()
            .filter_map(|entry| {
                self.send_message(url, entry.body, entry.attributes, entry.delay_seconds)
            })
            .collect()
    }

    // === Receiving ===

    /// Take up to `max_count` visible messages without waiting for more.
    ///
    /// Each message gets a fresh receipt handle and stays hidden for
    /// `visibility_timeout_seconds` (or the queue default), after which it returns to
    /// the front of the queue unless deleted.
    pub fn receive_messages(
        &self,
        url: &str,
        max_count: usize,
        visibility_timeout_seconds: Option<u32>,
    ) -> Vec<Message> {
        let Some(queue) = self.registry.get_queue_by_url(url) else {
            return Vec::new();
        };
        let Some(store) = self.registry.store(url) else {
            return Vec::new();
        };

        let timeout = Duration::from_secs(u64::from(
            visibility_timeout_seconds.unwrap_or(queue.attributes.visibility_timeout_seconds),
        ));
        let on_expire = self.redelivery_hook(url);

        let mut received = Vec::new();
        while received.len() < max_count {
            let Some(message) = store.poll_front() else {
                break;
            };

            let receipt_handle = ids::new_receipt_handle(&message.message_id);
            let message = message.received(receipt_handle.clone(), self.clock.now());
            self.in_flight.track(
                receipt_handle,
                url.to_string(),
                message.clone(),
                timeout,
                on_expire.clone(),
            );
            self.metrics.message_received();
            received.push(message);
        }

        debug!(url = %url, count = received.len(), "Received messages");
        received
    }

    /// Restart the visibility timeout of one delivery. `None` if the receipt handle is
    /// not in flight (deleted, expired, or never issued).
    pub fn change_message_visibility(
        &self,
        receipt_handle: &str,
        visibility_timeout_seconds: u32,
    ) -> Option<Message> {
        let message = self.in_flight.reschedule(
            receipt_handle,
            Duration::from_secs(u64::from(visibility_timeout_seconds)),
        );
        if message.is_none() {
            not_in_flight(receipt_handle);
        }
        message
    }

    pub fn change_message_visibility_batch(
        &self,
        entries: Vec<(String, u32)>,
    ) -> Vec<BatchEntryResult> {
        entries
            .into_iter()
            .map(|(receipt_handle, timeout)| {
                let succeeded = self
                    .change_message_visibility(&receipt_handle, timeout)
                    .is_some();
                BatchEntryResult {
                    receipt_handle,
                    succeeded,
                }
            })
            .collect()
    }

    // === Deleting ===

    /// Acknowledge one delivery. `None` if the receipt handle is not in flight.
    pub fn delete_message(&self, receipt_handle: &str) -> Option<Message> {
        let Some(message) = self.in_flight.cancel_and_remove(receipt_handle) else {
            not_in_flight(receipt_handle);
            return None;
        };

        self.metrics.message_deleted();
        debug!(message_id = %message.message_id, "Deleted message");
        Some(message)
    }

    pub fn delete_message_batch(&self, receipt_handles: Vec<String>) -> Vec<BatchEntryResult> {
        receipt_handles
            .into_iter()
            .map(|receipt_handle| {
                let succeeded = self.delete_message(&receipt_handle).is_some();
                BatchEntryResult {
                    receipt_handle,
                    succeeded,
                }
            })
            .collect()
    }

    fn redelivery_hook(&self, url: &str) -> ExpiryHook {
        let registry: Weak<QueueRegistry> = Arc::downgrade(&self.registry);
        let metrics = self.metrics.clone();
        let queue_url = url.to_string();

        Arc::new(move |message: Message| {
            let Some(store) = registry.upgrade().and_then(|r| r.store(&queue_url)) else {
                debug!(
                    url = %queue_url,
                    message_id = %message.message_id,
                    "Queue gone, dropping expired message"
                );
                return;
            };
            store.offer_front(message);
            metrics.message_redelivered();
        })
    }
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database")
            .field("registry", &self.registry)
            .field("in_flight", &self.in_flight)
            .finish()
    }
}

/// Delayed-send completion: place the message if its queue still exists
fn make_visible(registry: &Weak<QueueRegistry>, url: &str, message: Message) {
    match registry.upgrade().and_then(|r| r.store(url)) {
        Some(store) => {
            store.offer_back(message);
            store.delayed_finished();
        }
        None => {
            debug!(
                url = %url,
                message_id = %message.message_id,
                "Queue gone, dropping delayed message"
            );
        }
    }
}

fn not_in_flight(receipt_handle: &str) {
    debug!(
        receipt_handle = %receipt_handle,
        message_id = ?ids::message_id_of(receipt_handle),
        "Receipt handle not in flight"
    );
}
