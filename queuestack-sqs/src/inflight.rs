//! Messages currently held by consumers, keyed by receipt handle
//!
//! Each entry carries a timer that hands the message back to its queue when the
//! visibility timeout lapses. Delete, visibility change and the timer itself all go
//! through one gate: removing (or rewriting) the entry in the map. Whoever gets there
//! first wins; the others observe "not found".

use crate::message::Message;
use crate::scheduler::{ScheduledTask, VisibilityScheduler};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use queuestack_core::BrokerMetrics;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;
use tracing::debug;

/// Called with the (pending) message when its visibility timeout lapses
pub type ExpiryHook = Arc<dyn Fn(Message) + Send + Sync>;

struct InFlightEntry {
    queue_url: String,
    message: Message,
    /// Distinguishes this arming of the timer from earlier ones under the same handle
    generation: u64,
    task: ScheduledTask,
    on_expire: ExpiryHook,
}

pub struct InFlightTracker {
    entries: DashMap<String, InFlightEntry>,
    scheduler: VisibilityScheduler,
    metrics: Arc<dyn BrokerMetrics>,
    next_generation: AtomicU64,
}

impl InFlightTracker {
    pub fn new(scheduler: VisibilityScheduler, metrics: Arc<dyn BrokerMetrics>) -> Self {
        Self {
            entries: DashMap::new(),
            scheduler,
            metrics,
            next_generation: AtomicU64::new(0),
        }
    }

    /// Hold `message` under `receipt_handle` for `timeout`, then pass it to `on_expire`
    /// unless it was deleted or rescheduled first.
    pub fn track(
        self: &Arc<Self>,
        receipt_handle: String,
        queue_url: String,
        message: Message,
        timeout: Duration,
        on_expire: ExpiryHook,
    ) {
        let generation = self.next_generation();

        // The slot stays locked until the task handle is stored, so a timer that
        // fires immediately still finds its entry.
        match self.entries.entry(receipt_handle.clone()) {
            Entry::Occupied(mut slot) => {
                let entry = slot.get_mut();
                entry.task.cancel();
                entry.task = self.arm(receipt_handle, generation, timeout);
                entry.generation = generation;
                entry.queue_url = queue_url;
                entry.message = message;
                entry.on_expire = on_expire;
            }
            Entry::Vacant(slot) => {
                let task = self.arm(receipt_handle, generation, timeout);
                slot.insert(InFlightEntry {
                    queue_url,
                    message,
                    generation,
                    task,
                    on_expire,
                });
                self.metrics.in_flight_added();
            }
        }
    }

    /// Stop tracking `receipt_handle` and cancel its timer
    pub fn cancel_and_remove(&self, receipt_handle: &str) -> Option<Message> {
        let (_, entry) = self.entries.remove(receipt_handle)?;
        entry.task.cancel();
        self.metrics.in_flight_removed();
        Some(entry.message)
    }

    /// Restart the visibility timer of `receipt_handle` with `timeout`
    pub fn reschedule(self: &Arc<Self>, receipt_handle: &str, timeout: Duration) -> Option<Message> {
        let generation = self.next_generation();
        let mut entry = self.entries.get_mut(receipt_handle)?;

        entry.task.cancel();
        entry.task = self.arm(receipt_handle.to_string(), generation, timeout);
        entry.generation = generation;
        Some(entry.message.clone())
    }

    /// Number of deliveries in flight for one queue
    pub fn in_flight_for(&self, queue_url: &str) -> usize {
        self.entries
            .iter()
            .filter(|entry| entry.queue_url == queue_url)
            .count()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn next_generation(&self) -> u64 {
        self.next_generation.fetch_add(1, Ordering::Relaxed)
    }

    fn arm(self: &Arc<Self>, receipt_handle: String, generation: u64, timeout: Duration) -> ScheduledTask {
        let tracker: Weak<Self> = Arc::downgrade(self);
        self.scheduler.schedule(timeout, move || {
            if let Some(tracker) = tracker.upgrade() {
                tracker.expire(&receipt_handle, generation);
            }
        })
    }

    fn expire(&self, receipt_handle: &str, generation: u64) {
        let Some((_, entry)) = self
            .entries
            .remove_if(receipt_handle, |_, entry| entry.generation == generation)
        else {
            return;
        };

        self.metrics.in_flight_removed();
        debug!(
            queue = %entry.queue_url,
            message_id = %entry.message.message_id,
            "Visibility timeout expired"
        );
        (entry.on_expire)(entry.message.returned());
    }
}

impl std::fmt::Debug for InFlightTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InFlightTracker")
            .field("entries", &self.entries.len())
            .finish()
    }
}
