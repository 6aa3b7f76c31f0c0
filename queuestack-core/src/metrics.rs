//! Write-only metrics side channel
//!
//! The broker reports events here and never reads them back. Registry construction
//! and export belong to whoever hosts the broker.

use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};

/// Sink for broker events
pub trait BrokerMetrics: Send + Sync {
    fn queue_created(&self) {}
    fn queue_deleted(&self) {}
    fn message_sent(&self) {}
    fn message_received(&self) {}
    fn message_deleted(&self) {}
    fn message_redelivered(&self) {}
    fn in_flight_added(&self) {}
    fn in_flight_removed(&self) {}
}

/// Discards everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopMetrics;

impl BrokerMetrics for NoopMetrics {}

/// In-process counters, handy for tests and simple hosts
#[derive(Debug, Default)]
pub struct BrokerCounters {
    queues_created: AtomicU64,
    queues_deleted: AtomicU64,
    messages_sent: AtomicU64,
    messages_received: AtomicU64,
    messages_deleted: AtomicU64,
    messages_redelivered: AtomicU64,
    in_flight: AtomicI64,
}

/// Point-in-time copy of [`BrokerCounters`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CountersSnapshot {
    pub queues_created: u64,
    pub queues_deleted: u64,
    pub messages_sent: u64,
    pub messages_received: u64,
    pub messages_deleted: u64,
    pub messages_redelivered: u64,
    pub in_flight: i64,
}

impl BrokerCounters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> CountersSnapshot {
        CountersSnapshot {
            queues_created: self.queues_created.load(Ordering::Relaxed),
            queues_deleted: self.queues_deleted.load(Ordering::Relaxed),
            messages_sent: self.messages_sent.load(Ordering::Relaxed),
            messages_received: self.messages_received.load(Ordering::Relaxed),
            messages_deleted: self.messages_deleted.load(Ordering::Relaxed),
            messages_redelivered: self.messages_redelivered.load(Ordering::Relaxed),
            in_flight: self.in_flight.load(Ordering::Relaxed),
        }
    }
}

impl BrokerMetrics for BrokerCounters {
    fn queue_created(&self) {
        self.queues_created.fetch_add(1, Ordering::Relaxed);
    }

    fn queue_deleted(&self) {
        self.queues_deleted.fetch_add(1, Ordering::Relaxed);
    }

    fn message_sent(&self) {
        self.messages_sent.fetch_add(1, Ordering::Relaxed);
    }

    fn message_received(&self) {
        self.messages_received.fetch_add(1, Ordering::Relaxed);
    }

    fn message_deleted(&self) {
        self.messages_deleted.fetch_add(1, Ordering::Relaxed);
    }

    fn message_redelivered(&self) {
        self.messages_redelivered.fetch_add(1, Ordering::Relaxed);
    }

    fn in_flight_added(&self) {
        self.in_flight.fetch_add(1, Ordering::Relaxed);
    }

    fn in_flight_removed(&self) {
        self.in_flight.fetch_sub(1, Ordering::Relaxed);
    }
}
