//! Per-queue storage of pending messages

use crate::message::Message;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Pending (visible) messages of one queue.
///
/// New sends go to the back; redeliveries go to the front so they are handed out
/// ahead of newer arrivals. Every operation touches a single end under a short lock.
#[derive(Debug, Default)]
pub struct MessageStore {
    messages: Mutex<VecDeque<Message>>,
    delayed: AtomicUsize,
}

impl MessageStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn offer_back(&self, message: Message) {
        self.messages.lock().push_back(message);
    }

    pub fn offer_front(&self, message: Message) {
        self.messages.lock().push_front(message);
    }

    pub fn poll_front(&self) -> Option<Message> {
        self.messages.lock().pop_front()
    }

    /// Swap in an empty collection, returning how many pending messages were dropped
    pub fn purge(&self) -> usize {
        let dropped = std::mem::take(&mut *self.messages.lock());
        dropped.len()
    }

    pub fn len(&self) -> usize {
        self.messages.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// A delayed send for this queue has been scheduled
    pub fn delayed_started(&self) {
        self.delayed.fetch_add(1, Ordering::Relaxed);
    }

    /// A delayed send for this queue has become visible
    pub fn delayed_finished(&self) {
        // Saturates at zero
        let _ = self
            .delayed
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |n| n.checked_sub(1));
    }

    /// Messages sent with a delay that have not become visible yet
    pub fn delayed(&self) -> usize {
        self.delayed.load(Ordering::Relaxed)
    }
}
