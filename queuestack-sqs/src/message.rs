//! Message records

use crate::hashing::{md5_of_attributes, md5_of_body};
use chrono::{DateTime, Utc};
use queuestack_core::ids;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A message as stored in a queue or handed to a consumer.
///
/// Records are immutable; every state change produces a new value. The receive
/// counters live on the record so they survive a trip through the in-flight tracker
/// and back into the queue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub message_id: String,
    /// Set while the message is in flight, `None` while pending
    pub receipt_handle: Option<String>,
    pub body: String,
    pub attributes: HashMap<String, String>,
    pub md5_of_body: String,
    pub md5_of_attributes: String,
    pub receive_count: u32,
    pub sent_time: DateTime<Utc>,
    pub first_received_time: Option<DateTime<Utc>>,
}

impl Message {
    pub fn new(body: String, attributes: HashMap<String, String>, sent_time: DateTime<Utc>) -> Self {
        Self {
            message_id: ids::new_message_id(),
            receipt_handle: None,
            md5_of_body: md5_of_body(&body),
            md5_of_attributes: md5_of_attributes(&attributes),
            body,
            attributes,
            receive_count: 0,
            sent_time,
            first_received_time: None,
        }
    }

    /// The record handed out for one delivery under `receipt_handle`
    pub fn received(self, receipt_handle: String, now: DateTime<Utc>) -> Self {
        Self {
            receipt_handle: Some(receipt_handle),
            receive_count: self.receive_count + 1,
            first_received_time: self.first_received_time.or(Some(now)),
            ..self
        }
    }

    /// The record put back into its queue once a delivery lapses
    pub fn returned(self) -> Self {
        Self {
            receipt_handle: None,
            ..self
        }
    }
}

/// One entry of a batched send
#[derive(Debug, Clone, Default)]
pub struct SendEntry {
    pub body: String,
    pub attributes: HashMap<String, String>,
    pub delay_seconds: Option<u32>,
}

impl SendEntry {
    pub fn new(body: impl Into<String>) -> Self {
        Self {
            body: body.into(),
            ..Default::default()
        }
    }
}
