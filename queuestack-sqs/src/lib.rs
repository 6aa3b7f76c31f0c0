//! In-memory SQS-style message broker for queuestack
//!
//! Provides a multi-queue broker with:
//! - CreateQueue, DeleteQueue, ListQueues, PurgeQueue, queue attributes
//! - SendMessage, ReceiveMessage, DeleteMessage (single and batched)
//! - Per-message visibility timeouts with automatic redelivery
//! - Delayed sends, MD5 digests of bodies and attributes, receive counters

pub mod config;
pub mod database;
pub mod hashing;
pub mod inflight;
pub mod message;
pub mod queue;
pub mod registry;
pub mod scheduler;
pub mod store;


pub use config::BrokerConfig;
pub use database::{BatchEntryResult, Database, QueueDepth};
pub use message::{Message, SendEntry};
pub use queue::{Queue, QueueAttributes};
pub use scheduler::{ScheduledTask, VisibilityScheduler};
