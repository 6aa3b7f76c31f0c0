//! Core types shared by the queuestack broker
//!
//! This crate holds the leaf pieces the broker is built from: fault and error-code
//! types, identifier minting, the clock abstraction and the metrics side channel.

pub mod clock;
pub mod error;
pub mod ids;
pub mod metrics;

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{BrokerError, ErrorCode};
pub use metrics::{BrokerCounters, BrokerMetrics, CountersSnapshot, NoopMetrics};
