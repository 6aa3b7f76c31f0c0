//! Test utilities for queuestack
//!
//! Provides utilities for testing code built on the broker:
//! - Install a tracing subscriber once per test binary
//! - Start a broker with metrics counters attached
//! - Poll for a condition with a deadline
//!
//! ## Usage
//!
//! ```rust,no_run
//! use queuestack_test::TestBroker;
//!
//! #[tokio::test]
//! async fn test_queue() {
//!     let broker = TestBroker::start();
//!     let url = broker.queue("jobs");
//!
//!     broker.send(&url, "hello");
//!     assert_eq!(broker.db().receive_messages(&url, 1, None).len(), 1);
//! }
//! ```

pub mod broker;
pub mod logging;
pub mod wait;

pub use broker::TestBroker;
pub use logging::init_tracing;
pub use wait::{wait_until, WaitTimeout};

/// Default deadline for [`wait_until`]
pub const WAIT_TIMEOUT_SECS: u64 = 10;
