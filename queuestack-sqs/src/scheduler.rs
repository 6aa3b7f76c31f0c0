//! One-shot delayed callbacks on the tokio runtime
//!
//! Used to make delayed sends visible and to hand in-flight messages back to their
//! queue once a visibility timeout lapses.

use queuestack_core::BrokerError;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::AbortHandle;

#[derive(Debug, Clone)]
pub struct VisibilityScheduler {
    runtime: Handle,
}

impl VisibilityScheduler {
    /// Bind to the tokio runtime of the calling context
    pub fn new() -> Result<Self, BrokerError> {
        Handle::try_current()
            .map(Self::with_handle)
            .map_err(|e| BrokerError::SchedulerUnavailable(e.to_string()))
    }

    pub fn with_handle(runtime: Handle) -> Self {
        Self { runtime }
    }

    /// Run `task` once after `delay`. Safe to call from any thread.
    pub fn schedule<F>(&self, delay: Duration, task: F) -> ScheduledTask
    where
        F: FnOnce() + Send + 'static,
    {
        let handle = self.runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            task();
        });

        ScheduledTask {
            handle: handle.abort_handle(),
        }
    }
}

/// Handle to a scheduled callback
#[derive(Debug)]
pub struct ScheduledTask {
    handle: AbortHandle,
}

impl ScheduledTask {
    /// Stop the callback if it has not started. A callback that is already running
    /// completes, so callers still need their own gate against a late fire.
    pub fn cancel(&self) {
        self.handle.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}
