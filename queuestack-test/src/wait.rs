//! Polling helpers

use std::time::Duration;

/// The condition did not hold before the deadline
#[derive(Debug)]
pub struct WaitTimeout(pub Duration);

impl std::fmt::Display for WaitTimeout {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Condition not met within {:?}", self.0)
    }
}

impl std::error::Error for WaitTimeout {}

/// Poll `check` every 10ms until it returns `Some`, or give up after `timeout`
pub async fn wait_until<T, F>(timeout: Duration, mut check: F) -> Result<T, WaitTimeout>
where
    F: FnMut() -> Option<T>,
{
    let start = tokio::time::Instant::now();

    while start.elapsed() < timeout {
        if let Some(value) = check() {
            return Ok(value);
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    check().ok_or(WaitTimeout(timeout))
}
