//! Bounded polling used to synchronize with a UI that only signals
//! completion through eventual DOM changes.

use crate::errors::Result;
use std::future::Future;
use std::time::Duration;
use tokio::time::{sleep, Instant};
use tracing::debug;

/// Fixed attempt budget: first check immediate, then one check per interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollBudget {
    pub attempts: u32,
    pub interval: Duration,
}

impl PollBudget {
    pub const fn new(attempts: u32, interval: Duration) -> Self {
        Self { attempts, interval }
    }

    /// Longest total sleep before the budget is exhausted.
    pub fn max_wait(&self) -> Duration {
        self.interval * self.attempts.saturating_sub(1)
    }
}

/// Run `check` up to `budget.attempts` times, sleeping between attempts but
/// never after the last one.
///
/// A failed check (`Err`) counts the same as an unmet one and is discarded.
/// Returns the 1-based attempt that succeeded, or `None` once the budget is
/// spent.
pub async fn poll_attempts<F, Fut>(budget: PollBudget, mut check: F) -> Option<u32>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<bool>>,
{
    for attempt in 1..=budget.attempts {
        match check(attempt).await {
            Ok(true) => return Some(attempt),
            Ok(false) => debug!(attempt, "condition not met yet"),
            Err(e) => debug!(attempt, error = %e, "check failed, retrying"),
        }
        if attempt < budget.attempts {
            sleep(budget.interval).await;
        }
    }
    None
}

/// Re-check `check` every `interval` until it holds or `timeout` elapses.
///
/// The condition is always evaluated at least once, including with a zero
/// timeout. Errors from `check` propagate immediately.
pub async fn wait_until<F, Fut>(timeout: Duration, interval: Duration, mut check: F) -> Result<bool>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<bool>>,
{
    let deadline = Instant::now() + timeout;
    loop {
        if check().await? {
            return Ok(true);
        }
        let now = Instant::now();
        if now >= deadline {
            return Ok(false);
        }
        sleep(interval.min(deadline - now)).await;
    }
}
