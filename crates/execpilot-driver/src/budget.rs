//! Per-execution poll budget.

use std::time::Duration;

/// Counts consecutive non-terminal polls of one execution.
///
/// The count starts at zero and goes back to zero whenever the client
/// answers a tool callback, so a multi-step tool conversation is never
/// cut short by work done before the latest submission.
#[derive(Debug, Clone)]
pub struct PollBudget {
    max_attempts: u32,
    attempt: u32,
    interval: Duration,
}

impl PollBudget {
    pub fn new(max_attempts: u32, interval: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            attempt: 0,
            interval,
        }
    }

    /// Record a non-terminal poll. Returns true while budget remains.
    pub fn record_attempt(&mut self) -> bool {
        self.attempt = self.attempt.saturating_add(1);
        !self.is_exhausted()
    }

    pub fn is_exhausted(&self) -> bool {
        self.attempt >= self.max_attempts
    }

    /// Start counting again after a tool output submission.
    pub fn reset(&mut self) {
        self.attempt = 0;
    }

    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Sleep for one poll interval.
    pub async fn wait(&self) {
        tokio::time::sleep(self.interval).await;
    }
}
