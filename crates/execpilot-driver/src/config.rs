//! Driver configuration.

use std::time::Duration;

/// Default delay between polls.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(3);

/// Default number of consecutive non-terminal polls before giving up.
pub const DEFAULT_MAX_POLL_ATTEMPTS: u32 = 15;

/// Default pause before each tool output submission.
pub const DEFAULT_SUBMIT_DELAY: Duration = Duration::from_secs(1);

/// Execution driver configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriverConfig {
    /// Delay between polls of an execution.
    pub poll_interval: Duration,

    /// Non-terminal polls tolerated since creation or the last tool output
    /// submission. Always at least 1.
    pub max_poll_attempts: u32,

    /// Pause before submitting each tool output.
    pub submit_delay: Duration,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            max_poll_attempts: DEFAULT_MAX_POLL_ATTEMPTS,
            submit_delay: DEFAULT_SUBMIT_DELAY,
        }
    }
}

impl DriverConfig {
    /// Builder method to set the poll interval.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Builder method to set the poll budget. Zero is raised to one.
    pub fn with_max_poll_attempts(mut self, attempts: u32) -> Self {
        self.max_poll_attempts = attempts.max(1);
        self
    }

    /// Builder method to set the submission delay.
    pub fn with_submit_delay(mut self, delay: Duration) -> Self {
        self.submit_delay = delay;
        self
    }
}
