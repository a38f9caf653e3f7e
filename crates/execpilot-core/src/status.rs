//! Status of a remote execution.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::CoreError;

/// Status of a remote Execution as reported by the orchestration service.
///
/// The set is closed: a status string outside it fails to decode instead of
/// being treated as still running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionStatus {
    /// Accepted but not yet scheduled.
    Queued,
    /// Being scheduled onto a worker.
    Starting,
    /// Actively executing.
    Running,
    /// Paused waiting for input from a human or another system.
    AwaitingInput,
    /// Paused until the client answers its pending tool calls.
    RequiresAction,
    /// Finished successfully.
    Completed,
    /// Finished successfully (alternate spelling used by some deployments).
    Succeeded,
    /// Finished with an error.
    Failed,
    /// Cancelled before finishing.
    Cancelled,
    /// Gave up waiting on the remote side.
    Expired,
}

impl ExecutionStatus {
    /// All statuses, in lifecycle order.
    pub const ALL: [ExecutionStatus; 10] = [
        Self::Queued,
        Self::Starting,
        Self::Running,
        Self::AwaitingInput,
        Self::RequiresAction,
        Self::Completed,
        Self::Succeeded,
        Self::Failed,
        Self::Cancelled,
        Self::Expired,
    ];

    /// Returns true if the execution will not change status again.
    pub fn is_terminal(&self) -> bool {
        self.is_success() || self.is_failure()
    }

    /// Returns true for the terminal success statuses.
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Completed | Self::Succeeded)
    }

    /// Returns true for the terminal failure statuses.
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed | Self::Cancelled | Self::Expired)
    }

    /// Returns true if the execution is waiting on client tool outputs.
    pub fn requires_action(&self) -> bool {
        matches!(self, Self::RequiresAction)
    }

    /// Wire name of the status.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Queued => "queued",
            Self::Starting => "starting",
            Self::Running => "running",
            Self::AwaitingInput => "awaiting_input",
            Self::RequiresAction => "requires_action",
            Self::Completed => "completed",
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
            Self::Expired => "expired",
        }
    }
}

impl fmt::Display for ExecutionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExecutionStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| CoreError::UnknownStatus(s.to_string()))
    }
}
