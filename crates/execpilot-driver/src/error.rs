//! Error types for driving executions and invoking tools.

use thiserror::Error;

use execpilot_client::ClientError;
use execpilot_core::{ExecutionId, ExecutionStatus, TaskId, ToolCallId};

/// Errors raised by a local tool invoker.
#[derive(Debug, Error)]
pub enum ToolError {
    /// No invoker is registered under the requested name.
    #[error("no local invoker registered for tool '{0}'")]
    UnknownTool(String),

    /// The call is not a `function` call.
    #[error("unsupported tool call type '{0}'")]
    UnsupportedCallType(String),

    /// Arguments did not decode into the tool's declared parameters.
    #[error("invalid arguments: {0}")]
    InvalidArguments(String),

    /// The tool produced nothing usable.
    #[error("tool returned empty content")]
    EmptyContent,

    /// Fetching remote content failed after all retries.
    #[error("fetch failed after {attempts} attempt(s): {message}")]
    Fetch { attempts: u32, message: String },

    /// The tool result could not be serialized into the output envelope.
    #[error("invalid tool output: {0}")]
    InvalidOutput(String),
}

/// Errors returned by [`ExecutionDriver::run`](crate::ExecutionDriver::run)
/// and the registration/setup helpers.
#[derive(Debug, Error)]
pub enum DriverError {
    /// Missing credentials or unusable definitions; fatal at startup.
    #[error("setup failed: {0}")]
    Setup(String),

    /// Registering an agent or task with the service failed.
    #[error("failed to register {entity} {id}: {source}")]
    Registration {
        entity: &'static str,
        id: String,
        #[source]
        source: ClientError,
    },

    /// The service rejected the execution; never retried.
    #[error("failed to create execution for task {task_id}: {source}")]
    ExecutionCreate {
        task_id: TaskId,
        #[source]
        source: ClientError,
    },

    /// A local tool failed while servicing a callback; nothing was submitted.
    #[error("tool '{tool}' failed for call {tool_call_id} of execution {execution_id}: {source}")]
    ToolInvocationFailed {
        execution_id: ExecutionId,
        tool_call_id: ToolCallId,
        tool: String,
        #[source]
        source: ToolError,
    },

    /// The execution reached a terminal failure status.
    #[error(
        "execution {execution_id} ended with status {status}: {}",
        .detail.as_deref().unwrap_or("no error detail provided")
    )]
    RemoteExecutionFailed {
        execution_id: ExecutionId,
        status: ExecutionStatus,
        detail: Option<String>,
    },

    /// The local poll budget ran out while the execution was still active.
    /// The remote execution may still finish.
    #[error("execution {execution_id} still {last_status} after {attempts} poll(s)")]
    PollTimeout {
        execution_id: ExecutionId,
        attempts: u32,
        last_status: ExecutionStatus,
    },

    /// Transport or service error while polling, submitting or reading
    /// transitions.
    #[error("orchestration service error: {0}")]
    Client(#[from] ClientError),
}

impl DriverError {
    /// Returns true for errors that should stop the process at startup.
    pub fn is_setup(&self) -> bool {
        matches!(self, Self::Setup(_) | Self::Registration { .. })
    }

    /// Returns true if the remote execution may still complete on its own.
    pub fn remote_may_still_run(&self) -> bool {
        matches!(self, Self::PollTimeout { .. } | Self::Client(_))
    }
}
