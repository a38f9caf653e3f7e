//! execpilot core domain types
//!
//! This crate contains the pure domain model shared by the client, the
//! driver and the CLI, with no dependencies on:
//! - Network/HTTP
//! - Async runtime
//! - Filesystem
//!
//! The remote orchestration service owns executions and their transitions;
//! these types only describe what the client observes.

pub mod definition;
pub mod error;
pub mod execution;
pub mod ids;
pub mod status;

// Re-export commonly used types
pub use definition::{AgentDefinition, TaskDefinition, ToolSpec};
pub use error::CoreError;
pub use execution::{Execution, FunctionCall, RunOutput, ToolCall, ToolOutput, Transition};
pub use ids::{AgentId, ExecutionId, TaskId, ToolCallId};
pub use status::ExecutionStatus;
