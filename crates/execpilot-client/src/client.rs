//! The orchestration service boundary.

use async_trait::async_trait;
use serde_json::Value;

use execpilot_core::{
    AgentDefinition, AgentId, Execution, ExecutionId, TaskDefinition, TaskId, ToolOutput,
    Transition,
};

use crate::error::ClientError;

/// Result of a create-or-update call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    /// No entity existed under the identifier; one was created.
    Created,
    /// The entity existed and was replaced with the new definition.
    Updated,
}

impl UpsertOutcome {
    /// Returns true if a new entity was created.
    pub fn was_created(&self) -> bool {
        matches!(self, Self::Created)
    }
}

/// Operations the client needs from the orchestration service.
///
/// Implementations must be shareable across concurrent runs; each call is an
/// independent request with its own timeout.
#[async_trait]
pub trait OrchestrationClient: Send + Sync {
    /// Create or replace the agent stored under `agent_id`.
    async fn create_or_update_agent(
        &self,
        agent_id: &AgentId,
        definition: &AgentDefinition,
    ) -> Result<UpsertOutcome, ClientError>;

    /// Create or replace the task stored under `task_id`, owned by `agent_id`.
    async fn create_or_update_task(
        &self,
        agent_id: &AgentId,
        task_id: &TaskId,
        definition: &TaskDefinition,
    ) -> Result<UpsertOutcome, ClientError>;

    /// Start a new execution of a task.
    async fn create_execution(
        &self,
        task_id: &TaskId,
        input: &Value,
    ) -> Result<Execution, ClientError>;

    /// Fetch the current state of an execution.
    async fn get_execution(&self, execution_id: &ExecutionId) -> Result<Execution, ClientError>;

    /// Answer pending tool calls of a paused execution.
    async fn submit_tool_outputs(
        &self,
        execution_id: &ExecutionId,
        outputs: &[ToolOutput],
    ) -> Result<(), ClientError>;

    /// List the transitions of an execution, in service order.
    async fn list_transitions(
        &self,
        execution_id: &ExecutionId,
    ) -> Result<Vec<Transition>, ClientError>;
}
