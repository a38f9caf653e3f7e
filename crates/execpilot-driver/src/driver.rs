//! Drives one remote execution from creation to a terminal outcome.

use std::collections::HashSet;
use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, error, info, instrument, warn};

use execpilot_client::OrchestrationClient;
use execpilot_core::{
    AgentId, Execution, ExecutionId, RunOutput, TaskId, ToolCall, ToolCallId, ToolOutput,
};

use crate::budget::PollBudget;
use crate::config::DriverConfig;
use crate::error::{DriverError, ToolError};
use crate::tools::ToolRegistry;

/// Runs tasks on the orchestration service and answers their tool calls.
///
/// A driver holds no per-run state, so one instance can run any number of
/// executions concurrently.
#[derive(Clone)]
pub struct ExecutionDriver {
    client: Arc<dyn OrchestrationClient>,
    tools: Arc<ToolRegistry>,
    config: DriverConfig,
}

impl ExecutionDriver {
    pub fn new(client: Arc<dyn OrchestrationClient>, tools: ToolRegistry) -> Self {
        Self {
            client,
            tools: Arc::new(tools),
            config: DriverConfig::default(),
        }
    }

    /// Builder method to set the configuration.
    pub fn with_config(mut self, config: DriverConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &DriverConfig {
        &self.config
    }

    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    pub fn client(&self) -> &Arc<dyn OrchestrationClient> {
        &self.client
    }

    /// Create an execution of `task_id` and drive it to completion.
    ///
    /// Returns the output of the first transition once the execution
    /// succeeds, or [`RunOutput::NoOutput`] if it carries none. Tool calls
    /// are answered from the local registry as they appear; each call is
    /// answered at most once. A run that stays non-terminal for more than
    /// `max_poll_attempts` polls since creation or the last submission ends
    /// with [`DriverError::PollTimeout`], leaving the remote execution alone.
    #[instrument(skip_all, fields(task_id = %task_id, agent_id = %agent_id))]
    pub async fn run(
        &self,
        task_id: &TaskId,
        agent_id: &AgentId,
        input: Value,
    ) -> Result<RunOutput, DriverError> {
        let execution = self
            .client
            .create_execution(task_id, &input)
            .await
            .map_err(|source| {
                error!(error = %source, "Failed to create execution");
                DriverError::ExecutionCreate {
                    task_id: task_id.clone(),
                    source,
                }
            })?;

        info!(execution_id = %execution.id, status = %execution.status, "Created execution");

        self.drive(&execution.id).await
    }

    /// Poll an existing execution until it reaches a terminal outcome.
    pub async fn drive(&self, execution_id: &ExecutionId) -> Result<RunOutput, DriverError> {
        let mut budget = PollBudget::new(self.config.max_poll_attempts, self.config.poll_interval);
        let mut answered: HashSet<ToolCallId> = HashSet::new();

        loop {
            let execution = self.client.get_execution(execution_id).await?;
            let status = execution.status;

            debug!(
                execution_id = %execution_id,
                status = %status,
                attempt = budget.attempt() + 1,
                max_attempts = budget.max_attempts(),
                "Polled execution"
            );

            if status.is_success() {
                info!(execution_id = %execution_id, status = %status, "Execution succeeded");
                return self.collect_output(execution_id).await;
            }

            if status.is_failure() {
                let detail = execution.error_detail();
                error!(
                    execution_id = %execution_id,
                    status = %status,
                    detail = detail.as_deref().unwrap_or(""),
                    "Execution failed remotely"
                );
                return Err(DriverError::RemoteExecutionFailed {
                    execution_id: execution_id.clone(),
                    status,
                    detail,
                });
            }

            if status.requires_action() {
                let submitted = self.answer_tool_calls(&execution, &mut answered).await?;
                if submitted > 0 {
                    budget.reset();
                    budget.wait().await;
                    continue;
                }
            }

            if !budget.record_attempt() {
                warn!(
                    execution_id = %execution_id,
                    status = %status,
                    attempts = budget.attempt(),
                    "Poll budget exhausted; remote execution may still be running"
                );
                return Err(DriverError::PollTimeout {
                    execution_id: execution_id.clone(),
                    attempts: budget.attempt(),
                    last_status: status,
                });
            }

            budget.wait().await;
        }
    }

    /// Answer the tool calls of a paused execution that have not been
    /// answered yet. Returns how many outputs were submitted.
    ///
    /// Every pending call is invoked before anything is submitted, so a
    /// failing tool leaves the whole batch unanswered.
    async fn answer_tool_calls(
        &self,
        execution: &Execution,
        answered: &mut HashSet<ToolCallId>,
    ) -> Result<usize, DriverError> {
        if execution.tool_calls.is_empty() {
            warn!(execution_id = %execution.id, "Execution requires action but lists no tool calls");
            return Ok(0);
        }

        let mut seen: HashSet<&ToolCallId> = HashSet::new();
        let pending: Vec<&ToolCall> = execution
            .tool_calls
            .iter()
            .filter(|call| !answered.contains(&call.id) && seen.insert(&call.id))
            .collect();

        if pending.is_empty() {
            debug!(execution_id = %execution.id, "All tool calls already answered");
            return Ok(0);
        }

        let mut outputs = Vec::with_capacity(pending.len());
        for call in pending {
            outputs.push(self.invoke(execution, call).await?);
        }

        for output in &outputs {
            if !self.config.submit_delay.is_zero() {
                tokio::time::sleep(self.config.submit_delay).await;
            }
            self.client
                .submit_tool_outputs(&execution.id, std::slice::from_ref(output))
                .await?;
            answered.insert(output.tool_call_id.clone());
            info!(
                execution_id = %execution.id,
                tool_call_id = %output.tool_call_id,
                "Submitted tool output"
            );
        }

        Ok(outputs.len())
    }

    async fn invoke(&self, execution: &Execution, call: &ToolCall) -> Result<ToolOutput, DriverError> {
        info!(
            execution_id = %execution.id,
            tool_call_id = %call.id,
            tool = %call.name(),
            "Answering tool call"
        );

        let failed = |source: ToolError| {
            error!(
                execution_id = %execution.id,
                tool_call_id = %call.id,
                tool = %call.name(),
                error = %source,
                "Tool invocation failed"
            );
            DriverError::ToolInvocationFailed {
                execution_id: execution.id.clone(),
                tool_call_id: call.id.clone(),
                tool: call.name().to_string(),
                source,
            }
        };

        let result = self.tools.invoke(call).await.map_err(failed)?;

        ToolOutput::content(call.id.clone(), &result)
            .map_err(|e| failed(ToolError::InvalidOutput(e.to_string())))
    }

    async fn collect_output(&self, execution_id: &ExecutionId) -> Result<RunOutput, DriverError> {
        let transitions = self.client.list_transitions(execution_id).await?;

        for (index, transition) in transitions.iter().enumerate() {
            debug!(
                execution_id = %execution_id,
                index,
                kind = %transition.kind,
                has_output = transition.output().is_some(),
                "Transition"
            );
        }

        let output = RunOutput::from_transitions(&transitions);
        if output.is_no_output() {
            warn!(
                execution_id = %execution_id,
                transitions = transitions.len(),
                "Execution succeeded without output"
            );
        }

        Ok(output)
    }
}

impl std::fmt::Debug for ExecutionDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExecutionDriver")
            .field("tools", &self.tools)
            .field("config", &self.config)
            .finish()
    }
}
