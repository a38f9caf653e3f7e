//! In-memory orchestration service for unit tests.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::{json, Map, Value};

use execpilot_client::{ClientError, OrchestrationClient, UpsertOutcome};
use execpilot_core::{
    AgentDefinition, AgentId, Execution, ExecutionId, ExecutionStatus, TaskDefinition, TaskId,
    ToolCall, ToolOutput, ToolSpec, Transition,
};

use crate::error::ToolError;
use crate::tools::ToolInvoker;

/// Replays a scripted sequence of execution states per task.
///
/// Executions created for task `t` get the id `exec-t`. Each poll pops the
/// next scripted state; the last one repeats forever.
#[derive(Default)]
pub(crate) struct ScriptedService {
    scripts: Mutex<HashMap<TaskId, VecDeque<Execution>>>,
    transitions: Mutex<HashMap<TaskId, Vec<Transition>>>,
    rejected_tasks: Mutex<Vec<TaskId>>,
    pub agents: Mutex<HashMap<AgentId, AgentDefinition>>,
    pub tasks: Mutex<HashMap<TaskId, (AgentId, TaskDefinition)>>,
    pub upserts: Mutex<Vec<String>>,
    pub created: Mutex<Vec<(TaskId, Value)>>,
    pub polls: Mutex<Vec<ExecutionId>>,
    pub submissions: Mutex<Vec<(ExecutionId, Vec<ToolOutput>)>>,
    pub transition_reads: Mutex<usize>,
}

impl ScriptedService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_script(
        self,
        task_id: &str,
        states: Vec<Execution>,
        transitions: Vec<Transition>,
    ) -> Self {
        self.scripts
            .lock()
            .unwrap()
            .insert(TaskId::new(task_id), states.into());
        self.transitions
            .lock()
            .unwrap()
            .insert(TaskId::new(task_id), transitions);
        self
    }

    pub fn rejecting(self, task_id: &str) -> Self {
        self.rejected_tasks.lock().unwrap().push(TaskId::new(task_id));
        self
    }

    pub fn poll_count(&self) -> usize {
        self.polls.lock().unwrap().len()
    }

    pub fn submitted(&self) -> Vec<ToolOutput> {
        self.submissions
            .lock()
            .unwrap()
            .iter()
            .flat_map(|(_, outputs)| outputs.clone())
            .collect()
    }

    fn task_for(execution_id: &ExecutionId) -> TaskId {
        TaskId::new(
            execution_id
                .as_str()
                .strip_prefix("exec-")
                .unwrap_or(execution_id.as_str()),
        )
    }
}

#[async_trait]
impl OrchestrationClient for ScriptedService {
    async fn create_or_update_agent(
        &self,
        agent_id: &AgentId,
        definition: &AgentDefinition,
    ) -> Result<UpsertOutcome, ClientError> {
        self.upserts.lock().unwrap().push(format!("agent:{agent_id}"));
        let previous = self
            .agents
            .lock()
            .unwrap()
            .insert(agent_id.clone(), definition.clone());
        Ok(if previous.is_some() {
            UpsertOutcome::Updated
        } else {
            UpsertOutcome::Created
        })
    }

    async fn create_or_update_task(
        &self,
        agent_id: &AgentId,
        task_id: &TaskId,
        definition: &TaskDefinition,
    ) -> Result<UpsertOutcome, ClientError> {
        if !self.agents.lock().unwrap().contains_key(agent_id) {
            return Err(ClientError::NotFound(format!("/agents/{agent_id}")));
        }
        self.upserts.lock().unwrap().push(format!("task:{task_id}"));
        let previous = self
            .tasks
            .lock()
            .unwrap()
            .insert(task_id.clone(), (agent_id.clone(), definition.clone()));
        Ok(if previous.is_some() {
            UpsertOutcome::Updated
        } else {
            UpsertOutcome::Created
        })
    }

    async fn create_execution(
        &self,
        task_id: &TaskId,
        input: &Value,
    ) -> Result<Execution, ClientError> {
        if self.rejected_tasks.lock().unwrap().contains(task_id) {
            return Err(ClientError::Status {
                status: 422,
                body: "input does not match schema".to_string(),
            });
        }
        self.created
            .lock()
            .unwrap()
            .push((task_id.clone(), input.clone()));
        Ok(Execution::new(
            format!("exec-{task_id}"),
            ExecutionStatus::Queued,
        ))
    }

    async fn get_execution(&self, execution_id: &ExecutionId) -> Result<Execution, ClientError> {
        self.polls.lock().unwrap().push(execution_id.clone());

        let mut scripts = self.scripts.lock().unwrap();
        let script = scripts
            .get_mut(&Self::task_for(execution_id))
            .ok_or_else(|| ClientError::NotFound(format!("/executions/{execution_id}")))?;

        let mut state = if script.len() > 1 {
            script.pop_front().unwrap()
        } else {
            script.front().cloned().unwrap()
        };
        state.id = execution_id.clone();
        Ok(state)
    }

    async fn submit_tool_outputs(
        &self,
        execution_id: &ExecutionId,
        outputs: &[ToolOutput],
    ) -> Result<(), ClientError> {
        self.submissions
            .lock()
            .unwrap()
            .push((execution_id.clone(), outputs.to_vec()));
        Ok(())
    }

    async fn list_transitions(
        &self,
        execution_id: &ExecutionId,
    ) -> Result<Vec<Transition>, ClientError> {
        *self.transition_reads.lock().unwrap() += 1;
        Ok(self
            .transitions
            .lock()
            .unwrap()
            .get(&Self::task_for(execution_id))
            .cloned()
            .unwrap_or_default())
    }
}

/// Execution state with no tool calls.
pub(crate) fn state(status: ExecutionStatus) -> Execution {
    Execution::new("scripted", status)
}

/// Paused execution asking for the given `(call id, tool, arguments)`.
pub(crate) fn requires_action(calls: &[(&str, &str, Value)]) -> Execution {
    calls.iter().fold(
        Execution::new("scripted", ExecutionStatus::RequiresAction),
        |execution, (id, name, arguments)| {
            execution.with_tool_call(ToolCall::function(*id, *name, arguments.clone()))
        },
    )
}

pub(crate) fn transition(output: Value) -> Transition {
    Transition::new("finish", Some(output))
}

/// Tool answering every call with a fixed value, counting invocations.
pub(crate) struct FixedTool {
    name: &'static str,
    result: Value,
    pub calls: Mutex<Vec<Map<String, Value>>>,
}

impl FixedTool {
    pub fn new(name: &'static str, result: Value) -> Self {
        Self {
            name,
            result,
            calls: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl ToolInvoker for FixedTool {
    fn spec(&self) -> ToolSpec {
        ToolSpec::new(
            self.name,
            "scripted tool",
            json!({"type": "object", "properties": {"url": {"type": "string"}}}),
        )
    }

    async fn invoke(&self, arguments: Map<String, Value>) -> Result<Value, ToolError> {
        self.calls.lock().unwrap().push(arguments);
        Ok(self.result.clone())
    }
}
