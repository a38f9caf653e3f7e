//! Execution, tool call and transition records.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::{CoreError, ExecutionId, ExecutionStatus, TaskId, ToolCallId};

/// One run of a task definition against a given input.
///
/// Created by the client, mutated only by the remote service. The client
/// observes it by polling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Execution {
    /// Unique execution identifier.
    pub id: ExecutionId,

    /// Task this execution belongs to, when the service reports it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_id: Option<TaskId>,

    /// Current status.
    pub status: ExecutionStatus,

    /// Last error reported by the service (string or structured).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<Value>,

    /// Pending tool calls, present while the status is `requires_action`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCall>,

    /// When the execution was created.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,

    /// When the execution last changed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Execution {
    /// Create an execution record with the given status and nothing else.
    pub fn new(id: impl Into<ExecutionId>, status: ExecutionStatus) -> Self {
        Self {
            id: id.into(),
            task_id: None,
            status,
            error: None,
            tool_calls: Vec::new(),
            created_at: None,
            updated_at: None,
        }
    }

    /// Builder method to attach an error detail.
    pub fn with_error(mut self, error: impl Into<Value>) -> Self {
        self.error = Some(error.into());
        self
    }

    /// Builder method to add a pending tool call.
    pub fn with_tool_call(mut self, call: ToolCall) -> Self {
        self.tool_calls.push(call);
        self
    }

    /// Human-readable error detail, if the service provided one.
    pub fn error_detail(&self) -> Option<String> {
        match self.error.as_ref()? {
            Value::Null => None,
            Value::String(s) if s.trim().is_empty() => None,
            Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }
}

/// A request from a paused execution for a local tool invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Identifier the output must be tagged with.
    pub id: ToolCallId,

    /// Call kind; only `function` calls are answered by the client.
    #[serde(rename = "type", default = "default_call_type")]
    pub kind: String,

    /// The function being called.
    pub function: FunctionCall,
}

fn default_call_type() -> String {
    "function".to_string()
}

impl ToolCall {
    /// Create a function tool call.
    pub fn function(
        id: impl Into<ToolCallId>,
        name: impl Into<String>,
        arguments: Value,
    ) -> Self {
        Self {
            id: id.into(),
            kind: default_call_type(),
            function: FunctionCall {
                name: name.into(),
                arguments,
            },
        }
    }

    /// Name of the requested tool.
    pub fn name(&self) -> &str {
        &self.function.name
    }

    /// Returns true for `function` calls, the only kind answered locally.
    pub fn is_function(&self) -> bool {
        self.kind == "function"
    }
}

/// Function name and arguments of a tool call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionCall {
    /// Declared tool name, used as the lookup key for the local invoker.
    pub name: String,

    /// Arguments: a JSON object, or a string holding a JSON-encoded object.
    #[serde(default)]
    pub arguments: Value,
}

impl FunctionCall {
    /// Decode the arguments into a JSON object.
    ///
    /// Accepts an object as-is, a string containing a JSON object, or a
    /// missing/null value (no arguments). Anything else is rejected; string
    /// payloads are parsed as JSON and never evaluated.
    pub fn arguments_object(&self) -> Result<Map<String, Value>, CoreError> {
        match &self.arguments {
            Value::Object(map) => Ok(map.clone()),
            Value::Null => Ok(Map::new()),
            Value::String(raw) => match serde_json::from_str::<Value>(raw) {
                Ok(Value::Object(map)) => Ok(map),
                Ok(other) => Err(CoreError::InvalidArguments(format!(
                    "expected a JSON object, got {}",
                    json_kind(&other)
                ))),
                Err(e) => Err(CoreError::InvalidArguments(format!(
                    "arguments are not valid JSON: {}",
                    e
                ))),
            },
            other => Err(CoreError::InvalidArguments(format!(
                "expected a JSON object, got {}",
                json_kind(other)
            ))),
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Output submitted back for one tool call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolOutput {
    /// The tool call being answered.
    pub tool_call_id: ToolCallId,

    /// JSON-encoded `{"content": ...}` envelope.
    pub output: String,
}

impl ToolOutput {
    /// Wrap a tool result in the `{"content": ...}` envelope.
    pub fn content(tool_call_id: ToolCallId, result: &Value) -> Result<Self, CoreError> {
        let output = serde_json::to_string(&json!({ "content": result }))?;
        Ok(Self {
            tool_call_id,
            output,
        })
    }
}

/// Immutable record of an execution state change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transition {
    /// Transition type (e.g. `init`, `step`, `finish`).
    #[serde(rename = "type")]
    pub kind: String,

    /// Output carried by the transition, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<Value>,

    /// When the transition was recorded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl Transition {
    /// Create a transition with an output payload.
    pub fn new(kind: impl Into<String>, output: Option<Value>) -> Self {
        Self {
            kind: kind.into(),
            output,
            created_at: None,
        }
    }

    /// The output if it is present and non-empty.
    pub fn output(&self) -> Option<&Value> {
        match self.output.as_ref()? {
            Value::Null => None,
            Value::String(s) if s.is_empty() => None,
            value => Some(value),
        }
    }
}

/// Final result of driving an execution to completion.
#[derive(Debug, Clone, PartialEq)]
pub enum RunOutput {
    /// Output of the first transition.
    Value(Value),
    /// The execution succeeded but no transition carried output.
    NoOutput,
}

impl RunOutput {
    /// Extract the output from an ordered transition list.
    ///
    /// Only the first transition is consulted.
    pub fn from_transitions(transitions: &[Transition]) -> Self {
        transitions
            .first()
            .and_then(Transition::output)
            .cloned()
            .map_or(Self::NoOutput, Self::Value)
    }

    /// Returns true for the "no output" sentinel.
    pub fn is_no_output(&self) -> bool {
        matches!(self, Self::NoOutput)
    }

    /// The output value, if any.
    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Self::Value(v) => Some(v),
            Self::NoOutput => None,
        }
    }

    /// Consume and return the output value, if any.
    pub fn into_value(self) -> Option<Value> {
        match self {
            Self::Value(v) => Some(v),
            Self::NoOutput => None,
        }
    }
}

impl fmt::Display for RunOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Value(Value::String(s)) => f.write_str(s),
            Self::Value(other) => write!(f, "{}", other),
            Self::NoOutput => f.write_str("No output"),
        }
    }
}
