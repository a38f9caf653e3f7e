//! Agent and task definitions registered with the orchestration service.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::CoreError;

/// An agent registered with the orchestration service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentDefinition {
    /// Display name.
    pub name: String,

    /// Short description, available to task prompts as `agent.about`.
    #[serde(default)]
    pub about: String,

    /// Model the agent runs on (e.g. "claude-3.5-sonnet", "gpt-4o").
    pub model: String,

    /// Function tools the agent calls back to the client for.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<ToolSpec>,
}

impl AgentDefinition {
    /// Create a new agent definition without tools.
    pub fn new(name: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            about: String::new(),
            model: model.into(),
            tools: Vec::new(),
        }
    }

    /// Builder method to set the description.
    pub fn with_about(mut self, about: impl Into<String>) -> Self {
        self.about = about.into();
        self
    }

    /// Builder method to declare a tool.
    pub fn with_tool(mut self, tool: ToolSpec) -> Self {
        self.tools.push(tool);
        self
    }

    /// Builder method to declare several tools.
    pub fn with_tools(mut self, tools: impl IntoIterator<Item = ToolSpec>) -> Self {
        self.tools.extend(tools);
        self
    }
}

/// Declaration of a client-side function tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolSpec {
    /// Tool name; tool calls are routed by this key.
    pub name: String,

    /// What the tool does, shown to the model.
    pub description: String,

    /// JSON schema of the arguments object.
    pub parameters: Value,
}

impl ToolSpec {
    /// Create a new tool spec.
    pub fn new(name: impl Into<String>, description: impl Into<String>, parameters: Value) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters,
        }
    }
}

/// A remote workflow definition.
///
/// Only the fields the client reasons about are typed; the workflow body
/// (`main`, `tools`, ...) is kept verbatim and sent as-is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskDefinition {
    /// Task name.
    pub name: String,

    /// Task description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// JSON schema the execution input must match.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_schema: Option<Value>,

    /// JSON schema of the final output.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_schema: Option<Value>,

    /// Remaining workflow keys.
    #[serde(flatten)]
    pub workflow: Map<String, Value>,
}

impl TaskDefinition {
    /// Build a definition from an already-parsed document.
    pub fn from_value(value: Value) -> Result<Self, CoreError> {
        if !value.is_object() {
            return Err(CoreError::InvalidDefinition(
                "task definition must be a mapping".to_string(),
            ));
        }

        let definition: Self = serde_json::from_value(value)
            .map_err(|e| CoreError::InvalidDefinition(e.to_string()))?;

        if definition.name.trim().is_empty() {
            return Err(CoreError::InvalidDefinition(
                "task definition has an empty name".to_string(),
            ));
        }

        Ok(definition)
    }

    /// Names of the input properties the schema marks as required.
    pub fn required_inputs(&self) -> Vec<&str> {
        self.input_schema
            .as_ref()
            .and_then(|schema| schema.get("required"))
            .and_then(Value::as_array)
            .map(|required| required.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default()
    }

    /// Check an execution input against the required keys of the schema.
    pub fn check_input(&self, input: &Value) -> Result<(), CoreError> {
        let Some(object) = input.as_object() else {
            return Err(CoreError::InvalidArguments(
                "execution input must be a JSON object".to_string(),
            ));
        };

        let missing: Vec<&str> = self
            .required_inputs()
            .into_iter()
            .filter(|key| !object.contains_key(*key))
            .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(CoreError::InvalidArguments(format!(
                "execution input is missing required keys: {}",
                missing.join(", ")
            )))
        }
    }
}
