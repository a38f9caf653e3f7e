//! Local tools the orchestration service calls back to.
//!
//! Tools come in two flavours:
//! - [`ToolInvoker`]: object-safe, takes a raw JSON arguments object. This is
//!   what the registry stores and the driver dispatches to.
//! - [`Tool`]: typed arguments with a derived JSON schema. Every `Tool` is a
//!   `ToolInvoker` through a blanket impl.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use execpilot_core::{ToolCall, ToolSpec};

use crate::error::ToolError;

/// A tool that can answer tool calls with a JSON result.
#[async_trait]
pub trait ToolInvoker: Send + Sync {
    /// Declaration sent to the service when the agent is registered.
    fn spec(&self) -> ToolSpec;

    /// Run the tool with a decoded arguments object.
    async fn invoke(&self, arguments: Map<String, Value>) -> Result<Value, ToolError>;
}

/// A tool with typed arguments.
///
/// Arguments should deny unknown fields so a model that invents parameters
/// gets an error instead of silently ignored input.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Name the service routes calls by.
    const NAME: &'static str;

    type Args: DeserializeOwned + JsonSchema + Send;
    type Output: Serialize + Send;

    fn description(&self) -> String;

    async fn call(&self, args: Self::Args) -> Result<Self::Output, ToolError>;
}

#[async_trait]
impl<T: Tool> ToolInvoker for T {
    fn spec(&self) -> ToolSpec {
        let schema = schemars::schema_for!(T::Args);
        ToolSpec::new(T::NAME, self.description(), schema.to_value())
    }

    async fn invoke(&self, arguments: Map<String, Value>) -> Result<Value, ToolError> {
        let args: T::Args = serde_json::from_value(Value::Object(arguments))
            .map_err(|e| ToolError::InvalidArguments(e.to_string()))?;

        let output = self.call(args).await?;

        serde_json::to_value(output).map_err(|e| ToolError::InvalidOutput(e.to_string()))
    }
}

/// Name-keyed set of local tools.
#[derive(Clone, Default)]
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn ToolInvoker>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool. A tool with the same name is replaced.
    pub fn register(&mut self, tool: impl ToolInvoker + 'static) -> &mut Self {
        self.register_shared(Arc::new(tool))
    }

    /// Register an already shared tool. A tool with the same name is replaced.
    pub fn register_shared(&mut self, tool: Arc<dyn ToolInvoker>) -> &mut Self {
        let name = tool.spec().name;
        if self.tools.insert(name.clone(), tool).is_some() {
            warn!(tool = %name, "Replaced previously registered tool");
        }
        self
    }

    /// Builder method to register a tool.
    pub fn with_tool(mut self, tool: impl ToolInvoker + 'static) -> Self {
        self.register(tool);
        self
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn ToolInvoker>> {
        self.tools.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    /// Registered tool names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.tools.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Declarations of all registered tools, sorted by name.
    pub fn specs(&self) -> Vec<ToolSpec> {
        let mut specs: Vec<ToolSpec> = self.tools.values().map(|tool| tool.spec()).collect();
        specs.sort_by(|a, b| a.name.cmp(&b.name));
        specs
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Answer one tool call.
    ///
    /// Fails if the call is not a `function` call, no tool matches its name,
    /// the arguments are not an object, or the tool returns null or blank text.
    pub async fn invoke(&self, call: &ToolCall) -> Result<Value, ToolError> {
        if !call.is_function() {
            return Err(ToolError::UnsupportedCallType(call.kind.clone()));
        }

        let tool = self
            .get(call.name())
            .ok_or_else(|| ToolError::UnknownTool(call.name().to_string()))?;

        let arguments = call
            .function
            .arguments_object()
            .map_err(|e| ToolError::InvalidArguments(e.to_string()))?;

        debug!(tool = %call.name(), tool_call_id = %call.id, "Invoking local tool");
        let result = tool.invoke(arguments).await?;

        if is_empty_result(&result) {
            return Err(ToolError::EmptyContent);
        }

        Ok(result)
    }
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("tools", &self.names())
            .finish()
    }
}

fn is_empty_result(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(text) => text.trim().is_empty(),
        _ => false,
    }
}
