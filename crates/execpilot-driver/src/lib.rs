//! Execution driver for execpilot
//!
//! Creates executions on a remote orchestration service, polls them to a
//! terminal state and answers their tool calls with local tools.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use execpilot_client::HttpOrchestrationClient;
//! use execpilot_core::{AgentId, TaskId};
//! use execpilot_driver::{
//!     ExecutionDriver, FetchWebContent, ReaderConfig, ToolRegistry, WebReader,
//! };
//! use serde_json::json;
//!
//! async fn summarize() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = HttpOrchestrationClient::new("https://api.example.com/api", "api-key")?;
//!     let reader = WebReader::new(ReaderConfig::default(), "reader-key")?;
//!     let tools = ToolRegistry::new().with_tool(FetchWebContent::new(reader));
//!
//!     let driver = ExecutionDriver::new(Arc::new(client), tools);
//!     let output = driver
//!         .run(
//!             &TaskId::new("task-id"),
//!             &AgentId::new("agent-id"),
//!             json!({"url": "https://example.com"}),
//!         )
//!         .await?;
//!
//!     println!("{output}");
//!     Ok(())
//! }
//! ```

mod budget;
mod config;
mod definitions;
mod driver;
mod error;
mod pipeline;
mod reader;
mod registration;
mod tools;

#[cfg(test)]
mod testing;

pub use budget::PollBudget;
pub use config::{
    DriverConfig, DEFAULT_MAX_POLL_ATTEMPTS, DEFAULT_POLL_INTERVAL, DEFAULT_SUBMIT_DELAY,
};
pub use definitions::DefinitionLoader;
pub use driver::ExecutionDriver;
pub use error::{DriverError, ToolError};
pub use pipeline::{Pipeline, PipelineError};
pub use reader::{
    FetchWebContent, FetchWebContentArgs, ReaderConfig, WebReader, DEFAULT_READER_BASE_URL,
    FETCH_WEB_CONTENT,
};
pub use registration::{Readiness, Registrar, DEFAULT_SETTLE_DELAY};
pub use tools::{Tool, ToolInvoker, ToolRegistry};
