//! Two-stage research-then-compose pipeline.

use serde_json::{json, Value};
use thiserror::Error;
use tracing::{info, instrument};

use execpilot_core::{AgentId, RunOutput, TaskId};

use crate::driver::ExecutionDriver;
use crate::error::DriverError;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Driver(#[from] DriverError),

    #[error("search stage returned no results for '{topic}'")]
    NoSearchResults { topic: String },

    #[error("compose stage returned no content")]
    NoContent,
}

/// Runs a search task, then feeds its results to a compose task.
#[derive(Debug, Clone)]
pub struct Pipeline {
    driver: ExecutionDriver,
    agent_id: AgentId,
    search_task: TaskId,
    compose_task: TaskId,
}

impl Pipeline {
    pub fn new(
        driver: ExecutionDriver,
        agent_id: AgentId,
        search_task: TaskId,
        compose_task: TaskId,
    ) -> Self {
        Self {
            driver,
            agent_id,
            search_task,
            compose_task,
        }
    }

    /// Research `topic` and return the composed text.
    #[instrument(skip(self))]
    pub async fn run(&self, topic: &str) -> Result<String, PipelineError> {
        let search = self
            .driver
            .run(&self.search_task, &self.agent_id, json!({ "topic": topic }))
            .await?;

        let results = search_results(&search).ok_or_else(|| PipelineError::NoSearchResults {
            topic: topic.to_string(),
        })?;
        info!(results = results.len(), "Search stage finished");

        let composed = self
            .driver
            .run(
                &self.compose_task,
                &self.agent_id,
                json!({ "search_results": results, "topic": topic }),
            )
            .await?;

        let content = content(&composed).ok_or(PipelineError::NoContent)?;
        info!(bytes = content.len(), "Compose stage finished");

        Ok(content)
    }
}

/// Outputs sometimes arrive as JSON encoded in a string.
fn document(output: &RunOutput) -> Option<Value> {
    match output.as_value()? {
        Value::String(text) => serde_json::from_str(text).ok(),
        other => Some(other.clone()),
    }
}

/// Non-empty `search_results.results` list of the search output.
fn search_results(output: &RunOutput) -> Option<Vec<Value>> {
    let results = document(output)?
        .get("search_results")?
        .get("results")?
        .as_array()?
        .clone();

    (!results.is_empty()).then_some(results)
}

/// `content` of the compose output, or the output itself if it is plain text.
fn content(output: &RunOutput) -> Option<String> {
    let text = match output.as_value()? {
        Value::Object(fields) => fields.get("content")?.as_str()?.to_string(),
        Value::String(text) => match serde_json::from_str::<Value>(text) {
            Ok(Value::Object(fields)) => fields.get("content")?.as_str()?.to_string(),
            _ => text.clone(),
        },
        _ => return None,
    };

    (!text.trim().is_empty()).then_some(text)
}
