//! HTTP client for the orchestration service REST API.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use execpilot_core::{
    AgentDefinition, AgentId, Execution, ExecutionId, TaskDefinition, TaskId, ToolOutput,
    Transition,
};

use crate::client::{OrchestrationClient, UpsertOutcome};
use crate::error::ClientError;

/// Default per-request timeout.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// HTTP implementation of [`OrchestrationClient`].
///
/// Constructed once at startup and shared; every request carries the bearer
/// credential and its own timeout.
#[derive(Clone)]
pub struct HttpOrchestrationClient {
    inner: reqwest::Client,
    base_url: String,
    api_key: String,
}

#[derive(Deserialize)]
struct TransitionPage {
    items: Vec<Transition>,
}

impl HttpOrchestrationClient {
    /// Create a client with the default request timeout.
    pub fn new(base_url: &str, api_key: impl Into<String>) -> Result<Self, ClientError> {
        Self::with_timeout(base_url, api_key, DEFAULT_REQUEST_TIMEOUT)
    }

    /// Create a client with a custom per-request timeout.
    pub fn with_timeout(
        base_url: &str,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, ClientError> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(ClientError::Configuration("API key is empty".to_string()));
        }

        let inner = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ClientError::Configuration(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            inner,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        })
    }

    /// Base URL requests are made against.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn send(&self, request: RequestBuilder, path: &str) -> Result<Response, ClientError> {
        let response = request.bearer_auth(&self.api_key).send().await?;
        let status = response.status();

        if status == StatusCode::NOT_FOUND {
            return Err(ClientError::NotFound(path.to_string()));
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::Status {
                status: status.as_u16(),
                body,
            });
        }

        Ok(response)
    }

    async fn decode<T: DeserializeOwned>(response: Response, path: &str) -> Result<T, ClientError> {
        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| ClientError::Decode {
            path: path.to_string(),
            message: e.to_string(),
        })
    }

    async fn upsert<B: serde::Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<UpsertOutcome, ClientError> {
        debug!(path = %path, "PUT request");
        let response = self
            .send(self.inner.put(self.url(path)).json(body), path)
            .await?;

        if response.status() == StatusCode::CREATED {
            Ok(UpsertOutcome::Created)
        } else {
            Ok(UpsertOutcome::Updated)
        }
    }
}

impl fmt::Debug for HttpOrchestrationClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpOrchestrationClient")
            .field("base_url", &self.base_url)
            .field("api_key", &"<redacted>")
            .finish()
    }
}

#[async_trait]
impl OrchestrationClient for HttpOrchestrationClient {
    async fn create_or_update_agent(
        &self,
        agent_id: &AgentId,
        definition: &AgentDefinition,
    ) -> Result<UpsertOutcome, ClientError> {
        let path = format!("/agents/{}", agent_id);
        self.upsert(&path, definition).await
    }

    async fn create_or_update_task(
        &self,
        agent_id: &AgentId,
        task_id: &TaskId,
        definition: &TaskDefinition,
    ) -> Result<UpsertOutcome, ClientError> {
        let path = format!("/agents/{}/tasks/{}", agent_id, task_id);
        self.upsert(&path, definition).await
    }

    async fn create_execution(
        &self,
        task_id: &TaskId,
        input: &Value,
    ) -> Result<Execution, ClientError> {
        let path = format!("/tasks/{}/executions", task_id);
        debug!(path = %path, "POST request");

        let request = self
            .inner
            .post(self.url(&path))
            .json(&json!({ "input": input }));
        let response = self.send(request, &path).await?;
        Self::decode(response, &path).await
    }

    async fn get_execution(&self, execution_id: &ExecutionId) -> Result<Execution, ClientError> {
        let path = format!("/executions/{}", execution_id);
        debug!(path = %path, "GET request");

        let response = self.send(self.inner.get(self.url(&path)), &path).await?;
        Self::decode(response, &path).await
    }

    async fn submit_tool_outputs(
        &self,
        execution_id: &ExecutionId,
        outputs: &[ToolOutput],
    ) -> Result<(), ClientError> {
        let path = format!("/executions/{}/tool_outputs", execution_id);
        debug!(path = %path, count = outputs.len(), "POST request");

        let request = self
            .inner
            .post(self.url(&path))
            .json(&json!({ "outputs": outputs }));
        self.send(request, &path).await?;
        Ok(())
    }

    async fn list_transitions(
        &self,
        execution_id: &ExecutionId,
    ) -> Result<Vec<Transition>, ClientError> {
        let path = format!("/executions/{}/transitions", execution_id);
        debug!(path = %path, "GET request");

        let response = self.send(self.inner.get(self.url(&path)), &path).await?;
        let page: TransitionPage = Self::decode(response, &path).await?;
        Ok(page.items)
    }
}
