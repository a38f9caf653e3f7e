//! Idempotent registration of agents and tasks.

use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use execpilot_client::{OrchestrationClient, UpsertOutcome};
use execpilot_core::{AgentDefinition, AgentId, TaskDefinition, TaskId};

use crate::error::DriverError;

/// Pause after creating a new entity, giving the service time to make it
/// usable.
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_secs(5);

/// What [`Registrar::ensure_ready`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Readiness {
    pub agent: UpsertOutcome,
    pub task: UpsertOutcome,
}

impl Readiness {
    /// Returns true if anything had to be created.
    pub fn created_any(&self) -> bool {
        self.agent.was_created() || self.task.was_created()
    }
}

/// Makes sure agents and tasks exist under fixed identifiers.
///
/// Every call replaces the stored definition, so running against an already
/// configured service changes nothing but the definitions' content.
pub struct Registrar {
    client: Arc<dyn OrchestrationClient>,
    settle_delay: Duration,
}

impl Registrar {
    pub fn new(client: Arc<dyn OrchestrationClient>) -> Self {
        Self {
            client,
            settle_delay: DEFAULT_SETTLE_DELAY,
        }
    }

    /// Builder method to set the pause after creations.
    pub fn with_settle_delay(mut self, delay: Duration) -> Self {
        self.settle_delay = delay;
        self
    }

    /// Create or update the agent, then the task it owns.
    pub async fn ensure_ready(
        &self,
        agent_id: &AgentId,
        agent: &AgentDefinition,
        task_id: &TaskId,
        task: &TaskDefinition,
    ) -> Result<Readiness, DriverError> {
        let agent_outcome = self.ensure_agent(agent_id, agent).await?;
        let task_outcome = self.ensure_task(agent_id, task_id, task).await?;

        Ok(Readiness {
            agent: agent_outcome,
            task: task_outcome,
        })
    }

    /// Create or update an agent.
    pub async fn ensure_agent(
        &self,
        agent_id: &AgentId,
        agent: &AgentDefinition,
    ) -> Result<UpsertOutcome, DriverError> {
        let outcome = self
            .client
            .create_or_update_agent(agent_id, agent)
            .await
            .map_err(|source| DriverError::Registration {
                entity: "agent",
                id: agent_id.to_string(),
                source,
            })?;

        info!(
            agent_id = %agent_id,
            name = %agent.name,
            tools = agent.tools.len(),
            outcome = ?outcome,
            "Agent ready"
        );
        self.settle(outcome).await;

        Ok(outcome)
    }

    /// Create or update a task owned by `agent_id`.
    pub async fn ensure_task(
        &self,
        agent_id: &AgentId,
        task_id: &TaskId,
        task: &TaskDefinition,
    ) -> Result<UpsertOutcome, DriverError> {
        let outcome = self
            .client
            .create_or_update_task(agent_id, task_id, task)
            .await
            .map_err(|source| DriverError::Registration {
                entity: "task",
                id: task_id.to_string(),
                source,
            })?;

        info!(
            agent_id = %agent_id,
            task_id = %task_id,
            name = %task.name,
            outcome = ?outcome,
            "Task ready"
        );
        self.settle(outcome).await;

        Ok(outcome)
    }

    async fn settle(&self, outcome: UpsertOutcome) {
        if outcome.was_created() && !self.settle_delay.is_zero() {
            tokio::time::sleep(self.settle_delay).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedService;
    use execpilot_client::ClientError;
    use serde_json::json;

    fn agent() -> AgentDefinition {
        AgentDefinition::new("Web Content Processor", "claude-3.5-sonnet")
            .with_about("Reads and summarizes web pages")
    }

    fn task(name: &str) -> TaskDefinition {
        TaskDefinition::from_value(json!({"name": name, "main": [{"prompt": "hi"}]})).unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn test_ensure_ready_is_idempotent() {
        let service = Arc::new(ScriptedService::new());
        let registrar = Registrar::new(service.clone());
        let agent_id = AgentId::new("agent-1");
        let task_id = TaskId::new("task-1");

        let first = registrar
            .ensure_ready(&agent_id, &agent(), &task_id, &task("v1"))
            .await
            .unwrap();
        assert_eq!(first.agent, UpsertOutcome::Created);
        assert_eq!(first.task, UpsertOutcome::Created);
        assert!(first.created_any());

        let second = registrar
            .ensure_ready(&agent_id, &agent(), &task_id, &task("v2"))
            .await
            .unwrap();
        assert_eq!(second.agent, UpsertOutcome::Updated);
        assert_eq!(second.task, UpsertOutcome::Updated);
        assert!(!second.created_any());

        assert_eq!(service.agents.lock().unwrap().len(), 1);
        let tasks = service.tasks.lock().unwrap();
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[&task_id].1.name, "v2");
        assert_eq!(tasks[&task_id].0, agent_id);
    }

    #[tokio::test(start_paused = true)]
    async fn test_agent_registered_before_task() {
        let service = Arc::new(ScriptedService::new());
        let registrar = Registrar::new(service.clone());

        registrar
            .ensure_ready(
                &AgentId::new("agent-1"),
                &agent(),
                &TaskId::new("task-1"),
                &task("v1"),
            )
            .await
            .unwrap();

        assert_eq!(
            *service.upserts.lock().unwrap(),
            vec!["agent:agent-1", "task:task-1"]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_settle_delay_only_after_creation() {
        let service = Arc::new(ScriptedService::new());
        let registrar = Registrar::new(service.clone());
        let agent_id = AgentId::new("agent-1");
        let task_id = TaskId::new("task-1");

        let started = tokio::time::Instant::now();
        registrar
            .ensure_ready(&agent_id, &agent(), &task_id, &task("v1"))
            .await
            .unwrap();
        assert!(started.elapsed() >= DEFAULT_SETTLE_DELAY * 2);

        let started = tokio::time::Instant::now();
        registrar
            .ensure_ready(&agent_id, &agent(), &task_id, &task("v1"))
            .await
            .unwrap();
        assert!(started.elapsed() < Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_task_failure_is_registration_error() {
        let service = Arc::new(ScriptedService::new());
        let registrar = Registrar::new(service.clone());

        // Task upsert fails because the agent does not exist.
        let err = registrar
            .ensure_task(&AgentId::new("ghost"), &TaskId::new("task-1"), &task("v1"))
            .await
            .unwrap_err();

        assert!(err.is_setup());
        match err {
            DriverError::Registration { entity, id, source } => {
                assert_eq!(entity, "task");
                assert_eq!(id, "task-1");
                assert!(matches!(source, ClientError::NotFound(_)));
            }
            other => panic!("expected Registration, got {other:?}"),
        }
    }
}
