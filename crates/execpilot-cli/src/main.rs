//! execpilot CLI - run orchestrated tasks that call back to local tools.

mod config;
mod workflows;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use futures_util::{stream, StreamExt};
use serde_json::{Map, Value};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use execpilot_client::{HttpOrchestrationClient, OrchestrationClient};
use execpilot_core::{AgentId, RunOutput, TaskDefinition, TaskId};
use execpilot_driver::{
    DefinitionLoader, DriverConfig, DriverError, ExecutionDriver, FetchWebContent, Pipeline,
    ReaderConfig, Registrar, ToolRegistry, WebReader, DEFAULT_READER_BASE_URL,
};

use config::{
    Credentials, DEFAULT_AGENT_ID, DEFAULT_BASE_URL, DEFAULT_COMPOSE_TASK_ID,
    DEFAULT_SEARCH_TASK_ID, DEFAULT_TASK_ID,
};
use workflows::Workflow;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// execpilot - run remote agent tasks with local tool callbacks
#[derive(Parser)]
#[command(name = "execpilot")]
#[command(about = "Run orchestrated agent tasks with local tool callbacks", long_about = None)]
struct Cli {
    /// Orchestration service base URL
    #[arg(long, env = "ORCHESTRATOR_BASE_URL", default_value = DEFAULT_BASE_URL, global = true)]
    base_url: String,

    /// Reader API base URL
    #[arg(long, env = "READER_BASE_URL", default_value = DEFAULT_READER_BASE_URL, global = true)]
    reader_base_url: String,

    /// Agent identifier
    #[arg(long, env = "AGENT_UUID", default_value = DEFAULT_AGENT_ID, global = true)]
    agent_id: String,

    /// Task identifier
    #[arg(long, env = "TASK_UUID", default_value = DEFAULT_TASK_ID, global = true)]
    task_id: String,

    /// Seconds between execution polls
    #[arg(long, env = "EXECPILOT_POLL_INTERVAL", default_value_t = 3, global = true)]
    poll_interval: u64,

    /// Non-terminal polls tolerated since creation or the last tool submission
    #[arg(long, env = "EXECPILOT_MAX_POLL_ATTEMPTS", default_value_t = 15, global = true)]
    max_poll_attempts: u32,

    /// Per-request timeout in seconds
    #[arg(long, env = "EXECPILOT_REQUEST_TIMEOUT", default_value_t = 30, global = true)]
    request_timeout: u64,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a task once per item and print each result
    Run {
        /// Built-in workflow to run
        #[arg(long, value_enum, default_value_t = Workflow::Summarize)]
        workflow: Workflow,

        /// Task definition file replacing the workflow's task
        #[arg(long)]
        task_file: Option<PathBuf>,

        /// Input key each item is bound to (defaults to the workflow's)
        #[arg(long)]
        input_key: Option<String>,

        /// Items processed at once; results print in input order
        #[arg(long, default_value_t = 1)]
        concurrency: usize,

        /// URLs or topics to process
        #[arg(required = true)]
        items: Vec<String>,
    },

    /// Research a topic, then compose a blog post from the results
    Pipeline {
        /// Directory of task definition YAML files
        #[arg(long)]
        tasks_dir: PathBuf,

        /// Topic to research
        #[arg(long)]
        topic: String,

        /// File the composed post is written to
        #[arg(long, default_value = "generated_blog.md")]
        output: PathBuf,

        /// File stem of the search task
        #[arg(long, default_value = "search")]
        search_task: String,

        /// File stem of the compose task
        #[arg(long, default_value = "compose")]
        compose_task: String,

        /// Identifier of the search task
        #[arg(long, default_value = DEFAULT_SEARCH_TASK_ID)]
        search_task_id: String,

        /// Identifier of the compose task
        #[arg(long, default_value = DEFAULT_COMPOSE_TASK_ID)]
        compose_task_id: String,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let level = if cli.verbose { "execpilot=debug" } else { "execpilot=info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(level.parse()?))
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let credentials = Credentials::from_env();
    let client: Arc<dyn OrchestrationClient> = Arc::new(HttpOrchestrationClient::with_timeout(
        &cli.base_url,
        credentials.orchestrator()?,
        Duration::from_secs(cli.request_timeout),
    )?);

    let driver_config = DriverConfig::default()
        .with_poll_interval(Duration::from_secs(cli.poll_interval))
        .with_max_poll_attempts(cli.max_poll_attempts);

    info!(
        base_url = %cli.base_url,
        agent_id = %cli.agent_id,
        poll_interval_secs = cli.poll_interval,
        max_poll_attempts = driver_config.max_poll_attempts,
        "Starting execpilot"
    );

    match &cli.command {
        Commands::Run {
            workflow,
            task_file,
            input_key,
            concurrency,
            items,
        } => {
            let tools = build_tools(&cli, &credentials, workflow.uses_reader())?;
            let loader = DefinitionLoader::new()
                .with_substitution("SEARCH_API_KEY", credentials.search_or_blank());
            let task = match task_file {
                Some(path) => loader.load_file(path)?,
                None => loader.parse(workflow.template())?,
            };
            let agent_id = AgentId::new(cli.agent_id.as_str());
            let task_id = TaskId::new(cli.task_id.as_str());

            Registrar::new(client.clone())
                .ensure_ready(&agent_id, &workflow.agent(&tools), &task_id, &task)
                .await?;

            let driver = ExecutionDriver::new(client, tools).with_config(driver_config);
            let input_key = input_key.as_deref().unwrap_or(workflow.input_key());

            run_batch(
                &driver,
                &task,
                &task_id,
                &agent_id,
                *workflow,
                input_key,
                items,
                *concurrency,
            )
            .await;
        }
        Commands::Pipeline {
            tasks_dir,
            topic,
            output,
            search_task,
            compose_task,
            search_task_id,
            compose_task_id,
        } => {
            let tools = build_tools(&cli, &credentials, false)?;
            let definitions = DefinitionLoader::new()
                .with_substitution("SEARCH_API_KEY", credentials.search_or_blank())
                .load_dir(tasks_dir)?;

            let lookup = |stem: &str| {
                definitions.get(stem).ok_or_else(|| {
                    DriverError::Setup(format!(
                        "no task definition '{stem}' in {}",
                        tasks_dir.display()
                    ))
                })
            };
            let search = lookup(search_task.as_str())?;
            let compose = lookup(compose_task.as_str())?;

            let agent_id = AgentId::new(cli.agent_id.as_str());
            let search_id = TaskId::new(search_task_id.as_str());
            let compose_id = TaskId::new(compose_task_id.as_str());

            let registrar = Registrar::new(client.clone());
            registrar
                .ensure_agent(&agent_id, &workflows::pipeline_agent(&tools))
                .await?;
            registrar.ensure_task(&agent_id, &search_id, search).await?;
            registrar.ensure_task(&agent_id, &compose_id, compose).await?;

            let driver = ExecutionDriver::new(client, tools).with_config(driver_config);
            let content = Pipeline::new(driver, agent_id, search_id, compose_id)
                .run(topic)
                .await?;

            std::fs::write(output, &content)?;
            println!("Blog generated successfully at {}", output.display());
        }
    }

    Ok(())
}

/// Local tools for a command. The fetch tool is registered when the command
/// needs it, or when a reader key happens to be configured.
fn build_tools(
    cli: &Cli,
    credentials: &Credentials,
    reader_required: bool,
) -> Result<ToolRegistry, DriverError> {
    let mut tools = ToolRegistry::new();

    let key = match credentials.reader() {
        Ok(key) => key,
        Err(e) if reader_required => return Err(e),
        Err(_) => return Ok(tools),
    };

    let config = ReaderConfig::default()
        .with_base_url(cli.reader_base_url.as_str())
        .with_timeout(Duration::from_secs(cli.request_timeout));
    tools.register(FetchWebContent::new(WebReader::new(config, key)?));

    Ok(tools)
}

/// Run every item, printing each result next to its item. Failures are
/// reported per item and never stop the batch; every item's outcome is
/// returned in input order.
#[allow(clippy::too_many_arguments)]
async fn run_batch<'a>(
    driver: &ExecutionDriver,
    task: &TaskDefinition,
    task_id: &TaskId,
    agent_id: &AgentId,
    workflow: Workflow,
    input_key: &str,
    items: &'a [String],
    concurrency: usize,
) -> Vec<(&'a str, Result<RunOutput, BoxError>)> {
    let (item_label, result_label) = workflow.labels();

    let mut results = std::pin::pin!(stream::iter(items)
        .map(|item| async move {
            let result = run_item(driver, task, task_id, agent_id, input_key, item).await;
            (item.as_str(), result)
        })
        .buffered(concurrency.max(1)));

    let mut outcomes = Vec::with_capacity(items.len());
    let mut failures = 0usize;
    while let Some((item, result)) = results.next().await {
        match &result {
            Ok(output) => println!("\n{item_label}: {item}\n{result_label}: {output}"),
            Err(e) => {
                failures += 1;
                error!(item = %item, error = %e, "Run failed");
                println!("\n{item_label}: {item}\nError: {e}");
            }
        }
        outcomes.push((item, result));
    }

    info!(items = items.len(), failures, "Batch finished");
    outcomes
}

async fn run_item(
    driver: &ExecutionDriver,
    task: &TaskDefinition,
    task_id: &TaskId,
    agent_id: &AgentId,
    input_key: &str,
    item: &str,
) -> Result<RunOutput, BoxError> {
    let mut input = Map::new();
    input.insert(input_key.to_string(), Value::String(item.to_string()));
    let input = Value::Object(input);

    task.check_input(&input)?;

    Ok(driver.run(task_id, agent_id, input).await?)
}
