//! Built-in workflows: an agent plus the task it runs.

use clap::ValueEnum;

use execpilot_core::AgentDefinition;
use execpilot_driver::ToolRegistry;

const SUMMARIZE_TASK: &str = include_str!("../tasks/summarize.yaml");
const HEADLINE_TASK: &str = include_str!("../tasks/headline.yaml");

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Workflow {
    /// Fetch each URL through the reader tool and summarize it
    Summarize,
    /// Search the news for each topic and write a sarcastic headline
    Headline,
}

impl Workflow {
    /// Task template, possibly containing `<SEARCH_API_KEY>`.
    pub fn template(&self) -> &'static str {
        match self {
            Self::Summarize => SUMMARIZE_TASK,
            Self::Headline => HEADLINE_TASK,
        }
    }

    /// Input key each batch item is bound to.
    pub fn input_key(&self) -> &'static str {
        match self {
            Self::Summarize => "url",
            Self::Headline => "topic",
        }
    }

    /// Labels for printing `(item, result)` pairs.
    pub fn labels(&self) -> (&'static str, &'static str) {
        match self {
            Self::Summarize => ("URL", "Summary"),
            Self::Headline => ("Topic", "Headline"),
        }
    }

    /// Whether the workflow calls back to the local fetch tool.
    pub fn uses_reader(&self) -> bool {
        matches!(self, Self::Summarize)
    }

    /// Agent definition declaring the registry's tools.
    pub fn agent(&self, tools: &ToolRegistry) -> AgentDefinition {
        let agent = match self {
            Self::Summarize => AgentDefinition::new("Web Content Processor", "claude-3.5-sonnet")
                .with_about("Processes web content using a reader API and summarizes it."),
            Self::Headline => AgentDefinition::new("Chad", "claude-3.5-sonnet")
                .with_about("Sarcastic news headline reporter."),
        };
        agent.with_tools(tools.specs())
    }
}

/// Agent used by the research-then-compose pipeline.
pub fn pipeline_agent(tools: &ToolRegistry) -> AgentDefinition {
    AgentDefinition::new("Blog Generation Agent", "gpt-4o")
        .with_about("Blog writer that researches a topic before composing a post.")
        .with_tools(tools.specs())
}

#[cfg(test)]
mod tests {
    use super::*;
    use execpilot_driver::DefinitionLoader;

    #[test]
    fn test_summarize_template_parses() {
        let task = DefinitionLoader::new()
            .parse(Workflow::Summarize.template())
            .unwrap();

        assert_eq!(task.required_inputs(), vec![Workflow::Summarize.input_key()]);
        assert_eq!(task.workflow["main"][0]["tool"], "fetch_web_content");
    }

    #[test]
    fn test_headline_template_needs_search_key() {
        let template = Workflow::Headline.template();

        assert!(DefinitionLoader::new()
            .with_substitution("SEARCH_API_KEY", "")
            .parse(template)
            .is_err());

        let task = DefinitionLoader::new()
            .with_substitution("SEARCH_API_KEY", "brave-key")
            .parse(template)
            .unwrap();
        assert_eq!(task.required_inputs(), vec!["topic"]);
        assert_eq!(
            task.workflow["tools"][0]["integration"]["setup"]["api_key"],
            "brave-key"
        );
    }

    #[test]
    fn test_agent_declares_registered_tools() {
        let agent = Workflow::Headline.agent(&ToolRegistry::new());
        assert!(agent.tools.is_empty());
        assert_eq!(agent.about, "Sarcastic news headline reporter.");
    }

    #[test]
    fn test_pipeline_templates_parse() {
        let loader = DefinitionLoader::new().with_substitution("SEARCH_API_KEY", "brave-key");
        let dir = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("tasks/pipeline");
        let definitions = loader.load_dir(&dir).unwrap();

        assert!(definitions.contains_key("search"));
        assert_eq!(definitions["compose"].required_inputs(), vec!["topic", "search_results"]);
    }
}
