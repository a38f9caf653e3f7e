//! Loading task definitions from YAML templates.
//!
//! Templates may contain `<NAME>` placeholders (for example
//! `<SEARCH_API_KEY>`) which are replaced before parsing.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::OnceLock;

use regex::Regex;
use serde_json::Value;
use tracing::debug;

use execpilot_core::TaskDefinition;

use crate::error::DriverError;

/// Parses task definition templates.
#[derive(Debug, Clone, Default)]
pub struct DefinitionLoader {
    substitutions: BTreeMap<String, String>,
}

impl DefinitionLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method to replace `<name>` with `value` in every template.
    pub fn with_substitution(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.substitutions.insert(name.into(), value.into());
        self
    }

    /// Apply substitutions to a template.
    ///
    /// A placeholder that appears in the template with a blank value is an
    /// error, so a missing secret never reaches the service as "". So is a
    /// placeholder left over after substitution.
    pub fn render(&self, template: &str) -> Result<String, DriverError> {
        let mut rendered = template.to_string();
        for (name, value) in &self.substitutions {
            let placeholder = format!("<{name}>");
            if !rendered.contains(&placeholder) {
                continue;
            }
            if value.trim().is_empty() {
                return Err(DriverError::Setup(format!(
                    "no value for placeholder {placeholder}"
                )));
            }
            rendered = rendered.replace(&placeholder, value);
        }

        if let Some(leftover) = placeholder_pattern().find(&rendered) {
            return Err(DriverError::Setup(format!(
                "no substitution configured for placeholder {}",
                leftover.as_str()
            )));
        }

        Ok(rendered)
    }

    /// Parse a YAML template into a task definition.
    pub fn parse(&self, template: &str) -> Result<TaskDefinition, DriverError> {
        let rendered = self.render(template)?;
        let document: Value = serde_yaml::from_str(&rendered)
            .map_err(|e| DriverError::Setup(format!("invalid task YAML: {e}")))?;

        TaskDefinition::from_value(document)
            .map_err(|e| DriverError::Setup(format!("invalid task definition: {e}")))
    }

    /// Load one task definition file.
    pub fn load_file(&self, path: &Path) -> Result<TaskDefinition, DriverError> {
        let template = std::fs::read_to_string(path).map_err(|e| {
            DriverError::Setup(format!("failed to read {}: {e}", path.display()))
        })?;

        self.parse(&template).map_err(|e| match e {
            DriverError::Setup(message) => {
                DriverError::Setup(format!("{}: {message}", path.display()))
            }
            other => other,
        })
    }

    /// Load every `*.yaml` / `*.yml` file of a directory, keyed by file stem.
    pub fn load_dir(&self, dir: &Path) -> Result<BTreeMap<String, TaskDefinition>, DriverError> {
        let entries = std::fs::read_dir(dir).map_err(|e| {
            DriverError::Setup(format!("failed to read task directory {}: {e}", dir.display()))
        })?;

        let mut definitions = BTreeMap::new();
        for entry in entries {
            let path = entry
                .map_err(|e| DriverError::Setup(format!("failed to list {}: {e}", dir.display())))?
                .path();

            let is_yaml = matches!(
                path.extension().and_then(|ext| ext.to_str()),
                Some("yaml" | "yml")
            );
            if !path.is_file() || !is_yaml {
                continue;
            }

            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };

            debug!(path = %path.display(), "Loading task definition");
            definitions.insert(stem.to_string(), self.load_file(&path)?);
        }

        Ok(definitions)
    }
}

/// Matches `<NAME>` placeholders: upper-case letters, digits and underscores.
fn placeholder_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"<[A-Z][A-Z0-9_]*>").unwrap())
}
