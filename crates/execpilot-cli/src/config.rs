//! Credentials and fixed identifiers from the environment.

use execpilot_driver::DriverError;

/// Service API key; always required.
pub const ORCHESTRATOR_API_KEY: &str = "ORCHESTRATOR_API_KEY";

/// Reader API key; required when the fetch tool is registered.
pub const READER_API_KEY: &str = "READER_API_KEY";

/// Search provider key; substituted into `<SEARCH_API_KEY>` placeholders.
pub const SEARCH_API_KEY: &str = "SEARCH_API_KEY";

pub const DEFAULT_BASE_URL: &str = "https://dev.julep.ai/api";
pub const DEFAULT_AGENT_ID: &str = "a1b2c3d4-1234-5678-9101-abcdef123456";
pub const DEFAULT_TASK_ID: &str = "d4c3b2a1-4321-8765-1098-fedcba654321";
pub const DEFAULT_SEARCH_TASK_ID: &str = "5e4a1c2b-0d3f-4e6a-9b8c-7f1e2d3c4b5a";
pub const DEFAULT_COMPOSE_TASK_ID: &str = "6f5b2d3c-1e4a-4f7b-8c9d-0a2b3c4d5e6f";

/// API keys read from the environment.
///
/// Keys are only validated when the command that needs them asks for them.
pub struct Credentials {
    orchestrator: Option<String>,
    reader: Option<String>,
    search: Option<String>,
}

impl Credentials {
    /// Read credentials from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            orchestrator: lookup(ORCHESTRATOR_API_KEY),
            reader: lookup(READER_API_KEY),
            search: lookup(SEARCH_API_KEY),
        }
    }

    pub fn orchestrator(&self) -> Result<&str, DriverError> {
        required(ORCHESTRATOR_API_KEY, self.orchestrator.as_deref())
    }

    pub fn reader(&self) -> Result<&str, DriverError> {
        required(READER_API_KEY, self.reader.as_deref())
    }

    /// Search key, or "" when unset. A template that uses the placeholder
    /// then fails to render.
    pub fn search_or_blank(&self) -> &str {
        self.search.as_deref().unwrap_or("")
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mask = |value: &Option<String>| if value.is_some() { "<set>" } else { "<unset>" };
        f.debug_struct("Credentials")
            .field("orchestrator", &mask(&self.orchestrator))
            .field("reader", &mask(&self.reader))
            .field("search", &mask(&self.search))
            .finish()
    }
}

fn required<'a>(name: &str, value: Option<&'a str>) -> Result<&'a str, DriverError> {
    match value {
        Some(value) if !value.trim().is_empty() => Ok(value),
        Some(_) => Err(DriverError::Setup(format!(
            "the {name} environment variable is set but empty"
        ))),
        None => Err(DriverError::Setup(format!(
            "the {name} environment variable must be set"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn credentials(vars: &[(&str, &str)]) -> Credentials {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Credentials::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn test_present_keys() {
        let creds = credentials(&[(ORCHESTRATOR_API_KEY, "orch"), (READER_API_KEY, "reader")]);
        assert_eq!(creds.orchestrator().unwrap(), "orch");
        assert_eq!(creds.reader().unwrap(), "reader");
        assert_eq!(creds.search_or_blank(), "");
    }

    #[test]
    fn test_missing_and_blank_keys_are_setup_errors() {
        let creds = credentials(&[(READER_API_KEY, "   ")]);

        let missing = creds.orchestrator().unwrap_err();
        assert!(missing.is_setup());
        assert!(missing.to_string().contains("must be set"));

        let blank = creds.reader().unwrap_err();
        assert!(blank.to_string().contains("set but empty"));
    }

    #[test]
    fn test_debug_hides_values() {
        let creds = credentials(&[(ORCHESTRATOR_API_KEY, "super-secret")]);
        let debug = format!("{creds:?}");
        assert!(!debug.contains("super-secret"));
        assert!(debug.contains("<set>"));
    }
}
