//! Web reader client and the `fetch_web_content` tool.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::header::ACCEPT;
use schemars::JsonSchema;
use serde::Deserialize;
use tracing::{error, info, warn};

use crate::error::{DriverError, ToolError};
use crate::tools::Tool;

/// Default reader endpoint; the target URL is appended verbatim.
pub const DEFAULT_READER_BASE_URL: &str = "https://r.jina.ai/";

/// Name of the reference fetch tool.
pub const FETCH_WEB_CONTENT: &str = "fetch_web_content";

/// Reader client configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReaderConfig {
    /// Prefix the target URL is appended to.
    pub base_url: String,

    /// Total attempts per fetch, including the first.
    pub max_attempts: u32,

    /// Delay after the first failure; doubles after each further failure.
    pub base_backoff: Duration,

    /// Per-request timeout.
    pub timeout: Duration,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_READER_BASE_URL.to_string(),
            max_attempts: 3,
            base_backoff: Duration::from_secs(1),
            timeout: Duration::from_secs(30),
        }
    }
}

impl ReaderConfig {
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts.max(1);
        self
    }

    pub fn with_base_backoff(mut self, backoff: Duration) -> Self {
        self.base_backoff = backoff;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Fetches page text through a reader API.
#[derive(Clone)]
pub struct WebReader {
    inner: reqwest::Client,
    config: ReaderConfig,
    api_key: String,
}

impl WebReader {
    pub fn new(config: ReaderConfig, api_key: impl Into<String>) -> Result<Self, DriverError> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(DriverError::Setup("reader API key is empty".to_string()));
        }

        let inner = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| DriverError::Setup(format!("failed to build reader client: {e}")))?;

        Ok(Self {
            inner,
            config,
            api_key,
        })
    }

    pub fn config(&self) -> &ReaderConfig {
        &self.config
    }

    /// Fetch the text of `url`, retrying transport errors and non-success
    /// statuses with doubling backoff.
    pub async fn read(&self, url: &str) -> Result<String, ToolError> {
        let target = format!("{}{}", self.config.base_url, url);
        let mut backoff = self.config.base_backoff;
        let mut attempt = 0;

        loop {
            attempt += 1;
            let started = Instant::now();

            let failure = match self
                .inner
                .get(&target)
                .bearer_auth(&self.api_key)
                .header(ACCEPT, "text/plain")
                .send()
                .await
            {
                Ok(response) if response.status().is_success() => match response.text().await {
                    Ok(text) => {
                        info!(
                            url = %url,
                            attempt,
                            bytes = text.len(),
                            elapsed_ms = started.elapsed().as_millis() as u64,
                            "Fetched web content"
                        );
                        return Ok(text);
                    }
                    Err(e) => format!("failed to read body: {e}"),
                },
                Ok(response) => format!("reader returned {}", response.status()),
                Err(e) => e.to_string(),
            };

            if attempt >= self.config.max_attempts {
                error!(url = %url, attempts = attempt, error = %failure, "Giving up on web fetch");
                return Err(ToolError::Fetch {
                    attempts: attempt,
                    message: failure,
                });
            }

            warn!(
                url = %url,
                attempt,
                max_attempts = self.config.max_attempts,
                retry_in_ms = backoff.as_millis() as u64,
                error = %failure,
                "Web fetch failed, retrying"
            );
            tokio::time::sleep(backoff).await;
            backoff *= 2;
        }
    }
}

impl std::fmt::Debug for WebReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebReader")
            .field("config", &self.config)
            .field("api_key", &"<redacted>")
            .finish()
    }
}

/// Arguments of `fetch_web_content`.
#[derive(Debug, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct FetchWebContentArgs {
    /// Absolute http(s) URL of the page to fetch.
    pub url: String,
}

/// Reference tool: fetch a page as plain text.
#[derive(Debug, Clone)]
pub struct FetchWebContent {
    reader: WebReader,
}

impl FetchWebContent {
    pub fn new(reader: WebReader) -> Self {
        Self { reader }
    }
}

#[async_trait]
impl Tool for FetchWebContent {
    const NAME: &'static str = FETCH_WEB_CONTENT;
    type Args = FetchWebContentArgs;
    type Output = String;

    fn description(&self) -> String {
        "Fetch the text content of a web page".to_string()
    }

    async fn call(&self, args: Self::Args) -> Result<Self::Output, ToolError> {
        let url = args.url.trim();
        let parsed = reqwest::Url::parse(url)
            .map_err(|e| ToolError::InvalidArguments(format!("invalid url '{url}': {e}")))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ToolError::InvalidArguments(format!(
                "unsupported url scheme '{}'",
                parsed.scheme()
            )));
        }

        let text = self.reader.read(url).await?;
        if text.trim().is_empty() {
            warn!(url = %url, "Reader returned empty content");
            return Err(ToolError::EmptyContent);
        }

        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::ToolInvoker;
    use axum::extract::State;
    use axum::http::{HeaderMap, StatusCode, Uri};
    use axum::Router;
    use serde_json::{json, Map, Value};
    use std::sync::{Arc, Mutex};

    /// Reader stub replying from a script; the last entry repeats.
    #[derive(Clone)]
    struct Script {
        replies: Arc<Mutex<Vec<(StatusCode, &'static str)>>>,
        requests: Arc<Mutex<Vec<(String, Option<String>)>>>,
    }

    impl Script {
        fn new(replies: Vec<(StatusCode, &'static str)>) -> Self {
            Self {
                replies: Arc::new(Mutex::new(replies)),
                requests: Arc::new(Mutex::new(Vec::new())),
            }
        }

        fn request_count(&self) -> usize {
            self.requests.lock().unwrap().len()
        }
    }

    async fn reply(
        State(script): State<Script>,
        uri: Uri,
        headers: HeaderMap,
    ) -> (StatusCode, &'static str) {
        let auth = headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        script.requests.lock().unwrap().push((uri.path().to_string(), auth));

        let mut replies = script.replies.lock().unwrap();
        if replies.len() > 1 {
            replies.remove(0)
        } else {
            replies[0]
        }
    }

    async fn serve(script: Script) -> String {
        let app = Router::new().fallback(reply).with_state(script);
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}/read/")
    }

    fn reader(base_url: String) -> WebReader {
        let config = ReaderConfig::default()
            .with_base_url(base_url)
            .with_base_backoff(Duration::from_millis(10))
            .with_timeout(Duration::from_secs(5));
        WebReader::new(config, "reader-key").unwrap()
    }

    fn args(url: &str) -> Map<String, Value> {
        json!({ "url": url }).as_object().unwrap().clone()
    }

    #[test]
    fn test_blank_key_rejected() {
        assert!(WebReader::new(ReaderConfig::default(), "").is_err());
    }

    #[test]
    fn test_spec_declares_url_parameter() {
        let tool = FetchWebContent::new(reader("http://127.0.0.1:9/".into()));
        let spec = tool.spec();
        assert_eq!(spec.name, "fetch_web_content");
        assert_eq!(spec.parameters["properties"]["url"]["type"], "string");
        assert_eq!(spec.parameters["required"], json!(["url"]));
    }

    #[tokio::test]
    async fn test_retries_then_succeeds() {
        let script = Script::new(vec![
            (StatusCode::SERVICE_UNAVAILABLE, "busy"),
            (StatusCode::BAD_GATEWAY, "busy"),
            (StatusCode::OK, "Example Domain\nThis domain is for examples."),
        ]);
        let base = serve(script.clone()).await;

        let tool = FetchWebContent::new(reader(base));
        let result = tool.invoke(args("https://example.com")).await.unwrap();

        assert_eq!(result, json!("Example Domain\nThis domain is for examples."));
        assert_eq!(script.request_count(), 3);

        let requests = script.requests.lock().unwrap();
        assert!(requests[0].0.starts_with("/read/"));
        assert_eq!(requests[0].1.as_deref(), Some("Bearer reader-key"));
    }

    #[tokio::test]
    async fn test_gives_up_after_three_attempts() {
        let script = Script::new(vec![(StatusCode::INTERNAL_SERVER_ERROR, "down")]);
        let base = serve(script.clone()).await;

        let started = Instant::now();
        let err = reader(base).read("https://example.com").await.unwrap_err();

        match err {
            ToolError::Fetch { attempts, message } => {
                assert_eq!(attempts, 3);
                assert!(message.contains("500"));
            }
            other => panic!("expected Fetch, got {other:?}"),
        }
        assert_eq!(script.request_count(), 3);
        // 10ms then 20ms of backoff
        assert!(started.elapsed() >= Duration::from_millis(30));
    }

    #[tokio::test]
    async fn test_connection_errors_are_retried() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let started = Instant::now();
        let err = reader(format!("http://{addr}/"))
            .read("https://example.com")
            .await
            .unwrap_err();

        match err {
            ToolError::Fetch { attempts, message } => {
                assert_eq!(attempts, 3);
                assert!(message.contains("error sending request"), "{message}");
            }
            other => panic!("expected Fetch, got {other:?}"),
        }
        assert!(started.elapsed() >= Duration::from_millis(30));
    }

    #[tokio::test]
    async fn test_whitespace_body_is_empty_content() {
        let script = Script::new(vec![(StatusCode::OK, "  \n\t ")]);
        let base = serve(script.clone()).await;

        let tool = FetchWebContent::new(reader(base));
        let err = tool.invoke(args("https://example.com")).await.unwrap_err();

        assert!(matches!(err, ToolError::EmptyContent));
        assert_eq!(script.request_count(), 1);
    }

    #[tokio::test]
    async fn test_bad_arguments_never_fetch() {
        let script = Script::new(vec![(StatusCode::OK, "content")]);
        let base = serve(script.clone()).await;
        let tool = FetchWebContent::new(reader(base));

        for bad in [
            json!({}),
            json!({"url": "not a url"}),
            json!({"url": "ftp://example.com/file"}),
            json!({"url": "https://example.com", "depth": 2}),
        ] {
            let err = tool.invoke(bad.as_object().unwrap().clone()).await.unwrap_err();
            assert!(matches!(err, ToolError::InvalidArguments(_)), "{bad}");
        }
        assert_eq!(script.request_count(), 0);
    }
}
