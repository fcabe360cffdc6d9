//! Optional AI polish of the cleaned fragment.
//!
//! The fragment is sent once to an injected [`TextCompletion`] provider with a
//! fixed system instruction. Failures and timeouts are logged and swallowed:
//! the caller always gets a fragment back.

use std::sync::{Arc, LazyLock};
use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use distill_shared::{DistillError, PolishConfig, Result};

/// Instruction sent with every polish request.
pub const SYSTEM_INSTRUCTION: &str = "You are an expert content extractor. Extract the main article content from the provided HTML. Remove any navigation, ads, footers, sidebars, and other non-content elements. Return ONLY the clean HTML of the main article content. Do not include markdown formatting or code blocks, just the raw HTML string.";

// ---------------------------------------------------------------------------
// Capability
// ---------------------------------------------------------------------------

/// A single polish request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionRequest {
    pub system_instruction: String,
    pub html_fragment: String,
}

/// The provider's reply.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionResponse {
    pub text: String,
}

/// A text-completion service used to polish cleaned HTML.
#[async_trait]
pub trait TextCompletion: Send + Sync {
    /// Run one completion. Implementations should not retry.
    async fn complete(&self, request: &CompletionRequest) -> Result<CompletionResponse>;

    /// Human-readable provider name for tracing.
    fn name(&self) -> &str;
}

/// Polish settings for one cleaning call.
#[derive(Clone)]
pub struct PolishOptions {
    pub provider: Arc<dyn TextCompletion>,
    /// Deadline for the single completion call.
    pub timeout: Option<Duration>,
}

impl PolishOptions {
    pub fn new(provider: Arc<dyn TextCompletion>) -> Self {
        Self {
            provider,
            timeout: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

impl std::fmt::Debug for PolishOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PolishOptions")
            .field("provider", &self.provider.name())
            .field("timeout", &self.timeout)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Polish call
// ---------------------------------------------------------------------------

/// Send `fragment` to the provider and return the polished HTML, or the
/// original fragment if the call fails, times out, or returns nothing.
#[instrument(skip_all, fields(provider = options.provider.name(), len = fragment.len()))]
pub async fn polish_fragment(fragment: String, options: &PolishOptions) -> String {
    if fragment.trim().is_empty() {
        return fragment;
    }

    let request = CompletionRequest {
        system_instruction: SYSTEM_INSTRUCTION.to_string(),
        html_fragment: fragment.clone(),
    };

    let call = options.provider.complete(&request);
    let outcome = match options.timeout {
        Some(deadline) => match tokio::time::timeout(deadline, call).await {
            Ok(result) => result,
            Err(_) => Err(DistillError::Polish(format!(
                "timed out after {}ms",
                deadline.as_millis()
            ))),
        },
        None => call.await,
    };

    match outcome {
        Ok(response) => {
            let polished = strip_html_fence(&response.text);
            if polished.trim().is_empty() {
                debug!("provider returned empty text, keeping heuristic result");
                fragment
            } else {
                debug!(polished_len = polished.len(), "polish applied");
                polished
            }
        }
        Err(e) => {
            warn!(error = %e, "AI polish failed, keeping heuristic result");
            fragment
        }
    }
}

/// Remove a Markdown ```` ```html ```` fence the model may wrap its answer in.
pub fn strip_html_fence(text: &str) -> String {
    static OPEN_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"^```html\s*").expect("valid regex"));
    static CLOSE_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"\s*```$").expect("valid regex"));

    let opened = OPEN_RE.replace(text, "");
    CLOSE_RE.replace(&opened, "").into_owned()
}

// ---------------------------------------------------------------------------
// OpenAI-compatible provider
// ---------------------------------------------------------------------------

/// Chat-completions provider for any OpenAI-compatible endpoint.
#[derive(Debug, Clone)]
pub struct OpenAiCompatProvider {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    model: String,
}

impl OpenAiCompatProvider {
    /// Create a provider with its own HTTP client and request timeout.
    pub fn new(
        base_url: impl Into<String>,
        api_key: Option<String>,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| DistillError::Polish(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.into(),
            api_key,
            model: model.into(),
        })
    }

    /// Build from the `[polish]` config section and a resolved API key.
    pub fn from_config(config: &PolishConfig, api_key: Option<String>) -> Result<Self> {
        Self::new(
            config.base_url.clone(),
            api_key,
            config.model.clone(),
            Duration::from_millis(config.timeout_ms),
        )
    }

    fn endpoint(&self) -> String {
        format!("{}/v1/chat/completions", self.base_url.trim_end_matches('/'))
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f64,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    #[serde(default)]
    content: Option<String>,
}

#[async_trait]
impl TextCompletion for OpenAiCompatProvider {
    async fn complete(&self, request: &CompletionRequest) -> Result<CompletionResponse> {
        let body = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: &request.system_instruction,
                },
                ChatMessage {
                    role: "user",
                    content: &request.html_fragment,
                },
            ],
            temperature: 0.3,
        };

        let mut builder = self.client.post(self.endpoint()).json(&body);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }

        let resp = builder
            .send()
            .await
            .map_err(|e| DistillError::Polish(format!("request failed: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(DistillError::Polish(format!(
                "chat completions returned HTTP {status}"
            )));
        }

        let parsed: ChatResponse = resp
            .json()
            .await
            .map_err(|e| DistillError::Polish(format!("invalid response body: {e}")))?;

        let text = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default();

        Ok(CompletionResponse { text })
    }

    fn name(&self) -> &str {
        "openai-compat"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedReply(&'static str);

    #[async_trait]
    impl TextCompletion for FixedReply {
        async fn complete(&self, _request: &CompletionRequest) -> Result<CompletionResponse> {
            Ok(CompletionResponse {
                text: self.0.to_string(),
            })
        }

        fn name(&self) -> &str {
            "fixed"
        }
    }

    struct Failing;

    #[async_trait]
    impl TextCompletion for Failing {
        async fn complete(&self, _request: &CompletionRequest) -> Result<CompletionResponse> {
            Err(DistillError::Polish("boom".into()))
        }

        fn name(&self) -> &str {
            "failing"
        }
    }

    struct Slow;

    #[async_trait]
    impl TextCompletion for Slow {
        async fn complete(&self, _request: &CompletionRequest) -> Result<CompletionResponse> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(CompletionResponse {
                text: "<p>too late</p>".into(),
            })
        }

        fn name(&self) -> &str {
            "slow"
        }
    }

    #[test]
    fn strip_html_fence_removes_wrapping() {
        assert_eq!(strip_html_fence("```html\n<p>x</p>\n```"), "<p>x</p>");
        assert_eq!(strip_html_fence("<p>x</p>"), "<p>x</p>");
    }

    #[tokio::test]
    async fn success_replaces_fragment() {
        let opts = PolishOptions::new(Arc::new(FixedReply("```html\n<p>clean</p>\n```")));
        let out = polish_fragment("<div><p>clean</p><nav>x</nav></div>".into(), &opts).await;
        assert_eq!(out, "<p>clean</p>");
    }

    #[tokio::test]
    async fn failure_keeps_fragment() {
        let opts = PolishOptions::new(Arc::new(Failing));
        let out = polish_fragment("<p>original</p>".into(), &opts).await;
        assert_eq!(out, "<p>original</p>");
    }

    #[tokio::test]
    async fn empty_reply_keeps_fragment() {
        let opts = PolishOptions::new(Arc::new(FixedReply("   ")));
        let out = polish_fragment("<p>original</p>".into(), &opts).await;
        assert_eq!(out, "<p>original</p>");
    }

    #[tokio::test]
    async fn timeout_keeps_fragment() {
        let opts = PolishOptions::new(Arc::new(Slow)).with_timeout(Duration::from_millis(20));
        let out = polish_fragment("<p>original</p>".into(), &opts).await;
        assert_eq!(out, "<p>original</p>");
    }

    #[tokio::test]
    async fn openai_provider_parses_reply() {
        let server = wiremock::MockServer::start().await;

        wiremock::Mock::given(wiremock::matchers::method("POST"))
            .and(wiremock::matchers::path("/v1/chat/completions"))
            .and(wiremock::matchers::header("authorization", "Bearer test-key"))
            .respond_with(wiremock::ResponseTemplate::new(200).set_body_json(
                serde_json::json!({
                    "choices": [{ "message": { "role": "assistant", "content": "<p>polished</p>" } }]
                }),
            ))
            .mount(&server)
            .await;

        let provider = OpenAiCompatProvider::new(
            server.uri(),
            Some("test-key".into()),
            "gpt-4o-mini",
            Duration::from_secs(5),
        )
        .unwrap();

        let opts = PolishOptions::new(Arc::new(provider));
        let out = polish_fragment("<div>noisy</div>".into(), &opts).await;
        assert_eq!(out, "<p>polished</p>");
    }

    #[tokio::test]
    async fn openai_provider_http_error_is_swallowed() {
        let server = wiremock::MockServer::start().await;

        wiremock::Mock::given(wiremock::matchers::method("POST"))
            .respond_with(wiremock::ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let provider =
            OpenAiCompatProvider::new(server.uri(), None, "gpt-4o-mini", Duration::from_secs(5))
                .unwrap();

        let err = provider
            .complete(&CompletionRequest {
                system_instruction: SYSTEM_INSTRUCTION.into(),
                html_fragment: "<p>x</p>".into(),
            })
            .await
            .unwrap_err();
        assert!(err.to_string().contains("HTTP 500"));

        let opts = PolishOptions::new(Arc::new(provider));
        let out = polish_fragment("<p>kept</p>".into(), &opts).await;
        assert_eq!(out, "<p>kept</p>");
    }
}
