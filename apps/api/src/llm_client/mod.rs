/// LLM Client — the single point of entry for all chat-completion calls.
///
/// ARCHITECTURAL RULE: No other module may call the provider API directly.
/// All LLM interactions MUST go through a `CompletionClient`.
///
/// Provider: OpenRouter chat-completions. Each interview session gets its own client,
/// bound to the API key the candidate supplied when the session was started.
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

pub mod prompts;

#[cfg(test)]
pub mod testing;

pub const DEFAULT_API_URL: &str = "https://openrouter.ai/api/v1/chat/completions";
pub const DEFAULT_MODEL: &str = "openai/gpt-3.5-turbo";
/// Fixed per-request timeout. A call that exceeds it surfaces as a transport failure.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Sampling parameters for interview turns: favor variety and natural phrasing.
pub const TURN_RESPONSE_PARAMS: CompletionParams = CompletionParams {
    temperature: 0.7,
    max_tokens: 500,
};

/// Sampling parameters for end-of-session feedback: favor consistency and structure.
pub const FEEDBACK_PARAMS: CompletionParams = CompletionParams {
    temperature: 0.5,
    max_tokens: 1000,
};

#[derive(Debug, Error)]
pub enum CompletionError {
    #[error("Transport failure: {message}")]
    TransportFailure { message: String, timed_out: bool },

    #[error("Provider error (status {status}): {message}")]
    ProviderError { status: u16, message: String },

    #[error("Malformed response: {0}")]
    MalformedResponse(String),
}

impl CompletionError {
    pub fn timeout() -> Self {
        CompletionError::TransportFailure {
            message: format!(
                "request timed out after {}s",
                REQUEST_TIMEOUT.as_secs()
            ),
            timed_out: true,
        }
    }
}

impl From<reqwest::Error> for CompletionError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            CompletionError::timeout()
        } else {
            CompletionError::TransportFailure {
                message: e.to_string(),
                timed_out: false,
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

/// One `{role, content}` entry of the outbound message list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompletionParams {
    pub temperature: f32,
    pub max_tokens: u32,
}

/// A single request/response exchange with the remote model.
///
/// Implementations MUST NOT retry. Retry policy belongs to the caller.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    async fn complete(
        &self,
        messages: &[ChatMessage],
        params: CompletionParams,
    ) -> Result<String, CompletionError>;
}

/// Builds a completion client bound to a caller-supplied API key.
///
/// Carried in `AppState` as `Arc<dyn CompletionClientFactory>`.
pub trait CompletionClientFactory: Send + Sync {
    fn for_api_key(&self, api_key: &str) -> Arc<dyn CompletionClient>;
}

// ────────────────────────────────────────────────────────────────────────────
// Wire format
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Option<ChoiceMessage>,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

// ────────────────────────────────────────────────────────────────────────────
// OpenRouter client
// ────────────────────────────────────────────────────────────────────────────

/// Provider settings shared by every per-session client.
#[derive(Debug, Clone)]
pub struct ProviderSettings {
    pub api_url: String,
    pub model: String,
    pub referer: String,
    pub title: String,
}

#[derive(Clone)]
pub struct OpenRouterClient {
    client: Client,
    api_key: String,
    settings: Arc<ProviderSettings>,
}

#[async_trait]
impl CompletionClient for OpenRouterClient {
    async fn complete(
        &self,
        messages: &[ChatMessage],
        params: CompletionParams,
    ) -> Result<String, CompletionError> {
        let request_body = ChatCompletionRequest {
            model: &self.settings.model,
            messages,
            temperature: params.temperature,
            max_tokens: params.max_tokens,
        };

        let response = self
            .client
            .post(&self.settings.api_url)
            .bearer_auth(&self.api_key)
            .header("HTTP-Referer", &self.settings.referer)
            .header("X-Title", &self.settings.title)
            .json(&request_body)
            .send()
            .await?;

        let status = response.status().as_u16();
        let body = response.text().await?;

        let text = parse_completion_body(status, &body).map_err(|e| {
            warn!("Completion call failed: {e}");
            e
        })?;

        debug!(
            "Completion call succeeded: messages={}, output_chars={}",
            messages.len(),
            text.chars().count()
        );

        Ok(text)
    }
}

/// Produces `OpenRouterClient`s that share one connection pool.
pub struct OpenRouterClientFactory {
    client: Client,
    settings: Arc<ProviderSettings>,
}

impl OpenRouterClientFactory {
    pub fn new(settings: ProviderSettings) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            client,
            settings: Arc::new(settings),
        })
    }

    pub fn model(&self) -> &str {
        &self.settings.model
    }
}

impl CompletionClientFactory for OpenRouterClientFactory {
    fn for_api_key(&self, api_key: &str) -> Arc<dyn CompletionClient> {
        Arc::new(OpenRouterClient {
            client: self.client.clone(),
            api_key: api_key.to_string(),
            settings: Arc::clone(&self.settings),
        })
    }
}

/// Interprets a provider response body.
///
/// An `error` object wins over the HTTP status, since OpenRouter reports some
/// failures inside a 200 body.
fn parse_completion_body(status: u16, body: &str) -> Result<String, CompletionError> {
    let value: Option<Value> = serde_json::from_str(body).ok();

    if let Some(error) = value.as_ref().and_then(|v| v.get("error")) {
        return Err(CompletionError::ProviderError {
            status,
            message: provider_error_message(error),
        });
    }

    if !(200..300).contains(&status) {
        return Err(CompletionError::TransportFailure {
            message: format!(
                "HTTP {status}: {}",
                body.chars().take(200).collect::<String>()
            ),
            timed_out: false,
        });
    }

    let value = value.ok_or_else(|| {
        CompletionError::MalformedResponse("response body is not valid JSON".to_string())
    })?;

    let parsed: ChatCompletionResponse = serde_json::from_value(value)
        .map_err(|e| CompletionError::MalformedResponse(e.to_string()))?;

    parsed
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message)
        .and_then(|m| m.content)
        .ok_or_else(|| {
            CompletionError::MalformedResponse(
                "missing choices[0].message.content".to_string(),
            )
        })
}

fn provider_error_message(error: &Value) -> String {
    match error {
        Value::String(s) => s.clone(),
        Value::Object(obj) => obj
            .get("message")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| error.to_string()),
        other => other.to_string(),
    }
}

/// Strips ```json ... ``` or ``` ... ``` code fences from LLM output.
pub fn strip_json_fences(text: &str) -> &str {
    let text = text.trim();
    if let Some(stripped) = text.strip_prefix("```json") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else if let Some(stripped) = text.strip_prefix("```") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else {
        text
    }
}
