/// LLM Client: the single point of entry for all model completion calls.
///
/// ARCHITECTURAL RULE: No other module may call the Anthropic API directly.
/// Generation code depends on the `CompletionModel` trait, never on this transport.
///
/// One `complete()` call is exactly one HTTP request. Retries and deadlines are
/// owned by `generation::invoker::ModelInvoker`.
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

pub mod prompts;

#[cfg(test)]
pub mod testing;

const ANTHROPIC_API_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";
/// The model used for all post generation calls.
/// This is intentionally hardcoded to prevent accidental drift.
pub const MODEL: &str = "claude-sonnet-4-5";

/// Typed failure of a single completion call.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LlmError {
    #[error("model call timed out after {}ms", .0.as_millis())]
    Timeout(Duration),

    #[error("rate limited by upstream: {0}")]
    RateLimited(String),

    #[error("upstream error (status {status:?}): {message}")]
    Upstream {
        status: Option<u16>,
        message: String,
    },

    #[error("transient network error: {0}")]
    Transient(String),
}

impl LlmError {
    /// Only rate limits and transient network failures are worth an immediate retry.
    pub fn is_retryable(&self) -> bool {
        matches!(self, LlmError::RateLimited(_) | LlmError::Transient(_))
    }

    /// Stable machine-readable tag used in per-variant error reports.
    pub fn kind(&self) -> &'static str {
        match self {
            LlmError::Timeout(_) => "timeout",
            LlmError::RateLimited(_) => "rate_limit",
            LlmError::Upstream { .. } => "upstream",
            LlmError::Transient(_) => "transient_network",
        }
    }
}

/// Provider-agnostic completion request.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub system: String,
    pub prompt: String,
    pub max_tokens: u32,
    pub temperature: f32,
}

/// Token counts as reported by the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
}

impl TokenUsage {
    pub fn total(&self) -> u32 {
        self.prompt_tokens + self.completion_tokens
    }
}

/// Raw completion text plus usage, if the provider reported it.
#[derive(Debug, Clone, PartialEq)]
pub struct Completion {
    pub text: String,
    pub usage: Option<TokenUsage>,
}

/// The completion model seam. Implement this to swap providers (or to fake
/// the model in tests) without touching generation code.
///
/// Carried by the invoker as `Arc<dyn CompletionModel>`.
#[async_trait]
pub trait CompletionModel: Send + Sync {
    fn model_name(&self) -> &str;

    async fn complete(&self, request: &CompletionRequest) -> Result<Completion, LlmError>;
}

#[derive(Debug, Serialize)]
struct AnthropicRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    system: &'a str,
    messages: Vec<AnthropicMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct AnthropicMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    content: Vec<ContentBlock>,
    #[serde(default)]
    usage: Option<AnthropicUsage>,
    #[serde(default)]
    stop_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    block_type: String,
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AnthropicUsage {
    input_tokens: u32,
    output_tokens: u32,
}

impl AnthropicResponse {
    /// Extracts the text content from the first text block.
    fn text(&self) -> Option<&str> {
        self.content
            .iter()
            .find(|b| b.block_type == "text")
            .and_then(|b| b.text.as_deref())
    }
}

#[derive(Debug, Deserialize)]
struct AnthropicError {
    error: AnthropicErrorBody,
}

#[derive(Debug, Deserialize)]
struct AnthropicErrorBody {
    message: String,
}

/// Anthropic Messages API implementation of `CompletionModel`.
#[derive(Clone)]
pub struct LlmClient {
    client: Client,
    api_key: String,
    timeout: Duration,
}

impl LlmClient {
    /// `timeout` is a transport-level backstop; the invoker enforces the real deadline.
    pub fn new(api_key: String, timeout: Duration) -> anyhow::Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            api_key,
            timeout,
        })
    }

    fn classify_transport_error(&self, error: reqwest::Error) -> LlmError {
        if error.is_timeout() {
            LlmError::Timeout(self.timeout)
        } else if error.is_decode() {
            LlmError::Upstream {
                status: error.status().map(|s| s.as_u16()),
                message: format!("undecodable response: {error}"),
            }
        } else {
            LlmError::Transient(error.to_string())
        }
    }
}

#[async_trait]
impl CompletionModel for LlmClient {
    fn model_name(&self) -> &str {
        MODEL
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<Completion, LlmError> {
        let request_body = AnthropicRequest {
            model: MODEL,
            max_tokens: request.max_tokens,
            temperature: request.temperature,
            system: &request.system,
            messages: vec![AnthropicMessage {
                role: "user",
                content: &request.prompt,
            }],
        };

        let response = self
            .client
            .post(ANTHROPIC_API_URL)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("content-type", "application/json")
            .json(&request_body)
            .send()
            .await
            .map_err(|e| self.classify_transport_error(e))?;

        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            // Try to parse error message
            let message = serde_json::from_str::<AnthropicError>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            warn!("LLM API returned {}: {}", status, message);
            return Err(classify_status(status, message));
        }

        let parsed: AnthropicResponse = response
            .json()
            .await
            .map_err(|e| self.classify_transport_error(e))?;

        if parsed.stop_reason.as_deref() == Some("refusal") {
            return Err(LlmError::Upstream {
                status: Some(status.as_u16()),
                message: "model refused to answer".to_string(),
            });
        }

        let text = parsed
            .text()
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| LlmError::Upstream {
                status: Some(status.as_u16()),
                message: "LLM returned empty content".to_string(),
            })?
            .to_string();

        let usage = parsed.usage.map(|u| TokenUsage {
            prompt_tokens: u.input_tokens,
            completion_tokens: u.output_tokens,
        });

        debug!(
            "LLM call succeeded: usage={:?}, chars={}",
            usage,
            text.len()
        );

        Ok(Completion { text, usage })
    }
}

/// Maps a non-success HTTP status onto the retry taxonomy.
/// 429 is a rate limit, 5xx (including Anthropic's 529 "overloaded") is transient,
/// everything else is a non-retryable upstream rejection.
fn classify_status(status: StatusCode, message: String) -> LlmError {
    if status == StatusCode::TOO_MANY_REQUESTS {
        LlmError::RateLimited(message)
    } else if status.is_server_error() || status.as_u16() == 529 {
        LlmError::Transient(format!("status {}: {}", status.as_u16(), message))
    } else {
        LlmError::Upstream {
            status: Some(status.as_u16()),
            message,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_429_as_rate_limit() {
        let err = classify_status(StatusCode::TOO_MANY_REQUESTS, "slow down".to_string());
        assert_eq!(err, LlmError::RateLimited("slow down".to_string()));
        assert!(err.is_retryable());
    }

    #[test]
    fn test_classify_5xx_as_transient() {
        let err = classify_status(StatusCode::BAD_GATEWAY, "oops".to_string());
        assert!(matches!(err, LlmError::Transient(_)));
        assert!(err.is_retryable());

        let overloaded = classify_status(
            StatusCode::from_u16(529).unwrap(),
            "overloaded".to_string(),
        );
        assert_eq!(overloaded.kind(), "transient_network");
    }

    #[test]
    fn test_classify_4xx_as_upstream() {
        let err = classify_status(StatusCode::BAD_REQUEST, "bad prompt".to_string());
        assert_eq!(
            err,
            LlmError::Upstream {
                status: Some(400),
                message: "bad prompt".to_string()
            }
        );
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_timeout_is_not_retryable() {
        let err = LlmError::Timeout(Duration::from_secs(30));
        assert!(!err.is_retryable());
        assert_eq!(err.kind(), "timeout");
        assert_eq!(err.to_string(), "model call timed out after 30000ms");
    }

    #[test]
    fn test_response_text_picks_first_text_block() {
        let json = r#"{
            "content": [
                {"type": "tool_use", "text": null},
                {"type": "text", "text": "hello"}
            ],
            "usage": {"input_tokens": 12, "output_tokens": 3}
        }"#;
        let parsed: AnthropicResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.text(), Some("hello"));
        assert_eq!(parsed.usage.unwrap().input_tokens, 12);
    }

    #[test]
    fn test_response_without_usage_still_parses() {
        let json = r#"{"content": [{"type": "text", "text": "hi"}]}"#;
        let parsed: AnthropicResponse = serde_json::from_str(json).unwrap();
        assert!(parsed.usage.is_none());
        assert!(parsed.stop_reason.is_none());
    }

    #[test]
    fn test_token_usage_total() {
        let usage = TokenUsage {
            prompt_tokens: 120,
            completion_tokens: 80,
        };
        assert_eq!(usage.total(), 200);
    }
}
