//! Model invoker: deadline and bounded retry around one `CompletionModel` call.
//!
//! Each attempt is a single completion call under `tokio::time::timeout`. On expiry
//! the call future is dropped, which cancels the underlying HTTP request.
//! Only `RateLimited` and `Transient` errors are retried, with capped exponential backoff.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, warn};

use crate::generation::prompt_builder::PromptSpec;
use crate::llm_client::{CompletionModel, CompletionRequest, LlmError, TokenUsage};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_backoff: Duration,
    pub max_backoff: Duration,
}

impl RetryPolicy {
    /// Delay before retry number `retry` (1-based): base, 2×base, 4×base … capped.
    pub fn backoff(&self, retry: u32) -> Duration {
        let factor = 1u32 << retry.saturating_sub(1).min(16);
        self.base_backoff
            .saturating_mul(factor)
            .min(self.max_backoff)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 1,
            base_backoff: Duration::from_millis(250),
            max_backoff: Duration::from_secs(2),
        }
    }
}

/// Sampling parameters forwarded to the model.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SamplingParams {
    pub max_tokens: u32,
    pub temperature: f32,
}

impl Default for SamplingParams {
    fn default() -> Self {
        Self {
            max_tokens: 1024,
            temperature: 0.7,
        }
    }
}

/// Raw output of a successful invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelResponse {
    pub text: String,
    pub usage: Option<TokenUsage>,
    /// Time spent inside model calls across all attempts; backoff sleeps excluded.
    pub duration: Duration,
    pub attempts: u32,
}

#[derive(Clone)]
pub struct ModelInvoker {
    model: Arc<dyn CompletionModel>,
    timeout: Duration,
    retry: RetryPolicy,
    sampling: SamplingParams,
}

impl ModelInvoker {
    pub fn new(
        model: Arc<dyn CompletionModel>,
        timeout: Duration,
        retry: RetryPolicy,
        sampling: SamplingParams,
    ) -> Self {
        Self {
            model,
            timeout,
            retry,
            sampling,
        }
    }

    pub fn model_name(&self) -> &str {
        self.model.model_name()
    }

    pub async fn invoke(&self, spec: &PromptSpec) -> Result<ModelResponse, LlmError> {
        let request = CompletionRequest {
            system: spec.system.clone(),
            prompt: spec.prompt.clone(),
            max_tokens: self.sampling.max_tokens,
            temperature: self.sampling.temperature,
        };

        let mut in_call = Duration::ZERO;
        let mut retries = 0;

        loop {
            let started = Instant::now();
            let outcome = tokio::time::timeout(self.timeout, self.model.complete(&request))
                .await
                .unwrap_or(Err(LlmError::Timeout(self.timeout)));
            in_call += started.elapsed();

            match outcome {
                Ok(completion) => {
                    debug!(
                        variant = spec.variant_index,
                        attempts = retries + 1,
                        elapsed_ms = in_call.as_millis() as u64,
                        tokens = ?completion.usage.map(|u| u.total()),
                        "model call succeeded"
                    );
                    return Ok(ModelResponse {
                        text: completion.text,
                        usage: completion.usage,
                        duration: in_call,
                        attempts: retries + 1,
                    });
                }
                Err(error) if error.is_retryable() && retries < self.retry.max_retries => {
                    retries += 1;
                    let delay = self.retry.backoff(retries);
                    warn!(
                        variant = spec.variant_index,
                        "model call failed ({error}), retry {}/{} after {}ms",
                        retries,
                        self.retry.max_retries,
                        delay.as_millis()
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(error) => return Err(error),
            }
        }
    }
}
