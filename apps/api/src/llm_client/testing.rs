//! Scripted `CompletionModel` for tests. Counts every call that starts and
//! every call that runs to completion so tests can assert on external usage.

use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use super::{Completion, CompletionModel, CompletionRequest, LlmError, TokenUsage};

/// What the fake does for one call.
#[derive(Debug, Clone)]
pub enum FakeReply {
    Text(String),
    TextWithoutUsage(String),
    Fail(LlmError),
    /// Sleeps before producing the inner reply.
    Delayed(Duration, Box<FakeReply>),
}

type Script = dyn Fn(&CompletionRequest, u32) -> FakeReply + Send + Sync;

pub struct FakeModel {
    script: Box<Script>,
    started: AtomicU32,
    finished: AtomicU32,
}

impl FakeModel {
    /// `script` receives the request and the zero-based call number.
    pub fn new(script: impl Fn(&CompletionRequest, u32) -> FakeReply + Send + Sync + 'static) -> Self {
        Self {
            script: Box::new(script),
            started: AtomicU32::new(0),
            finished: AtomicU32::new(0),
        }
    }

    /// Every call returns a well-formed post with `words` body words.
    pub fn always(words: usize) -> Self {
        Self::new(move |_, _| FakeReply::Text(sample_output(words)))
    }

    pub fn calls(&self) -> u32 {
        self.started.load(Ordering::SeqCst)
    }

    pub fn finished(&self) -> u32 {
        self.finished.load(Ordering::SeqCst)
    }
}

/// True when the prompt was built for the given one-based variant number.
pub fn is_variant(request: &CompletionRequest, number: usize) -> bool {
    request.prompt.contains(&format!("VARIANT: {number} of"))
}

/// A well-formed sectioned reply with a body of exactly `words` words.
pub fn sample_output(words: usize) -> String {
    let body = (0..words)
        .map(|i| format!("word{i}"))
        .collect::<Vec<_>>()
        .join(" ");
    format!(
        "[POST]\n{body}\n[HASHTAGS]\n#RemoteWork #Leadership #remotework\n[CTA]\nHow does your team stay connected?\n[END]"
    )
}

pub const SAMPLE_USAGE: TokenUsage = TokenUsage {
    prompt_tokens: 400,
    completion_tokens: 250,
};

#[async_trait]
impl CompletionModel for FakeModel {
    fn model_name(&self) -> &str {
        "fake-model"
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<Completion, LlmError> {
        let call = self.started.fetch_add(1, Ordering::SeqCst);
        let mut reply = (self.script)(request, call);
        loop {
            match reply {
                FakeReply::Delayed(delay, inner) => {
                    tokio::time::sleep(delay).await;
                    reply = *inner;
                }
                FakeReply::Text(text) => {
                    self.finished.fetch_add(1, Ordering::SeqCst);
                    return Ok(Completion {
                        text,
                        usage: Some(SAMPLE_USAGE),
                    });
                }
                FakeReply::TextWithoutUsage(text) => {
                    self.finished.fetch_add(1, Ordering::SeqCst);
                    return Ok(Completion { text, usage: None });
                }
                FakeReply::Fail(error) => {
                    self.finished.fetch_add(1, Ordering::SeqCst);
                    return Err(error);
                }
            }
        }
    }
}
