/// LLM Client: the single point of entry for all generative-AI calls.
///
/// ARCHITECTURAL RULE: No other module may call the AI provider directly.
/// Every AI-backed feature (parsing, ATS scoring, insights, job matching, cover
/// letters) goes through `LlmClient`, which bounds process-wide concurrency and
/// retries transient overloads.
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tokio::sync::Semaphore;
use tracing::{debug, warn};

use crate::config::AiLimits;

pub mod gemini;
pub mod prompts;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Provider signalled overload (HTTP 503). The only retryable failure.
    #[error("AI service unavailable: {0}")]
    Unavailable(String),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("AI service unavailable after {attempts} attempts: {message}")]
    Exhausted { attempts: u32, message: String },

    #[error("Malformed AI response: {reason}")]
    Malformed { reason: String, raw: String },

    #[error("LLM returned empty content")]
    EmptyContent,

    #[error("AI gateway closed")]
    Closed,
}

/// A text-in / text-out model provider. `GeminiBackend` in production, fakes in tests.
#[async_trait]
pub trait LlmBackend: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, LlmError>;
}

/// Bounded-concurrency, selectively-retrying gateway in front of an `LlmBackend`.
///
/// At most `max_concurrency` attempts are in flight process-wide; waiters queue
/// FIFO on the semaphore. A permit is held for one attempt only, so a caller
/// sleeping in backoff never blocks anyone else.
#[derive(Clone)]
pub struct LlmClient {
    backend: Arc<dyn LlmBackend>,
    permits: Arc<Semaphore>,
    max_attempts: u32,
    backoff_unit: Duration,
}

impl LlmClient {
    pub fn new(backend: Arc<dyn LlmBackend>, limits: AiLimits) -> Self {
        Self {
            backend,
            permits: Arc::new(Semaphore::new(limits.max_concurrency)),
            max_attempts: limits.max_attempts.max(1),
            backoff_unit: limits.backoff_unit,
        }
    }

    /// Sends a prompt and returns the raw response text.
    /// Retries only `Unavailable`, sleeping `attempt × backoff_unit` between attempts.
    pub async fn call(&self, prompt: &str) -> Result<String, LlmError> {
        let mut attempt = 1;
        loop {
            let result = {
                let _permit = self.permits.acquire().await.map_err(|_| LlmError::Closed)?;
                self.backend.generate(prompt).await
            };

            match result {
                Ok(text) => {
                    debug!("AI call succeeded on attempt {attempt} ({} chars)", text.len());
                    return Ok(text);
                }
                Err(LlmError::Unavailable(message)) if attempt < self.max_attempts => {
                    let delay = self.backoff_unit * attempt;
                    warn!(
                        "AI call attempt {}/{} unavailable, retrying after {}ms: {}",
                        attempt,
                        self.max_attempts,
                        delay.as_millis(),
                        message
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(LlmError::Unavailable(message)) => {
                    return Err(LlmError::Exhausted {
                        attempts: attempt,
                        message,
                    });
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Calls the model and deserializes its text response as JSON of shape `T`.
    /// The prompt must instruct the model to return JSON.
    pub async fn call_json<T: DeserializeOwned>(&self, prompt: &str) -> Result<T, LlmError> {
        let text = self.call(prompt).await?;
        parse_json_response(&text)
    }

    #[cfg(test)]
    pub fn available_permits(&self) -> usize {
        self.permits.available_permits()
    }
}

/// Cleans up model output and parses it into `T`.
/// Strips Markdown code fences and control characters other than `\n` and `\t`.
pub fn parse_json_response<T: DeserializeOwned>(text: &str) -> Result<T, LlmError> {
    let cleaned: String = strip_json_fences(text)
        .chars()
        .filter(|c| !c.is_control() || *c == '\n' || *c == '\t')
        .collect();

    if cleaned.trim().is_empty() {
        return Err(LlmError::EmptyContent);
    }

    serde_json::from_str(&cleaned).map_err(|e| LlmError::Malformed {
        reason: e.to_string(),
        raw: text.to_string(),
    })
}

/// Strips ```json ... ``` or ``` ... ``` code fences from LLM output.
fn strip_json_fences(text: &str) -> &str {
    let text = text.trim();
    let body = text
        .strip_prefix("```json")
        .or_else(|| text.strip_prefix("```JSON"))
        .or_else(|| text.strip_prefix("```"));
    match body {
        Some(stripped) => stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start()),
        None => text,
    }
}
