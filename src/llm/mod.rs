//! Language model access
//!
//! Plugins and the summarization pipeline talk to models only through the
//! [`ModelCaller`] capability, which keeps them testable without a network.

mod config;
mod openrouter;

pub use config::OpenRouterConfig;
pub use openrouter::{OpenRouterClient, parse_completion};

use std::time::Duration;

use async_trait::async_trait;

use crate::Result;

/// One model invocation: prompt in, text out
#[async_trait]
pub trait ModelCaller: Send + Sync {
    /// Run a single completion against `model`
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::ModelCall`] (or a transport error) when the
    /// model cannot produce a response
    async fn call(
        &self,
        model: &str,
        prompt: &str,
        max_tokens: u32,
        temperature: f32,
    ) -> Result<String>;
}

/// Parameters shared by every attempt of a fallback run
#[derive(Debug, Clone, Copy)]
pub struct CallParams {
    /// Token budget for the response
    pub max_tokens: u32,
    /// Sampling temperature
    pub temperature: f32,
    /// Upper bound for one attempt
    pub timeout: Duration,
}

/// Try `models` in order until one returns non-empty text
///
/// Failures, timeouts and blank responses are logged and skipped. Returns
/// `None` once the list is exhausted.
pub async fn call_with_fallback(
    caller: &dyn ModelCaller,
    models: &[String],
    prompt: &str,
    params: CallParams,
    stage: &str,
) -> Option<String> {
    for (i, model) in models.iter().enumerate() {
        tracing::debug!(
            stage,
            model = %model,
            attempt = i + 1,
            total = models.len(),
            "calling model"
        );

        let attempt = tokio::time::timeout(
            params.timeout,
            caller.call(model, prompt, params.max_tokens, params.temperature),
        )
        .await;

        match attempt {
            Ok(Ok(text)) if !text.trim().is_empty() => {
                tracing::info!(stage, model = %model, "model call succeeded");
                return Some(text);
            }
            Ok(Ok(_)) => {
                tracing::warn!(stage, model = %model, "model returned empty response, trying next");
            }
            Ok(Err(e)) => {
                tracing::warn!(stage, model = %model, error = %e, "model failed, trying next");
            }
            Err(_) => {
                tracing::warn!(
                    stage,
                    model = %model,
                    timeout_secs = params.timeout.as_secs(),
                    "model timed out, trying next"
                );
            }
        }
    }

    tracing::error!(stage, models = models.len(), "all models failed");
    None
}
