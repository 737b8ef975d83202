//! Single-pass or chunk-and-merge summarization with model fallback

use std::sync::Arc;

use super::{SummarizationConfig, chunk_text, prompts};
use crate::llm::{CallParams, ModelCaller, call_with_fallback};
use crate::{Error, Result};

/// Blank line between chunk summaries handed to the merge call
const SUMMARY_SEPARATOR: &str = "\n\n";

/// Turns transcripts into summaries through a [`ModelCaller`]
///
/// The pipeline holds no per-request state; one instance can serve many
/// concurrent summaries.
pub struct SummarizationPipeline {
    caller: Arc<dyn ModelCaller>,
    config: SummarizationConfig,
}

impl SummarizationPipeline {
    /// Build a pipeline, validating the configuration once
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfiguration`] when the chunk parameters
    /// cannot work together
    pub fn new(caller: Arc<dyn ModelCaller>, config: SummarizationConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { caller, config })
    }

    /// Configuration in use
    #[must_use]
    pub const fn config(&self) -> &SummarizationConfig {
        &self.config
    }

    /// Summarize `transcript`, using `title` to anchor the prompts
    ///
    /// Short transcripts take one call. Longer ones are chunked, each chunk
    /// summarized on its own, and the survivors merged. Failed chunks are
    /// skipped and a failed merge degrades to the joined chunk summaries.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SummarizationFailed`] when no model produced output
    /// for a step that had no alternative
    pub async fn summarize(&self, transcript: &str, title: &str) -> Result<String> {
        let length = transcript.chars().count();
        tracing::info!(title, length, "starting summarization");

        if length <= self.config.single_pass_threshold {
            return self.single_pass(transcript, title).await;
        }

        self.chunked(transcript, title).await
    }

    async fn single_pass(&self, transcript: &str, title: &str) -> Result<String> {
        tracing::info!("using single-pass summarization");

        let prompt = prompts::single_pass(title, transcript);
        call_with_fallback(
            self.caller.as_ref(),
            &self.config.models.single_pass,
            &prompt,
            self.params(self.config.final_max_tokens),
            "single_pass",
        )
        .await
        .ok_or_else(|| {
            Error::SummarizationFailed("every single-pass model failed".to_string())
        })
    }

    async fn chunked(&self, transcript: &str, title: &str) -> Result<String> {
        let mut chunks = chunk_text(
            transcript,
            self.config.chunk_size,
            self.config.chunk_overlap,
        )?;

        if chunks.len() > self.config.max_chunks {
            tracing::warn!(
                chunks = chunks.len(),
                max_chunks = self.config.max_chunks,
                "transcript too long, dropping trailing chunks"
            );
            chunks.truncate(self.config.max_chunks);
        }

        let total = chunks.len();
        tracing::info!(total, "using chunked summarization");

        let mut summaries = Vec::with_capacity(total);
        for (i, chunk) in chunks.iter().enumerate() {
            let prompt = prompts::chunk(title, i + 1, total, chunk);
            let summary = call_with_fallback(
                self.caller.as_ref(),
                &self.config.models.chunk,
                &prompt,
                self.params(self.config.chunk_max_tokens),
                "chunk",
            )
            .await;

            match summary {
                Some(text) => summaries.push(text),
                None => {
                    tracing::warn!(chunk = i + 1, total, "chunk skipped after all models failed");
                }
            }
        }

        match summaries.len() {
            0 => Err(Error::SummarizationFailed(format!(
                "none of the {total} chunks could be summarized"
            ))),
            1 => Ok(summaries.remove(0)),
            survived => {
                let combined = summaries.join(SUMMARY_SEPARATOR);
                tracing::info!(survived, total, "merging chunk summaries");

                let prompt = prompts::merge(title, &combined);
                let merged = call_with_fallback(
                    self.caller.as_ref(),
                    &self.config.models.merge,
                    &prompt,
                    self.params(self.config.final_max_tokens),
                    "final",
                )
                .await;

                Ok(merged.unwrap_or_else(|| {
                    tracing::warn!("merge failed, returning combined chunk summaries");
                    combined
                }))
            }
        }
    }

    const fn params(&self, max_tokens: u32) -> CallParams {
        CallParams {
            max_tokens,
            temperature: self.config.temperature,
            timeout: self.config.call_timeout(),
        }
    }
}
