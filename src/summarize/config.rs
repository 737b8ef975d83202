//! Summarization pipeline configuration

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

const DEFAULT_MODEL: &str = "mistralai/mistral-small-3.2-24b-instruct:free";

/// Tuning for the summarization pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SummarizationConfig {
    /// Transcripts up to this many characters are summarized in one call
    pub single_pass_threshold: usize,
    /// Maximum characters per chunk
    pub chunk_size: usize,
    /// Characters shared between consecutive chunks
    pub chunk_overlap: usize,
    /// Chunks beyond this count are dropped
    pub max_chunks: usize,
    /// Token budget for each chunk summary
    pub chunk_max_tokens: u32,
    /// Token budget for the merge and single-pass calls
    pub final_max_tokens: u32,
    /// Sampling temperature for every summarization call
    pub temperature: f32,
    /// Upper bound for a single model call, in seconds
    pub call_timeout_secs: u64,
    /// Ordered fallback model lists per call kind
    pub models: FallbackModels,
}

impl Default for SummarizationConfig {
    fn default() -> Self {
        Self {
            single_pass_threshold: 25_000,
            chunk_size: 8_000,
            chunk_overlap: 800,
            max_chunks: 50,
            chunk_max_tokens: 800,
            final_max_tokens: 5_000,
            temperature: 0.7,
            call_timeout_secs: 60,
            models: FallbackModels::default(),
        }
    }
}

impl SummarizationConfig {
    /// Check that the values can work together
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfiguration`] for a zero chunk size, an
    /// overlap that would stop the chunk window from advancing, a zero
    /// chunk limit or a zero call timeout
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(Error::InvalidConfiguration(
                "chunk_size must be greater than zero".to_string(),
            ));
        }
        if self.chunk_overlap >= self.chunk_size {
            return Err(Error::InvalidConfiguration(format!(
                "chunk_overlap ({}) must be smaller than chunk_size ({})",
                self.chunk_overlap, self.chunk_size
            )));
        }
        if self.max_chunks == 0 {
            return Err(Error::InvalidConfiguration(
                "max_chunks must be greater than zero".to_string(),
            ));
        }
        if self.call_timeout_secs == 0 {
            return Err(Error::InvalidConfiguration(
                "call_timeout_secs must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Per-call timeout as a [`Duration`]
    #[must_use]
    pub const fn call_timeout(&self) -> Duration {
        Duration::from_secs(self.call_timeout_secs)
    }
}

/// Ordered model lists, tried first to last
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FallbackModels {
    /// Models for per-chunk summaries
    pub chunk: Vec<String>,
    /// Models for merging chunk summaries
    #[serde(rename = "final")]
    pub merge: Vec<String>,
    /// Models for whole-transcript summaries
    pub single_pass: Vec<String>,
}

impl Default for FallbackModels {
    fn default() -> Self {
        let list = vec![DEFAULT_MODEL.to_string()];
        Self {
            chunk: list.clone(),
            merge: list.clone(),
            single_pass: list,
        }
    }
}
