//! Transcript summarization
//!
//! Long transcripts are cut into overlapping windows, summarized window by
//! window and merged; short ones go through a single call. Every call walks
//! an ordered model list so a single provider outage does not fail the
//! summary.

mod chunk;
mod config;
mod pipeline;
pub mod prompts;

pub use chunk::chunk_text;
pub use config::{FallbackModels, SummarizationConfig};
pub use pipeline::SummarizationPipeline;
