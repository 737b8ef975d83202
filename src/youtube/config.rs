//! YouTube plugin configuration

use serde::{Deserialize, Serialize};

use crate::summarize::SummarizationConfig;

/// YouTube plugin configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct YouTubeConfig {
    /// Summarization pipeline tuning
    pub summarization: SummarizationConfig,
    /// Question answering settings
    pub qa: QaConfig,
    /// Transcript cache settings
    pub cache: CacheConfig,
    /// Subtitle extraction settings
    pub subtitles: SubtitleConfig,
    /// Feature toggles
    pub features: FeatureFlags,
}

/// Question answering over cached transcripts
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QaConfig {
    /// Ordered fallback models
    pub models: Vec<String>,
    /// Transcript characters included in the prompt
    pub max_transcript_length: usize,
    /// Token budget for answers
    pub max_tokens: u32,
    /// Sampling temperature
    pub temperature: f32,
}

impl Default for QaConfig {
    fn default() -> Self {
        Self {
            models: vec!["mistralai/mistral-small-3.2-24b-instruct:free".to_string()],
            max_transcript_length: 6_000,
            max_tokens: 5_000,
            temperature: 0.7,
        }
    }
}

/// Per-chat transcript cache
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Transcripts kept per chat before the oldest is evicted
    pub max_cached_per_room: usize,
    /// Hours before a cached transcript is ignored (0 keeps them forever)
    pub expiry_hours: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_cached_per_room: 5,
            expiry_hours: 24,
        }
    }
}

/// Subtitle extraction through `yt-dlp`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SubtitleConfig {
    /// `yt-dlp` executable
    pub ytdlp_path: String,
    /// Subtitle languages in order of preference
    pub languages: Vec<String>,
    /// Seconds allowed for metadata extraction and the subtitle download
    pub timeout_secs: u64,
}

impl Default for SubtitleConfig {
    fn default() -> Self {
        Self {
            ytdlp_path: "yt-dlp".to_string(),
            languages: vec!["en".to_string(), "en-US".to_string(), "en-GB".to_string()],
            timeout_secs: 30,
        }
    }
}

/// Feature toggles
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[allow(clippy::struct_excessive_bools)]
pub struct FeatureFlags {
    /// Summarize videos
    pub ai_summarization: bool,
    /// Answer questions about processed videos
    pub qa_enabled: bool,
    /// Send interim status messages
    pub show_progress: bool,
    /// Remember transcripts for follow-up questions
    pub caching_enabled: bool,
}

impl Default for FeatureFlags {
    fn default() -> Self {
        Self {
            ai_summarization: true,
            qa_enabled: true,
            show_progress: true,
            caching_enabled: true,
        }
    }
}
