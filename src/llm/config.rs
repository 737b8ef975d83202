//! Configuration for the `OpenRouter` chat completion client

use serde::{Deserialize, Serialize};

/// `OpenRouter` client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OpenRouterConfig {
    /// Chat completions endpoint
    pub api_url: String,
    /// API key (usually supplied through `OPENROUTER_API_KEY`)
    pub api_key: Option<String>,
    /// Model used by the prompt commands
    pub model: String,
    /// Sampling temperature for the prompt commands
    pub temperature: f32,
    /// Value sent as the `HTTP-Referer` header
    pub referer: String,
    /// Value sent as the `X-Title` header
    pub title: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for OpenRouterConfig {
    fn default() -> Self {
        Self {
            api_url: "https://openrouter.ai/api/v1/chat/completions".to_string(),
            api_key: None,
            model: "cognitivecomputations/dolphin3.0-mistral-24b:free".to_string(),
            temperature: 0.8,
            referer: "https://github.com/omnidotdev/beacon-plugins".to_string(),
            title: "Beacon Bot".to_string(),
            timeout_secs: 60,
        }
    }
}
