//! Error types for Beacon plugins

use thiserror::Error;

/// Result type alias for plugin operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in Beacon plugins
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration file or environment error
    #[error("configuration error: {0}")]
    Config(String),

    /// Configuration values that cannot work together
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// A single model call failed
    #[error("model call failed: {0}")]
    ModelCall(String),

    /// Every summarization route was exhausted
    #[error("summarization failed: {0}")]
    SummarizationFailed(String),

    /// A remote API answered with an unexpected shape
    #[error("unexpected response from {source_name}: {message}")]
    Parse {
        /// Which API produced the response
        source_name: &'static str,
        /// What was wrong with it
        message: String,
    },

    /// Home Assistant API error
    #[error("home assistant error: {0}")]
    HomeAssistant(String),

    /// Subtitle extraction error
    #[error("subtitle error: {0}")]
    Subtitle(String),

    /// Speech-to-text error
    #[error("transcription error: {0}")]
    Transcription(String),

    /// `SimpleX` chat CLI error
    #[error("simplex error: {0}")]
    Simplex(String),

    /// Database API error
    #[error("database api error: {0}")]
    DatabaseApi(String),

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP error
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("toml error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl Error {
    /// Build a parse error for the named API
    #[must_use]
    pub fn parse(source_name: &'static str, message: impl Into<String>) -> Self {
        Self::Parse {
            source_name,
            message: message.into(),
        }
    }
}
