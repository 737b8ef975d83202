//! Speech-to-text for voice messages
//!
//! Validates downloaded audio, optionally speeds it up, and hands it to a
//! [`Transcriber`].

mod config;
pub mod tempo;
mod whisper;

pub use config::SttConfig;
pub use whisper::{WhisperTranscriber, parse_transcription};

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;

use crate::{Error, Result};

/// Speech-to-text backend
#[async_trait]
pub trait Transcriber: Send + Sync {
    /// Transcribe `audio`, named `filename` for format detection
    ///
    /// # Errors
    ///
    /// Returns error if the backend rejects the audio or cannot be reached
    async fn transcribe(&self, audio: Vec<u8>, filename: &str) -> Result<String>;

    /// Backend name for logging
    fn name(&self) -> &'static str;
}

/// Audio file validation and transcription
pub struct SpeechToText {
    transcriber: Arc<dyn Transcriber>,
    config: SttConfig,
}

impl SpeechToText {
    /// Create the service
    #[must_use]
    pub fn new(transcriber: Arc<dyn Transcriber>, config: SttConfig) -> Self {
        Self {
            transcriber,
            config,
        }
    }

    /// Configuration in use
    #[must_use]
    pub const fn config(&self) -> &SttConfig {
        &self.config
    }

    /// Reject files that are too large or in an unsupported format
    ///
    /// # Errors
    ///
    /// Returns [`Error::Transcription`] describing the problem
    pub fn check(&self, path: &Path, size: u64) -> Result<()> {
        if size > self.config.max_file_size {
            return Err(Error::Transcription(format!(
                "audio file too large: {size} bytes (max {})",
                self.config.max_file_size
            )));
        }

        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default()
            .to_lowercase();

        if !self
            .config
            .supported_formats
            .iter()
            .any(|f| f.eq_ignore_ascii_case(&extension))
        {
            return Err(Error::Transcription(format!(
                "unsupported audio format: {extension:?}"
            )));
        }

        Ok(())
    }

    /// Transcribe the audio file at `path`
    ///
    /// # Errors
    ///
    /// Returns error if the file is rejected, cannot be read or the backend
    /// fails
    pub async fn transcribe_file(&self, path: &Path) -> Result<String> {
        let size = tokio::fs::metadata(path).await?.len();
        self.check(path, size)?;

        let filename = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("audio")
            .to_string();

        let (audio, filename) = if self.config.speed_up {
            let sped =
                tempo::speed_up(&self.config.ffmpeg_path, path, self.config.tempo_multiplier)
                    .await?;
            (tokio::fs::read(sped.path()).await?, "audio.m4a".to_string())
        } else {
            (tokio::fs::read(path).await?, filename)
        };

        tracing::info!(
            provider = self.transcriber.name(),
            file = %filename,
            bytes = audio.len(),
            "transcribing audio"
        );
        self.transcriber.transcribe(audio, &filename).await
    }
}

/// Chat reply for a transcription
#[must_use]
pub fn format_transcription(user: &str, text: &str) -> String {
    let text = text.trim();
    if text.is_empty() {
        format!("🎤 **Audio from {user}**\n\n🔇 (No speech detected)")
    } else {
        format!("🎤 **Audio from {user}**\n\n💬 \"{text}\"")
    }
}
