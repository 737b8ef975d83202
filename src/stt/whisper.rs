//! Whisper transcription over the `OpenAI` audio API

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use reqwest::multipart::{Form, Part};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use super::{SttConfig, Transcriber};
use crate::{Error, Result};

/// Whisper transcriber
pub struct WhisperTranscriber {
    client: Client,
    api_url: String,
    api_key: SecretString,
    model: String,
    language: Option<String>,
    response_format: String,
}

impl WhisperTranscriber {
    /// Create a transcriber, or `None` without an API key
    #[must_use]
    pub fn from_config(config: &SttConfig) -> Option<Self> {
        let key = config.api_key.as_ref().filter(|k| !k.is_empty())?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap_or_else(|_| Client::new());

        Some(Self {
            client,
            api_url: config.api_url.clone(),
            api_key: SecretString::from(key.clone()),
            model: config.model.clone(),
            language: config.language_hint().map(ToString::to_string),
            response_format: config.response_format.clone(),
        })
    }

    /// MIME type for an audio file extension
    fn mime_for_extension(extension: &str) -> &'static str {
        match extension {
            "mp3" | "mpeg" | "mpga" => "audio/mpeg",
            "m4a" | "mp4" => "audio/mp4",
            "wav" => "audio/wav",
            "webm" => "audio/webm",
            "ogg" => "audio/ogg",
            "flac" => "audio/flac",
            _ => "application/octet-stream",
        }
    }
}

#[async_trait]
impl Transcriber for WhisperTranscriber {
    async fn transcribe(&self, audio: Vec<u8>, filename: &str) -> Result<String> {
        let extension = filename.rsplit('.').next().unwrap_or_default().to_lowercase();

        let part = Part::bytes(audio)
            .file_name(filename.to_string())
            .mime_str(Self::mime_for_extension(&extension))
            .map_err(|e| Error::Transcription(format!("Invalid MIME type: {e}")))?;

        let mut form = Form::new()
            .text("model", self.model.clone())
            .text("response_format", self.response_format.clone())
            .part("file", part);

        if let Some(ref lang) = self.language {
            form = form.text("language", lang.clone());
        }

        let response = self
            .client
            .post(&self.api_url)
            .bearer_auth(self.api_key.expose_secret())
            .multipart(form)
            .send()
            .await
            .map_err(|e| Error::Transcription(format!("Whisper request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Transcription(format!(
                "Whisper API error: {status} - {body}"
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| Error::Transcription(format!("Whisper body read failed: {e}")))?;

        parse_transcription(&body, &self.response_format)
    }

    fn name(&self) -> &'static str {
        "whisper"
    }
}

#[derive(Deserialize)]
struct TranscriptionResponse {
    text: String,
}

/// Extract text from a transcription body in the requested format
///
/// # Errors
///
/// Returns [`Error::Parse`] when a JSON format was requested and the body
/// has no `text` field
pub fn parse_transcription(body: &str, response_format: &str) -> Result<String> {
    match response_format {
        "json" | "verbose_json" => {
            let parsed: TranscriptionResponse = serde_json::from_str(body)
                .map_err(|e| Error::parse("whisper", format!("invalid transcription: {e}")))?;
            Ok(parsed.text.trim().to_string())
        }
        _ => Ok(body.trim().to_string()),
    }
}
