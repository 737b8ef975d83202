//! Speech-to-text configuration

use serde::{Deserialize, Serialize};

/// Speech-to-text configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SttConfig {
    /// Transcription endpoint
    pub api_url: String,
    /// API key (usually supplied through `OPENAI_API_KEY`)
    pub api_key: Option<String>,
    /// Whisper model
    pub model: String,
    /// ISO 639-1 language hint, or `auto` to let the model detect it
    pub language: String,
    /// `json`, `verbose_json` or `text`
    pub response_format: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Largest accepted upload in bytes
    pub max_file_size: u64,
    /// Accepted file extensions
    pub supported_formats: Vec<String>,
    /// Speed audio up with ffmpeg before uploading
    pub speed_up: bool,
    /// `atempo` factor used when speeding up
    pub tempo_multiplier: f32,
    /// ffmpeg executable
    pub ffmpeg_path: String,
}

impl Default for SttConfig {
    fn default() -> Self {
        Self {
            api_url: "https://api.openai.com/v1/audio/transcriptions".to_string(),
            api_key: None,
            model: "whisper-1".to_string(),
            language: "auto".to_string(),
            response_format: "json".to_string(),
            timeout_secs: 30,
            max_file_size: 25 * 1024 * 1024, // 25MB
            supported_formats: ["m4a", "wav", "mp3", "mp4", "mpeg", "mpga", "ogg", "webm"]
                .into_iter()
                .map(String::from)
                .collect(),
            speed_up: false,
            tempo_multiplier: 2.0,
            ffmpeg_path: "ffmpeg".to_string(),
        }
    }
}

impl SttConfig {
    /// Language to send, `None` for auto-detection
    #[must_use]
    pub fn language_hint(&self) -> Option<&str> {
        let lang = self.language.trim();
        (!lang.is_empty() && !lang.eq_ignore_ascii_case("auto")).then_some(lang)
    }
}
