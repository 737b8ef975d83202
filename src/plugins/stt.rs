//! Voice message transcription

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;

use crate::Result;
use crate::bot::{CommandContext, Plugin};
use crate::stt::{SpeechToText, format_transcription};

const MIB: u64 = 1024 * 1024;

/// `transcribe`, `sttconfig` and the downloaded-audio hook
pub struct SttPlugin {
    stt: Option<SpeechToText>,
    in_flight: Mutex<HashSet<PathBuf>>,
}

/// Removes a path from the in-flight set when transcription ends
struct InFlight<'a> {
    set: &'a Mutex<HashSet<PathBuf>>,
    path: PathBuf,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.set
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.path);
    }
}

impl SttPlugin {
    #[must_use]
    pub fn new(stt: Option<SpeechToText>) -> Self {
        Self {
            stt,
            in_flight: Mutex::new(HashSet::new()),
        }
    }

    fn claim(&self, path: &Path) -> Option<InFlight<'_>> {
        let mut set = self
            .in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        set.insert(path.to_path_buf()).then(|| InFlight {
            set: &self.in_flight,
            path: path.to_path_buf(),
        })
    }

    /// Transcribe a downloaded voice message
    ///
    /// Returns `None` when transcription is unavailable or the same file is
    /// already being processed.
    pub async fn handle_audio(&self, path: &Path, user: &str, chat_id: &str) -> Option<String> {
        let stt = self.stt.as_ref()?;

        let Some(_guard) = self.claim(path) else {
            tracing::info!(file = %path.display(), "audio already being processed");
            return None;
        };

        tracing::info!(file = %path.display(), user, chat = chat_id, "transcribing voice message");
        match stt.transcribe_file(path).await {
            Ok(text) => Some(format_transcription(user, &text)),
            Err(e) => {
                tracing::error!(file = %path.display(), error = %e, "transcription failed");
                Some(format!("❌ Could not transcribe audio from {user}: {e}"))
            }
        }
    }

    fn config_summary(&self) -> String {
        let Some(stt) = &self.stt else {
            return "❌ Speech-to-text is not configured (set OPENAI_API_KEY)".to_string();
        };
        let config = stt.config();

        format!(
            "🎤 **STT OpenAI Configuration**\n\
             **Model:** {}\n\
             **Language:** {}\n\
             **Response Format:** {}\n\
             **Speed-up:** {}\n\
             **Tempo Multiplier:** {}x\n\
             **Max File Size:** {}.{} MB\n\
             **Supported Formats:** {}\n\
             **Timeout:** {} seconds",
            config.model,
            config.language,
            config.response_format,
            if config.speed_up { "enabled" } else { "disabled" },
            config.tempo_multiplier,
            config.max_file_size / MIB,
            (config.max_file_size % MIB) * 10 / MIB,
            config.supported_formats.join(", "),
            config.timeout_secs
        )
    }
}

#[async_trait]
impl Plugin for SttPlugin {
    fn name(&self) -> &'static str {
        "stt"
    }

    fn version(&self) -> &'static str {
        "1.0.0"
    }

    fn description(&self) -> &'static str {
        "Speech-to-text transcription for voice messages"
    }

    fn commands(&self) -> &'static [&'static str] {
        &["transcribe", "stt", "sttconfig"]
    }

    async fn initialize(&self) -> Result<()> {
        if self.stt.is_none() {
            tracing::warn!("OPENAI_API_KEY not set, voice messages will not be transcribed");
        }
        Ok(())
    }

    async fn handle(&self, ctx: &CommandContext) -> Result<Option<String>> {
        let reply = match ctx.command.as_str() {
            "transcribe" | "stt" if self.stt.is_some() => {
                "🎤 STT is enabled - just send an audio message and I'll transcribe it automatically!"
                    .to_string()
            }
            "transcribe" | "stt" => {
                "❌ Speech-to-text is not configured (set OPENAI_API_KEY)".to_string()
            }
            "sttconfig" => self.config_summary(),
            _ => return Ok(None),
        };
        Ok(Some(reply))
    }
}
