//! Subtitle extraction through `yt-dlp`
//!
//! `yt-dlp -J` prints the video's metadata, including subtitle track URLs.
//! The best track is downloaded directly and flattened into plain text.

use std::collections::HashMap;
use std::sync::LazyLock;
use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;
use reqwest::Client;
use serde::Deserialize;
use tokio::process::Command;

use super::config::SubtitleConfig;
use crate::{Error, Result};

/// Title used when the metadata has none
pub const UNKNOWN_TITLE: &str = "Unknown Video";

/// Track formats we can flatten, best first
const PREFERRED_FORMATS: &[&str] = &["vtt", "srv3", "srv2", "srv1"];

static TAG_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^>]+>").expect("valid regex"));

static TIMESTAMP_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d{2}:\d{2}:\d{2}\.\d{3}").expect("valid regex"));

/// Title and flattened transcript of a video
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Video {
    /// Video title
    pub title: String,
    /// Subtitle text joined into one string
    pub transcript: String,
}

/// Anything that can turn a video URL into a transcript
#[async_trait]
pub trait TranscriptSource: Send + Sync {
    /// Fetch title and transcript for `url`
    ///
    /// # Errors
    ///
    /// Returns [`Error::Subtitle`] when the video has no usable subtitles
    async fn fetch(&self, url: &str) -> Result<Video>;
}

/// `yt-dlp` backed transcript source
pub struct YtDlp {
    binary: String,
    languages: Vec<String>,
    timeout: Duration,
    http: Client,
}

impl YtDlp {
    /// Create a source from configuration
    #[must_use]
    pub fn new(config: &SubtitleConfig) -> Self {
        let timeout = Duration::from_secs(config.timeout_secs);
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            binary: config.ytdlp_path.clone(),
            languages: config.languages.clone(),
            timeout,
            http,
        }
    }

    async fn video_info(&self, url: &str) -> Result<String> {
        let mut command = Command::new(&self.binary);
        command
            .args(["-J", "--skip-download", "--no-warnings", "--no-playlist"])
            .arg(url)
            .kill_on_drop(true);

        let output = tokio::time::timeout(self.timeout, command.output())
            .await
            .map_err(|_| {
                Error::Subtitle(format!(
                    "yt-dlp timed out after {}s",
                    self.timeout.as_secs()
                ))
            })?
            .map_err(|e| Error::Subtitle(format!("failed to run {}: {e}", self.binary)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::Subtitle(format!(
                "yt-dlp exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

#[async_trait]
impl TranscriptSource for YtDlp {
    async fn fetch(&self, url: &str) -> Result<Video> {
        tracing::info!(url, "extracting subtitles");

        let info = parse_video_info(&self.video_info(url).await?)?;
        let track = select_track(&info, &self.languages)
            .ok_or_else(|| Error::Subtitle("no subtitles found for this video".to_string()))?;

        tracing::debug!(ext = %track.ext, "downloading subtitle track");
        let response = self
            .http
            .get(&track.url)
            .send()
            .await
            .map_err(|e| Error::Subtitle(format!("subtitle download failed: {e}")))?;

        if !response.status().is_success() {
            return Err(Error::Subtitle(format!(
                "subtitle download failed: {}",
                response.status()
            )));
        }

        let transcript = parse_subtitles(&response.text().await?);
        if transcript.is_empty() {
            return Err(Error::Subtitle("subtitle track was empty".to_string()));
        }

        Ok(Video {
            title: info.title.unwrap_or_else(|| UNKNOWN_TITLE.to_string()),
            transcript,
        })
    }
}

/// The parts of `yt-dlp -J` output we use
#[derive(Debug, Deserialize)]
pub struct VideoInfo {
    /// Video title
    pub title: Option<String>,
    /// Uploaded subtitles by language
    #[serde(default)]
    pub subtitles: HashMap<String, Vec<SubtitleTrack>>,
    /// Generated captions by language
    #[serde(default)]
    pub automatic_captions: HashMap<String, Vec<SubtitleTrack>>,
}

/// One downloadable subtitle file
#[derive(Debug, Clone, Deserialize)]
pub struct SubtitleTrack {
    /// File format, e.g. `vtt`
    pub ext: String,
    /// Download URL
    pub url: String,
}

/// Parse `yt-dlp -J` output
///
/// # Errors
///
/// Returns [`Error::Parse`] if the output is not a video info object
pub fn parse_video_info(json: &str) -> Result<VideoInfo> {
    serde_json::from_str(json)
        .map_err(|e| Error::parse("yt-dlp", format!("invalid video info: {e}")))
}

/// Pick the best track: languages in order, uploaded before generated,
/// then the most readable format
#[must_use]
pub fn select_track<'a>(info: &'a VideoInfo, languages: &[String]) -> Option<&'a SubtitleTrack> {
    let tracks = languages.iter().find_map(|lang| {
        info.subtitles
            .get(lang)
            .or_else(|| info.automatic_captions.get(lang))
    })?;

    PREFERRED_FORMATS
        .iter()
        .find_map(|format| tracks.iter().find(|t| t.ext == *format))
}

/// Flatten subtitle file content into plain text
///
/// Drops the header block, cue numbers, timing lines and markup, collapses
/// the consecutive repeats typical of generated captions, and joins the
/// rest with spaces.
#[must_use]
pub fn parse_subtitles(content: &str) -> String {
    let mut lines: Vec<String> = Vec::new();
    let mut in_header = false;

    for raw in content.lines() {
        let line = raw.trim();

        if line.starts_with("WEBVTT") {
            in_header = true;
            continue;
        }
        if in_header {
            // Header metadata (Kind:, Language:) runs until the first blank line
            in_header = !line.is_empty();
            continue;
        }
        if line.is_empty() || line.contains("-->") || line.chars().all(|c| c.is_ascii_digit()) {
            continue;
        }

        let without_tags = TAG_REGEX.replace_all(line, "");
        let cleaned = TIMESTAMP_REGEX.replace_all(&without_tags, "");
        let cleaned = cleaned.trim();

        if !cleaned.is_empty() && lines.last().is_none_or(|prev| prev != cleaned) {
            lines.push(cleaned.to_string());
        }
    }

    lines.join(" ")
}
