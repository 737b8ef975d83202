//! YouTube transcripts: URL detection, subtitle extraction and caching

mod cache;
mod config;
pub mod subtitles;
mod url;

pub use cache::{CachedTranscript, TranscriptCache};
pub use config::{CacheConfig, FeatureFlags, QaConfig, SubtitleConfig, YouTubeConfig};
pub use subtitles::{TranscriptSource, Video, YtDlp};
pub use self::url::{VideoRequest, extract_video_request, is_youtube_url};

/// Cut `transcript` to `max_chars` characters, marking the cut with `...`
#[must_use]
pub fn truncate_transcript(transcript: &str, max_chars: usize) -> String {
    match transcript.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}...", &transcript[..cut]),
        None => transcript.to_string(),
    }
}
