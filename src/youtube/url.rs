//! YouTube URL detection

use std::sync::LazyLock;

use regex::Regex;

static YOUTUBE_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?:https?://)?(?:www\.)?youtube\.com/watch\?v=[a-zA-Z0-9_-]+(?:[&?][^\s]*)?",
        r"(?:https?://)?(?:www\.)?youtu\.be/[a-zA-Z0-9_-]+(?:[&?][^\s]*)?",
        r"(?:https?://)?(?:www\.)?youtube\.com/embed/[a-zA-Z0-9_-]+(?:[&?][^\s]*)?",
        r"(?:https?://)?(?:www\.)?youtube\.com/v/[a-zA-Z0-9_-]+(?:[&?][^\s]*)?",
        r"(?:https?://)?(?:www\.)?m\.youtube\.com/watch\?v=[a-zA-Z0-9_-]+(?:[&?][^\s]*)?",
        r"(?:https?://)?(?:www\.)?youtube\.com/shorts/[a-zA-Z0-9_-]+(?:[&?][^\s]*)?",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("valid regex"))
    .collect()
});

/// A video link found in a message, plus whatever followed it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoRequest {
    /// The matched URL
    pub url: String,
    /// Trimmed text after the URL, if any
    pub question: Option<String>,
}

/// Find the first YouTube URL in `text`
///
/// When several patterns match, the earliest and then longest match wins,
/// so `https://m.youtube.com/watch?v=…` is taken whole.
#[must_use]
pub fn extract_video_request(text: &str) -> Option<VideoRequest> {
    let found = YOUTUBE_PATTERNS
        .iter()
        .filter_map(|re| re.find(text))
        .min_by_key(|m| (m.start(), std::cmp::Reverse(m.end())))?;

    let rest = text[found.end()..].trim();

    Some(VideoRequest {
        url: found.as_str().to_string(),
        question: (!rest.is_empty()).then(|| rest.to_string()),
    })
}

/// Whether `text` contains a YouTube URL
#[must_use]
pub fn is_youtube_url(text: &str) -> bool {
    YOUTUBE_PATTERNS.iter().any(|re| re.is_match(text))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_supported_url_forms() {
        for url in [
            "https://www.youtube.com/watch?v=dQw4w9WgXcQ",
            "https://youtu.be/dQw4w9WgXcQ?t=42",
            "youtube.com/embed/dQw4w9WgXcQ",
            "http://youtube.com/v/dQw4w9WgXcQ",
            "https://m.youtube.com/watch?v=dQw4w9WgXcQ&feature=share",
            "https://youtube.com/shorts/abc_DEF-123",
        ] {
            let request = extract_video_request(url).unwrap();
            assert_eq!(request.url, url);
            assert_eq!(request.question, None);
        }
    }

    #[test]
    fn test_question_after_url() {
        let request =
            extract_video_request("https://youtu.be/abc123   What are the main points? ").unwrap();
        assert_eq!(request.url, "https://youtu.be/abc123");
        assert_eq!(request.question.as_deref(), Some("What are the main points?"));
    }

    #[test]
    fn test_non_youtube_text() {
        assert!(extract_video_request("what did they say about rust?").is_none());
        assert!(!is_youtube_url("https://vimeo.com/12345"));
        assert!(is_youtube_url("see youtu.be/xyz"));
    }
}
