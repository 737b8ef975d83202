//! Per-chat transcript cache
//!
//! Each chat keeps its most recently processed transcripts so follow-up
//! questions do not re-download subtitles. Entries are evicted oldest
//! insertion first; lookups do not refresh an entry's position.

use std::collections::HashMap;
use std::num::NonZeroUsize;

use chrono::{DateTime, Duration, Utc};
use lru::LruCache;

/// A transcript remembered for follow-up questions
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedTranscript {
    /// Video URL as given by the user
    pub url: String,
    /// Video title
    pub title: String,
    /// Flattened subtitle text
    pub transcript: String,
    /// When the transcript was stored
    pub cached_at: DateTime<Utc>,
}

/// Bounded transcript store keyed by chat, plus each chat's last video
pub struct TranscriptCache {
    capacity: NonZeroUsize,
    expiry: Option<Duration>,
    rooms: HashMap<String, LruCache<String, CachedTranscript>>,
    last_video: HashMap<String, String>,
}

impl TranscriptCache {
    /// Create a cache holding up to `per_room` transcripts per chat
    ///
    /// `expiry_hours == 0` keeps entries until evicted.
    #[must_use]
    pub fn new(per_room: usize, expiry_hours: u64) -> Self {
        let expiry = i64::try_from(expiry_hours)
            .ok()
            .filter(|h| *h > 0)
            .map(Duration::hours);

        Self {
            capacity: NonZeroUsize::new(per_room).unwrap_or(NonZeroUsize::MIN),
            expiry,
            rooms: HashMap::new(),
            last_video: HashMap::new(),
        }
    }

    /// Store a transcript and mark it as the chat's last video
    pub fn insert(&mut self, chat_id: &str, url: &str, title: &str, transcript: &str) {
        self.insert_at(chat_id, url, title, transcript, Utc::now());
    }

    fn insert_at(
        &mut self,
        chat_id: &str,
        url: &str,
        title: &str,
        transcript: &str,
        now: DateTime<Utc>,
    ) {
        let capacity = self.capacity;
        let room = self
            .rooms
            .entry(chat_id.to_string())
            .or_insert_with(|| LruCache::new(capacity));

        room.put(
            url.to_string(),
            CachedTranscript {
                url: url.to_string(),
                title: title.to_string(),
                transcript: transcript.to_string(),
                cached_at: now,
            },
        );
        self.last_video
            .insert(chat_id.to_string(), url.to_string());

        tracing::debug!(chat_id, url, cached = room.len(), "cached transcript");
    }

    /// Transcript for `url` in `chat_id`, unless evicted or expired
    #[must_use]
    pub fn get(&self, chat_id: &str, url: &str) -> Option<&CachedTranscript> {
        self.get_at(chat_id, url, Utc::now())
    }

    fn get_at(&self, chat_id: &str, url: &str, now: DateTime<Utc>) -> Option<&CachedTranscript> {
        self.rooms
            .get(chat_id)?
            .peek(url)
            .filter(|entry| self.expiry.is_none_or(|ttl| now - entry.cached_at < ttl))
    }

    /// URL of the chat's most recently processed video
    #[must_use]
    pub fn last_video_url(&self, chat_id: &str) -> Option<&str> {
        self.last_video.get(chat_id).map(String::as_str)
    }

    /// Transcript of the chat's most recently processed video
    #[must_use]
    pub fn last_video(&self, chat_id: &str) -> Option<&CachedTranscript> {
        let url = self.last_video_url(chat_id)?;
        self.get(chat_id, url)
    }

    /// Number of transcripts cached for `chat_id`
    #[must_use]
    pub fn len(&self, chat_id: &str) -> usize {
        self.rooms.get(chat_id).map_or(0, LruCache::len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_evicts_oldest_insertion_first() {
        let mut cache = TranscriptCache::new(2, 0);
        cache.insert("room", "a", "A", "ta");
        cache.insert("room", "b", "B", "tb");

        // Reading does not protect an entry
        assert!(cache.get("room", "a").is_some());
        cache.insert("room", "c", "C", "tc");

        assert!(cache.get("room", "a").is_none());
        assert_eq!(cache.get("room", "b").unwrap().title, "B");
        assert_eq!(cache.len("room"), 2);
        assert_eq!(cache.last_video("room").unwrap().url, "c");
    }

    #[test]
    fn test_rooms_are_isolated() {
        let mut cache = TranscriptCache::new(5, 0);
        cache.insert("one", "a", "A", "ta");

        assert!(cache.get("two", "a").is_none());
        assert!(cache.last_video("two").is_none());
        assert_eq!(cache.last_video_url("one"), Some("a"));
    }

    #[test]
    fn test_expired_entries_are_ignored() {
        let mut cache = TranscriptCache::new(5, 1);
        let then = Utc::now() - Duration::hours(2);
        cache.insert_at("room", "a", "A", "ta", then);

        assert!(cache.get("room", "a").is_none());
        assert!(cache.get_at("room", "a", then + Duration::minutes(30)).is_some());
        assert!(cache.last_video("room").is_none());
    }

    #[test]
    fn test_zero_capacity_still_keeps_last_video() {
        let mut cache = TranscriptCache::new(0, 0);
        cache.insert("room", "a", "A", "ta");
        assert_eq!(cache.last_video("room").unwrap().title, "A");
    }
}
