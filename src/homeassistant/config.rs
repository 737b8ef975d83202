//! Home Assistant connection settings

use serde::{Deserialize, Serialize};

/// Home Assistant configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HomeAssistantConfig {
    /// Base URL of the instance
    pub url: String,
    /// Long-lived access token (usually supplied through `HOMEASSISTANT_TOKEN`)
    pub token: Option<String>,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Maximum entities listed in one reply
    pub max_entities_per_response: usize,
    /// Words ignored when matching names; empty uses the built-in list
    pub stop_words: Vec<String>,
    /// Todo list used when none is named
    pub default_todo_list: Option<String>,
}

impl Default for HomeAssistantConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:8123".to_string(),
            token: None,
            timeout_secs: 10,
            max_entities_per_response: 20,
            stop_words: Vec::new(),
            default_todo_list: None,
        }
    }
}
