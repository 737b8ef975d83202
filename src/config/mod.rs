//! Configuration for the Beacon plugin host

pub mod file;

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

pub use file::{config_file_path, interpolate_env, load_config_file, parse_config};

use crate::database::DatabaseApiConfig;
use crate::homeassistant::HomeAssistantConfig;
use crate::llm::OpenRouterConfig;
use crate::nist::DEFAULT_BEACON_URL;
use crate::simplex::SimplexConfig;
use crate::stt::SttConfig;
use crate::youtube::YouTubeConfig;
use crate::{Error, Result};

const REDACTED: &str = "********";

/// Complete configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub bot: BotConfig,
    pub ai: AiConfig,
    pub youtube: YouTubeConfig,
    pub homeassistant: HomeAssistantConfig,
    pub stt: SttConfig,
    pub database: DatabaseApiConfig,
    pub simplex: SimplexConfig,
}

/// Command handling and administration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BotConfig {
    /// Prefix that marks a message as a command
    pub command_prefix: String,
    /// Admin name to permitted admin commands, `*` for all
    pub admins: BTreeMap<String, Vec<String>>,
    /// Commands anyone may run
    pub public_commands: Vec<String>,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            command_prefix: "!".to_string(),
            admins: BTreeMap::new(),
            public_commands: ["help", "ping", "status", "uptime", "commands", "platform", "info"]
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }
}

/// Prompt commands and the randomness beacon
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AiConfig {
    pub openrouter: OpenRouterConfig,
    /// NIST randomness beacon endpoint for the latest pulse
    pub nist_beacon_url: String,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            openrouter: OpenRouterConfig::default(),
            nist_beacon_url: DEFAULT_BEACON_URL.to_string(),
        }
    }
}

impl Config {
    /// Load from `path` (or the default location) and apply environment
    /// overrides
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if an explicit `path` cannot be loaded, or
    /// [`Error::InvalidConfiguration`] if the summarization settings are
    /// inconsistent
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let env = |name: &str| std::env::var(name).ok();
        let mut config = load_config_file(path, env)?;
        config.apply_env_overrides(env);
        config.validate()?;
        Ok(config)
    }

    /// Override secrets and endpoints from environment variables
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.is_empty());

        if let Some(v) = get("OPENROUTER_API_KEY") {
            self.ai.openrouter.api_key = Some(v);
        }
        if let Some(v) = get("OPENROUTER_API_URL") {
            self.ai.openrouter.api_url = v;
        }
        if let Some(v) = get("NIST_BEACON_URL") {
            self.ai.nist_beacon_url = v;
        }
        if let Some(v) = get("HOMEASSISTANT_TOKEN") {
            self.homeassistant.token = Some(v);
        }
        if let Some(v) = get("HOMEASSISTANT_URL") {
            self.homeassistant.url = v;
        }
        if let Some(v) = get("OPENAI_API_KEY") {
            self.stt.api_key = Some(v);
        }
        if let Some(v) = get("DATABASE_API_URL") {
            self.database.url = v;
        }
        if let Some(v) = get("DATABASE_API_KEY") {
            self.database.api_key = Some(v);
        }
        if let Some(v) = get("SIMPLEX_WS_URL") {
            self.simplex.ws_url = v;
        }
    }

    /// Check cross-field constraints
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfiguration`] for unusable chunking settings
    /// or an endpoint that is not an absolute URL
    pub fn validate(&self) -> Result<()> {
        self.youtube.summarization.validate()?;

        for (name, value) in [
            ("ai.openrouter.api_url", &self.ai.openrouter.api_url),
            ("ai.nist_beacon_url", &self.ai.nist_beacon_url),
            ("homeassistant.url", &self.homeassistant.url),
            ("stt.api_url", &self.stt.api_url),
            ("database.url", &self.database.url),
            ("simplex.ws_url", &self.simplex.ws_url),
        ] {
            url::Url::parse(value).map_err(|e| {
                Error::InvalidConfiguration(format!("{name} is not a valid URL ({value}): {e}"))
            })?;
        }
        Ok(())
    }

    /// Copy with every secret replaced by a placeholder
    #[must_use]
    pub fn redacted(&self) -> Self {
        fn hide(secret: &mut Option<String>) {
            if secret.is_some() {
                *secret = Some(REDACTED.to_string());
            }
        }

        let mut copy = self.clone();
        hide(&mut copy.ai.openrouter.api_key);
        hide(&mut copy.homeassistant.token);
        hide(&mut copy.stt.api_key);
        hide(&mut copy.database.api_key);
        copy
    }

    /// Render the configuration as TOML with secrets redacted
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if serialization fails
    pub fn to_redacted_toml(&self) -> Result<String> {
        toml::to_string_pretty(&self.redacted())
            .map_err(|e| Error::Config(format!("failed to render config: {e}")))
    }
}
