//! Bundled plugins and host assembly
//!
//! [`PluginHost::from_config`] builds every client the configuration
//! enables and registers the plugins in routing order, `core` first.

mod ai;
mod auth;
mod core;
mod database;
mod homeassistant;
mod simplex;
mod stt;
mod youtube;

pub use ai::AiPlugin;
pub use auth::AuthPlugin;
pub use self::core::{CORE_PLUGIN, CorePlugin, format_uptime};
pub use database::DatabasePlugin;
pub use homeassistant::HomeAssistantPlugin;
pub use simplex::SimplexPlugin;
pub use stt::SttPlugin;
pub use youtube::YouTubePlugin;

use std::sync::Arc;

use crate::Result;
use crate::bot::{AdminList, PluginCatalog, PluginRegistry};
use crate::config::Config;
use crate::database::{DatabaseApi, DatabaseApiClient};
use crate::homeassistant::{HomeAssistantApi, HomeAssistantClient};
use crate::llm::{ModelCaller, OpenRouterClient};
use crate::nist::NistBeacon;
use crate::simplex::SimplexClient;
use crate::stt::{SpeechToText, WhisperTranscriber};
use crate::youtube::YtDlp;

/// Registry plus the handles the binary needs outside command routing
pub struct PluginHost {
    pub registry: PluginRegistry,
    pub stt: Arc<SttPlugin>,
    pub admins: Arc<AdminList>,
}

impl PluginHost {
    /// Build clients and register every bundled plugin
    ///
    /// Missing credentials leave the matching client unset; the plugin is
    /// still registered and explains what is missing when used.
    ///
    /// # Errors
    ///
    /// Returns error if the YouTube summarization settings are invalid
    pub fn from_config(config: &Config) -> Result<Self> {
        let catalog = PluginCatalog::new();
        let mut registry = PluginRegistry::new(config.bot.command_prefix.clone(), catalog.clone());
        let admins = Arc::new(AdminList::new(
            config.bot.admins.clone(),
            config.bot.public_commands.clone(),
        ));

        let caller = OpenRouterClient::from_config(&config.ai.openrouter)
            .map(|c| Arc::new(c) as Arc<dyn ModelCaller>);
        let database = DatabaseApiClient::from_config(&config.database)
            .map(|c| Arc::new(c) as Arc<dyn DatabaseApi>);
        let homeassistant = HomeAssistantClient::from_config(&config.homeassistant)
            .map(|c| Arc::new(c) as Arc<dyn HomeAssistantApi>);
        let stt = Arc::new(SttPlugin::new(
            WhisperTranscriber::from_config(&config.stt)
                .map(|w| SpeechToText::new(Arc::new(w), config.stt.clone())),
        ));
        let simplex = Arc::new(SimplexClient::new(&config.simplex));

        tracing::info!(
            openrouter = caller.is_some(),
            database = database.is_some(),
            homeassistant = homeassistant.is_some(),
            "building plugins"
        );

        registry.register(Arc::new(
            CorePlugin::new(catalog.clone(), config.bot.command_prefix.clone())
                .with_simplex_url(config.simplex.ws_url.clone()),
        ));
        registry.register(Arc::new(AiPlugin::new(
            caller.clone(),
            &config.ai.openrouter,
            Arc::new(NistBeacon::new(config.ai.nist_beacon_url.clone())),
        )));
        registry.register(Arc::new(AuthPlugin::new(database.clone())));
        registry.register(Arc::new(DatabasePlugin::new(database)));
        registry.register(Arc::new(HomeAssistantPlugin::new(
            homeassistant,
            &config.homeassistant,
        )));
        registry.register(Arc::new(YouTubePlugin::new(
            caller,
            Arc::new(YtDlp::new(&config.youtube.subtitles)),
            config.youtube.clone(),
        )?));
        registry.register(Arc::new(SimplexPlugin::new(simplex, admins.clone(), catalog)));
        registry.register(stt.clone());

        Ok(Self {
            registry,
            stt,
            admins,
        })
    }
}
