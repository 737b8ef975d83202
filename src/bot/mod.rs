//! Chat command framework
//!
//! A [`PluginRegistry`] owns the plugins, parses prefixed command lines into
//! a [`CommandContext`] and routes each command to the plugin that claimed
//! it. Platform adapters only need to feed text in and send replies out.

pub mod admin;
mod context;
mod registry;

pub use admin::{AdminList, Permissions};
pub use context::{CommandContext, Platform, parse_command};
pub use registry::{PluginCatalog, PluginInfo, PluginRegistry};

use async_trait::async_trait;

use crate::Result;

/// A bundle of chat commands
#[async_trait]
pub trait Plugin: Send + Sync {
    /// Unique plugin name
    fn name(&self) -> &'static str;

    fn version(&self) -> &'static str;

    /// One-line summary for help output
    fn description(&self) -> &'static str;

    /// Command names this plugin answers, without prefix
    fn commands(&self) -> &'static [&'static str];

    /// Whether the plugin works on `platform`
    fn supports(&self, _platform: Platform) -> bool {
        true
    }

    /// Prepare the plugin before the first command
    ///
    /// # Errors
    ///
    /// Returns error if the plugin cannot work; it is then never dispatched to
    async fn initialize(&self) -> Result<()> {
        Ok(())
    }

    /// Handle a command, returning the reply text if there is one
    ///
    /// # Errors
    ///
    /// Returns error on failure; the registry answers with a generic error
    /// reply and logs the details
    async fn handle(&self, ctx: &CommandContext) -> Result<Option<String>>;
}
