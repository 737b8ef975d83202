//! Plugin registration and command routing

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, PoisonError, RwLock};

use chrono::{DateTime, Local};

use super::{CommandContext, Platform, Plugin, parse_command};

/// What the catalog knows about a registered plugin
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginInfo {
    pub name: String,
    pub version: String,
    pub description: String,
    pub commands: Vec<String>,
    pub enabled: bool,
}

#[derive(Debug, Default)]
struct CatalogState {
    plugins: Vec<PluginInfo>,
    failed: BTreeMap<String, String>,
    routes: BTreeMap<String, String>,
}

/// Shared, read-mostly view of the registry
///
/// Plugins that report on or manage other plugins hold a clone.
#[derive(Debug, Clone)]
pub struct PluginCatalog {
    state: Arc<RwLock<CatalogState>>,
    started_at: DateTime<Local>,
}

impl Default for PluginCatalog {
    fn default() -> Self {
        Self::new()
    }
}

impl PluginCatalog {
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Arc::default(),
            started_at: Local::now(),
        }
    }

    /// When the bot started
    #[must_use]
    pub const fn started_at(&self) -> DateTime<Local> {
        self.started_at
    }

    /// Registered plugins in registration order
    #[must_use]
    pub fn plugins(&self) -> Vec<PluginInfo> {
        self.read(|s| s.plugins.clone())
    }

    /// Plugins whose initialization failed, with the error
    #[must_use]
    pub fn failed(&self) -> BTreeMap<String, String> {
        self.read(|s| s.failed.clone())
    }

    /// Command name to owning plugin
    #[must_use]
    pub fn routes(&self) -> BTreeMap<String, String> {
        self.read(|s| s.routes.clone())
    }

    /// Whether `name` is registered, enabled and initialized
    #[must_use]
    pub fn is_active(&self, name: &str) -> bool {
        self.read(|s| {
            !s.failed.contains_key(name)
                && s.plugins.iter().any(|p| p.name == name && p.enabled)
        })
    }

    /// Enable a plugin, returning true if found
    pub fn enable(&self, name: &str) -> bool {
        self.set_enabled(name, true)
    }

    /// Disable a plugin, returning true if found
    pub fn disable(&self, name: &str) -> bool {
        self.set_enabled(name, false)
    }

    fn set_enabled(&self, name: &str, enabled: bool) -> bool {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        let Some(plugin) = state.plugins.iter_mut().find(|p| p.name == name) else {
            return false;
        };
        plugin.enabled = enabled;
        tracing::info!(plugin = name, enabled, "plugin toggled");
        true
    }

    fn read<T>(&self, f: impl FnOnce(&CatalogState) -> T) -> T {
        f(&self.state.read().unwrap_or_else(PoisonError::into_inner))
    }

    fn write(&self, f: impl FnOnce(&mut CatalogState)) {
        f(&mut self.state.write().unwrap_or_else(PoisonError::into_inner));
    }
}

/// Owns the plugins and routes commands to them
pub struct PluginRegistry {
    prefix: String,
    plugins: Vec<Arc<dyn Plugin>>,
    routes: HashMap<String, usize>,
    catalog: PluginCatalog,
}

impl PluginRegistry {
    /// Create a registry for commands starting with `prefix`
    #[must_use]
    pub fn new(prefix: impl Into<String>, catalog: PluginCatalog) -> Self {
        Self {
            prefix: prefix.into(),
            plugins: Vec::new(),
            routes: HashMap::new(),
            catalog,
        }
    }

    #[must_use]
    pub const fn catalog(&self) -> &PluginCatalog {
        &self.catalog
    }

    #[must_use]
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }

    /// Add a plugin; commands already claimed by an earlier plugin stay there
    pub fn register(&mut self, plugin: Arc<dyn Plugin>) {
        let index = self.plugins.len();
        let name = plugin.name();

        let mut claimed = Vec::new();
        for command in plugin.commands() {
            let command = command.to_lowercase();
            if let Some(&owner) = self.routes.get(&command) {
                tracing::warn!(
                    command = %command,
                    plugin = name,
                    owner = self.plugins[owner].name(),
                    "command already registered, keeping first"
                );
                continue;
            }
            self.routes.insert(command.clone(), index);
            claimed.push(command);
        }

        tracing::info!(
            plugin = name,
            version = plugin.version(),
            commands = claimed.len(),
            "registered plugin"
        );

        self.catalog.write(|state| {
            state.plugins.push(PluginInfo {
                name: name.to_string(),
                version: plugin.version().to_string(),
                description: plugin.description().to_string(),
                commands: plugin.commands().iter().map(|c| (*c).to_string()).collect(),
                enabled: true,
            });
            for command in claimed {
                state.routes.insert(command, name.to_string());
            }
        });

        self.plugins.push(plugin);
    }

    /// Initialize every plugin, recording failures in the catalog
    ///
    /// Returns the number of plugins that initialized.
    pub async fn initialize_all(&self) -> usize {
        let mut ready = 0;
        for plugin in &self.plugins {
            match plugin.initialize().await {
                Ok(()) => ready += 1,
                Err(e) => {
                    tracing::error!(
                        plugin = plugin.name(),
                        error = %e,
                        "plugin failed to initialize"
                    );
                    let name = plugin.name().to_string();
                    self.catalog.write(|state| {
                        state.failed.insert(name, e.to_string());
                    });
                }
            }
        }
        ready
    }

    /// Build a context for `text` if it is a command
    #[must_use]
    pub fn parse(&self, text: &str, platform: Platform) -> Option<CommandContext> {
        let (command, args) = parse_command(text, &self.prefix)?;
        Some(CommandContext::new(command, args, platform))
    }

    /// Route `ctx` to its plugin and return the reply, if any
    pub async fn dispatch(&self, ctx: &CommandContext) -> Option<String> {
        let &index = self.routes.get(&ctx.command)?;
        let plugin = &self.plugins[index];
        let name = plugin.name();

        if !self.catalog.is_active(name) {
            tracing::debug!(plugin = name, command = %ctx.command, "plugin inactive, ignoring");
            return None;
        }
        if !plugin.supports(ctx.platform) {
            tracing::debug!(plugin = name, platform = %ctx.platform, "platform not supported");
            return None;
        }

        tracing::info!(
            plugin = name,
            command = %ctx.command,
            sender = %ctx.sender_name,
            platform = %ctx.platform,
            "handling command"
        );

        match plugin.handle(ctx).await {
            Ok(reply) => reply,
            Err(e) => {
                tracing::error!(
                    plugin = name,
                    command = %ctx.command,
                    error = %e,
                    "command failed"
                );
                Some(format!("❌ Error processing {} command", ctx.command))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use super::*;
    use crate::{Error, Result};

    struct Fixed {
        name: &'static str,
        commands: &'static [&'static str],
        platforms: &'static [Platform],
        fail_init: bool,
    }

    #[async_trait]
    impl Plugin for Fixed {
        fn name(&self) -> &'static str {
            self.name
        }

        fn version(&self) -> &'static str {
            "1.0.0"
        }

        fn description(&self) -> &'static str {
            "test plugin"
        }

        fn commands(&self) -> &'static [&'static str] {
            self.commands
        }

        fn supports(&self, platform: Platform) -> bool {
            self.platforms.contains(&platform)
        }

        async fn initialize(&self) -> Result<()> {
            if self.fail_init {
                return Err(Error::Config("missing token".to_string()));
            }
            Ok(())
        }

        async fn handle(&self, ctx: &CommandContext) -> Result<Option<String>> {
            if ctx.command == "boom" {
                return Err(Error::HomeAssistant("unreachable".to_string()));
            }
            Ok(Some(format!("{}:{}", self.name, ctx.args_raw)))
        }
    }

    fn plugin(name: &'static str, commands: &'static [&'static str]) -> Arc<dyn Plugin> {
        Arc::new(Fixed {
            name,
            commands,
            platforms: &Platform::ALL,
            fail_init: false,
        })
    }

    async fn run(registry: &PluginRegistry, text: &str, platform: Platform) -> Option<String> {
        let ctx = registry.parse(text, platform)?;
        registry.dispatch(&ctx).await
    }

    #[tokio::test]
    async fn test_first_registration_wins() {
        let mut registry = PluginRegistry::new("!", PluginCatalog::new());
        registry.register(plugin("one", &["ping", "boom"]));
        registry.register(plugin("two", &["ping", "pong"]));

        assert_eq!(run(&registry, "!ping x", Platform::Matrix).await.as_deref(), Some("one:x"));
        assert_eq!(run(&registry, "!PONG", Platform::Matrix).await.as_deref(), Some("two:"));
        assert_eq!(run(&registry, "!nope", Platform::Matrix).await, None);
        assert_eq!(run(&registry, "ping", Platform::Matrix).await, None);
        assert_eq!(registry.catalog().routes()["ping"], "one");
    }

    #[tokio::test]
    async fn test_handler_error_becomes_reply() {
        let mut registry = PluginRegistry::new("!", PluginCatalog::new());
        registry.register(plugin("one", &["boom"]));

        assert_eq!(
            run(&registry, "!boom", Platform::Simplex).await.as_deref(),
            Some("❌ Error processing boom command")
        );
    }

    #[tokio::test]
    async fn test_disabled_failed_and_unsupported_are_skipped() {
        let mut registry = PluginRegistry::new("!", PluginCatalog::new());
        registry.register(plugin("toggle", &["t"]));
        registry.register(Arc::new(Fixed {
            name: "broken",
            commands: &["b"],
            platforms: &Platform::ALL,
            fail_init: true,
        }));
        registry.register(Arc::new(Fixed {
            name: "sx",
            commands: &["sx"],
            platforms: &[Platform::Simplex],
            fail_init: false,
        }));

        assert_eq!(registry.initialize_all().await, 2);
        assert!(registry.catalog().failed().contains_key("broken"));
        assert_eq!(run(&registry, "!b", Platform::Matrix).await, None);

        assert_eq!(run(&registry, "!sx", Platform::Matrix).await, None);
        assert!(run(&registry, "!sx", Platform::Simplex).await.is_some());

        assert!(registry.catalog().disable("toggle"));
        assert_eq!(run(&registry, "!t", Platform::Matrix).await, None);
        assert!(registry.catalog().enable("toggle"));
        assert!(run(&registry, "!t", Platform::Matrix).await.is_some());
        assert!(!registry.catalog().enable("ghost"));
    }
}
