//! Built-in commands: help, status and plugin management

use std::collections::BTreeMap;
use std::fmt::Write as _;

use async_trait::async_trait;
use chrono::{Local, TimeDelta};

use crate::Result;
use crate::bot::{CommandContext, Platform, Plugin, PluginCatalog};

/// Name of the plugin that can never be disabled
pub const CORE_PLUGIN: &str = "core";

/// Essential commands available on every platform
pub struct CorePlugin {
    catalog: PluginCatalog,
    prefix: String,
    simplex_url: Option<String>,
}

impl CorePlugin {
    /// Create the plugin over the registry's catalog
    #[must_use]
    pub fn new(catalog: PluginCatalog, prefix: impl Into<String>) -> Self {
        Self {
            catalog,
            prefix: prefix.into(),
            simplex_url: None,
        }
    }

    /// Mention the `SimpleX` CLI endpoint in platform and info output
    #[must_use]
    pub fn with_simplex_url(mut self, url: impl Into<String>) -> Self {
        self.simplex_url = Some(url.into());
        self
    }

    fn uptime(&self) -> String {
        format_uptime(Local::now() - self.catalog.started_at())
    }

    fn help(&self, ctx: &CommandContext) -> String {
        let p = &self.prefix;
        let mut text = format!(
            "🤖 **Bot Help - {} Platform**\n\n\
             **Core Commands:**\n\
             • `{p}help` - Show this help message\n\
             • `{p}status` - Show bot status and health\n\
             • `{p}ping` - Test bot responsiveness\n\
             • `{p}uptime` - Show how long bot has been running\n\
             • `{p}plugins` - List all loaded plugins\n\
             • `{p}commands` - List all available commands\n\
             • `{p}platform` - Show platform information\n\
             • `{p}info` - Show detailed bot information\n\n\
             **Plugin Management:**\n\
             • `{p}enable <plugin>` - Enable a plugin\n\
             • `{p}disable <plugin>` - Disable a plugin\n\n\
             **Available Plugins:**",
            ctx.platform.title()
        );

        for plugin in self.catalog.plugins() {
            if plugin.name == CORE_PLUGIN || !plugin.enabled {
                continue;
            }
            let _ = write!(
                text,
                "\n\n**{} Plugin** (v{}):\n*{}*\nCommands: {}",
                title_case(&plugin.name),
                plugin.version,
                plugin.description,
                self.command_list(plugin.commands.iter())
            );
        }

        let _ = write!(
            text,
            "\n\n💡 **Tips:**\n\
             • All commands start with `{p}`\n\
             • Use `{p}help` anytime for this message"
        );
        text
    }

    fn status(&self, ctx: &CommandContext) -> String {
        let plugins = self.catalog.plugins();
        let failed = self.catalog.failed();
        let enabled = plugins.iter().filter(|p| p.enabled).count();

        let mut text = format!(
            "🤖 **Bot Status - {platform}**\n\n\
             **Health:** ✅ Online and responsive\n\
             **Uptime:** {uptime}\n\
             **Platform:** {platform}\n\
             **Core Plugin:** v{version}\n\n\
             **Plugin Status:**\n\
             • **Loaded:** {loaded} plugins\n\
             • **Enabled:** {enabled} plugins\n\
             • **Failed:** {failed_count} plugins",
            platform = ctx.platform.title(),
            uptime = self.uptime(),
            version = self.version(),
            loaded = plugins.len(),
            failed_count = failed.len(),
        );

        if !failed.is_empty() {
            text.push_str("\n\n**Failed Plugins:**");
            for (name, error) in &failed {
                let _ = write!(text, "\n• `{name}`: {}", truncate(error, 100));
            }
        }

        if ctx.platform == Platform::Simplex {
            if let Some(url) = &self.simplex_url {
                let _ = write!(text, "\n\n**SimpleX Status:**\n• WebSocket: {url}");
            }
        }
        text
    }

    fn plugins(&self, ctx: &CommandContext) -> String {
        let plugins = self.catalog.plugins();
        let failed = self.catalog.failed();

        let mut text = format!(
            "🔌 **Plugin Status - {}**\n\n\
             **Summary:**\n\
             • Loaded: {}\n\
             • Failed: {}\n\n\
             **Loaded Plugins:**",
            ctx.platform.title(),
            plugins.len(),
            failed.len()
        );

        for plugin in &plugins {
            let icon = if plugin.enabled { "🟢" } else { "🔴" };
            let _ = write!(
                text,
                "\n{icon} **{}** v{}\n   *{}*\n   Commands: {}\n",
                plugin.name,
                plugin.version,
                plugin.description,
                self.command_list(plugin.commands.iter())
            );
        }

        if !failed.is_empty() {
            text.push_str("\n**Failed Plugins:**");
            for (name, error) in &failed {
                let _ = write!(text, "\n❌ **{name}**: {}", truncate(error, 100));
            }
        }
        text
    }

    fn commands(&self, ctx: &CommandContext) -> String {
        let mut by_plugin: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for (command, plugin) in self.catalog.routes() {
            by_plugin.entry(plugin).or_default().push(command);
        }

        let mut text = format!("📝 **Available Commands - {}**\n\n", ctx.platform.title());
        for (plugin, commands) in &by_plugin {
            let _ = write!(
                text,
                "**{} Plugin:**\n{}\n\n",
                title_case(plugin),
                self.command_list(commands.iter())
            );
        }
        let _ = write!(text, "💡 Use `{}help` for detailed command descriptions.", self.prefix);
        text
    }

    fn enable(&self, ctx: &CommandContext) -> String {
        let Some(name) = ctx.arg(0) else {
            return format!(
                "❓ **Enable Plugin**\n\nUsage: `{p}enable <plugin_name>`\nExample: `{p}enable ai`",
                p = self.prefix
            );
        };
        if self.catalog.enable(name) {
            format!("✅ Plugin '{name}' enabled")
        } else {
            format!("❌ Plugin '{name}' not found")
        }
    }

    fn disable(&self, ctx: &CommandContext) -> String {
        let Some(name) = ctx.arg(0) else {
            return format!(
                "❓ **Disable Plugin**\n\nUsage: `{p}disable <plugin_name>`\nExample: `{p}disable ai`",
                p = self.prefix
            );
        };
        if name == CORE_PLUGIN {
            return "❌ Cannot disable core plugin".to_string();
        }
        if self.catalog.disable(name) {
            format!("⏸️ Plugin '{name}' disabled")
        } else {
            format!("❌ Plugin '{name}' not found")
        }
    }

    fn platform(&self, ctx: &CommandContext) -> String {
        let mut text = format!(
            "🌐 **Platform Information**\n\n\
             **Current Platform:** {}\n\
             **User ID:** {}\n\
             **Chat ID:** {}\n\
             **Display Name:** {}\n",
            ctx.platform.title(),
            ctx.sender_id,
            ctx.chat_id,
            ctx.sender_name
        );

        match ctx.platform {
            Platform::Simplex => {
                let _ = write!(
                    text,
                    "\n**SimpleX Features:**\n\
                     • End-to-end encrypted messaging\n\
                     • No central servers or user databases\n\
                     • XFTP for file transfers\n\
                     • Contact-based communication\n\n\
                     **Bot Configuration:**\n\
                     • WebSocket URL: {}",
                    self.simplex_url.as_deref().unwrap_or("N/A")
                );
            }
            Platform::Matrix => text.push_str(
                "\n**Matrix Features:**\n\
                 • Federated network\n\
                 • Room-based communication\n\
                 • Rich media and formatting support\n\
                 • End-to-end encryption support",
            ),
        }
        text
    }

    fn info(&self, ctx: &CommandContext) -> String {
        format!(
            "ℹ️ **Bot Information**\n\n\
             **Basic Info:**\n\
             • Platform: {}\n\
             • Core Version: {}\n\
             • Started: {}\n\
             • Uptime: {}\n\n\
             **User Context:**\n\
             • Your ID: {}\n\
             • Display Name: {}\n\
             • Chat ID: {}\n\n\
             **Plugin System:**\n\
             • Loaded Plugins: {}\n\
             • Failed Plugins: {}\n\
             • Total Commands: {}",
            ctx.platform.title(),
            self.version(),
            self.catalog.started_at().format("%Y-%m-%d %H:%M:%S"),
            self.uptime(),
            ctx.sender_id,
            ctx.sender_name,
            ctx.chat_id,
            self.catalog.plugins().len(),
            self.catalog.failed().len(),
            self.catalog.routes().len()
        )
    }

    fn command_list<'a>(&self, commands: impl Iterator<Item = &'a String>) -> String {
        commands
            .map(|c| format!("`{}{c}`", self.prefix))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Render a duration like `1 day, 2:03:04`
#[must_use]
pub fn format_uptime(elapsed: TimeDelta) -> String {
    let total = elapsed.num_seconds().max(0);
    let days = total / 86_400;
    let hours = (total % 86_400) / 3_600;
    let minutes = (total % 3_600) / 60;
    let seconds = total % 60;

    let clock = format!("{hours}:{minutes:02}:{seconds:02}");
    match days {
        0 => clock,
        1 => format!("1 day, {clock}"),
        n => format!("{n} days, {clock}"),
    }
}

fn title_case(name: &str) -> String {
    let mut chars = name.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars).collect()
    })
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let cut: String = text.chars().take(max_chars).collect();
    format!("{cut}...")
}

#[async_trait]
impl Plugin for CorePlugin {
    fn name(&self) -> &'static str {
        CORE_PLUGIN
    }

    fn version(&self) -> &'static str {
        "2.0.0"
    }

    fn description(&self) -> &'static str {
        "Core bot commands (help, status, ping, plugin management)"
    }

    fn commands(&self) -> &'static [&'static str] {
        &[
            "help", "ping", "status", "uptime", "plugins", "enable", "disable", "platform",
            "commands", "info",
        ]
    }

    async fn handle(&self, ctx: &CommandContext) -> Result<Option<String>> {
        let reply = match ctx.command.as_str() {
            "help" => self.help(ctx),
            "ping" => format!("🏓 Pong! Bot is responsive on {}.", ctx.platform),
            "status" => self.status(ctx),
            "uptime" => format!(
                "⏰ **Bot Uptime:** {}\n*Started: {}*",
                self.uptime(),
                self.catalog.started_at().format("%Y-%m-%d %H:%M:%S")
            ),
            "plugins" => self.plugins(ctx),
            "commands" => self.commands(ctx),
            "enable" => self.enable(ctx),
            "disable" => self.disable(ctx),
            "platform" => self.platform(ctx),
            "info" => self.info(ctx),
            _ => return Ok(None),
        };
        Ok(Some(reply))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_uptime() {
        assert_eq!(format_uptime(TimeDelta::seconds(59)), "0:00:59");
        assert_eq!(format_uptime(TimeDelta::seconds(3_723)), "1:02:03");
        assert_eq!(format_uptime(TimeDelta::seconds(90_061)), "1 day, 1:01:01");
        assert_eq!(format_uptime(TimeDelta::seconds(3 * 86_400)), "3 days, 0:00:00");
        assert_eq!(format_uptime(TimeDelta::seconds(-5)), "0:00:00");
    }

    #[test]
    fn test_helpers() {
        assert_eq!(title_case("homeassistant"), "Homeassistant");
        assert_eq!(title_case(""), "");
        assert_eq!(truncate("abcdef", 3), "abc...");
        assert_eq!(truncate("abc", 3), "abc");
    }
}
