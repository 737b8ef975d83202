//! `SimpleX` administration: invites, contacts, groups and bot admins

use std::fmt::Write as _;
use std::sync::Arc;

use async_trait::async_trait;

use crate::{Error, Result};
use crate::bot::admin::describe_commands;
use crate::bot::{AdminList, CommandContext, Platform, Plugin, PluginCatalog};
use crate::simplex::{ChatResponse, SimplexCli, find_invitation_link, parse_response};

/// Commands tried by `debug ping`
const PING_COMMANDS: [&str; 3] = ["/help", "/contacts", "/groups"];

/// Admin-only commands for bots running on `SimpleX`
pub struct SimplexPlugin {
    cli: Arc<dyn SimplexCli>,
    admins: Arc<AdminList>,
    catalog: PluginCatalog,
}

impl SimplexPlugin {
    #[must_use]
    pub fn new(cli: Arc<dyn SimplexCli>, admins: Arc<AdminList>, catalog: PluginCatalog) -> Self {
        Self {
            cli,
            admins,
            catalog,
        }
    }

    async fn invite(&self, ctx: &CommandContext) -> String {
        match ctx.arg(0).map(str::to_lowercase).as_deref() {
            None => "Invite commands:\n!invite generate - Generate a one-time connection invite"
                .to_string(),
            Some("generate") => self.generate_invite(ctx).await,
            Some(other) => format!("Unknown invite subcommand: {other}"),
        }
    }

    async fn generate_invite(&self, ctx: &CommandContext) -> String {
        ctx.progress("🔄 Generating invite...");

        let resp = match self.cli.send_command("/c").await {
            Ok(resp) => resp,
            Err(e) => {
                tracing::error!(error = %e, "invite generation failed");
                return "Failed to generate invite. Check logs for details.".to_string();
            }
        };

        let link = match parse_response(&resp) {
            Ok(ChatResponse::Invitation { link: Some(link) }) => Some(link),
            _ => find_invitation_link(&resp),
        };
        let Some(link) = link else {
            tracing::warn!(response = %resp, "no invitation link in response");
            return "Failed to generate invite. Check logs for details.".to_string();
        };

        tracing::info!(requested_by = %ctx.sender_name, "generated connection invite");
        format!(
            "🔗 One-time connection invite generated:\n\n\
             {link}\n\n\
             Share this link with the user and ask them to connect using:\n\
             /c {link}\n\n\
             This invite can be used once."
        )
    }

    async fn contacts(&self, ctx: &CommandContext) -> String {
        match ctx.arg(0).map(str::to_lowercase).as_deref() {
            None => "Contact commands:\n\
                     !contacts list - List all contacts\n\
                     !contacts info <name> - Get contact details"
                .to_string(),
            Some("list") => self.list_contacts().await,
            Some("info") => {
                let name = ctx.args_from(1);
                if name.is_empty() {
                    return "Usage: !contacts info <contact_name>".to_string();
                }
                self.contact_info(&name).await
            }
            Some(other) => format!("Unknown contacts subcommand: {other}"),
        }
    }

    async fn list_contacts(&self) -> String {
        let reply = self.cli.send_command("/contacts").await;
        let contacts = match reply.and_then(|r| parse_response(&r)) {
            Ok(ChatResponse::ContactsList { contacts }) => contacts,
            Ok(_) => return "No contacts found.".to_string(),
            Err(e) => return format!("Error sending contacts command: {e}"),
        };
        if contacts.is_empty() {
            return "No contacts found.".to_string();
        }

        let mut text = format!("📋 Bot Contacts ({} total):\n", contacts.len());
        for (i, contact) in contacts.iter().enumerate() {
            let _ = write!(text, "\n{}. {contact}", i + 1);
        }
        text
    }

    async fn contact_info(&self, name: &str) -> String {
        let resp = match self.cli.send_command(&format!("/contact {name}")).await {
            Ok(resp) => resp,
            Err(e) => return format!("Error getting contact info: {e}"),
        };

        match parse_response(&resp) {
            Ok(ChatResponse::ContactInfo { contact }) => {
                let display = contact
                    .profile
                    .as_ref()
                    .map_or(contact.local_display_name.as_str(), |p| p.display_name.as_str());
                format!(
                    "👤 **Contact: {}**\n\n\
                     • Display name: {display}\n\
                     • Status: {}\n\
                     • Connection: {}\n\
                     • Created: {}",
                    contact.local_display_name,
                    contact.contact_status.as_deref().unwrap_or("unknown"),
                    contact.connection_status(),
                    contact.created_at.as_deref().unwrap_or("unknown")
                )
            }
            Ok(ChatResponse::ChatCmdError { .. }) | Err(Error::Simplex(_)) => {
                format!("Contact '{name}' not found.")
            }
            Err(e) => {
                tracing::warn!(contact = name, error = %e, "unreadable contact info response");
                format!("Failed to get info for contact '{name}'.")
            }
            Ok(_) => format!("Failed to get info for contact '{name}'."),
        }
    }

    async fn groups(&self, ctx: &CommandContext) -> String {
        let sub = ctx.arg(0).map(str::to_lowercase);
        let name = ctx.args_from(1);

        match sub.as_deref() {
            None => "Group commands:\n\
                     !groups list - List all groups\n\
                     !groups info <name> - Get group details\n\
                     !groups invite <name> - Generate group invite link"
                .to_string(),
            Some("list") => self.list_groups().await,
            Some("info") if name.is_empty() => "Usage: !groups info <group_name>".to_string(),
            Some("info") => self.group_info(&name).await,
            Some("invite") if name.is_empty() => "Usage: !groups invite <group_name>".to_string(),
            Some("invite") => self.group_invite(&name).await,
            Some(other) => format!("Unknown groups subcommand: {other}"),
        }
    }

    async fn list_groups(&self) -> String {
        let reply = self.cli.send_command("/groups").await;
        let groups = match reply.and_then(|r| parse_response(&r)) {
            Ok(ChatResponse::GroupsList { groups }) => groups,
            Ok(_) => return "No groups found.".to_string(),
            Err(e) => return format!("Error sending groups command: {e}"),
        };
        if groups.is_empty() {
            return "No groups found.".to_string();
        }

        let mut text = format!("📋 Bot Groups ({} total):\n", groups.len());
        for (i, group) in groups.iter().enumerate() {
            let _ = write!(text, "\n{}. {} (Role: {})", i + 1, group.display_name, group.role());
        }
        text
    }

    async fn group_info(&self, name: &str) -> String {
        let resp = match self.cli.send_command(&format!("/group {name}")).await {
            Ok(resp) => resp,
            Err(e) => return format!("Error getting group info: {e}"),
        };

        match parse_response(&resp) {
            Ok(ChatResponse::GroupInfo { group }) => format!(
                "👥 **Group: {}**\n\n\
                 • Description: {}\n\
                 • Your role: {}\n\
                 • Created: {}",
                group.display_name,
                group.description.as_deref().unwrap_or("none"),
                group.role(),
                group.created_at.as_deref().unwrap_or("unknown")
            ),
            Ok(ChatResponse::ChatCmdError { .. }) | Err(Error::Simplex(_)) => {
                format!("Group '{name}' not found.")
            }
            Err(e) => {
                tracing::warn!(group = name, error = %e, "unreadable group info response");
                format!("Failed to get info for group '{name}'.")
            }
            Ok(_) => format!("Failed to get info for group '{name}'."),
        }
    }

    async fn group_invite(&self, name: &str) -> String {
        let resp = match self.cli.send_command(&format!("/g {name} /add")).await {
            Ok(resp) => resp,
            Err(e) => return format!("Error generating group invite: {e}"),
        };

        match find_invitation_link(&resp) {
            Some(link) => format!(
                "🔗 Group invite generated for '{name}':\n\n\
                 {link}\n\n\
                 Share this link to invite users to the group.\n\
                 Note: Group invite permissions depend on your role in the group."
            ),
            None => format!(
                "Failed to generate invite for group '{name}'. Check if you have permission to invite members."
            ),
        }
    }

    async fn debug(&self, ctx: &CommandContext) -> String {
        match ctx.arg(0).map(str::to_lowercase).as_deref() {
            None => "Debug commands:\n\
                     !debug websocket - Test WebSocket connection\n\
                     !debug ping - Send test ping to SimpleX CLI"
                .to_string(),
            Some("websocket") => {
                let connected = match self.cli.send_command("/help").await {
                    Ok(_) => "✅ Yes".to_string(),
                    Err(e) => format!("❌ No ({e})"),
                };
                format!(
                    "🔌 WebSocket Debug Info:\nURL: {}\nConnected: {connected}",
                    self.cli.endpoint()
                )
            }
            Some("ping") => {
                let mut working = Vec::new();
                for cmd in PING_COMMANDS {
                    match self.cli.send_command(cmd).await {
                        Ok(_) => working.push(cmd),
                        Err(e) => tracing::debug!(cmd, error = %e, "ping command failed"),
                    }
                }
                if working.is_empty() {
                    "🏓 CLI not responding to any test commands".to_string()
                } else {
                    format!("🏓 CLI responding! Working commands: {}", working.join(", "))
                }
            }
            Some(other) => format!("Unknown debug subcommand: {other}"),
        }
    }

    fn admin(&self, ctx: &CommandContext) -> String {
        let sub = ctx.arg(0).map(str::to_lowercase);
        let user = ctx.arg(1);

        match (sub.as_deref(), user) {
            (None, _) => "Admin commands:\n\
                          !admin list - List all admins\n\
                          !admin add <username> - Add admin with full permissions\n\
                          !admin remove <username> - Remove admin\n\
                          !admin permissions <username> - Show user permissions"
                .to_string(),
            (Some("list"), _) => {
                let admins = self.admins.list();
                if admins.is_empty() {
                    return "No admins configured.".to_string();
                }
                let lines: Vec<String> = admins
                    .iter()
                    .map(|(name, commands)| format!("• {name}: {}", describe_commands(commands)))
                    .collect();
                format!("Current admins:\n{}", lines.join("\n"))
            }
            (Some("add"), None) => "Usage: !admin add <username>".to_string(),
            (Some("add"), Some(user)) => {
                if self.admins.add(user) {
                    format!("Added {user} as admin with full permissions.")
                } else {
                    format!("Failed to add {user} as admin.")
                }
            }
            (Some("remove"), None) => "Usage: !admin remove <username>".to_string(),
            (Some("remove"), Some(user)) if user == ctx.sender_name => {
                "You cannot remove yourself as admin.".to_string()
            }
            (Some("remove"), Some(user)) => {
                if self.admins.remove(user) {
                    format!("Removed {user} from admins.")
                } else {
                    format!("Failed to remove {user} or user not found.")
                }
            }
            (Some("permissions"), None) => "Usage: !admin permissions <username>".to_string(),
            (Some("permissions"), Some(user)) => {
                let perms = self.admins.permissions(user);
                if perms.is_admin {
                    format!(
                        "User {user} is an admin with permissions: {}",
                        describe_commands(&perms.admin_commands)
                    )
                } else {
                    format!(
                        "User {user} is not an admin. Can only run public commands: {}",
                        perms.public_commands.join(", ")
                    )
                }
            }
            (Some(other), _) => format!("Unknown admin subcommand: {other}"),
        }
    }

    async fn stats(&self) -> String {
        let connected = if self.cli.send_command("/help").await.is_ok() {
            "✅ Yes"
        } else {
            "❌ No"
        };

        format!(
            "📊 **SimpleX Bot Statistics**\n\n\
             **WebSocket Status:**\n\
             • Connected: {connected}\n\
             • URL: {}\n\n\
             **Plugin Status:**\n\
             • Loaded Plugins: {}\n\
             • Failed Plugins: {}\n\n\
             **Admin Status:**\n\
             • Total Admins: {}",
            self.cli.endpoint(),
            self.catalog.plugins().len(),
            self.catalog.failed().len(),
            self.admins.len()
        )
    }
}

#[async_trait]
impl Plugin for SimplexPlugin {
    fn name(&self) -> &'static str {
        "simplex"
    }

    fn version(&self) -> &'static str {
        "1.0.0"
    }

    fn description(&self) -> &'static str {
        "SimpleX-specific administration (invites, contacts, groups, admins)"
    }

    fn commands(&self) -> &'static [&'static str] {
        &["invite", "contacts", "groups", "debug", "admin", "stats"]
    }

    fn supports(&self, platform: Platform) -> bool {
        platform == Platform::Simplex
    }

    async fn handle(&self, ctx: &CommandContext) -> Result<Option<String>> {
        let denied = match ctx.command.as_str() {
            "invite" => "manage invites",
            "contacts" => "list contacts",
            "groups" => "list groups",
            "debug" => "use debug commands",
            "admin" => "use admin commands",
            "stats" => "view stats",
            _ => return Ok(None),
        };
        if !self.admins.can_run(&ctx.sender_name, &ctx.command) {
            tracing::warn!(user = %ctx.sender_name, command = %ctx.command, "non-admin rejected");
            return Ok(Some(format!("Access denied. Only admins can {denied}.")));
        }

        let reply = match ctx.command.as_str() {
            "invite" => self.invite(ctx).await,
            "contacts" => self.contacts(ctx).await,
            "groups" => self.groups(ctx).await,
            "debug" => self.debug(ctx).await,
            "admin" => self.admin(ctx),
            _ => self.stats().await,
        };
        Ok(Some(reply))
    }
}
