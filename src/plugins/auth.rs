//! Room PIN issuing and verification

use std::sync::Arc;

use async_trait::async_trait;

use crate::Result;
use crate::bot::{CommandContext, Plugin};
use crate::database::{DatabaseApi, RoomUser};

/// PIN authentication for database access
pub struct AuthPlugin {
    api: Option<Arc<dyn DatabaseApi>>,
}

impl AuthPlugin {
    #[must_use]
    pub fn new(api: Option<Arc<dyn DatabaseApi>>) -> Self {
        Self { api }
    }

    async fn request_pin(&self, ctx: &CommandContext) -> String {
        let Some(api) = &self.api else {
            return "❌ Authentication service not configured. Contact the bot administrator."
                .to_string();
        };

        let who = room_user(ctx);
        match api.request_pin(&who).await {
            Ok(grant) => format!(
                "🔐 **PIN Request Successful**\n\n\
                 A new PIN has been generated for this room.\n\n\
                 **PIN:** `{}`\n\
                 **Valid for:** {}\n\n\
                 Use this PIN to access database features.\n\
                 Keep this PIN secure and don't share it publicly.",
                grant.pin,
                grant.validity.as_deref().unwrap_or("24 hours")
            ),
            Err(e) => {
                tracing::error!(room = %ctx.chat_id, error = %e, "PIN request failed");
                "❌ Failed to generate PIN. Please try again later.".to_string()
            }
        }
    }

    /// Whether the sender already verified a PIN for this room
    pub async fn is_authenticated(&self, ctx: &CommandContext) -> bool {
        let Some(api) = &self.api else {
            return false;
        };
        api.check_auth(&room_user(ctx)).await.unwrap_or_else(|e| {
            tracing::error!(room = %ctx.chat_id, error = %e, "auth check failed");
            false
        })
    }

    async fn verify(&self, ctx: &CommandContext) -> String {
        let Some(pin) = ctx.arg(0) else {
            if self.is_authenticated(ctx).await {
                return format!("✅ {} is already authenticated in this room.", ctx.sender_name);
            }
            return "🔐 **PIN Verification**\n\n\
                    Usage: `!auth <pin>` or `!verify <pin>`\n\n\
                    Enter the PIN provided by the pin request command to verify access."
                .to_string();
        };
        let Some(api) = &self.api else {
            return "❌ Authentication service not configured.".to_string();
        };

        match api.verify_pin(&room_user(ctx), pin).await {
            Ok(true) => format!(
                "✅ **Authentication Successful**\n\n\
                 PIN verified for this room.\n\
                 You now have access to authenticated database features.\n\n\
                 **User:** {}\n\
                 **Room:** {}",
                ctx.sender_name, ctx.chat_id
            ),
            Ok(false) => "❌ Invalid PIN. Please check the PIN and try again.".to_string(),
            Err(e) => {
                tracing::error!(room = %ctx.chat_id, error = %e, "PIN verification failed");
                "❌ Error verifying authentication.".to_string()
            }
        }
    }
}

fn room_user(ctx: &CommandContext) -> RoomUser<'_> {
    RoomUser {
        room_id: &ctx.chat_id,
        user_name: &ctx.sender_name,
        platform: ctx.platform.as_str(),
    }
}

#[async_trait]
impl Plugin for AuthPlugin {
    fn name(&self) -> &'static str {
        "auth"
    }

    fn version(&self) -> &'static str {
        "2.0.0"
    }

    fn description(&self) -> &'static str {
        "PIN authentication for database access - Request PINs for rooms"
    }

    fn commands(&self) -> &'static [&'static str] {
        &["pin", "request", "auth", "verify"]
    }

    async fn initialize(&self) -> Result<()> {
        if self.api.is_none() {
            tracing::warn!("DATABASE_API_KEY not configured, auth commands are limited");
        }
        Ok(())
    }

    async fn handle(&self, ctx: &CommandContext) -> Result<Option<String>> {
        let reply = match ctx.command.as_str() {
            "pin" | "request" => self.request_pin(ctx).await,
            "auth" | "verify" => self.verify(ctx).await,
            _ => return Ok(None),
        };
        Ok(Some(reply))
    }
}
