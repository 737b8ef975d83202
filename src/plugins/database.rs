//! Database service health and statistics

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;

use crate::Result;
use crate::bot::{CommandContext, Plugin};
use crate::database::{DatabaseApi, StatValue};

/// `db health` and `db stats`
pub struct DatabasePlugin {
    api: Option<Arc<dyn DatabaseApi>>,
    available: AtomicBool,
}

impl DatabasePlugin {
    #[must_use]
    pub fn new(api: Option<Arc<dyn DatabaseApi>>) -> Self {
        Self {
            available: AtomicBool::new(api.is_some()),
            api,
        }
    }

    async fn health(api: &dyn DatabaseApi) -> String {
        match api.health().await {
            Ok(true) => "✅ Database is healthy!".to_string(),
            Ok(false) => "❌ Database is unhealthy".to_string(),
            Err(e) => format!("❌ Database health check failed: {e}"),
        }
    }

    async fn stats(api: &dyn DatabaseApi) -> String {
        fn show(value: Option<&StatValue>) -> String {
            value.map_or_else(|| "Unknown".to_string(), ToString::to_string)
        }

        match api.stats().await {
            Ok(stats) => format!(
                "📊 **DATABASE STATISTICS**\n\n\
                 💬 Total Messages: {}\n\
                 📎 Total Media Files: {}\n\
                 💾 Database Size: {}",
                show(stats.total_messages.as_ref()),
                show(stats.total_media_files.as_ref()),
                show(stats.database_size.as_ref())
            ),
            Err(e) => format!("❌ Database stats failed: {e}"),
        }
    }
}

#[async_trait]
impl Plugin for DatabasePlugin {
    fn name(&self) -> &'static str {
        "database"
    }

    fn version(&self) -> &'static str {
        "1.0.0"
    }

    fn description(&self) -> &'static str {
        "Database service health and statistics"
    }

    fn commands(&self) -> &'static [&'static str] {
        &["db"]
    }

    async fn initialize(&self) -> Result<()> {
        let Some(api) = &self.api else {
            tracing::warn!("database API key not configured, database features disabled");
            return Ok(());
        };

        match api.health().await {
            Ok(true) => tracing::info!("database service reachable"),
            Ok(false) => {
                tracing::error!("database health check failed, database features disabled");
                self.available.store(false, Ordering::Relaxed);
            }
            Err(e) => {
                tracing::error!(error = %e, "database unreachable, database features disabled");
                self.available.store(false, Ordering::Relaxed);
            }
        }
        Ok(())
    }

    async fn handle(&self, ctx: &CommandContext) -> Result<Option<String>> {
        let api = match &self.api {
            Some(api) if self.available.load(Ordering::Relaxed) => api,
            _ => return Ok(Some("❌ Database functionality not available".to_string())),
        };

        let reply = match ctx.args_raw.as_str() {
            "health" => Self::health(api.as_ref()).await,
            "stats" | "status" => Self::stats(api.as_ref()).await,
            _ => "❌ Unknown database command. Use 'db health', 'db stats', or 'db status'"
                .to_string(),
        };
        Ok(Some(reply))
    }
}
