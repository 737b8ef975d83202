//! YouTube summaries and follow-up questions

use std::fmt::Write as _;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::Mutex;

use crate::bot::{CommandContext, Plugin};
use crate::llm::{CallParams, ModelCaller, call_with_fallback};
use crate::summarize::{SummarizationPipeline, prompts};
use crate::youtube::{
    TranscriptCache, TranscriptSource, YouTubeConfig, extract_video_request, truncate_transcript,
};
use crate::{Error, Result};

const MISSING_KEY: &str =
    "❌ YouTube summary feature requires OPENROUTER_API_KEY in environment variables";
const NO_RECENT_VIDEO: &str =
    "❌ No recent YouTube video found. Please process a video first with `!youtube <url>`";

/// `youtube`, `summary` and `ytconfig`
pub struct YouTubePlugin {
    caller: Option<Arc<dyn ModelCaller>>,
    pipeline: Option<SummarizationPipeline>,
    source: Arc<dyn TranscriptSource>,
    cache: Mutex<TranscriptCache>,
    config: YouTubeConfig,
}

impl YouTubePlugin {
    /// Create the plugin
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfiguration`] when the summarization
    /// settings are unusable
    pub fn new(
        caller: Option<Arc<dyn ModelCaller>>,
        source: Arc<dyn TranscriptSource>,
        config: YouTubeConfig,
    ) -> Result<Self> {
        let pipeline = caller
            .clone()
            .map(|c| SummarizationPipeline::new(c, config.summarization.clone()))
            .transpose()?;
        let cache = TranscriptCache::new(
            config.cache.max_cached_per_room,
            config.cache.expiry_hours,
        );

        Ok(Self {
            caller,
            pipeline,
            source,
            cache: Mutex::new(cache),
            config,
        })
    }

    fn progress(&self, ctx: &CommandContext, message: &str) {
        if self.config.features.show_progress {
            ctx.progress(message);
        }
    }

    async fn youtube(&self, ctx: &CommandContext) -> String {
        if !ctx.has_args() {
            return help_text();
        }

        let Some(request) = extract_video_request(&ctx.args_raw) else {
            return self.ask_last_video(ctx, ctx.args_raw.trim()).await;
        };
        let Some(pipeline) = &self.pipeline else {
            return MISSING_KEY.to_string();
        };

        self.progress(ctx, "🔄 Extracting subtitles from YouTube video...");
        let video = match self.source.fetch(&request.url).await {
            Ok(video) => video,
            Err(Error::Subtitle(reason)) => {
                tracing::warn!(url = %request.url, reason = %reason, "no transcript");
                return "❌ No subtitles found for this video. The video might not have subtitles or be unavailable."
                    .to_string();
            }
            Err(e) => {
                tracing::error!(url = %request.url, error = %e, "transcript fetch failed");
                return format!("❌ Error processing YouTube video: {e}");
            }
        };

        if self.config.features.caching_enabled {
            self.cache
                .lock()
                .await
                .insert(&ctx.chat_id, &request.url, &video.title, &video.transcript);
        }

        if let Some(question) = &request.question {
            let answer = self.answer(&video.title, question, &video.transcript).await;
            return format!("📺 **{}**\n\n**Q:** {question}\n\n**A:** {answer}", video.title);
        }

        if !self.config.features.ai_summarization {
            return format!(
                "📺 **{}**\n\nTranscript extracted ({} characters). AI summarization is disabled.",
                video.title,
                video.transcript.chars().count()
            );
        }

        self.progress(ctx, "🤖 Generating summary using AI...");
        match pipeline.summarize(&video.transcript, &video.title).await {
            Ok(summary) => format!(
                "📺 **{}**\n\n**Summary:**\n{summary}\n\n💡 Ask questions about this video using: `!youtube <your question>`",
                video.title
            ),
            Err(e) => {
                tracing::error!(url = %request.url, error = %e, "summarization failed");
                "❌ Failed to generate summary. Please try again later.".to_string()
            }
        }
    }

    async fn summary(&self, ctx: &CommandContext) -> String {
        if !ctx.has_args() {
            let cache = self.cache.lock().await;
            return match cache.last_video(&ctx.chat_id) {
                Some(video) => format!(
                    "📺 **Last processed video:** {}\n\n💡 Ask questions with: `!summary <your question>`",
                    video.title
                ),
                None => NO_RECENT_VIDEO.to_string(),
            };
        }
        self.ask_last_video(ctx, ctx.args_raw.trim()).await
    }

    async fn ask_last_video(&self, ctx: &CommandContext, question: &str) -> String {
        let last = {
            let cache = self.cache.lock().await;
            if cache.last_video_url(&ctx.chat_id).is_none() {
                return NO_RECENT_VIDEO.to_string();
            }
            cache.last_video(&ctx.chat_id).cloned()
        };

        let Some(video) = last else {
            return "❌ Transcript not found for the last video. Please process a video again."
                .to_string();
        };

        let answer = self.answer(&video.title, question, &video.transcript).await;
        format!("**Q:** {question}\n\n**A:** {answer}")
    }

    async fn answer(&self, title: &str, question: &str, transcript: &str) -> String {
        if !self.config.features.qa_enabled {
            return "❌ Video Q&A is disabled".to_string();
        }
        let Some(caller) = &self.caller else {
            return "❌ AI features require OPENROUTER_API_KEY".to_string();
        };

        let qa = &self.config.qa;
        let excerpt = truncate_transcript(transcript, qa.max_transcript_length);
        let prompt = prompts::question(title, question, &excerpt);
        let params = CallParams {
            max_tokens: qa.max_tokens,
            temperature: qa.temperature,
            timeout: Duration::from_secs(self.config.summarization.call_timeout_secs),
        };

        call_with_fallback(caller.as_ref(), &qa.models, &prompt, params, "qa")
            .await
            .unwrap_or_else(|| "❌ Failed to process question with AI".to_string())
    }

    fn ytconfig(&self, ctx: &CommandContext) -> Result<String> {
        match ctx.arg(0).map(str::to_lowercase).as_deref() {
            None | Some("help") => Ok(config_help()),
            Some("show") => {
                let rendered = toml::to_string_pretty(&self.config)
                    .map_err(|e| Error::Config(format!("failed to render configuration: {e}")))?;
                Ok(format!("⚙️ **YouTube Plugin Configuration**\n\n```toml\n{rendered}```"))
            }
            Some("get") => {
                let Some(path) = ctx.arg(1) else {
                    return Ok("❌ Usage: `!ytconfig get <setting>`".to_string());
                };
                let tree = serde_json::to_value(&self.config)?;
                Ok(match lookup_setting(&tree, path) {
                    Some(Value::String(s)) => format!("⚙️ `{path}` = {s}"),
                    Some(value) => format!("⚙️ `{path}` = {value}"),
                    None => format!("❌ Setting '{path}' not found"),
                })
            }
            Some("models") => Ok(self.models()),
            Some(other) => Ok(format!("❌ Unknown ytconfig command: {other}\n\n{}", config_help())),
        }
    }

    fn models(&self) -> String {
        let models = &self.config.summarization.models;
        let mut text = "🤖 **YouTube AI Models**\n".to_string();
        for (label, list) in [
            ("Single-pass summary", &models.single_pass),
            ("Chunk summaries", &models.chunk),
            ("Final merge", &models.merge),
            ("Q&A", &self.config.qa.models),
        ] {
            let _ = write!(text, "\n**{label}:**\n");
            for (i, model) in list.iter().enumerate() {
                let _ = writeln!(text, "{}. `{model}`", i + 1);
            }
        }
        text.push_str("\nModels are tried in order until one responds.");
        text
    }
}

/// Walk a dotted path such as `summarization.chunk_size`
fn lookup_setting<'a>(tree: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.')
        .try_fold(tree, |node, key| node.get(key))
}

fn help_text() -> String {
    "📺 **YouTube Plugin Help**\n\n\
     **Commands:**\n\
     • `!youtube <url>` - Summarize a YouTube video\n\
     • `!yt <url>` - Alias for youtube command\n\
     • `!youtube <url> <question>` - Ask a question about a video\n\
     • `!youtube <question>` - Ask a question about the last processed video\n\
     • `!summary` - Show info about last processed video\n\
     • `!summary <question>` - Ask a question about the last video\n\
     • `!ytconfig` - Show YouTube plugin settings\n\n\
     **Examples:**\n\
     • `!youtube https://youtube.com/watch?v=...` - Get video summary\n\
     • `!youtube What are the main points?` - Ask about last video\n\
     • `!summary How long is the video?` - Ask specific question\n\n\
     **Requirements:** OPENROUTER_API_KEY environment variable required for AI features."
        .to_string()
}

fn config_help() -> String {
    "⚙️ **YouTube Configuration Commands**\n\n\
     • `!ytconfig show` - Show current configuration\n\
     • `!ytconfig get <setting>` - Get specific setting value\n\
     • `!ytconfig models` - Show configured AI models\n\n\
     **Examples:**\n\
     • `!ytconfig get summarization.chunk_size`\n\
     • `!ytconfig get features.show_progress`"
        .to_string()
}

#[async_trait]
impl Plugin for YouTubePlugin {
    fn name(&self) -> &'static str {
        "youtube"
    }

    fn version(&self) -> &'static str {
        "2.0.0"
    }

    fn description(&self) -> &'static str {
        "YouTube video summarization and Q&A"
    }

    fn commands(&self) -> &'static [&'static str] {
        &["youtube", "yt", "video", "summary", "ytconfig"]
    }

    async fn initialize(&self) -> Result<()> {
        if self.caller.is_none() {
            tracing::warn!("OPENROUTER_API_KEY not set, YouTube summaries unavailable");
        }
        Ok(())
    }

    async fn handle(&self, ctx: &CommandContext) -> Result<Option<String>> {
        let reply = match ctx.command.as_str() {
            "youtube" | "yt" | "video" => self.youtube(ctx).await,
            "summary" => self.summary(ctx).await,
            "ytconfig" => self.ytconfig(ctx)?,
            _ => return Ok(None),
        };
        Ok(Some(reply))
    }
}
