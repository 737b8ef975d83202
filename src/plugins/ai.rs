//! Prompt commands: magic 8-ball, advice, verses, songs and free questions

use std::sync::Arc;

use async_trait::async_trait;

use crate::Result;
use crate::bot::{CommandContext, Plugin};
use crate::llm::{ModelCaller, OpenRouterConfig};
use crate::nist::{RandomnessSource, ReadingSource, read_polarity};

const MISSING_KEY: &str = "❌ AI features require OPENROUTER_API_KEY environment variable";

/// Prompt-based commands backed by a chat model
pub struct AiPlugin {
    caller: Option<Arc<dyn ModelCaller>>,
    model: String,
    temperature: f32,
    beacon: Arc<dyn RandomnessSource>,
}

impl AiPlugin {
    /// Create the plugin; without a caller every model command explains the
    /// missing key
    #[must_use]
    pub fn new(
        caller: Option<Arc<dyn ModelCaller>>,
        config: &OpenRouterConfig,
        beacon: Arc<dyn RandomnessSource>,
    ) -> Self {
        Self {
            caller,
            model: config.model.clone(),
            temperature: config.temperature,
            beacon,
        }
    }

    async fn complete(&self, prompt: &str, max_tokens: u32) -> Option<Result<String>> {
        let caller = self.caller.as_ref()?;
        Some(
            caller
                .call(&self.model, prompt, max_tokens, self.temperature)
                .await,
        )
    }

    async fn eight_ball(&self, ctx: &CommandContext) -> String {
        if !ctx.has_args() {
            return "🎱 **Magic 8-Ball**\n\nAsk me a yes/no question!\nExample: `!8ball Will it rain today?`"
                .to_string();
        }
        if self.caller.is_none() {
            return MISSING_KEY.to_string();
        }

        let question = &ctx.args_raw;
        let reading = read_polarity(self.beacon.as_ref()).await;
        let polarity = if reading.positive {
            "positive and encouraging"
        } else {
            "negative or cautionary"
        };
        let prompt = format!(
            r#"You are a mystical magic 8-ball. The user asked: "{question}"

Based on cosmic randomness from NIST, your response should be {polarity}.

Respond like a classic magic 8-ball with mystical wisdom. Be concise but memorable.
Examples of {polarity} responses:
- "The stars align in your favor"
- "Caution is advised in this matter"
- "Yes, the universe supports this path"
- "Signs point to obstacles ahead"

Give just the 8-ball response, nothing else."#
        );

        match self.complete(&prompt, 100).await {
            Some(Ok(answer)) => {
                format!("🎱 **Magic 8-Ball**\n\n**Question:** {question}\n\n**Answer:** {answer}")
            }
            _ => "❌ The magic 8-ball is currently unavailable. Try again later!".to_string(),
        }
    }

    async fn topic_command(&self, ctx: &CommandContext, kind: TopicCommand) -> String {
        let topic = if ctx.has_args() {
            ctx.args_raw.as_str()
        } else {
            kind.default_topic()
        };

        match self.complete(&kind.prompt(topic), kind.max_tokens()).await {
            None => MISSING_KEY.to_string(),
            Some(Ok(text)) => kind.reply(topic, &text),
            Some(Err(e)) => {
                tracing::error!(command = %ctx.command, error = %e, "generation failed");
                kind.failure().to_string()
            }
        }
    }

    async fn ask(&self, ctx: &CommandContext) -> String {
        if !ctx.has_args() {
            return "🤖 **AI Assistant**\n\nAsk me anything!\nExample: `!ai What is the meaning of life?`"
                .to_string();
        }

        let question = &ctx.args_raw;
        let prompt = format!(
            "Answer this question helpfully and accurately: {question}\n\n\
             Provide:\n\
             - Clear, informative response\n\
             - Practical insights where applicable\n\
             - Honest acknowledgment if uncertain\n\
             - Conversational but professional tone\n\n\
             Keep response concise but comprehensive."
        );

        match self.complete(&prompt, 500).await {
            None => MISSING_KEY.to_string(),
            Some(Ok(answer)) => {
                format!("🤖 **AI Assistant**\n\n**Question:** {question}\n\n**Answer:** {answer}")
            }
            Some(Err(e)) => {
                tracing::error!(error = %e, "question failed");
                "❌ Unable to process your question at the moment.".to_string()
            }
        }
    }

    async fn nist(&self) -> String {
        let reading = read_polarity(self.beacon.as_ref()).await;
        let polarity = if reading.positive { "POSITIVE" } else { "NEGATIVE" };
        let source = match reading.source {
            ReadingSource::Beacon => "US National Institute of Standards and Technology",
            ReadingSource::Clock => "Local clock (beacon unavailable)",
        };

        format!(
            "🔢 **NIST Randomness Beacon**\n\n\
             **Current Value:** {}\n\
             **Polarity:** {polarity}\n\
             **Source:** {source}\n\n\
             The NIST Randomness Beacon provides publicly verifiable randomness.\n\
             This value changes every 60 seconds and is cryptographically signed.",
            reading.value
        )
    }
}

#[derive(Debug, Clone, Copy)]
enum TopicCommand {
    Advice,
    Bible,
    Song,
}

impl TopicCommand {
    const fn default_topic(self) -> &'static str {
        match self {
            Self::Advice => "general life",
            Self::Bible => "hope and encouragement",
            Self::Song => "happiness",
        }
    }

    const fn max_tokens(self) -> u32 {
        match self {
            Self::Advice => 200,
            Self::Bible => 300,
            Self::Song => 400,
        }
    }

    fn prompt(self, topic: &str) -> String {
        match self {
            Self::Advice => format!(
                "Provide thoughtful, practical advice about {topic}.\n\n\
                 Make it:\n\
                 - Actionable and specific\n\
                 - Encouraging yet realistic\n\
                 - Based on wisdom and common sense\n\
                 - Suitable for someone seeking guidance\n\n\
                 Keep it concise but meaningful (2-3 sentences max)."
            ),
            Self::Bible => format!(
                "Provide an encouraging Bible verse related to {topic}.\n\n\
                 Include:\n\
                 - The actual verse text (accurate)\n\
                 - The Bible reference (book, chapter:verse)\n\
                 - A brief application to the topic\n\n\
                 Format like: \"Verse text\" - Reference\n\n\
                 Then add a short explanation of how it relates to {topic}."
            ),
            Self::Song => format!(
                "Write a short, upbeat song about {topic}.\n\n\
                 Include:\n\
                 - 2 verses (4 lines each)\n\
                 - A simple chorus (2-4 lines)\n\
                 - Rhyming lyrics\n\
                 - Positive, encouraging tone\n\n\
                 Format:\n\
                 **Verse 1:**\n[4 lines]\n\n\
                 **Chorus:**\n[2-4 lines]\n\n\
                 **Verse 2:**\n[4 lines]\n\n\
                 **Chorus:**\n[repeat]\n\n\
                 Keep it simple and singable!"
            ),
        }
    }

    fn reply(self, topic: &str, text: &str) -> String {
        match self {
            Self::Advice => format!("💡 **AI Advice**\n\n**Topic:** {topic}\n\n{text}"),
            Self::Bible => format!("📖 **Bible Verse**\n\n**Topic:** {topic}\n\n{text}"),
            Self::Song => format!("🎵 **AI-Generated Song**\n\n**Theme:** {topic}\n\n{text}"),
        }
    }

    const fn failure(self) -> &'static str {
        match self {
            Self::Advice => "❌ Unable to generate advice at the moment. Please try again later.",
            Self::Bible => "❌ Unable to retrieve a bible verse at the moment.",
            Self::Song => "❌ Unable to compose a song at the moment.",
        }
    }
}

#[async_trait]
impl Plugin for AiPlugin {
    fn name(&self) -> &'static str {
        "ai"
    }

    fn version(&self) -> &'static str {
        "2.0.0"
    }

    fn description(&self) -> &'static str {
        "AI-powered features including magic 8-ball, advice, and content generation"
    }

    fn commands(&self) -> &'static [&'static str] {
        &["8ball", "advice", "advise", "bible", "song", "nist", "ai", "ask"]
    }

    async fn initialize(&self) -> Result<()> {
        if self.caller.is_none() {
            tracing::warn!("OPENROUTER_API_KEY not set, AI commands will explain how to enable them");
        }
        Ok(())
    }

    async fn handle(&self, ctx: &CommandContext) -> Result<Option<String>> {
        let reply = match ctx.command.as_str() {
            "8ball" => self.eight_ball(ctx).await,
            "advice" | "advise" => self.topic_command(ctx, TopicCommand::Advice).await,
            "bible" => self.topic_command(ctx, TopicCommand::Bible).await,
            "song" => self.topic_command(ctx, TopicCommand::Song).await,
            "nist" => self.nist().await,
            "ai" | "ask" => self.ask(ctx).await,
            _ => return Ok(None),
        };
        Ok(Some(reply))
    }
}
