//! Command invocation context

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

/// Chat network a command arrived on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Matrix,
    Simplex,
}

impl Platform {
    /// Every supported platform
    pub const ALL: [Self; 2] = [Self::Matrix, Self::Simplex];

    /// Lowercase identifier
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Matrix => "matrix",
            Self::Simplex => "simplex",
        }
    }

    /// Name for display in replies
    #[must_use]
    pub const fn title(self) -> &'static str {
        match self {
            Self::Matrix => "Matrix",
            Self::Simplex => "SimpleX",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Platform {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "matrix" => Ok(Self::Matrix),
            "simplex" => Ok(Self::Simplex),
            other => Err(format!("unknown platform: {other}")),
        }
    }
}

/// A parsed command and who sent it
#[derive(Debug, Clone)]
pub struct CommandContext {
    /// Command name without prefix, lowercased
    pub command: String,
    /// Whitespace-separated arguments
    pub args: Vec<String>,
    /// Everything after the command name, trimmed
    pub args_raw: String,
    /// Room or conversation id
    pub chat_id: String,
    /// Stable sender id
    pub sender_id: String,
    /// Sender display name
    pub sender_name: String,
    /// Network the command came from
    pub platform: Platform,
    progress: Option<mpsc::UnboundedSender<String>>,
}

impl CommandContext {
    /// Context for `command` with raw argument text
    #[must_use]
    pub fn new(
        command: impl Into<String>,
        args_raw: impl Into<String>,
        platform: Platform,
    ) -> Self {
        let args_raw = args_raw.into().trim().to_string();
        Self {
            command: command.into().to_lowercase(),
            args: args_raw.split_whitespace().map(String::from).collect(),
            args_raw,
            chat_id: String::new(),
            sender_id: String::new(),
            sender_name: String::new(),
            platform,
            progress: None,
        }
    }

    /// Set the chat id
    #[must_use]
    pub fn with_chat(mut self, chat_id: impl Into<String>) -> Self {
        self.chat_id = chat_id.into();
        self
    }

    /// Set the sender id and display name
    #[must_use]
    pub fn with_sender(mut self, id: impl Into<String>, name: impl Into<String>) -> Self {
        self.sender_id = id.into();
        self.sender_name = name.into();
        self
    }

    /// Forward interim status messages to `tx`
    #[must_use]
    pub fn with_progress(mut self, tx: mpsc::UnboundedSender<String>) -> Self {
        self.progress = Some(tx);
        self
    }

    #[must_use]
    pub fn has_args(&self) -> bool {
        !self.args.is_empty()
    }

    #[must_use]
    pub fn arg_count(&self) -> usize {
        self.args.len()
    }

    /// Argument at `index`
    #[must_use]
    pub fn arg(&self, index: usize) -> Option<&str> {
        self.args.get(index).map(String::as_str)
    }

    /// Arguments from `start` on, joined by single spaces
    #[must_use]
    pub fn args_from(&self, start: usize) -> String {
        self.args.get(start..).map(|a| a.join(" ")).unwrap_or_default()
    }

    /// Send an interim status message, if anyone listens
    pub fn progress(&self, message: impl Into<String>) {
        if let Some(tx) = &self.progress {
            let _ = tx.send(message.into());
        }
    }
}

/// Split `text` into a lowercased command name and its raw arguments
///
/// Returns `None` unless `text` starts with `prefix` followed by a name.
#[must_use]
pub fn parse_command(text: &str, prefix: &str) -> Option<(String, String)> {
    let rest = text.trim().strip_prefix(prefix)?;
    let (name, args) = rest
        .split_once(char::is_whitespace)
        .unwrap_or((rest, ""));

    if name.is_empty() {
        return None;
    }

    Some((name.to_lowercase(), args.trim().to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_command() {
        assert_eq!(
            parse_command("  !HA light Kitchen on ", "!"),
            Some(("ha".to_string(), "light Kitchen on".to_string()))
        );
        assert_eq!(parse_command("!ping", "!"), Some(("ping".to_string(), String::new())));
        assert_eq!(parse_command("! ping", "!"), None);
        assert_eq!(parse_command("hello", "!"), None);
        assert_eq!(parse_command("/help me", "/"), Some(("help".to_string(), "me".to_string())));
    }

    #[test]
    fn test_context_args() {
        let ctx =
            CommandContext::new("YT", "  https://youtu.be/x   what  is it ", Platform::Matrix);

        assert_eq!(ctx.command, "yt");
        assert_eq!(ctx.arg_count(), 4);
        assert_eq!(ctx.arg(0), Some("https://youtu.be/x"));
        assert_eq!(ctx.arg(9), None);
        assert_eq!(ctx.args_from(1), "what is it");
        assert_eq!(ctx.args_from(7), "");
        assert!(CommandContext::new("ping", "", Platform::Simplex).args.is_empty());
    }

    #[tokio::test]
    async fn test_progress_forwarding() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let ctx = CommandContext::new("yt", "", Platform::Matrix).with_progress(tx);

        ctx.progress("🔄 working");
        assert_eq!(rx.recv().await.as_deref(), Some("🔄 working"));

        CommandContext::new("yt", "", Platform::Matrix).progress("nobody listens");
    }

    #[test]
    fn test_platform_parse() {
        assert_eq!("SimpleX".parse::<Platform>(), Ok(Platform::Simplex));
        assert!("irc".parse::<Platform>().is_err());
        assert_eq!(Platform::Matrix.to_string(), "matrix");
    }
}
