//! Beacon plugins - chat command plugins for the Beacon bot
//!
//! This library provides the command layer shared by the Matrix and `SimpleX`
//! bots:
//! - Command parsing, routing and plugin management
//! - Home Assistant control with alias-based entity lookup
//! - YouTube summaries through a chunk-and-merge pipeline with model fallback
//! - Prompt commands, PIN authentication and voice transcription
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │              Platform transports (external)          │
//! │          Matrix sync loop  │  SimpleX CLI            │
//! └────────────────────┬────────────────────────────────┘
//!                      │ CommandContext
//! ┌────────────────────▼────────────────────────────────┐
//! │                  PluginRegistry                      │
//! │  core │ ai │ auth │ db │ ha │ youtube │ simplex │ stt │
//! └────────────────────┬────────────────────────────────┘
//!                      │
//! ┌────────────────────▼────────────────────────────────┐
//! │                 Service clients                      │
//! │ OpenRouter │ Home Assistant │ yt-dlp │ Whisper │ ... │
//! └─────────────────────────────────────────────────────┘
//! ```

pub mod bot;
pub mod config;
pub mod database;
pub mod error;
pub mod homeassistant;
pub mod llm;
pub mod nist;
pub mod plugins;
pub mod simplex;
pub mod stt;
pub mod summarize;
pub mod youtube;

pub use bot::{CommandContext, Platform, Plugin, PluginRegistry};
pub use config::Config;
pub use error::{Error, Result};
pub use plugins::PluginHost;
