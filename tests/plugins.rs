//! Plugin integration tests
//!
//! Commands run through a real registry against mock services.

use std::collections::BTreeMap;
use std::io::Write as _;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use beacon_plugins::bot::{AdminList, PluginCatalog};
use beacon_plugins::plugins::{
    AuthPlugin, CorePlugin, DatabasePlugin, SimplexPlugin, SttPlugin, YouTubePlugin,
};
use beacon_plugins::stt::{SpeechToText, SttConfig, Transcriber};
use beacon_plugins::summarize::FallbackModels;
use beacon_plugins::youtube::{QaConfig, YouTubeConfig};
use beacon_plugins::{
    CommandContext, Config, Error, Platform, Plugin, PluginHost, PluginRegistry, Result,
};
use serde_json::json;
use tokio::sync::mpsc;
use tokio_test::assert_ok;

mod common;
use common::{MockDatabase, MockModelCaller, MockSimplex, MockTranscriptSource, right};

const VIDEO_URL: &str = "https://youtu.be/abc123";

struct Broken;

#[async_trait]
impl Plugin for Broken {
    fn name(&self) -> &'static str {
        "broken"
    }

    fn version(&self) -> &'static str {
        "0.1.0"
    }

    fn description(&self) -> &'static str {
        "always fails to start"
    }

    fn commands(&self) -> &'static [&'static str] {
        &["broken"]
    }

    async fn initialize(&self) -> Result<()> {
        Err(Error::Config("token missing".to_string()))
    }

    async fn handle(&self, _ctx: &CommandContext) -> Result<Option<String>> {
        Ok(Some("unreachable".to_string()))
    }
}

async fn send(
    registry: &PluginRegistry,
    text: &str,
    platform: Platform,
    sender: &str,
) -> Option<String> {
    let ctx = registry
        .parse(text, platform)?
        .with_chat("!room:example.org")
        .with_sender(sender, sender);
    registry.dispatch(&ctx).await
}

fn admins() -> Arc<AdminList> {
    let admins = BTreeMap::from([
        ("alice".to_string(), vec!["*".to_string()]),
        ("bob".to_string(), vec!["stats".to_string()]),
    ]);
    Arc::new(AdminList::new(admins, vec!["help".to_string(), "ping".to_string()]))
}

fn simplex_registry(cli: MockSimplex) -> (PluginRegistry, Arc<MockSimplex>) {
    let cli = Arc::new(cli);
    let catalog = PluginCatalog::new();
    let mut registry = PluginRegistry::new("!", catalog.clone());
    registry.register(Arc::new(CorePlugin::new(catalog.clone(), "!")));
    registry.register(Arc::new(SimplexPlugin::new(cli.clone(), admins(), catalog)));
    (registry, cli)
}

// Registry and core

#[tokio::test]
async fn test_core_commands_and_plugin_toggling() {
    let catalog = PluginCatalog::new();
    let mut registry = PluginRegistry::new("!", catalog.clone());
    registry.register(Arc::new(CorePlugin::new(catalog.clone(), "!")));
    registry.register(Arc::new(DatabasePlugin::new(Some(Arc::new(MockDatabase::new(true))))));
    registry.register(Arc::new(Broken));
    assert_eq!(registry.initialize_all().await, 2);

    let matrix = Platform::Matrix;
    assert_eq!(
        send(&registry, "!ping", matrix, "alice").await.as_deref(),
        Some("🏓 Pong! Bot is responsive on matrix.")
    );

    let status = send(&registry, "!status", matrix, "alice").await.unwrap();
    assert!(status.contains("**Loaded:** 3 plugins"));
    assert!(status.contains("**Failed:** 1 plugins"));
    assert!(status.contains("`broken`: token missing"));
    assert_eq!(send(&registry, "!broken", matrix, "alice").await, None);

    assert_eq!(
        send(&registry, "!disable database", matrix, "alice").await.as_deref(),
        Some("⏸️ Plugin 'database' disabled")
    );
    assert_eq!(send(&registry, "!db stats", matrix, "alice").await, None);
    assert_eq!(
        send(&registry, "!enable database", matrix, "alice").await.as_deref(),
        Some("✅ Plugin 'database' enabled")
    );
    assert!(send(&registry, "!db stats", matrix, "alice").await.is_some());

    assert_eq!(
        send(&registry, "!disable core", matrix, "alice").await.as_deref(),
        Some("❌ Cannot disable core plugin")
    );
    assert_eq!(
        send(&registry, "!disable ghost", matrix, "alice").await.as_deref(),
        Some("❌ Plugin 'ghost' not found")
    );
}

#[tokio::test]
async fn test_host_without_credentials_registers_everything() {
    let host = PluginHost::from_config(&Config::default()).unwrap();
    let registry = &host.registry;

    assert_eq!(registry.len(), 8);
    assert_eq!(registry.catalog().routes()["ytconfig"], "youtube");
    assert!(host.admins.is_empty());

    let matrix = Platform::Matrix;
    assert_eq!(
        send(registry, "!lights", matrix, "alice").await.as_deref(),
        Some("❌ Home Assistant not connected")
    );
    assert_eq!(
        send(registry, "!youtube https://youtu.be/abc123", matrix, "alice").await.as_deref(),
        Some("❌ YouTube summary feature requires OPENROUTER_API_KEY in environment variables")
    );
    assert_eq!(
        send(registry, "!stats", Platform::Simplex, "alice").await.as_deref(),
        Some("Access denied. Only admins can view stats.")
    );
}

#[tokio::test]
async fn test_help_lists_enabled_plugins() {
    let catalog = PluginCatalog::new();
    let mut registry = PluginRegistry::new("!", catalog.clone());
    registry.register(Arc::new(CorePlugin::new(catalog.clone(), "!")));
    registry.register(Arc::new(AuthPlugin::new(None)));

    let help = send(&registry, "!help", Platform::Simplex, "alice").await.unwrap();
    assert!(help.starts_with("🤖 **Bot Help - SimpleX Platform**"));
    assert!(help.contains("**Auth Plugin** (v2.0.0)"));
    assert!(help.contains("`!pin`"));

    catalog.disable("auth");
    let help = send(&registry, "!help", Platform::Simplex, "alice").await.unwrap();
    assert!(!help.contains("**Auth Plugin**"));
}

// Auth and database

#[tokio::test]
async fn test_pin_request_and_verification() {
    let db = Arc::new(MockDatabase::new(true));
    let catalog = PluginCatalog::new();
    let mut registry = PluginRegistry::new("!", catalog);
    registry.register(Arc::new(AuthPlugin::new(Some(db.clone()))));

    let reply = send(&registry, "!pin", Platform::Matrix, "alice").await.unwrap();
    assert!(reply.contains("**PIN:** `4321`"));
    assert!(reply.contains("**Valid for:** 24 hours"));
    assert_eq!(
        db.requests(),
        [(
            "!room:example.org".to_string(),
            "alice".to_string(),
            "matrix".to_string()
        )]
    );

    assert!(
        send(&registry, "!verify", Platform::Matrix, "alice")
            .await
            .unwrap()
            .starts_with("🔐 **PIN Verification**")
    );

    let ok = send(&registry, "!auth 4321", Platform::Matrix, "alice").await.unwrap();
    assert!(ok.starts_with("✅ **Authentication Successful**"));
    assert!(ok.contains("**User:** alice"));

    assert_eq!(
        send(&registry, "!verify 0000", Platform::Matrix, "alice").await.as_deref(),
        Some("❌ Invalid PIN. Please check the PIN and try again.")
    );
    assert_eq!(
        send(&registry, "!auth", Platform::Matrix, "alice").await.as_deref(),
        Some("✅ alice is already authenticated in this room.")
    );
    assert!(
        send(&registry, "!auth", Platform::Matrix, "bob")
            .await
            .unwrap()
            .starts_with("🔐 **PIN Verification**")
    );
}

#[tokio::test]
async fn test_auth_without_service() {
    let auth = AuthPlugin::new(None);
    let ctx = CommandContext::new("request", "", Platform::Matrix);

    assert_eq!(
        auth.handle(&ctx).await.unwrap().as_deref(),
        Some("❌ Authentication service not configured. Contact the bot administrator.")
    );
}

#[tokio::test]
async fn test_database_stats_and_health() {
    let db = DatabasePlugin::new(Some(Arc::new(MockDatabase::new(true))));
    assert_ok!(db.initialize().await);

    let stats = db
        .handle(&CommandContext::new("db", "stats", Platform::Matrix))
        .await
        .unwrap()
        .unwrap();
    assert!(stats.starts_with("📊 **DATABASE STATISTICS**"));
    assert!(stats.contains("💬 Total Messages: 1204"));
    assert!(stats.contains("💾 Database Size: 12.4 MB"));

    let health = db.handle(&CommandContext::new("db", "health", Platform::Matrix)).await.unwrap();
    assert_eq!(health.as_deref(), Some("✅ Database is healthy!"));

    let unknown = db.handle(&CommandContext::new("db", "vacuum", Platform::Matrix)).await.unwrap();
    assert!(unknown.unwrap().starts_with("❌ Unknown database command"));
}

#[tokio::test]
async fn test_unhealthy_database_disables_commands() {
    let db = DatabasePlugin::new(Some(Arc::new(MockDatabase::new(false))));
    assert_ok!(db.initialize().await);

    let reply = db.handle(&CommandContext::new("db", "stats", Platform::Matrix)).await.unwrap();
    assert_eq!(reply.as_deref(), Some("❌ Database functionality not available"));
}

// SimpleX

#[tokio::test]
async fn test_simplex_commands_ignored_on_matrix() {
    let (registry, cli) = simplex_registry(MockSimplex::default());

    assert_eq!(send(&registry, "!contacts list", Platform::Matrix, "alice").await, None);
    assert!(cli.sent().is_empty());
}

#[tokio::test]
async fn test_simplex_access_is_per_command() {
    let mock = MockSimplex::default().respond("/help", right(json!({"type": "chatHelp"})));
    let (registry, cli) = simplex_registry(mock);
    let simplex = Platform::Simplex;

    assert_eq!(
        send(&registry, "!contacts list", simplex, "bob").await.as_deref(),
        Some("Access denied. Only admins can list contacts.")
    );
    assert_eq!(
        send(&registry, "!invite generate", simplex, "mallory").await.as_deref(),
        Some("Access denied. Only admins can manage invites.")
    );

    let stats = send(&registry, "!stats", simplex, "bob").await.unwrap();
    assert!(stats.contains("• Connected: ✅ Yes"));
    assert!(stats.contains("• URL: ws://mock:5225"));
    assert!(stats.contains("• Loaded Plugins: 2"));
    assert!(stats.contains("• Total Admins: 2"));
    assert_eq!(cli.sent(), ["/help"]);
}

#[tokio::test]
async fn test_contacts_list_and_info() {
    let mock = MockSimplex::default()
        .respond(
            "/contacts",
            right(json!({"type": "contactsList", "contacts": [
                {"localDisplayName": "carol", "contactStatus": "active",
                 "activeConn": {"connStatus": "ready"}},
                {"localDisplayName": "dave", "contactStatus": "active"}
            ]})),
        )
        .respond(
            "/contact ghost",
            json!({"Left": {"type": "chatCmdError", "chatError": {"type": "errorStore"}}}),
        )
        .respond("/contact carol", right(json!({"type": "contactInfo"})));
    let (registry, _cli) = simplex_registry(mock);

    assert_eq!(
        send(&registry, "!contacts list", Platform::Simplex, "alice").await.as_deref(),
        Some(
            "📋 Bot Contacts (2 total):\n\n\
             1. carol (Contact: active, Connection: ready)\n\
             2. dave (Contact: active, Connection: disconnected)"
        )
    );
    assert_eq!(
        send(&registry, "!contacts info ghost", Platform::Simplex, "alice").await.as_deref(),
        Some("Contact 'ghost' not found.")
    );
    assert_eq!(
        send(&registry, "!contacts info carol", Platform::Simplex, "alice").await.as_deref(),
        Some("Failed to get info for contact 'carol'.")
    );
}

#[tokio::test]
async fn test_invite_generation_reports_progress() {
    let link = "https://simplex.chat/invitation#/?v=2&smp=xyz";
    let mock = MockSimplex::default().respond(
        "/c",
        right(json!({"type": "invitation", "connReqInvitation": link})),
    );
    let (registry, cli) = simplex_registry(mock);

    let (tx, mut rx) = mpsc::unbounded_channel();
    let ctx = registry
        .parse("!invite generate", Platform::Simplex)
        .unwrap()
        .with_sender("alice", "alice")
        .with_progress(tx);
    let reply = registry.dispatch(&ctx).await.unwrap();

    assert_eq!(rx.try_recv().unwrap(), "🔄 Generating invite...");
    assert!(reply.starts_with("🔗 One-time connection invite generated:"));
    assert!(reply.contains(&format!("/c {link}")));
    assert_eq!(cli.sent(), ["/c"]);
}

#[tokio::test]
async fn test_group_invite_and_missing_group() {
    let mock = MockSimplex::default()
        .respond(
            "/g team /add",
            right(json!({"type": "groupLink",
                "note": "join via https://simplex.chat/invitation#/?v=2&smp=grp today"})),
        )
        .respond(
            "/group ghost",
            json!({"Left": {"type": "chatCmdError", "chatError": {"type": "errorStore"}}}),
        )
        .respond("/group team", right(json!({"type": "groupInfo", "group": "team"})));
    let (registry, _cli) = simplex_registry(mock);

    let invite = send(&registry, "!groups invite team", Platform::Simplex, "alice").await.unwrap();
    assert!(invite.starts_with("🔗 Group invite generated for 'team':"));
    assert!(invite.contains("https://simplex.chat/invitation#/?v=2&smp=grp\n"));

    assert_eq!(
        send(&registry, "!groups info ghost", Platform::Simplex, "alice").await.as_deref(),
        Some("Group 'ghost' not found.")
    );
    assert_eq!(
        send(&registry, "!groups info team", Platform::Simplex, "alice").await.as_deref(),
        Some("Failed to get info for group 'team'.")
    );
}

#[tokio::test]
async fn test_admin_management() {
    let mock = MockSimplex::default().respond(
        "/contacts",
        right(json!({"type": "contactsList", "contacts": []})),
    );
    let (registry, _cli) = simplex_registry(mock);
    let simplex = Platform::Simplex;

    assert_eq!(
        send(&registry, "!admin add carol", simplex, "alice").await.as_deref(),
        Some("Added carol as admin with full permissions.")
    );
    assert_eq!(
        send(&registry, "!contacts list", simplex, "carol").await.as_deref(),
        Some("No contacts found.")
    );
    assert_eq!(
        send(&registry, "!admin remove alice", simplex, "alice").await.as_deref(),
        Some("You cannot remove yourself as admin.")
    );
    assert_eq!(
        send(&registry, "!admin permissions dave", simplex, "alice").await.as_deref(),
        Some("User dave is not an admin. Can only run public commands: help, ping")
    );

    let list = send(&registry, "!admin list", simplex, "alice").await.unwrap();
    assert!(list.contains("• bob: stats"));
    assert!(list.contains("• carol: all commands"));

    assert_eq!(
        send(&registry, "!admin remove carol", simplex, "alice").await.as_deref(),
        Some("Removed carol from admins.")
    );
    assert_eq!(
        send(&registry, "!contacts list", simplex, "carol").await.as_deref(),
        Some("Access denied. Only admins can list contacts.")
    );
}

#[tokio::test]
async fn test_debug_ping_reports_working_commands() {
    let mock = MockSimplex::default()
        .respond("/help", right(json!({"type": "chatHelp"})))
        .respond("/groups", right(json!({"type": "groupsList", "groups": []})));
    let (registry, cli) = simplex_registry(mock);

    assert_eq!(
        send(&registry, "!debug ping", Platform::Simplex, "alice").await.as_deref(),
        Some("🏓 CLI responding! Working commands: /help, /groups")
    );
    assert_eq!(cli.sent(), ["/help", "/contacts", "/groups"]);
}

// YouTube

fn youtube_config() -> YouTubeConfig {
    let mut config = YouTubeConfig {
        qa: QaConfig {
            models: vec!["qa-model".to_string()],
            ..QaConfig::default()
        },
        ..YouTubeConfig::default()
    };
    config.summarization.models = FallbackModels {
        chunk: vec!["chunk-model".to_string()],
        merge: vec!["merge-model".to_string()],
        single_pass: vec!["single-model".to_string()],
    };
    config
}

fn youtube(caller: Option<&Arc<MockModelCaller>>) -> YouTubePlugin {
    let source = MockTranscriptSource::default().with_video(
        VIDEO_URL,
        "Rust in 100 Seconds",
        "Rust is a memory safe systems language without a garbage collector.",
    );
    let caller = caller.map(|c| Arc::clone(c) as Arc<dyn beacon_plugins::llm::ModelCaller>);
    YouTubePlugin::new(caller, Arc::new(source), youtube_config()).unwrap()
}

async fn ask(plugin: &YouTubePlugin, command: &str, args: &str, chat: &str) -> String {
    let ctx = CommandContext::new(command, args, Platform::Matrix).with_chat(chat);
    plugin.handle(&ctx).await.unwrap().unwrap()
}

#[tokio::test]
async fn test_summary_then_follow_up_questions() {
    let caller = Arc::new(MockModelCaller::default());
    let yt = youtube(Some(&caller));

    let (tx, mut rx) = mpsc::unbounded_channel();
    let ctx = CommandContext::new("youtube", VIDEO_URL, Platform::Matrix)
        .with_chat("room-a")
        .with_progress(tx);
    let summary = yt.handle(&ctx).await.unwrap().unwrap();

    assert_eq!(
        summary,
        "📺 **Rust in 100 Seconds**\n\n**Summary:**\nsingle-model output #1\n\n\
         💡 Ask questions about this video using: `!youtube <your question>`"
    );
    assert_eq!(rx.try_recv().unwrap(), "🔄 Extracting subtitles from YouTube video...");
    assert_eq!(rx.try_recv().unwrap(), "🤖 Generating summary using AI...");

    assert_eq!(
        ask(&yt, "yt", "does it have a GC?", "room-a").await,
        "**Q:** does it have a GC?\n\n**A:** qa-model output #2"
    );
    let qa = caller.calls_to("qa-model");
    assert!(qa[0].prompt.contains("without a garbage collector"));
    assert!(qa[0].prompt.contains("Question: does it have a GC?"));

    assert_eq!(
        ask(&yt, "summary", "", "room-a").await,
        "📺 **Last processed video:** Rust in 100 Seconds\n\n💡 Ask questions with: `!summary <your question>`"
    );
    assert!(ask(&yt, "summary", "who made it?", "room-a").await.starts_with("**Q:** who made it?"));
}

#[tokio::test]
async fn test_cache_is_per_chat() {
    let caller = Arc::new(MockModelCaller::replying("fine"));
    let yt = youtube(Some(&caller));
    ask(&yt, "youtube", VIDEO_URL, "room-a").await;

    let no_video =
        "❌ No recent YouTube video found. Please process a video first with `!youtube <url>`";
    assert_eq!(ask(&yt, "summary", "", "room-b").await, no_video);
    assert_eq!(ask(&yt, "video", "what was it about?", "room-b").await, no_video);
}

#[tokio::test]
async fn test_url_with_question_answers_directly() {
    let caller = Arc::new(MockModelCaller::replying("Graydon Hoare"));
    let yt = youtube(Some(&caller));

    let reply = ask(&yt, "youtube", &format!("{VIDEO_URL} Who created Rust?"), "room-a").await;

    assert_eq!(
        reply,
        "📺 **Rust in 100 Seconds**\n\n**Q:** Who created Rust?\n\n**A:** Graydon Hoare"
    );
    let calls = caller.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].model, "qa-model");
}

#[tokio::test]
async fn test_missing_subtitles_and_missing_key() {
    let caller = Arc::new(MockModelCaller::default());
    let yt = youtube(Some(&caller));
    assert_eq!(
        ask(&yt, "youtube", "https://youtu.be/nosubs", "room-a").await,
        "❌ No subtitles found for this video. The video might not have subtitles or be unavailable."
    );
    assert!(caller.calls().is_empty());

    let without_ai = youtube(None);
    assert_eq!(
        ask(&without_ai, "youtube", VIDEO_URL, "room-a").await,
        "❌ YouTube summary feature requires OPENROUTER_API_KEY in environment variables"
    );
    assert!(
        ask(&without_ai, "youtube", "", "room-a")
            .await
            .contains("!youtube <url>")
    );
}

#[tokio::test]
async fn test_ytconfig_reads_settings() {
    let yt = youtube(None);

    assert_eq!(
        ask(&yt, "ytconfig", "get summarization.chunk_size", "room-a").await,
        "⚙️ `summarization.chunk_size` = 8000"
    );
    assert_eq!(
        ask(&yt, "ytconfig", "get subtitles.ytdlp_path", "room-a").await,
        "⚙️ `subtitles.ytdlp_path` = yt-dlp"
    );
    assert_eq!(
        ask(&yt, "ytconfig", "get qa.nope", "room-a").await,
        "❌ Setting 'qa.nope' not found"
    );

    let shown = ask(&yt, "ytconfig", "show", "room-a").await;
    assert!(shown.contains("```toml"));
    assert!(shown.contains("[summarization]"));

    let models = ask(&yt, "ytconfig", "models", "room-a").await;
    assert!(models.contains("**Q&A:**\n1. `qa-model`"));
    assert!(models.contains("**Final merge:**\n1. `merge-model`"));
}

// Speech to text

struct Scripted {
    text: &'static str,
    delay: Duration,
}

#[async_trait]
impl Transcriber for Scripted {
    async fn transcribe(&self, _audio: Vec<u8>, _filename: &str) -> Result<String> {
        tokio::time::sleep(self.delay).await;
        Ok(self.text.to_string())
    }

    fn name(&self) -> &'static str {
        "scripted"
    }
}

fn stt_plugin(text: &'static str, delay: Duration) -> SttPlugin {
    let transcriber = Arc::new(Scripted { text, delay });
    SttPlugin::new(Some(SpeechToText::new(transcriber, SttConfig::default())))
}

fn audio_file(suffix: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
    file.write_all(b"OggS-voice").unwrap();
    file
}

#[tokio::test]
async fn test_voice_message_is_transcribed() {
    let stt = stt_plugin("see you at noon", Duration::ZERO);
    let file = audio_file(".ogg");

    assert_eq!(
        stt.handle_audio(file.path(), "alice", "room-a").await.as_deref(),
        Some("🎤 **Audio from alice**\n\n💬 \"see you at noon\"")
    );

    let silent = stt_plugin("  ", Duration::ZERO);
    assert_eq!(
        silent.handle_audio(file.path(), "alice", "room-a").await.as_deref(),
        Some("🎤 **Audio from alice**\n\n🔇 (No speech detected)")
    );
}

#[tokio::test]
async fn test_same_file_is_transcribed_once_at_a_time() {
    let stt = stt_plugin("hello", Duration::from_millis(50));
    let file = audio_file(".ogg");

    let (first, second) = tokio::join!(
        stt.handle_audio(file.path(), "alice", "room-a"),
        stt.handle_audio(file.path(), "alice", "room-a"),
    );
    assert_eq!([&first, &second].iter().filter(|r| r.is_some()).count(), 1);

    assert!(stt.handle_audio(file.path(), "alice", "room-a").await.is_some());
}

#[tokio::test]
async fn test_unsupported_audio_is_reported() {
    let stt = stt_plugin("unused", Duration::ZERO);
    let file = audio_file(".txt");

    let reply = stt.handle_audio(file.path(), "bob", "room-a").await.unwrap();
    assert!(reply.starts_with("❌ Could not transcribe audio from bob:"));
    assert!(reply.contains("unsupported audio format"));
}

#[tokio::test]
async fn test_stt_commands() {
    let stt = stt_plugin("unused", Duration::ZERO);
    let config = stt
        .handle(&CommandContext::new("sttconfig", "", Platform::Matrix))
        .await
        .unwrap()
        .unwrap();
    assert!(config.contains("**Model:** whisper-1"));
    assert!(config.contains("**Max File Size:** 25.0 MB"));

    let disabled = SttPlugin::new(None);
    assert!(
        disabled
            .handle_audio(Path::new("/tmp/voice.ogg"), "alice", "room-a")
            .await
            .is_none()
    );
    assert_eq!(
        disabled
            .handle(&CommandContext::new("stt", "", Platform::Matrix))
            .await
            .unwrap()
            .as_deref(),
        Some("❌ Speech-to-text is not configured (set OPENAI_API_KEY)")
    );
}
