use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

use beacon_plugins::{Config, Platform, PluginHost};

/// Beacon plugins - run chat bot commands from the terminal
#[derive(Parser)]
#[command(name = "beacon-plugins", version, about)]
struct Cli {
    /// Configuration file (defaults to ~/.config/omni/beacon/plugins.toml)
    #[arg(short, long, env = "BEACON_PLUGINS_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Dispatch one command line, e.g. "!ha light kitchen on"
    Run {
        #[command(flatten)]
        session: Session,
        /// Message text
        #[arg(required = true, num_args = 1..)]
        text: Vec<String>,
    },
    /// Read command lines from stdin and dispatch each
    Repl {
        #[command(flatten)]
        session: Session,
    },
    /// Transcribe an audio file as if it arrived as a voice message
    Transcribe {
        /// Audio file
        file: PathBuf,
        /// Sender shown in the reply
        #[arg(long, default_value = "cli")]
        sender: String,
    },
    /// Print the resolved configuration with secrets redacted
    Config,
}

/// Who is talking, and where
#[derive(Args, Clone)]
struct Session {
    /// Platform the command appears to come from (matrix or simplex)
    #[arg(long, default_value = "matrix")]
    platform: Platform,
    /// Chat or room ID
    #[arg(long, default_value = "cli")]
    chat: String,
    /// Sender display name
    #[arg(long, default_value = "cli")]
    sender: String,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => "warn,beacon_plugins=info",
        1 => "info,beacon_plugins=debug",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_writer(std::io::stderr)
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("fatal: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = Config::load(cli.config.as_deref())?;

    match cli.command {
        Command::Config => {
            print!("{}", config.to_redacted_toml()?);
            Ok(())
        }
        Command::Run { session, text } => {
            let host = start(&config).await?;
            let line = text.join(" ");
            if !dispatch(&host, &session, &line).await {
                println!("(no reply)");
            }
            Ok(())
        }
        Command::Repl { session } => {
            let host = start(&config).await?;
            repl(&host, &session).await
        }
        Command::Transcribe { file, sender } => {
            let host = PluginHost::from_config(&config)?;
            match host.stt.handle_audio(&file, &sender, "cli").await {
                Some(reply) => println!("{reply}"),
                None => anyhow::bail!("speech-to-text is not configured (set OPENAI_API_KEY)"),
            }
            Ok(())
        }
    }
}

async fn start(config: &Config) -> anyhow::Result<PluginHost> {
    let host = PluginHost::from_config(config)?;
    let ready = host.registry.initialize_all().await;
    let failed = host.registry.len() - ready;
    if failed > 0 {
        tracing::warn!(ready, failed, "some plugins failed to initialize");
    }
    Ok(host)
}

/// Dispatch one line, printing progress messages as they arrive
///
/// Returns whether anything was printed.
async fn dispatch(host: &PluginHost, session: &Session, line: &str) -> bool {
    let Some(ctx) = host.registry.parse(line, session.platform) else {
        tracing::debug!(line, "not a command");
        return false;
    };

    let (tx, mut rx) = mpsc::unbounded_channel::<String>();
    let printer = tokio::spawn(async move {
        while let Some(message) = rx.recv().await {
            println!("{message}");
        }
    });

    let ctx = ctx
        .with_chat(session.chat.clone())
        .with_sender(session.sender.clone(), session.sender.clone())
        .with_progress(tx);
    let reply = host.registry.dispatch(&ctx).await;

    drop(ctx);
    if let Err(e) = printer.await {
        tracing::warn!(error = %e, "progress printer stopped");
    }

    match reply {
        Some(reply) => {
            println!("{reply}");
            true
        }
        None => false,
    }
}

async fn repl(host: &PluginHost, session: &Session) -> anyhow::Result<()> {
    eprintln!(
        "beacon-plugins on {} as {} (prefix `{}`), Ctrl-D to quit",
        session.platform.title(),
        session.sender,
        host.registry.prefix()
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if !dispatch(host, session, line).await {
            println!("(no reply)");
        }
    }
    Ok(())
}
