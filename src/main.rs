use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use groqchat::{Config, Secrets, build_session, commands, ui};
use std::fs::OpenOptions;
use std::io;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "groqchat")]
#[command(version)]
#[command(about = "Chat with a hosted LLM from the terminal", long_about = None)]
struct Cli {
    /// Model to use instead of the configured one
    #[arg(long, global = true)]
    model: Option<String>,

    /// Key file holding chatbot_api_key (and optionally langsmith_api_key)
    #[arg(long, global = true)]
    key_file: Option<PathBuf>,

    /// Config file to use instead of ~/.groqchat/config.toml
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Line-oriented chat on stdin/stdout instead of the full-screen UI
    #[arg(long)]
    plain: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Send a single message and print the reply
    Say {
        #[arg(required = true)]
        message: Vec<String>,
    },
    /// Print the effective configuration
    Config,
}

fn init_logging(config: &Config) -> Result<()> {
    let log_path = config.log_path();
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .with_context(|| format!("Failed to open log file {}", log_path.display()))?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("groqchat=info")),
        )
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = Config::load(cli.config.as_deref())?.with_overrides(cli.model, cli.key_file);
    config.ensure_home()?;
    init_logging(&config)?;

    if let Some(Commands::Config) = cli.command {
        return commands::show_config(&config);
    }

    // No key, no session
    let secrets = Secrets::load(&config.key_file)?;
    let mut session = build_session(&config, &secrets)?;

    match cli.command {
        Some(Commands::Say { message }) => commands::say(session, message.join(" ")).await,
        _ if cli.plain => commands::repl(&mut session, io::stdin().lock(), io::stdout()).await,
        _ => ui::run(session, &config.ui.title, &config.ui.placeholder).await,
    }
}
