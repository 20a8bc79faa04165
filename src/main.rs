//! Fusion - live dashboard client
//!
//! Entry point for the Fusion CLI.

mod cli;
mod cmd_listen;
mod cmd_rest;
mod cmd_view;

use anyhow::Context;
use clap::Parser;
use tracing::warn;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use fusion_config::{Config, ConfigLoader, ConfigValidator, fusion_dir};

use crate::cli::{Cli, Commands};

/// Initialize tracing with console and file output.
///
/// Log files are written to ~/.fusion/logs/ with daily rotation.
fn init_tracing() -> anyhow::Result<()> {
    let log_dir = fusion_dir().join("logs");
    std::fs::create_dir_all(&log_dir)
        .with_context(|| format!("creating log directory {}", log_dir.display()))?;

    let file_appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix("fusion")
        .filename_suffix("log")
        .max_log_files(14)
        .build(&log_dir)?;

    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    // Keep the writer alive for the whole process.
    static GUARD: std::sync::OnceLock<tracing_appender::non_blocking::WorkerGuard> =
        std::sync::OnceLock::new();
    let _ = GUARD.set(guard);

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_target(true).with_ansi(true))
        .with(fmt::layer().with_writer(non_blocking).with_ansi(false))
        .init();

    Ok(())
}

/// Load, override and validate the configuration.
fn load_config(cli: &Cli) -> anyhow::Result<Config> {
    let config = ConfigLoader::load_or_default(&cli.config)
        .with_context(|| format!("loading {}", cli.config.display()))?;

    let warnings = ConfigValidator::validate(&config).into_result()?;
    for warning in warnings {
        warn!(path = %warning.path, "{}", warning.message);
    }
    Ok(config)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing()?;

    let cli = Cli::parse();
    let config = load_config(&cli)?;

    match cli.command {
        Commands::Listen { chat } => cmd_listen::run_listen(&config, chat).await,
        Commands::Chats => cmd_rest::list_chats(&config).await,
        Commands::Messages { chat_id } => cmd_rest::show_messages(&config, &chat_id).await,
        Commands::Send { chat_id, text } => cmd_rest::send_message(&config, &chat_id, &text).await,
        Commands::View { action } => cmd_view::handle_view(&config, action),
    }
}
