use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing::{error, info};

use rustbot::bot::Dispatcher;
use rustbot::core::config::{AppConfig, DEFAULT_CONFIG_PATH};
use rustbot::playground::{PlaygroundClient, SnippetTemplate, share_from_config};
use rustbot::slack::{Session, SlackTransport};

/// Slack bot that evaluates Rust snippets on the playground.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// Full path to config file
    #[arg(short, long, value_name = "path", default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    rustbot::setup_logging();
    let args = Args::parse();

    let config = AppConfig::load(&args.config).map_err(|e| {
        error!("Error: {}", e);
        e
    })?;
    let template = SnippetTemplate::new(config.playground.template.clone())
        .context("Failed to load snippet template")?;

    let dispatcher = Dispatcher::new(
        template,
        Box::new(PlaygroundClient::new(&config.playground)),
        share_from_config(&config),
        config.max_output_chars,
    );
    let mut session = Session::new(
        SlackTransport::new(&config),
        dispatcher,
        config.bot_id.clone(),
        config.poll_interval,
    );

    info!(config = %args.config.display(), share = ?config.share, "Starting rustbot");
    session.run().await.context("rustbot stopped")?;
    Ok(())
}
