//! rustbot - A Slack bot that runs Rust snippets on the playground.
//!
//! Mention the bot with a snippet (or `!rustc <snippet>`) and it wraps the
//! snippet in a small program, evaluates it on play.rust-lang.org and answers
//! with the output. Compile errors come back with a share link to the failing
//! code.
//!
//! # Architecture
//!
//! The system uses:
//! - Slack Socket Mode (tokio-tungstenite) for inbound events
//! - slack-morphism for the Slack Web API
//! - reqwest for the playground, Bitly and gist services
//! - Tokio for the async runtime, driven from a single task
//!
//! # Example
//!
//! ```no_run
//! use rustbot::bot::Dispatcher;
//! use rustbot::core::config::AppConfig;
//! use rustbot::playground::{PlaygroundClient, SnippetTemplate, share_from_config};
//! use rustbot::slack::{Session, SlackTransport};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     rustbot::setup_logging();
//!
//!     let config = AppConfig::load(std::path::Path::new("rustbot.toml"))?;
//!     let dispatcher = Dispatcher::new(
//!         SnippetTemplate::new(config.playground.template.clone())?,
//!         Box::new(PlaygroundClient::new(&config.playground)),
//!         share_from_config(&config),
//!         config.max_output_chars,
//!     );
//!     let mut session = Session::new(
//!         SlackTransport::new(&config),
//!         dispatcher,
//!         config.bot_id.clone(),
//!         config.poll_interval,
//!     );
//!     session.run().await?;
//!     Ok(())
//! }
//! ```

pub mod bot;
pub mod core;
pub mod errors;
pub mod playground;
pub mod slack;

/// Configure structured logging.
///
/// The level comes from `RUST_LOG` (default `info`). Setting
/// `RUSTBOT_LOG_FORMAT=json` switches to one JSON object per line.
/// Calling this more than once is harmless; later calls are ignored.
///
/// # Example
///
/// ```
/// rustbot::setup_logging();
/// ```
pub fn setup_logging() {
    use tracing_subscriber::EnvFilter;
    use tracing_subscriber::prelude::*;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let json = std::env::var("RUSTBOT_LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));

    let registry = tracing_subscriber::registry().with(filter);
    let result = if json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_target(true))
            .try_init()
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_target(true))
            .try_init()
    };

    if result.is_err() {
        tracing::debug!("Logging already initialised");
    }
}
