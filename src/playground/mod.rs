//! Everything that talks to the Rust playground and the share services

pub mod client;
pub mod share;
pub mod template;

pub use client::{Evaluate, PlaygroundClient, classify};
pub use share::{GistShare, LinkShare, Share};
pub use template::SnippetTemplate;

use reqwest::Client;
use std::time::Duration;

use crate::core::config::{AppConfig, ShareStrategy};

/// HTTP client with a request timeout so a hung service cannot stall the bot forever.
#[must_use]
pub fn http_client(timeout: Duration) -> Client {
    Client::builder()
        .timeout(timeout)
        .build()
        .unwrap_or_else(|_| Client::new())
}

/// Builds the share backend selected in config.
#[must_use]
pub fn share_from_config(config: &AppConfig) -> Box<dyn Share> {
    let http = http_client(config.playground.timeout);
    match config.share {
        ShareStrategy::Link => Box::new(LinkShare::new(
            http,
            config.bitly_url.clone(),
            config.bitly_token.clone(),
            config.playground.share_url.clone(),
        )),
        ShareStrategy::Gist => Box::new(GistShare::new(
            http,
            config.gist_url.clone(),
            config.github_token.clone(),
            config.playground.share_url.clone(),
        )),
    }
}
