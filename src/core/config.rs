//! Configuration file loading.
//!
//! The bot reads a single TOML file at startup. Only the Slack and Bitly
//! credentials are mandatory; everything else falls back to the public
//! Rust playground and the defaults below.

use serde::Deserialize;
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::errors::BotError;

pub const DEFAULT_CONFIG_PATH: &str = "rustbot.toml";
pub const DEFAULT_BOT_ID: &str = "U0CG0Q57Z";

pub const PLAYGROUND_EVALUATE_URL: &str = "https://play.rust-lang.org/evaluate.json";
pub const PLAYGROUND_SHARE_URL: &str = "https://play.rust-lang.org/";
pub const BITLY_SHORTEN_URL: &str = "https://api-ssl.bitly.com/v3/shorten";
pub const GIST_API_URL: &str = "https://api.github.com/gists";

const DEFAULT_TEMPLATE: &str = include_str!("../../resources/template.rs");
const DEFAULT_PLAYPEN: &str = include_str!("../../resources/playpen.json");

const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_POLL_INTERVAL_MS: u64 = 100;
const DEFAULT_MAX_OUTPUT_CHARS: usize = 1500;

/// Which sharing backend is used when an evaluation fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShareStrategy {
    #[default]
    Link,
    Gist,
}

#[derive(Debug, Default, Deserialize)]
struct FileConfig {
    #[serde(default)]
    slack: SlackSection,
    #[serde(default)]
    bitly: BitlySection,
    #[serde(default)]
    github: GithubSection,
    #[serde(default)]
    playground: PlaygroundSection,
    #[serde(default)]
    bot: BotSection,
}

#[derive(Debug, Default, Deserialize)]
struct SlackSection {
    token: Option<String>,
    app_token: Option<String>,
    botid: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct BitlySection {
    token: Option<String>,
    url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct GithubSection {
    token: Option<String>,
    url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct PlaygroundSection {
    url: Option<String>,
    share_url: Option<String>,
    template: Option<PathBuf>,
    request: Option<PathBuf>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct BotSection {
    share: Option<ShareStrategy>,
    poll_interval_ms: Option<u64>,
    max_output_chars: Option<usize>,
}

/// Settings for the execution service and the snippet template.
#[derive(Debug, Clone)]
pub struct PlaygroundConfig {
    pub evaluate_url: String,
    pub share_url: String,
    pub template: String,
    /// Request flags every evaluation starts from. Never mutated after load.
    pub base_request: Map<String, Value>,
    pub timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub slack_bot_token: String,
    pub slack_app_token: String,
    pub bot_id: String,
    pub bitly_token: String,
    pub bitly_url: String,
    pub github_token: Option<String>,
    pub gist_url: String,
    pub playground: PlaygroundConfig,
    pub share: ShareStrategy,
    pub poll_interval: Duration,
    pub max_output_chars: usize,
}

impl AppConfig {
    /// Loads and validates the config file at `path`.
    ///
    /// Relative template/request paths are resolved against the config
    /// file's directory.
    ///
    /// # Errors
    ///
    /// Returns `BotError::ConfigError` when the file cannot be read or parsed,
    /// when the Slack or Bitly tokens are missing, or when the template or
    /// request files are unusable.
    pub fn load(path: &Path) -> Result<Self, BotError> {
        let content = fs::read_to_string(path)
            .map_err(|e| BotError::ConfigError(format!("{}: {}", path.display(), e)))?;
        let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
        Self::from_toml_str(&content, base_dir)
    }

    /// Parses config text. `base_dir` anchors relative file references.
    ///
    /// # Errors
    ///
    /// See [`AppConfig::load`].
    pub fn from_toml_str(content: &str, base_dir: &Path) -> Result<Self, BotError> {
        let file: FileConfig = toml::from_str(content)?;

        let (Some(slack_bot_token), Some(slack_app_token), Some(bitly_token)) = (
            non_empty(file.slack.token),
            non_empty(file.slack.app_token),
            non_empty(file.bitly.token),
        ) else {
            return Err(BotError::ConfigError(
                "missing access tokens for slack or bitly".to_string(),
            ));
        };

        let template = match &file.playground.template {
            Some(p) => fs::read_to_string(base_dir.join(p))?,
            None => DEFAULT_TEMPLATE.to_string(),
        };

        let request_text = match &file.playground.request {
            Some(p) => fs::read_to_string(base_dir.join(p))?,
            None => DEFAULT_PLAYPEN.to_string(),
        };
        let base_request = match serde_json::from_str::<Value>(&request_text)? {
            Value::Object(map) => map,
            other => {
                return Err(BotError::ConfigError(format!(
                    "playground request must be a JSON object, got {other}"
                )));
            }
        };

        Ok(Self {
            slack_bot_token,
            slack_app_token,
            bot_id: non_empty(file.slack.botid).unwrap_or_else(|| DEFAULT_BOT_ID.to_string()),
            bitly_token,
            bitly_url: file
                .bitly
                .url
                .unwrap_or_else(|| BITLY_SHORTEN_URL.to_string()),
            github_token: non_empty(file.github.token),
            gist_url: file.github.url.unwrap_or_else(|| GIST_API_URL.to_string()),
            playground: PlaygroundConfig {
                evaluate_url: file
                    .playground
                    .url
                    .unwrap_or_else(|| PLAYGROUND_EVALUATE_URL.to_string()),
                share_url: file
                    .playground
                    .share_url
                    .unwrap_or_else(|| PLAYGROUND_SHARE_URL.to_string()),
                template,
                base_request,
                timeout: Duration::from_secs(
                    file.playground.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS),
                ),
            },
            share: file.bot.share.unwrap_or_default(),
            poll_interval: Duration::from_millis(
                file.bot.poll_interval_ms.unwrap_or(DEFAULT_POLL_INTERVAL_MS),
            ),
            max_output_chars: file
                .bot
                .max_output_chars
                .unwrap_or(DEFAULT_MAX_OUTPUT_CHARS),
        })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}
