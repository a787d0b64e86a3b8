//! Share links for failing snippets.
//!
//! Two interchangeable backends: a Bitly-shortened playground URL with the
//! code inlined, or a public gist referenced by id.

use async_trait::async_trait;
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use tracing::info;

use crate::errors::BotError;

/// Everything except ASCII alphanumerics and `-_.~!` gets escaped.
const CODE_ESCAPE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~')
    .remove(b'!');

pub const DEFAULT_VERSION: &str = "stable";
const GIST_DESCRIPTION: &str = "Shared by Chinese Rustaceans";
const GIST_FILENAME: &str = "playground.rs";
const USER_AGENT: &str = concat!("rustbot/", env!("CARGO_PKG_VERSION"));

#[async_trait]
pub trait Share: Send + Sync {
    /// Returns a public URL that replays `code`.
    async fn share(&self, code: &str) -> Result<String, BotError>;
}

/// `https://play.rust-lang.org/?run=1&code=...&version=...`
#[must_use]
pub fn playground_code_url(base: &str, code: &str, version: &str) -> String {
    format!(
        "{base}?run=1&code={}&version={version}",
        utf8_percent_encode(code, CODE_ESCAPE)
    )
}

/// `https://play.rust-lang.org/?run=1&gist=...&version=stable`
#[must_use]
pub fn playground_gist_url(base: &str, gist_id: &str) -> String {
    format!("{base}?run=1&gist={gist_id}&version={DEFAULT_VERSION}")
}

#[derive(Debug, Deserialize)]
struct ShortenResponse {
    data: Option<ShortenData>,
}

#[derive(Debug, Deserialize)]
struct ShortenData {
    url: Option<String>,
}

/// Pulls `data.url` out of a Bitly v3 `shorten` response body.
///
/// # Errors
///
/// Returns `BotError::SharingError` when the field is missing or the body is
/// not JSON.
pub fn parse_shorten_response(body: &str) -> Result<String, BotError> {
    let parsed: ShortenResponse = serde_json::from_str(body)
        .map_err(|e| BotError::SharingError(format!("invalid shorten response: {e}")))?;
    parsed
        .data
        .and_then(|d| d.url)
        .ok_or_else(|| BotError::SharingError("shorten response has no data.url".to_string()))
}

#[derive(Debug, Deserialize)]
struct GistResponse {
    id: Option<String>,
}

/// Pulls the gist `id` out of a gist creation response body.
///
/// # Errors
///
/// Returns `BotError::SharingError` when the id is missing or the body is not
/// JSON.
pub fn parse_gist_response(body: &str) -> Result<String, BotError> {
    let parsed: GistResponse = serde_json::from_str(body)
        .map_err(|e| BotError::SharingError(format!("invalid gist response: {e}")))?;
    parsed
        .id
        .filter(|id| !id.is_empty())
        .ok_or_else(|| BotError::SharingError("gist response has no id".to_string()))
}

pub struct LinkShare {
    http: Client,
    shorten_url: String,
    access_token: String,
    playground_url: String,
    version: String,
}

impl LinkShare {
    #[must_use]
    pub fn new(
        http: Client,
        shorten_url: String,
        access_token: String,
        playground_url: String,
    ) -> Self {
        Self {
            http,
            shorten_url,
            access_token,
            playground_url,
            version: DEFAULT_VERSION.to_string(),
        }
    }

    #[must_use]
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }
}

#[async_trait]
impl Share for LinkShare {
    async fn share(&self, code: &str) -> Result<String, BotError> {
        let long_url = playground_code_url(&self.playground_url, code, &self.version);
        let body = self
            .http
            .get(&self.shorten_url)
            .query(&[
                ("access_token", self.access_token.as_str()),
                ("longUrl", long_url.as_str()),
            ])
            .send()
            .await?
            .text()
            .await?;
        let short = parse_shorten_response(&body)?;
        info!(url = %short, "Created short link");
        Ok(short)
    }
}

pub struct GistShare {
    http: Client,
    gist_url: String,
    token: Option<String>,
    playground_url: String,
}

impl GistShare {
    #[must_use]
    pub fn new(
        http: Client,
        gist_url: String,
        token: Option<String>,
        playground_url: String,
    ) -> Self {
        Self {
            http,
            gist_url,
            token,
            playground_url,
        }
    }
}

#[async_trait]
impl Share for GistShare {
    async fn share(&self, code: &str) -> Result<String, BotError> {
        let payload = json!({
            "description": GIST_DESCRIPTION,
            "public": true,
            "files": {
                GIST_FILENAME: { "content": code }
            }
        });

        let mut request = self
            .http
            .post(&self.gist_url)
            .header(reqwest::header::USER_AGENT, USER_AGENT)
            .json(&payload);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let body = request.send().await?.text().await?;
        let id = parse_gist_response(&body)?;
        info!(gist_id = %id, "Created gist");
        Ok(playground_gist_url(&self.playground_url, &id))
    }
}
