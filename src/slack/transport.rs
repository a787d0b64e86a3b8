use async_trait::async_trait;

use super::client::SlackClient;
use super::socket::SocketModeClient;
use crate::core::config::AppConfig;
use crate::core::models::{MessageEvent, UserRecord};
use crate::errors::BotError;
use crate::playground::http_client;

/// The minimal chat capabilities the session loop relies on.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn connect(&mut self) -> Result<(), BotError>;

    async fn lookup_user(&self, user_id: &str) -> Result<UserRecord, BotError>;

    /// Returns whatever events have arrived since the last poll; may be empty.
    async fn poll_events(&mut self) -> Result<Vec<MessageEvent>, BotError>;

    async fn send_message(&self, channel: &str, text: &str) -> Result<(), BotError>;
}

/// Socket Mode for inbound events, the Web API for everything else.
pub struct SlackTransport {
    web: SlackClient,
    socket: SocketModeClient,
}

impl SlackTransport {
    #[must_use]
    pub fn new(config: &AppConfig) -> Self {
        Self {
            web: SlackClient::new(config.slack_bot_token.clone()),
            socket: SocketModeClient::new(
                http_client(config.playground.timeout),
                config.slack_app_token.clone(),
            ),
        }
    }
}

#[async_trait]
impl Transport for SlackTransport {
    async fn connect(&mut self) -> Result<(), BotError> {
        self.socket.connect().await
    }

    async fn lookup_user(&self, user_id: &str) -> Result<UserRecord, BotError> {
        self.web.get_user_info(user_id).await
    }

    async fn poll_events(&mut self) -> Result<Vec<MessageEvent>, BotError> {
        self.socket.poll_events().await
    }

    async fn send_message(&self, channel: &str, text: &str) -> Result<(), BotError> {
        self.web.post_message(channel, text).await
    }
}
