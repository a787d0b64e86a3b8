//! Slack Web API client module
//!
//! Wraps the two Web API calls the bot needs: `users.info` and
//! `chat.postMessage`.

use slack_morphism::hyper_tokio::{SlackClientHyperConnector, SlackHyperClient};
use slack_morphism::prelude::{SlackApiChatPostMessageRequest, SlackApiUsersInfoRequest};
use slack_morphism::{
    SlackApiToken, SlackApiTokenValue, SlackChannelId, SlackMessageContent, SlackUserId,
};
use tracing::{debug, warn};

use crate::core::models::UserRecord;
use crate::errors::BotError;

// Build the Slack client connector without panicking.
// If connector construction fails, store None and surface a BotError at call sites.
static SLACK_CLIENT: std::sync::LazyLock<Option<SlackHyperClient>> =
    std::sync::LazyLock::new(|| match SlackClientHyperConnector::new() {
        Ok(connector) => Some(SlackHyperClient::new(connector)),
        Err(e) => {
            warn!("Failed to create Slack HTTP connector: {}", e);
            None
        }
    });

pub struct SlackClient {
    token: SlackApiToken,
}

impl SlackClient {
    #[must_use]
    pub fn new(token: String) -> Self {
        Self {
            token: SlackApiToken::new(SlackApiTokenValue::new(token)),
        }
    }

    fn connector() -> Result<&'static SlackHyperClient, BotError> {
        SLACK_CLIENT.as_ref().ok_or_else(|| {
            BotError::TransportError("Slack HTTP connector not initialized".to_string())
        })
    }

    /// # Errors
    ///
    /// Returns an error if the Slack API call fails, including when the user
    /// does not exist.
    pub async fn get_user_info(&self, user_id: &str) -> Result<UserRecord, BotError> {
        let session = Self::connector()?.open_session(&self.token);
        let request = SlackApiUsersInfoRequest::new(SlackUserId(user_id.to_string()));
        let info = session.users_info(&request).await?;

        let name = info.user.name.clone().or_else(|| {
            info.user
                .profile
                .as_ref()
                .and_then(|p| p.display_name.clone())
        });
        debug!(user_id, ?name, "Fetched user info");

        Ok(UserRecord {
            id: info.user.id.0,
            name,
            is_bot: info.user.flags.is_bot.unwrap_or(false),
        })
    }

    /// # Errors
    ///
    /// Returns an error if the Slack API call fails.
    pub async fn post_message(&self, channel_id: &str, text: &str) -> Result<(), BotError> {
        let session = Self::connector()?.open_session(&self.token);
        let request = SlackApiChatPostMessageRequest::new(
            SlackChannelId(channel_id.to_string()),
            SlackMessageContent::new().with_text(text.to_string()),
        );
        session.chat_post_message(&request).await?;
        Ok(())
    }
}
