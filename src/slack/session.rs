//! The long-running mention loop.
//!
//! `Disconnected → Connecting → Identifying → Listening → Terminated`.
//! Everything runs on one task: a slow playground call holds up every other
//! mention until it returns.

use std::future::Future;
use std::time::Duration;
use tracing::{debug, error, info};

use super::transport::Transport;
use crate::bot::{Dispatcher, strip_mention, unescape};
use crate::core::models::{BotIdentity, EventKind, MessageEvent};
use crate::errors::BotError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Disconnected,
    Connecting,
    Identifying,
    Listening,
    Terminated,
}

pub struct Session<T: Transport> {
    transport: T,
    dispatcher: Dispatcher,
    bot_id: String,
    poll_interval: Duration,
    identity: Option<BotIdentity>,
    state: SessionState,
}

impl<T: Transport> Session<T> {
    #[must_use]
    pub fn new(transport: T, dispatcher: Dispatcher, bot_id: String, poll_interval: Duration) -> Self {
        Self {
            transport,
            dispatcher,
            bot_id,
            poll_interval,
            identity: None,
            state: SessionState::Disconnected,
        }
    }

    #[must_use]
    pub fn state(&self) -> SessionState {
        self.state
    }

    #[must_use]
    pub fn identity(&self) -> Option<&BotIdentity> {
        self.identity.as_ref()
    }

    /// Connects and resolves the bot identity.
    ///
    /// # Errors
    ///
    /// Returns `BotError::TransportError` if the connection fails and
    /// `BotError::IdentityError` if the configured account is missing or is
    /// not a bot.
    pub async fn start(&mut self) -> Result<BotIdentity, BotError> {
        self.state = SessionState::Connecting;
        self.transport.connect().await?;

        self.state = SessionState::Identifying;
        let record = self
            .transport
            .lookup_user(&self.bot_id)
            .await
            .map_err(|e| BotError::IdentityError(format!("{}: {}", self.bot_id, e)))?;
        if !record.is_bot {
            return Err(BotError::IdentityError(format!(
                "{} is not a bot account",
                self.bot_id
            )));
        }

        let identity = BotIdentity {
            id: self.bot_id.clone(),
            display_name: record.name.unwrap_or_default(),
        };
        info!(bot_id = %identity.id, name = %identity.display_name, "Bot identity resolved");
        self.identity = Some(identity.clone());
        self.state = SessionState::Listening;
        Ok(identity)
    }

    /// Handles one event. Returns the reply if one was produced.
    ///
    /// A failed send is logged and does not stop the loop.
    pub async fn handle_event(&self, event: &MessageEvent) -> Option<String> {
        let identity = self.identity.as_ref()?;
        if event.kind != EventKind::Message || event.text.is_empty() || event.user == identity.id {
            return None;
        }

        let text = unescape(event.text.trim());
        let command = strip_mention(text.trim(), identity)?;
        info!(channel = %event.channel, user = %event.user, "Mention received");

        let reply = self.dispatcher.dispatch(&event.user, command).await?;
        if let Err(e) = self.transport.send_message(&event.channel, &reply).await {
            error!("Failed to send reply to {}: {}", event.channel, e);
        }
        Some(reply)
    }

    /// One poll cycle: fetch a batch, handle it, then idle once.
    ///
    /// # Errors
    ///
    /// Returns an error if polling the transport fails.
    pub async fn run_cycle(&mut self) -> Result<usize, BotError> {
        let events = self.transport.poll_events().await?;
        if !events.is_empty() {
            debug!("Polled {} events", events.len());
        }

        let mut replies = 0;
        for event in &events {
            if self.handle_event(event).await.is_some() {
                replies += 1;
            }
        }

        tokio::time::sleep(self.poll_interval).await;
        Ok(replies)
    }

    /// Starts the session and listens until `shutdown` resolves.
    ///
    /// # Errors
    ///
    /// Propagates startup failures and transport read failures.
    pub async fn run_until<F>(&mut self, shutdown: F) -> Result<(), BotError>
    where
        F: Future<Output = ()>,
    {
        if self.state != SessionState::Listening {
            self.start().await?;
        }

        tokio::pin!(shutdown);
        loop {
            let outcome = tokio::select! {
                () = &mut shutdown => None,
                result = self.run_cycle() => Some(result),
            };

            match outcome {
                None => {
                    info!("Shutdown requested, leaving");
                    self.state = SessionState::Terminated;
                    return Ok(());
                }
                Some(Err(e)) => {
                    self.state = SessionState::Terminated;
                    return Err(e);
                }
                Some(Ok(_)) => {}
            }
        }
    }

    /// Runs until Ctrl-C.
    ///
    /// # Errors
    ///
    /// See [`Session::run_until`].
    pub async fn run(&mut self) -> Result<(), BotError> {
        self.run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!("Failed to listen for Ctrl-C: {}", e);
                std::future::pending::<()>().await;
            }
        })
        .await
    }
}
