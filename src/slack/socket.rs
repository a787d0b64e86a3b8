//! Slack Socket Mode event stream.
//!
//! Socket Mode delivers Events API callbacks over a websocket opened with an
//! app-level token. Every envelope must be acknowledged by echoing its
//! `envelope_id` within a few seconds.

use futures::{FutureExt, SinkExt, StreamExt};
use std::collections::{HashSet, VecDeque};
use reqwest::Client;
use serde::Deserialize;
use serde_json::{Value, json};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::{debug, info, warn};
use url::Url;

use crate::core::models::{EventKind, MessageEvent};
use crate::errors::BotError;

pub const CONNECTIONS_OPEN_URL: &str = "https://slack.com/api/apps.connections.open";

/// Upper bound on frames drained in one poll.
const MAX_FRAMES_PER_POLL: usize = 64;

/// How many recent `event_id`s are remembered for redelivery checks.
const SEEN_EVENT_CAP: usize = 512;

type SocketStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Envelope received over the Socket Mode connection.
#[derive(Debug, Deserialize)]
pub struct SocketModeEnvelope {
    pub envelope_id: String,
    #[serde(rename = "type")]
    pub envelope_type: String,
    #[serde(default)]
    pub payload: Value,
    /// Non-zero when Slack redelivers an envelope it saw no ack for.
    #[serde(default)]
    pub retry_attempt: u32,
    #[serde(default)]
    pub retry_reason: Option<String>,
}

impl SocketModeEnvelope {
    #[must_use]
    pub fn event_id(&self) -> Option<&str> {
        self.payload.get("event_id").and_then(Value::as_str)
    }
}

/// Bounded memory of recently handled `event_id`s, oldest evicted first.
#[derive(Debug)]
pub struct SeenEvents {
    cap: usize,
    order: VecDeque<String>,
    ids: HashSet<String>,
}

impl SeenEvents {
    #[must_use]
    pub fn new(cap: usize) -> Self {
        Self {
            cap,
            order: VecDeque::with_capacity(cap),
            ids: HashSet::with_capacity(cap),
        }
    }

    /// Records `event_id`; returns `false` if it was already recorded.
    pub fn first_sighting(&mut self, event_id: &str) -> bool {
        if self.ids.contains(event_id) {
            return false;
        }
        if self.order.len() >= self.cap
            && let Some(oldest) = self.order.pop_front()
        {
            self.ids.remove(&oldest);
        }
        self.order.push_back(event_id.to_string());
        self.ids.insert(event_id.to_string());
        true
    }

    /// Extracts the message event unless this envelope repeats one already seen.
    pub fn accept(&mut self, envelope: &SocketModeEnvelope) -> Option<MessageEvent> {
        if let Some(event_id) = envelope.event_id()
            && !self.first_sighting(event_id)
        {
            debug!(
                event_id,
                retry_attempt = envelope.retry_attempt,
                reason = ?envelope.retry_reason,
                "Skipping redelivered event"
            );
            return None;
        }
        extract_message_event(envelope)
    }
}

/// A decoded text frame.
#[derive(Debug)]
pub enum SocketFrame {
    Hello,
    /// Slack asks the client to reconnect, usually for connection rotation.
    Disconnect(String),
    Envelope(SocketModeEnvelope),
    Ignored,
}

/// Decodes one text frame.
///
/// # Errors
///
/// Returns `BotError::ParseError` for frames that are not JSON.
pub fn parse_frame(text: &str) -> Result<SocketFrame, BotError> {
    let raw: Value = serde_json::from_str(text)?;
    let frame_type = raw.get("type").and_then(Value::as_str).unwrap_or("");
    match frame_type {
        "hello" => Ok(SocketFrame::Hello),
        "disconnect" => Ok(SocketFrame::Disconnect(
            raw.get("reason")
                .and_then(Value::as_str)
                .unwrap_or("unknown")
                .to_string(),
        )),
        _ => match serde_json::from_value::<SocketModeEnvelope>(raw) {
            Ok(envelope) => Ok(SocketFrame::Envelope(envelope)),
            Err(e) => {
                debug!("Unrecognized socket frame: {}", e);
                Ok(SocketFrame::Ignored)
            }
        },
    }
}

/// Maps an `events_api` envelope to a message event.
///
/// Events without a channel or user (edits, deletions, joins) are dropped.
#[must_use]
pub fn extract_message_event(envelope: &SocketModeEnvelope) -> Option<MessageEvent> {
    if envelope.envelope_type != "events_api" {
        return None;
    }
    let event = envelope.payload.get("event")?;
    let field = |name: &str| event.get(name).and_then(Value::as_str);

    Some(MessageEvent {
        channel: field("channel")?.to_string(),
        user: field("user")?.to_string(),
        text: field("text").unwrap_or_default().to_string(),
        kind: EventKind::from(field("type")?),
    })
}

/// Socket Mode URLs must be `wss://`.
///
/// # Errors
///
/// Returns `BotError::TransportError` for unparsable or non-`wss` URLs.
pub fn validate_socket_url(raw: &str) -> Result<Url, BotError> {
    let url = Url::parse(raw)
        .map_err(|e| BotError::TransportError(format!("invalid Socket Mode url: {e}")))?;
    if url.scheme() != "wss" {
        return Err(BotError::TransportError(format!(
            "Socket Mode url must use wss, got {}",
            url.scheme()
        )));
    }
    Ok(url)
}

pub struct SocketModeClient {
    http: Client,
    app_token: String,
    connections_open_url: String,
    stream: Option<SocketStream>,
    seen: SeenEvents,
}

impl SocketModeClient {
    #[must_use]
    pub fn new(http: Client, app_token: String) -> Self {
        Self {
            http,
            app_token,
            connections_open_url: CONNECTIONS_OPEN_URL.to_string(),
            stream: None,
            seen: SeenEvents::new(SEEN_EVENT_CAP),
        }
    }

    /// Calls `apps.connections.open` and connects to the returned websocket.
    ///
    /// # Errors
    ///
    /// Returns `BotError::TransportError` when Slack refuses the token or the
    /// websocket handshake fails.
    pub async fn connect(&mut self) -> Result<(), BotError> {
        let response: Value = self
            .http
            .post(&self.connections_open_url)
            .bearer_auth(&self.app_token)
            .send()
            .await?
            .json()
            .await?;

        if response.get("ok").and_then(Value::as_bool) != Some(true) {
            let err = response
                .get("error")
                .and_then(Value::as_str)
                .unwrap_or("unknown");
            return Err(BotError::TransportError(format!(
                "apps.connections.open failed: {err}"
            )));
        }

        let url = response
            .get("url")
            .and_then(Value::as_str)
            .ok_or_else(|| {
                BotError::TransportError("apps.connections.open returned no url".to_string())
            })?;

        let url = validate_socket_url(url)?;
        let (stream, _) = connect_async(url.as_str()).await?;
        self.stream = Some(stream);
        info!("Socket Mode connected");
        Ok(())
    }

    fn stream(&mut self) -> Result<&mut SocketStream, BotError> {
        self.stream
            .as_mut()
            .ok_or_else(|| BotError::TransportError("Socket Mode not connected".to_string()))
    }

    async fn send(&mut self, message: WsMessage) -> Result<(), BotError> {
        self.stream()?.send(message).await?;
        Ok(())
    }

    /// Drains the frames that are already buffered, without waiting.
    ///
    /// Envelopes are acknowledged as they are read. A `disconnect` request is
    /// answered with a fresh connection.
    ///
    /// # Errors
    ///
    /// Returns `BotError::TransportError` when the socket is closed or broken,
    /// or when reconnecting fails.
    pub async fn poll_events(&mut self) -> Result<Vec<MessageEvent>, BotError> {
        let mut events = Vec::new();

        for _ in 0..MAX_FRAMES_PER_POLL {
            let frame = match self.stream()?.next().now_or_never() {
                None => break,
                Some(None) => {
                    return Err(BotError::TransportError("Socket Mode stream ended".to_string()));
                }
                Some(Some(frame)) => frame?,
            };

            match frame {
                WsMessage::Text(text) => match parse_frame(text.as_str()) {
                    Ok(SocketFrame::Hello) => info!("Socket Mode hello received"),
                    Ok(SocketFrame::Disconnect(reason)) => {
                        warn!("Socket Mode disconnect requested ({}), reconnecting", reason);
                        self.connect().await?;
                        break;
                    }
                    Ok(SocketFrame::Envelope(envelope)) => {
                        let ack = json!({ "envelope_id": &envelope.envelope_id });
                        self.send(WsMessage::Text(ack.to_string().into())).await?;
                        events.extend(self.seen.accept(&envelope));
                    }
                    Ok(SocketFrame::Ignored) => {}
                    Err(e) => warn!("Dropping unparseable socket frame: {}", e),
                },
                WsMessage::Ping(data) => self.send(WsMessage::Pong(data)).await?,
                WsMessage::Close(close) => {
                    return Err(BotError::TransportError(format!(
                        "Socket Mode closed by server: {close:?}"
                    )));
                }
                _ => {}
            }
        }

        Ok(events)
    }
}
