/// Kind of event delivered by the transport. Only `Message` is acted upon.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventKind {
    Message,
    Other(String),
}

impl From<&str> for EventKind {
    fn from(kind: &str) -> Self {
        match kind {
            "message" => EventKind::Message,
            other => EventKind::Other(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageEvent {
    pub channel: String,
    pub user: String,
    pub text: String,
    pub kind: EventKind,
}

/// The bot's own account, resolved once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BotIdentity {
    pub id: String,
    pub display_name: String,
}

/// A user record as returned by the transport's user directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRecord {
    pub id: String,
    pub name: Option<String>,
    pub is_bot: bool,
}

/// Outcome of running code on the playground.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EvaluationResult {
    Success(String),
    CompileError(String),
    /// Neither output nor diagnostics came back. Never replied to.
    Unknown,
}
