//! All Slack-specific functionality

pub mod client;
pub mod session;
pub mod socket;
pub mod transport;

// Re-export main types for convenience
pub use client::SlackClient;
pub use session::{Session, SessionState};
pub use socket::SocketModeClient;
pub use transport::{SlackTransport, Transport};
