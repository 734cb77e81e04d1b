//! Client sessions: one connection, one command.
//!
//! - `subscriber`: `Idle -> Connected -> Streaming -> Closed`.
//! - `publisher`: `Idle -> Connected -> Sent -> Closed`, used for both
//!   `publish` and `unsubscribe`.
//!
//! No session state outlives its connection, and nothing is persisted
//! between invocations.

pub mod publisher;
pub mod subscriber;

pub use publisher::PublisherSession;
pub use subscriber::{SubscriberSession, SubscriptionStream};

/// Lifecycle position of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Created, no connection yet.
    Idle,
    /// Transport connected, command not yet delivered.
    Connected,
    /// Subscribe delivered; inbound messages are being surfaced.
    Streaming,
    /// Single-shot command delivered.
    Sent,
    /// Connection released. Terminal.
    Closed,
}

/// Fresh identifier used to correlate a session's log lines.
pub(crate) fn new_session_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
