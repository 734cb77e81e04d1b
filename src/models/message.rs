//! Inbound message delivered to a subscriber.

use crate::models::topic::Topic;

/// Payload published to a topic and delivered to its subscribers.
///
/// Unlike [`Command`](crate::models::Command), a message never carries a
/// command kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    /// Topic the message was published to.
    pub topic: Topic,
    /// Message body as sent by the publisher.
    pub content: String,
}

impl Message {
    /// Construct a message for `topic`.
    #[must_use]
    pub fn new(topic: Topic, content: impl Into<String>) -> Self {
        Self {
            topic,
            content: content.into(),
        }
    }
}
