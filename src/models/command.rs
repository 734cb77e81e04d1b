//! Client-to-broker control commands.

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use crate::models::topic::Topic;
use crate::{AppError, Result};

/// The three command verbs understood by the broker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandKind {
    /// Start receiving messages for a topic.
    Subscribe,
    /// Stop receiving messages for a topic.
    Unsubscribe,
    /// Deliver content to every subscriber of a topic.
    Publish,
}

impl CommandKind {
    /// Lower-case wire name of the verb.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Subscribe => "subscribe",
            Self::Unsubscribe => "unsubscribe",
            Self::Publish => "publish",
        }
    }

    /// Whether commands of this kind must carry content.
    #[must_use]
    pub fn requires_content(self) -> bool {
        matches!(self, Self::Publish)
    }
}

impl FromStr for CommandKind {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "subscribe" => Ok(Self::Subscribe),
            "unsubscribe" => Ok(Self::Unsubscribe),
            "publish" => Ok(Self::Publish),
            other => Err(AppError::InvalidCommand(format!("unknown command: {other}"))),
        }
    }
}

impl Display for CommandKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A validated command bound for the broker.
///
/// Fields are private so the kind/content pairing can only be produced by
/// [`Command::new`] and its shorthands: `Publish` always has non-empty
/// content, `Subscribe` and `Unsubscribe` never have any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    kind: CommandKind,
    topic: Topic,
    content: Option<String>,
}

impl Command {
    /// Build a command, enforcing the content rules for `kind`.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::InvalidCommand`] if `Publish` has missing or empty
    /// content, or if `Subscribe`/`Unsubscribe` are given content.
    pub fn new(kind: CommandKind, topic: Topic, content: Option<String>) -> Result<Self> {
        match (kind.requires_content(), content) {
            (true, Some(body)) if !body.is_empty() => Ok(Self {
                kind,
                topic,
                content: Some(body),
            }),
            (true, _) => Err(AppError::InvalidCommand(
                "publish requires non-empty content".into(),
            )),
            (false, None) => Ok(Self {
                kind,
                topic,
                content: None,
            }),
            (false, Some(_)) => Err(AppError::InvalidCommand(format!(
                "{kind} must not carry content"
            ))),
        }
    }

    /// Subscribe to `topic`.
    #[must_use]
    pub fn subscribe(topic: Topic) -> Self {
        Self {
            kind: CommandKind::Subscribe,
            topic,
            content: None,
        }
    }

    /// Unsubscribe from `topic`.
    #[must_use]
    pub fn unsubscribe(topic: Topic) -> Self {
        Self {
            kind: CommandKind::Unsubscribe,
            topic,
            content: None,
        }
    }

    /// Publish `content` to `topic`.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::InvalidCommand`] if `content` is empty.
    pub fn publish(topic: Topic, content: impl Into<String>) -> Result<Self> {
        Self::new(CommandKind::Publish, topic, Some(content.into()))
    }

    /// Command verb.
    #[must_use]
    pub fn kind(&self) -> CommandKind {
        self.kind
    }

    /// Target topic.
    #[must_use]
    pub fn topic(&self) -> &Topic {
        &self.topic
    }

    /// Publish payload; `None` for every other kind.
    #[must_use]
    pub fn content(&self) -> Option<&str> {
        self.content.as_deref()
    }
}
