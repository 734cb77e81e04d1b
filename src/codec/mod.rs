//! Message codec: structured-text renderings of commands and messages.
//!
//! Two interchangeable formats are supported, selected out-of-band by the
//! caller:
//!
//! | [`Format`]     | Command                                                        | Message                                           |
//! |----------------|----------------------------------------------------------------|---------------------------------------------------|
//! | `Json`         | `{"command":"publish","topic":"t","content":"c"}`              | `{"topic":"t","content":"c"}`                      |
//! | `Xml`          | `<Request><Command>publish</Command><Topic>t</Topic><Content>c</Content></Request>` | `<Message><Topic>t</Topic><Content>c</Content></Message>` |
//!
//! `content` / `<Content>` is omitted from `subscribe` and `unsubscribe`
//! commands. Every encoder is deterministic: fixed key order, no whitespace,
//! no timestamps.

mod json;
mod xml;

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::Deserialize;

use crate::models::{Command, CommandKind, Message, Topic};
use crate::{AppError, Result};

/// Structured-text format used to render commands and messages.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize)]
#[serde(try_from = "String")]
pub enum Format {
    /// JSON object with lower-case keys.
    #[default]
    Json,
    /// XML element tree with `PascalCase` element names.
    Xml,
}

impl Format {
    /// Name accepted by [`Format::from_str`].
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Xml => "xml",
        }
    }
}

impl FromStr for Format {
    type Err = AppError;

    /// Parse a format name.
    ///
    /// Only `json` and `xml` are accepted; there is no fallback.
    fn from_str(s: &str) -> Result<Self> {
        match s {
            "json" => Ok(Self::Json),
            "xml" => Ok(Self::Xml),
            other => Err(AppError::UnsupportedFormat(format!(
                "'{other}' (expected json or xml)"
            ))),
        }
    }
}

impl TryFrom<String> for Format {
    type Error = AppError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl Display for Format {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Render `command` in `format`.
///
/// # Errors
///
/// Returns [`AppError::Decode`] if the underlying serializer fails, which
/// does not happen for well-formed UTF-8 fields.
pub fn encode_command(command: &Command, format: Format) -> Result<String> {
    let kind = command.kind().as_str();
    let topic = command.topic().as_str();
    let content = command.content();
    match format {
        Format::Json => json::encode_command(kind, topic, content),
        Format::Xml => xml::encode_command(kind, topic, content),
    }
}

/// Parse a command previously rendered by [`encode_command`].
///
/// The decoded fields go through [`Command::new`], so a frame that breaks
/// the kind/content pairing is rejected just like a hand-built one.
///
/// # Errors
///
/// - [`AppError::Decode`] on malformed text, unknown keys, or missing fields.
/// - [`AppError::InvalidCommand`] on an unknown verb, empty topic, or a
///   content field that does not match the verb.
pub fn decode_command(raw: &str, format: Format) -> Result<Command> {
    let (kind, topic, content) = match format {
        Format::Json => json::decode_command(raw)?,
        Format::Xml => xml::decode_command(raw)?,
    };
    let kind: CommandKind = kind.parse()?;
    Command::new(kind, Topic::new(topic)?, content)
}

/// Render `message` in `format`.
///
/// # Errors
///
/// Returns [`AppError::Decode`] if the underlying serializer fails.
pub fn encode_message(message: &Message, format: Format) -> Result<String> {
    let topic = message.topic.as_str();
    let content = message.content.as_str();
    match format {
        Format::Json => json::encode_message(topic, content),
        Format::Xml => xml::encode_message(topic, content),
    }
}

/// Parse a message previously rendered by [`encode_message`].
///
/// # Errors
///
/// Returns [`AppError::Decode`] on malformed text, unknown keys (including a
/// `command` key), missing fields, or an empty topic.
pub fn decode_message(raw: &str, format: Format) -> Result<Message> {
    let (topic, content) = match format {
        Format::Json => json::decode_message(raw)?,
        Format::Xml => xml::decode_message(raw)?,
    };
    let topic = Topic::new(topic).map_err(|_| AppError::Decode("message topic is empty".into()))?;
    Ok(Message::new(topic, content))
}
