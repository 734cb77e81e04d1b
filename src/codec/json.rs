//! JSON rendering.

use serde::{Deserialize, Serialize};

use crate::{AppError, Result};

/// Borrowed view used for encoding; field order is the wire key order.
#[derive(Serialize)]
struct CommandOut<'a> {
    command: &'a str,
    topic: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    content: Option<&'a str>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct CommandIn {
    command: String,
    topic: String,
    #[serde(default)]
    content: Option<String>,
}

#[derive(Serialize)]
struct MessageOut<'a> {
    topic: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct MessageIn {
    topic: String,
    content: String,
}

pub(super) fn encode_command(kind: &str, topic: &str, content: Option<&str>) -> Result<String> {
    serde_json::to_string(&CommandOut {
        command: kind,
        topic,
        content,
    })
    .map_err(|e| AppError::Decode(format!("failed to serialise json command: {e}")))
}

pub(super) fn decode_command(raw: &str) -> Result<(String, String, Option<String>)> {
    let doc: CommandIn = serde_json::from_str(raw)
        .map_err(|e| AppError::Decode(format!("malformed json command: {e}")))?;
    Ok((doc.command, doc.topic, doc.content))
}

pub(super) fn encode_message(topic: &str, content: &str) -> Result<String> {
    serde_json::to_string(&MessageOut { topic, content })
        .map_err(|e| AppError::Decode(format!("failed to serialise json message: {e}")))
}

pub(super) fn decode_message(raw: &str) -> Result<(String, String)> {
    let doc: MessageIn = serde_json::from_str(raw)
        .map_err(|e| AppError::Decode(format!("malformed json message: {e}")))?;
    Ok((doc.topic, doc.content))
}
