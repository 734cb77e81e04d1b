//! Command protocol: command construction and socket wire framing.
//!
//! A connection carries exactly one command. The client never pipelines: a
//! subscriber opens a connection, sends `subscribe`, and then only reads;
//! `unsubscribe` and `publish` each get their own connection.
//!
//! Submodules:
//! - `codec`: length-prefixed framing for the socket transport.

pub mod codec;

use crate::codec::{encode_command, Format};
use crate::models::{Command, CommandKind, Topic};
use crate::Result;

/// Structured format used for command frames on the socket transport.
///
/// Output formatting is independent of this choice; the broker always
/// receives JSON commands.
pub const WIRE_FORMAT: Format = Format::Json;

/// Build a validated [`Command`] from caller-supplied parts.
///
/// # Errors
///
/// Returns [`AppError::InvalidCommand`](crate::AppError::InvalidCommand) if
/// `topic` is empty, if `Publish` has no content or empty content, or if
/// `Subscribe`/`Unsubscribe` are given content.
pub fn build_command(kind: CommandKind, topic: &str, content: Option<&str>) -> Result<Command> {
    let topic = Topic::new(topic)?;
    Command::new(kind, topic, content.map(str::to_owned))
}

/// Encode `command` as the payload of a socket command frame.
///
/// # Errors
///
/// Propagates any codec serialisation failure.
pub fn command_frame(command: &Command) -> Result<Vec<u8>> {
    encode_command(command, WIRE_FORMAT).map(String::into_bytes)
}
