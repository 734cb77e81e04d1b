//! Caller-facing operations.
//!
//! Each call is one session on a fresh connection. Topic, content, and
//! command invariants are checked before any connect attempt.

use tracing::info_span;
use tracing::Instrument;

use crate::codec::{encode_message, Format};
use crate::config::ClientConfig;
use crate::models::{CommandKind, Message, Topic};
use crate::protocol::build_command;
use crate::session::{PublisherSession, SubscriberSession, SubscriptionStream};
use crate::Result;

/// Subscribe to `topic` and return the lazy stream of formatted messages.
///
/// The stream ends when the broker closes the connection.
///
/// # Errors
///
/// - [`AppError::InvalidCommand`](crate::AppError::InvalidCommand) if `topic` is empty.
/// - [`AppError::Connection`](crate::AppError::Connection) if the broker is unreachable.
/// - [`AppError::Transport`](crate::AppError::Transport) if the subscribe cannot be sent.
pub async fn subscribe(
    config: &ClientConfig,
    topic: &str,
    format: Format,
) -> Result<SubscriptionStream> {
    let topic = Topic::new(topic)?;
    let span = info_span!("subscribe", topic = %topic);
    let session = SubscriberSession::open(config, topic, format)
        .instrument(span)
        .await?;
    Ok(session.into_stream())
}

/// Unsubscribe from `topic` over a new connection.
///
/// Returns the broker's reply rendered as a [`Message`] in `format`, or
/// `None` when the transport has no reply channel. Repeating the call for an
/// already-unsubscribed topic produces the same kind of result.
///
/// # Errors
///
/// - [`AppError::InvalidCommand`](crate::AppError::InvalidCommand) if `topic` is empty.
/// - [`AppError::Connection`](crate::AppError::Connection) if the broker is unreachable.
/// - [`AppError::Transport`](crate::AppError::Transport) if delivery fails.
pub async fn unsubscribe(
    config: &ClientConfig,
    topic: &str,
    format: Format,
) -> Result<Option<String>> {
    let command = build_command(CommandKind::Unsubscribe, topic, None)?;
    run_single_shot(config, PublisherSession::new(command)?, format).await
}

/// Publish `content` to `topic` over a new connection.
///
/// # Errors
///
/// - [`AppError::InvalidCommand`](crate::AppError::InvalidCommand) if `topic`
///   or `content` is empty, before any connection attempt.
/// - [`AppError::Connection`](crate::AppError::Connection) if the broker is unreachable.
/// - [`AppError::Transport`](crate::AppError::Transport) if delivery fails.
pub async fn publish(
    config: &ClientConfig,
    topic: &str,
    content: &str,
    format: Format,
) -> Result<Option<String>> {
    let command = build_command(CommandKind::Publish, topic, Some(content))?;
    run_single_shot(config, PublisherSession::new(command)?, format).await
}

async fn run_single_shot(
    config: &ClientConfig,
    mut session: PublisherSession,
    format: Format,
) -> Result<Option<String>> {
    let span = info_span!(
        "command",
        kind = %session.command().kind(),
        topic = %session.command().topic()
    );
    let reply = session.run(config).instrument(span).await?;
    let topic = session.command().topic().clone();
    reply
        .map(|text| encode_message(&Message::new(topic, text), format))
        .transpose()
}
