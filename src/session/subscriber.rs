//! Subscriber session.
//!
//! Sends `subscribe` once, then surfaces each inbound message, formatted in
//! the caller's [`Format`], in exactly the order the transport yields them.
//!
//! # Termination
//!
//! | Inbound item               | Surfaced as          | Next state  |
//! |----------------------------|----------------------|-------------|
//! | message                    | `Some(Ok(text))`     | `Streaming` |
//! | undecodable frame          | `Some(Err(Decode))`  | `Streaming` |
//! | transport failure          | `Some(Err(..))`      | `Closed`    |
//! | end of stream (peer close) | `None`               | `Closed`    |
//!
//! `Idle` and `Connected` only exist inside [`SubscriberSession::open`] and
//! [`SubscriberSession::start`]: a session is handed to the caller once the
//! subscribe has been delivered, so its first observable state is
//! `Streaming`. A failed connect or subscribe returns the error instead of a
//! session.

use std::pin::Pin;

use futures_util::stream::{self, Stream, StreamExt};
use tracing::{debug, info, warn};

use crate::codec::{encode_message, Format};
use crate::config::ClientConfig;
use crate::models::{Command, Topic};
use crate::session::{new_session_id, SessionState};
use crate::transport::{self, InboundStream, Transport};
use crate::{AppError, Result};

/// Lazy sequence of formatted messages for one subscription.
pub type SubscriptionStream = Pin<Box<dyn Stream<Item = Result<String>> + Send>>;

/// A live subscription holding its connection exclusively.
pub struct SubscriberSession {
    id: String,
    topic: Topic,
    format: Format,
    state: SessionState,
    inbound: Option<InboundStream>,
    delivered: u64,
}

impl std::fmt::Debug for SubscriberSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubscriberSession")
            .field("id", &self.id)
            .field("topic", &self.topic)
            .field("format", &self.format)
            .field("state", &self.state)
            .field("delivered", &self.delivered)
            .finish_non_exhaustive()
    }
}

impl SubscriberSession {
    /// Connect using `config` and subscribe to `topic`.
    ///
    /// # Errors
    ///
    /// - [`AppError::Connection`] if the broker cannot be reached.
    /// - [`AppError::Transport`] if the subscribe command cannot be sent.
    pub async fn open(config: &ClientConfig, topic: Topic, format: Format) -> Result<Self> {
        let transport = transport::connect(config).await.map_err(|err| {
            warn!(%topic, endpoint = %config.endpoint(), error = %err, "subscribe: connect failed");
            err
        })?;
        Self::start(transport, topic, format).await
    }

    /// Subscribe over an already-connected transport.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Transport`] if the subscribe command cannot be sent.
    pub async fn start(
        transport: Box<dyn Transport>,
        topic: Topic,
        format: Format,
    ) -> Result<Self> {
        let mut session = Self {
            id: new_session_id(),
            topic,
            format,
            state: SessionState::Connected,
            inbound: None,
            delivered: 0,
        };
        debug!(session_id = %session.id, topic = %session.topic, "subscriber: connected");

        let command = Command::subscribe(session.topic.clone());
        let inbound = transport.open_stream(&command).await.map_err(|err| {
            warn!(session_id = %session.id, error = %err, "subscriber: subscribe failed");
            err
        })?;
        session.inbound = Some(inbound);
        session.state = SessionState::Streaming;

        info!(session_id = %session.id, topic = %session.topic, %format, "subscribed");
        Ok(session)
    }

    /// Wait for the next inbound message and render it.
    ///
    /// Returns `None` once the session is [`SessionState::Closed`].
    pub async fn next_message(&mut self) -> Option<Result<String>> {
        let inbound = self.inbound.as_mut()?;

        match inbound.next().await {
            Some(Ok(message)) => {
                self.delivered += 1;
                Some(encode_message(&message, self.format))
            }
            Some(Err(AppError::Decode(msg))) => {
                warn!(
                    session_id = %self.id,
                    error = %msg,
                    "subscriber: undecodable frame, skipping"
                );
                Some(Err(AppError::Decode(msg)))
            }
            Some(Err(err)) => {
                warn!(session_id = %self.id, error = %err, "subscriber: transport failed, closing");
                self.close();
                Some(Err(err))
            }
            None => {
                info!(
                    session_id = %self.id,
                    topic = %self.topic,
                    delivered = self.delivered,
                    "subscriber: broker closed the stream"
                );
                self.close();
                None
            }
        }
    }

    /// Consume the session into a lazy stream of formatted messages.
    #[must_use]
    pub fn into_stream(self) -> SubscriptionStream {
        Box::pin(stream::unfold(self, |mut session| async move {
            session.next_message().await.map(|item| (item, session))
        }))
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Subscribed topic.
    #[must_use]
    pub fn topic(&self) -> &Topic {
        &self.topic
    }

    /// Output format.
    #[must_use]
    pub fn format(&self) -> Format {
        self.format
    }

    /// Number of messages surfaced so far.
    #[must_use]
    pub fn delivered(&self) -> u64 {
        self.delivered
    }

    /// Session correlation id.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    fn close(&mut self) {
        // Dropping the stream drops the connection it owns.
        self.inbound = None;
        self.state = SessionState::Closed;
        debug!(session_id = %self.id, "subscriber: closed");
    }
}
