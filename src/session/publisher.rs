//! Single-shot command session.
//!
//! Carries one `publish` or `unsubscribe` command: connect, send, close.
//! The socket contract expects no reply; the gRPC contract returns a short
//! status text, which is handed back to the caller unchanged.

use tracing::{debug, info, warn};

use crate::config::ClientConfig;
use crate::models::{Command, CommandKind};
use crate::session::{new_session_id, SessionState};
use crate::transport::{self, Transport};
use crate::{AppError, Result};

/// Session for a non-streaming command.
#[derive(Debug)]
pub struct PublisherSession {
    id: String,
    command: Command,
    state: SessionState,
}

impl PublisherSession {
    /// Prepare a session for `command`.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::InvalidCommand`] for `subscribe`, which needs a
    /// [`SubscriberSession`](crate::session::SubscriberSession).
    pub fn new(command: Command) -> Result<Self> {
        if command.kind() == CommandKind::Subscribe {
            return Err(AppError::InvalidCommand(
                "subscribe requires a streaming session".into(),
            ));
        }
        Ok(Self {
            id: new_session_id(),
            command,
            state: SessionState::Idle,
        })
    }

    /// Connect using `config` and deliver the command.
    ///
    /// # Errors
    ///
    /// - [`AppError::Connection`] if the broker cannot be reached.
    /// - [`AppError::Transport`] if the command cannot be delivered.
    pub async fn run(&mut self, config: &ClientConfig) -> Result<Option<String>> {
        let transport = match transport::connect(config).await {
            Ok(transport) => transport,
            Err(err) => {
                warn!(
                    session_id = %self.id,
                    endpoint = %config.endpoint(),
                    error = %err,
                    "connect failed"
                );
                self.state = SessionState::Closed;
                return Err(err);
            }
        };
        self.deliver(transport).await
    }

    /// Deliver the command over an already-connected transport, then close it.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Transport`] if the command cannot be delivered.
    pub async fn deliver(&mut self, mut transport: Box<dyn Transport>) -> Result<Option<String>> {
        self.state = SessionState::Connected;

        let reply = match transport.send_command(&self.command).await {
            Ok(reply) => reply,
            Err(err) => {
                warn!(session_id = %self.id, error = %err, "command delivery failed");
                self.state = SessionState::Closed;
                return Err(err);
            }
        };
        self.state = SessionState::Sent;
        info!(
            session_id = %self.id,
            command = %self.command.kind(),
            topic = %self.command.topic(),
            "command sent"
        );

        // The broker already has the command; a failed shutdown does not undo it.
        if let Err(err) = transport.close().await {
            debug!(session_id = %self.id, error = %err, "transport close failed");
        }
        self.state = SessionState::Closed;

        Ok(reply)
    }

    /// Command carried by this session.
    #[must_use]
    pub fn command(&self) -> &Command {
        &self.command
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> SessionState {
        self.state
    }
}
