//! Transport strategies behind one logical protocol.
//!
//! The [`Transport`] trait decouples session logic from the broker contract.
//! [`connect`] is the single place that looks at
//! [`TransportKind`]; sessions only ever hold a `Box<dyn Transport>`.
//!
//! Submodules:
//! - `socket`: length-prefixed frames over TCP.
//! - `rpc`: gRPC `MessageBroker` client built on `tonic`.
//! - `proto`: protobuf messages for the gRPC contract.

pub mod proto;
pub mod rpc;
pub mod socket;

use std::future::Future;
use std::pin::Pin;

use futures_util::Stream;
use tracing::debug;

use crate::config::{ClientConfig, TransportKind};
use crate::models::{Command, Message};
use crate::retry::retry_async;
use crate::{AppError, Result};

use self::rpc::RpcTransport;
use self::socket::SocketTransport;

/// Lazy sequence of inbound messages for one subscription.
///
/// Ends when the broker closes the stream. A transport failure is yielded as
/// a single `Err` item, after which the stream ends.
pub type InboundStream = Pin<Box<dyn Stream<Item = Result<Message>> + Send>>;

/// Boxed future returned by [`Transport`] methods.
pub type TransportFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T>> + Send + 'a>>;

/// A connected broker channel that carries exactly one command.
pub trait Transport: Send {
    /// Deliver a non-streaming command (`publish` or `unsubscribe`).
    ///
    /// Resolves to the broker's reply text when the contract has one. The
    /// socket contract has none and always yields `None`.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Transport`] if the write or call fails.
    fn send_command(&mut self, command: &Command) -> TransportFuture<'_, Option<String>>;

    /// Issue a `subscribe` command and turn the connection into its inbound
    /// message stream.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Transport`] if the command cannot be delivered.
    fn open_stream(self: Box<Self>, command: &Command) -> TransportFuture<'static, InboundStream>;

    /// Release the connection after a non-streaming command.
    ///
    /// Dropping a transport also closes it; `close` additionally flushes and
    /// reports shutdown errors.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Transport`] if the shutdown fails.
    fn close(self: Box<Self>) -> TransportFuture<'static, ()>;
}

/// Open the transport selected by `config`, applying its retry policy.
///
/// Only [`AppError::Connection`] failures are retried.
///
/// # Errors
///
/// Returns [`AppError::Connection`] once every permitted attempt has failed.
pub async fn connect(config: &ClientConfig) -> Result<Box<dyn Transport>> {
    let policy = config.retry.policy();
    retry_async(
        &policy,
        |attempt| connect_once(config, attempt),
        |err| matches!(err, AppError::Connection(_)),
    )
    .await
}

async fn connect_once(config: &ClientConfig, attempt: usize) -> Result<Box<dyn Transport>> {
    debug!(
        endpoint = %config.endpoint(),
        transport = ?config.transport,
        attempt,
        "connecting to broker"
    );
    match config.transport {
        TransportKind::Socket => Ok(Box::new(SocketTransport::connect(config).await?)),
        TransportKind::Rpc => Ok(Box::new(RpcTransport::connect(config).await?)),
    }
}
