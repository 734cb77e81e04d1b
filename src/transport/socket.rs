//! Byte-stream socket transport.
//!
//! Sends one length-prefixed JSON command frame, then either closes
//! (`publish`, `unsubscribe`) or reads length-prefixed message frames until
//! the broker closes (`subscribe`). Each inbound frame payload is the raw
//! UTF-8 message body; the topic comes from the subscribe command.
//!
//! The [`TcpStream`] is owned by the transport and later by the inbound
//! stream, so it is closed on every exit path by drop.

use bytes::{Bytes, BytesMut};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_util::codec::Framed;
use tracing::{debug, warn};

use crate::config::ClientConfig;
use crate::models::{Command, Message, Topic};
use crate::protocol::codec::FrameCodec;
use crate::protocol::command_frame;
use crate::transport::{InboundStream, Transport, TransportFuture};
use crate::{AppError, Result};

/// Framed TCP connection to a socket broker.
#[derive(Debug)]
pub struct SocketTransport {
    framed: Framed<TcpStream, FrameCodec>,
    endpoint: String,
}

impl SocketTransport {
    /// Connect to `config.endpoint()`, honouring the connect timeout.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Connection`] if the connection is refused, the
    /// address does not resolve, or the timeout elapses.
    pub async fn connect(config: &ClientConfig) -> Result<Self> {
        let endpoint = config.endpoint();
        let connecting = TcpStream::connect((config.host.as_str(), config.port));

        let connected = match config.connect_timeout() {
            Some(limit) => tokio::time::timeout(limit, connecting).await.map_err(|_| {
                AppError::Connection(format!(
                    "timed out connecting to {endpoint} after {}ms",
                    limit.as_millis()
                ))
            })?,
            None => connecting.await,
        };

        let stream = connected.map_err(|err| {
            AppError::Connection(format!("failed to connect to {endpoint}: {err}"))
        })?;

        debug!(%endpoint, "socket transport connected");
        Ok(Self::from_stream(stream, config.max_frame_bytes, endpoint))
    }

    /// Wrap an already-connected stream.
    #[must_use]
    pub fn from_stream(stream: TcpStream, max_frame_bytes: usize, endpoint: String) -> Self {
        Self {
            framed: Framed::new(stream, FrameCodec::with_max_frame_bytes(max_frame_bytes)),
            endpoint,
        }
    }

    /// Address this transport is connected to.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn write_frame(&mut self, frame: Vec<u8>) -> Result<()> {
        self.framed.send(Bytes::from(frame)).await.map_err(|err| {
            warn!(endpoint = %self.endpoint, error = %err, "socket transport: write failed");
            err
        })
    }
}

impl Transport for SocketTransport {
    fn send_command(&mut self, command: &Command) -> TransportFuture<'_, Option<String>> {
        let frame = command_frame(command);
        Box::pin(async move {
            self.write_frame(frame?).await?;
            Ok(None)
        })
    }

    fn open_stream(self: Box<Self>, command: &Command) -> TransportFuture<'static, InboundStream> {
        let frame = command_frame(command);
        let topic = command.topic().clone();
        Box::pin(async move {
            let mut this = *self;
            this.write_frame(frame?).await?;
            debug!(endpoint = %this.endpoint, %topic, "socket transport: streaming");

            let inbound = this
                .framed
                .map(move |frame| frame.and_then(|bytes| decode_inbound(&topic, &bytes)));
            Ok(Box::pin(inbound) as InboundStream)
        })
    }

    fn close(self: Box<Self>) -> TransportFuture<'static, ()> {
        Box::pin(async move {
            let mut this = *self;
            SinkExt::<Bytes>::close(&mut this.framed).await
        })
    }
}

/// Wrap one inbound frame payload into a [`Message`] for `topic`.
///
/// # Errors
///
/// Returns [`AppError::Decode`] if the payload is not UTF-8.
pub fn decode_inbound(topic: &Topic, frame: &BytesMut) -> Result<Message> {
    let content = std::str::from_utf8(frame)
        .map_err(|e| AppError::Decode(format!("inbound frame is not valid utf-8: {e}")))?;
    Ok(Message::new(topic.clone(), content))
}
