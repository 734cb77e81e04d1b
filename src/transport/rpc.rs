//! gRPC streaming transport.
//!
//! Speaks the broker's `MessageBroker` service over an insecure channel.
//! Unlike the socket transport, message boundaries are exact: one streamed
//! item is one [`Message`].
//!
//! | Command       | Call                                  |
//! |---------------|---------------------------------------|
//! | `subscribe`   | server-streaming `Subscribe`          |
//! | `unsubscribe` | unary `Unsubscribe` → reply text      |
//! | `publish`     | unary `Publish` → reply text          |

use futures_util::StreamExt;
use tonic::client::Grpc;
use tonic::codec::ProstCodec;
use tonic::codegen::http::uri::PathAndQuery;
use tonic::transport::{Channel, Endpoint};
use tonic::{Request, Status};
use tracing::{debug, warn};

use crate::config::ClientConfig;
use crate::models::{Command, CommandKind, Message, Topic};
use crate::transport::proto::{paths, BrokerReply, Delivery, PublishRequest, TopicRequest};
use crate::transport::{InboundStream, Transport, TransportFuture};
use crate::{AppError, Result};

/// Connected gRPC client for the broker service.
#[derive(Debug)]
pub struct RpcTransport {
    grpc: Grpc<Channel>,
    endpoint: String,
}

impl RpcTransport {
    /// Establish the channel to `config.rpc_uri()`.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Connection`] if the URI is invalid or the channel
    /// cannot be established within the connect timeout.
    pub async fn connect(config: &ClientConfig) -> Result<Self> {
        let uri = config.rpc_uri();
        let mut endpoint = Endpoint::from_shared(uri.clone())
            .map_err(|err| AppError::Connection(format!("invalid broker uri {uri}: {err}")))?;
        if let Some(limit) = config.connect_timeout() {
            endpoint = endpoint.connect_timeout(limit);
        }

        let channel = endpoint
            .connect()
            .await
            .map_err(|err| AppError::Connection(format!("failed to connect to {uri}: {err}")))?;

        debug!(endpoint = %uri, "rpc transport connected");
        Ok(Self {
            grpc: Grpc::new(channel),
            endpoint: uri,
        })
    }

    async fn ready(&mut self) -> Result<()> {
        self.grpc
            .ready()
            .await
            .map_err(|err| AppError::Transport(format!("broker service not ready: {err}")))
    }

    /// Issue the server-streaming `Subscribe` call.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Transport`] if the call is rejected.
    pub async fn subscribe_call(mut self, topic: Topic) -> Result<InboundStream> {
        self.ready().await?;
        let request = TopicRequest {
            topic: topic.as_str().to_owned(),
        };
        let codec: ProstCodec<TopicRequest, Delivery> = ProstCodec::default();
        let response = self
            .grpc
            .server_streaming(
                Request::new(request),
                PathAndQuery::from_static(paths::SUBSCRIBE),
                codec,
            )
            .await
            .map_err(|status| status_error(&status))?;

        debug!(endpoint = %self.endpoint, %topic, "rpc transport: streaming");
        // The channel must outlive the response stream.
        let channel = self.grpc;
        let inbound = response.into_inner().map(move |item| {
            let _channel = &channel;
            item.map(|delivery| Message::new(topic.clone(), delivery.content))
                .map_err(|status| status_error(&status))
        });
        Ok(Box::pin(inbound) as InboundStream)
    }

    /// Issue a unary `Unsubscribe` or `Publish` call and return the reply text.
    ///
    /// A reply with `success = false` (for example `Topic not found`) is a
    /// broker answer, not a client error, so it is returned as text.
    ///
    /// # Errors
    ///
    /// - [`AppError::InvalidCommand`] for `subscribe`, which has no unary form.
    /// - [`AppError::Transport`] if the call fails with a non-OK status.
    pub async fn unary_call(&mut self, command: &Command) -> Result<String> {
        let topic = command.topic().as_str().to_owned();
        let reply = match command.kind() {
            CommandKind::Unsubscribe => self.unsubscribe_rpc(TopicRequest { topic }).await?,
            CommandKind::Publish => {
                let request = PublishRequest {
                    topic,
                    message: Some(Delivery {
                        content: command.content().unwrap_or_default().to_owned(),
                    }),
                };
                self.publish_rpc(request).await?
            }
            CommandKind::Subscribe => {
                return Err(AppError::InvalidCommand(
                    "subscribe must be issued as a streaming call".into(),
                ));
            }
        };

        if !reply.success {
            warn!(
                command = %command.kind(),
                topic = %command.topic(),
                reply = %reply.message,
                "broker declined command"
            );
        }
        Ok(reply.message)
    }

    async fn unsubscribe_rpc(&mut self, request: TopicRequest) -> Result<BrokerReply> {
        self.ready().await?;
        let codec: ProstCodec<TopicRequest, BrokerReply> = ProstCodec::default();
        self.grpc
            .unary(
                Request::new(request),
                PathAndQuery::from_static(paths::UNSUBSCRIBE),
                codec,
            )
            .await
            .map(tonic::Response::into_inner)
            .map_err(|status| status_error(&status))
    }

    async fn publish_rpc(&mut self, request: PublishRequest) -> Result<BrokerReply> {
        self.ready().await?;
        let codec: ProstCodec<PublishRequest, BrokerReply> = ProstCodec::default();
        self.grpc
            .unary(
                Request::new(request),
                PathAndQuery::from_static(paths::PUBLISH),
                codec,
            )
            .await
            .map(tonic::Response::into_inner)
            .map_err(|status| status_error(&status))
    }
}

impl Transport for RpcTransport {
    fn send_command(&mut self, command: &Command) -> TransportFuture<'_, Option<String>> {
        let command = command.clone();
        Box::pin(async move { self.unary_call(&command).await.map(Some) })
    }

    fn open_stream(self: Box<Self>, command: &Command) -> TransportFuture<'static, InboundStream> {
        let kind = command.kind();
        let topic = command.topic().clone();
        Box::pin(async move {
            if kind != CommandKind::Subscribe {
                return Err(AppError::InvalidCommand(format!(
                    "{kind} cannot open a stream"
                )));
            }
            (*self).subscribe_call(topic).await
        })
    }

    fn close(self: Box<Self>) -> TransportFuture<'static, ()> {
        // Dropping the channel tears down the HTTP/2 connection.
        Box::pin(async move {
            drop(self);
            Ok(())
        })
    }
}

/// Map a non-OK gRPC status to [`AppError::Transport`].
fn status_error(status: &Status) -> AppError {
    AppError::Transport(format!(
        "rpc failed with {:?}: {}",
        status.code(),
        status.message()
    ))
}
