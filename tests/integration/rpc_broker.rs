//! In-process gRPC broker for RPC transport tests.
//!
//! Serves `message_broker.MessageBroker` on an ephemeral loopback port with
//! the same replies as the reference broker: `Subscribe` streams a fixed
//! feed and then completes, `Unsubscribe` answers `Topic not found` for a
//! topic with no subscription, and `Publish` records the request.

use std::collections::HashSet;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};

use futures_util::stream;
use tokio::net::TcpListener;
use tonic::body::BoxBody;
use tonic::codec::ProstCodec;
use tonic::codegen::{empty_body, http, Body, BoxFuture, Service, StdError};
use tonic::server::{Grpc, NamedService, ServerStreamingService, UnaryService};
use tonic::transport::server::TcpIncoming;
use tonic::transport::Server;
use tonic::{Request, Response, Status};

use topic_relay::config::TransportKind;
use topic_relay::transport::proto::{paths, BrokerReply, Delivery, PublishRequest, TopicRequest};
use topic_relay::ClientConfig;

use super::test_helpers::config_for_port;

#[derive(Default)]
struct BrokerState {
    feed: Vec<String>,
    subscribed: HashSet<String>,
    published: Vec<PublishRequest>,
}

/// Shared handle to the broker; clones see the same state.
#[derive(Clone, Default)]
pub struct RpcBroker {
    state: Arc<Mutex<BrokerState>>,
}

impl RpcBroker {
    /// A broker whose `Subscribe` stream yields `feed` and then completes.
    pub fn with_feed(feed: &[&str]) -> Self {
        let broker = Self::default();
        broker.state.lock().unwrap().feed = feed.iter().map(|s| (*s).to_owned()).collect();
        broker
    }

    /// Start serving on `127.0.0.1:0` and return the bound address.
    pub async fn serve(&self) -> SocketAddr {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind rpc broker");
        let addr = listener.local_addr().expect("local addr");
        let incoming = TcpIncoming::from_listener(listener, true, None).expect("incoming");
        tokio::spawn(
            Server::builder()
                .add_service(self.clone())
                .serve_with_incoming(incoming),
        );
        addr
    }

    /// Every `Publish` request received so far, in arrival order.
    pub fn published(&self) -> Vec<PublishRequest> {
        self.state.lock().unwrap().published.clone()
    }

    fn subscribe(&self, topic: String) -> Vec<Result<Delivery, Status>> {
        let mut state = self.state.lock().unwrap();
        let feed = state
            .feed
            .iter()
            .map(|content| {
                Ok(Delivery {
                    content: content.clone(),
                })
            })
            .collect();
        state.subscribed.insert(topic);
        feed
    }

    fn unsubscribe(&self, topic: &str) -> BrokerReply {
        if self.state.lock().unwrap().subscribed.remove(topic) {
            BrokerReply {
                success: true,
                message: "Unsubscribed from topic".into(),
            }
        } else {
            BrokerReply {
                success: false,
                message: "Topic not found".into(),
            }
        }
    }

    fn publish(&self, request: PublishRequest) -> BrokerReply {
        self.state.lock().unwrap().published.push(request);
        BrokerReply {
            success: true,
            message: "Message published".into(),
        }
    }
}

/// Client config pointing at `addr` over the RPC transport.
pub fn rpc_config(addr: SocketAddr) -> ClientConfig {
    ClientConfig {
        transport: TransportKind::Rpc,
        ..config_for_port(addr.port())
    }
}

struct SubscribeCall(RpcBroker);

impl ServerStreamingService<TopicRequest> for SubscribeCall {
    type Response = Delivery;
    type ResponseStream = stream::Iter<std::vec::IntoIter<Result<Delivery, Status>>>;
    type Future = BoxFuture<Response<Self::ResponseStream>, Status>;

    fn call(&mut self, request: Request<TopicRequest>) -> Self::Future {
        let items = self.0.subscribe(request.into_inner().topic);
        Box::pin(async move { Ok(Response::new(stream::iter(items))) })
    }
}

struct UnsubscribeCall(RpcBroker);

impl UnaryService<TopicRequest> for UnsubscribeCall {
    type Response = BrokerReply;
    type Future = BoxFuture<Response<BrokerReply>, Status>;

    fn call(&mut self, request: Request<TopicRequest>) -> Self::Future {
        let reply = self.0.unsubscribe(&request.into_inner().topic);
        Box::pin(async move { Ok(Response::new(reply)) })
    }
}

struct PublishCall(RpcBroker);

impl UnaryService<PublishRequest> for PublishCall {
    type Response = BrokerReply;
    type Future = BoxFuture<Response<BrokerReply>, Status>;

    fn call(&mut self, request: Request<PublishRequest>) -> Self::Future {
        let reply = self.0.publish(request.into_inner());
        Box::pin(async move { Ok(Response::new(reply)) })
    }
}

impl NamedService for RpcBroker {
    const NAME: &'static str = "message_broker.MessageBroker";
}

impl<B> Service<http::Request<B>> for RpcBroker
where
    B: Body + Send + 'static,
    B::Error: Into<StdError> + Send + 'static,
{
    type Response = http::Response<BoxBody>;
    type Error = Infallible;
    type Future = BoxFuture<Self::Response, Self::Error>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: http::Request<B>) -> Self::Future {
        let broker = self.clone();
        let path = req.uri().path().to_owned();
        match path.as_str() {
            paths::SUBSCRIBE => Box::pin(async move {
                let mut grpc = Grpc::new(ProstCodec::<Delivery, TopicRequest>::default());
                Ok(grpc.server_streaming(SubscribeCall(broker), req).await)
            }),
            paths::UNSUBSCRIBE => Box::pin(async move {
                let mut grpc = Grpc::new(ProstCodec::<BrokerReply, TopicRequest>::default());
                Ok(grpc.unary(UnsubscribeCall(broker), req).await)
            }),
            paths::PUBLISH => Box::pin(async move {
                let mut grpc = Grpc::new(ProstCodec::<BrokerReply, PublishRequest>::default());
                Ok(grpc.unary(PublishCall(broker), req).await)
            }),
            _ => Box::pin(async move {
                let mut response = http::Response::new(empty_body());
                let headers = response.headers_mut();
                headers.insert(
                    http::HeaderName::from_static("grpc-status"),
                    http::HeaderValue::from(tonic::Code::Unimplemented as i32),
                );
                headers.insert(
                    http::header::CONTENT_TYPE,
                    http::HeaderValue::from_static("application/grpc"),
                );
                Ok(response)
            }),
        }
    }
}
