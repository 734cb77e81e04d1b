//! Protobuf messages for the `message_broker.MessageBroker` gRPC service.
//!
//! Field tags match the broker's `message_broker.proto`; Rust type names
//! are local and do not appear on the wire.

/// Full method paths on the broker service.
pub mod paths {
    /// `rpc Subscribe(TopicRequest) returns (stream Message)`.
    pub const SUBSCRIBE: &str = "/message_broker.MessageBroker/Subscribe";
    /// `rpc Unsubscribe(TopicRequest) returns (Response)`.
    pub const UNSUBSCRIBE: &str = "/message_broker.MessageBroker/Unsubscribe";
    /// `rpc Publish(MessageMetadata) returns (Response)`.
    pub const PUBLISH: &str = "/message_broker.MessageBroker/Publish";
}

/// `TopicRequest { string topic = 1; }`
#[derive(Clone, PartialEq, prost::Message)]
pub struct TopicRequest {
    /// Topic to subscribe to or unsubscribe from.
    #[prost(string, tag = "1")]
    pub topic: String,
}

/// `Message { string content = 1; }`, one streamed delivery.
#[derive(Clone, PartialEq, prost::Message)]
pub struct Delivery {
    /// Published body.
    #[prost(string, tag = "1")]
    pub content: String,
}

/// `MessageMetadata { string topic = 1; Message message = 2; }`
#[derive(Clone, PartialEq, prost::Message)]
pub struct PublishRequest {
    /// Destination topic.
    #[prost(string, tag = "1")]
    pub topic: String,
    /// Body to broadcast.
    #[prost(message, optional, tag = "2")]
    pub message: Option<Delivery>,
}

/// `Response { bool success = 1; string message = 2; }`
#[derive(Clone, PartialEq, prost::Message)]
pub struct BrokerReply {
    /// Whether the broker applied the command.
    #[prost(bool, tag = "1")]
    pub success: bool,
    /// Human-readable outcome, e.g. `Topic not found`.
    #[prost(string, tag = "2")]
    pub message: String,
}
