#![forbid(unsafe_code)]

//! Topic-based publish/subscribe client.
//!
//! Builds `subscribe`, `unsubscribe`, and `publish` commands, delivers them
//! to a broker over a socket or gRPC transport, and surfaces subscribed
//! messages as JSON or XML text.

pub mod client;
pub mod codec;
pub mod config;
pub mod errors;
pub mod models;
pub mod protocol;
pub mod retry;
pub mod session;
pub mod transport;

pub use codec::Format;
pub use config::ClientConfig;
pub use errors::{AppError, Result};
