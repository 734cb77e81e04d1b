//! Error types shared across the client.

use std::fmt::{Display, Formatter};

/// Shared client result type.
pub type Result<T> = std::result::Result<T, AppError>;

/// Client error enumeration covering every failure an invocation can end with.
#[derive(Debug)]
pub enum AppError {
    /// Configuration parsing or validation failure.
    Config(String),
    /// Broker endpoint could not be reached (refused, timed out, bad address).
    Connection(String),
    /// I/O or RPC failure after the connection was established.
    Transport(String),
    /// Command fields violate the kind/topic/content rules.
    InvalidCommand(String),
    /// Requested output format is not one of `json` or `xml`.
    UnsupportedFormat(String),
    /// Structured text or an inbound frame could not be decoded.
    Decode(String),
}

impl Display for AppError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Config(msg) => write!(f, "config: {msg}"),
            Self::Connection(msg) => write!(f, "connection: {msg}"),
            Self::Transport(msg) => write!(f, "transport: {msg}"),
            Self::InvalidCommand(msg) => write!(f, "invalid command: {msg}"),
            Self::UnsupportedFormat(msg) => write!(f, "unsupported format: {msg}"),
            Self::Decode(msg) => write!(f, "decode: {msg}"),
        }
    }
}

impl std::error::Error for AppError {}

impl From<toml::de::Error> for AppError {
    fn from(err: toml::de::Error) -> Self {
        Self::Config(format!("invalid config: {err}"))
    }
}

// Required by tokio-util codecs; connect paths map their own errors to
// `Connection` before this conversion can apply.
impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        Self::Transport(err.to_string())
    }
}
