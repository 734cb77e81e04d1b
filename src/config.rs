//! Client configuration parsing, validation, and environment overrides.

use std::env;
use std::fs;
use std::path::Path;
use std::time::Duration;

use clap::ValueEnum;
use serde::Deserialize;
use tracing::debug;

use crate::codec::Format;
use crate::retry::RetryPolicy;
use crate::{AppError, Result};

/// Environment variable overriding [`ClientConfig::host`].
pub const ENV_HOST: &str = "PUBSUB_HOST";
/// Environment variable overriding [`ClientConfig::port`].
pub const ENV_PORT: &str = "PUBSUB_PORT";
/// Environment variable overriding [`ClientConfig::transport`].
pub const ENV_TRANSPORT: &str = "PUBSUB_TRANSPORT";

/// Which broker contract the client speaks.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, ValueEnum, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransportKind {
    /// Length-prefixed frames over a plain TCP stream. Default.
    #[default]
    Socket,
    /// gRPC `MessageBroker` service over an insecure HTTP/2 channel.
    Rpc,
}

impl TransportKind {
    fn parse(raw: &str) -> Result<Self> {
        match raw {
            "socket" => Ok(Self::Socket),
            "rpc" => Ok(Self::Rpc),
            other => Err(AppError::Config(format!(
                "invalid transport '{other}' (expected socket or rpc)"
            ))),
        }
    }
}

/// Connect retry settings.
///
/// Only the connect step is ever retried; once connected, any failure ends
/// the session.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct RetryConfig {
    /// Attempts including the first one; `1` disables retry.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: usize,
    /// Delay before the first retry.
    #[serde(default = "default_initial_backoff_ms")]
    pub initial_backoff_ms: u64,
    /// Upper bound for the doubling backoff.
    #[serde(default = "default_max_backoff_ms")]
    pub max_backoff_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_backoff_ms: default_initial_backoff_ms(),
            max_backoff_ms: default_max_backoff_ms(),
        }
    }
}

impl RetryConfig {
    /// Build the runtime retry policy.
    #[must_use]
    pub fn policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts,
            initial_backoff: Duration::from_millis(self.initial_backoff_ms),
            max_backoff: Duration::from_millis(self.max_backoff_ms),
            jitter: Duration::ZERO,
        }
    }
}

fn default_max_attempts() -> usize {
    1
}

fn default_initial_backoff_ms() -> u64 {
    100
}

fn default_max_backoff_ms() -> u64 {
    2000
}

fn default_host() -> String {
    "localhost".into()
}

fn default_port() -> u16 {
    65432
}

fn default_connect_timeout_ms() -> u64 {
    5000
}

fn default_max_frame_bytes() -> usize {
    crate::protocol::codec::MAX_FRAME_BYTES
}

/// Client configuration parsed from an optional `config.toml`.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct ClientConfig {
    /// Broker host name or IP address.
    #[serde(default = "default_host")]
    pub host: String,
    /// Broker port.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Broker contract to use.
    #[serde(default)]
    pub transport: TransportKind,
    /// Default output format when the caller does not choose one.
    #[serde(default)]
    pub format: Format,
    /// Connect timeout; `0` waits for the OS default.
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
    /// Largest socket frame accepted or sent.
    #[serde(default = "default_max_frame_bytes")]
    pub max_frame_bytes: usize,
    /// Connect retry policy.
    #[serde(default)]
    pub retry: RetryConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            transport: TransportKind::default(),
            format: Format::default(),
            connect_timeout_ms: default_connect_timeout_ms(),
            max_frame_bytes: default_max_frame_bytes(),
            retry: RetryConfig::default(),
        }
    }
}

impl ClientConfig {
    /// Load and validate configuration from a TOML file path.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if the file cannot be read or contains
    /// invalid TOML, or if validation fails.
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .map_err(|err| AppError::Config(format!("failed to read config: {err}")))?;
        Self::from_toml_str(&raw)
    }

    /// Parse configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if parsing or validation fails.
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Apply `PUBSUB_HOST`, `PUBSUB_PORT`, and `PUBSUB_TRANSPORT` from the
    /// process environment.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if a variable holds an invalid value.
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        self.apply_overrides_from(|key| env::var(key).ok())
    }

    /// Apply overrides from an arbitrary key lookup.
    ///
    /// Empty values are ignored.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if a value is invalid or the resulting
    /// configuration fails validation.
    pub fn apply_overrides_from<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.is_empty());

        if let Some(host) = get(ENV_HOST) {
            debug!(%host, "host overridden from environment");
            self.host = host;
        }
        if let Some(port) = get(ENV_PORT) {
            self.port = port
                .parse()
                .map_err(|err| AppError::Config(format!("invalid {ENV_PORT} '{port}': {err}")))?;
            debug!(port = self.port, "port overridden from environment");
        }
        if let Some(transport) = get(ENV_TRANSPORT) {
            self.transport = TransportKind::parse(&transport)?;
            debug!(transport = ?self.transport, "transport overridden from environment");
        }

        self.validate()
    }

    /// `host:port` string for socket connects and logging.
    #[must_use]
    pub fn endpoint(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Insecure `http://` URI for the gRPC channel.
    #[must_use]
    pub fn rpc_uri(&self) -> String {
        format!("http://{}", self.endpoint())
    }

    /// Connect timeout, or `None` when disabled.
    #[must_use]
    pub fn connect_timeout(&self) -> Option<Duration> {
        (self.connect_timeout_ms > 0).then(|| Duration::from_millis(self.connect_timeout_ms))
    }

    /// Check invariants that serde defaults cannot express.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` describing the first violated rule.
    pub fn validate(&self) -> Result<()> {
        if self.host.trim().is_empty() {
            return Err(AppError::Config("host must not be empty".into()));
        }

        if self.port == 0 {
            return Err(AppError::Config("port must be greater than zero".into()));
        }

        if self.max_frame_bytes == 0 {
            return Err(AppError::Config(
                "max_frame_bytes must be greater than zero".into(),
            ));
        }

        if self.retry.max_attempts == 0 {
            return Err(AppError::Config(
                "retry.max_attempts must be at least 1".into(),
            ));
        }

        Ok(())
    }
}
