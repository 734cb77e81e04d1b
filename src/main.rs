#![forbid(unsafe_code)]

//! Command-line publish/subscribe client for `topic-relay`.
//!
//! Parses arguments, builds the client configuration, and drives one
//! session. Formatted messages go to stdout; logs go to stderr.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use futures_util::StreamExt;
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

use topic_relay::config::TransportKind;
use topic_relay::{client, AppError, ClientConfig, Format, Result};

#[derive(Debug, Copy, Clone, Eq, PartialEq, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Debug, Parser)]
#[command(
    name = "topic-relay",
    about = "Topic-based publish/subscribe client",
    version,
    long_about = None
)]
struct Cli {
    /// Path to an optional TOML configuration file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Broker host; overrides config and `PUBSUB_HOST`.
    #[arg(long)]
    host: Option<String>,

    /// Broker port; overrides config and `PUBSUB_PORT`.
    #[arg(long)]
    port: Option<u16>,

    /// Broker contract; overrides config and `PUBSUB_TRANSPORT`.
    #[arg(long, value_enum)]
    transport: Option<TransportKind>,

    /// Output format for messages: json or xml.
    #[arg(long)]
    format: Option<String>,

    /// Log output format (text or json).
    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Subscribe to a topic and print messages until the broker closes.
    Subscribe {
        /// Topic to subscribe to.
        topic: String,
    },

    /// Unsubscribe from a topic.
    Unsubscribe {
        /// Topic to unsubscribe from.
        topic: String,
    },

    /// Publish a message to a topic.
    Publish {
        /// Destination topic.
        topic: String,
        /// Message body.
        message: String,
    },
}

fn main() {
    let args = Cli::parse();
    if let Err(err) = init_tracing(args.log_format) {
        eprintln!("Error: {err}");
        std::process::exit(1);
    }

    let outcome = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|err| AppError::Config(format!("failed to build tokio runtime: {err}")))
        .and_then(|runtime| runtime.block_on(run(args)));

    if let Err(err) = outcome {
        error!(%err, "invocation failed");
        eprintln!("Error: {err}");
        std::process::exit(1);
    }
}

async fn run(args: Cli) -> Result<()> {
    let config = build_config(&args)?;
    let format = match args.format.as_deref() {
        Some(raw) => raw.parse::<Format>()?,
        None => config.format,
    };
    info!(
        endpoint = %config.endpoint(),
        transport = ?config.transport,
        %format,
        "client configured"
    );

    match args.command {
        Command::Subscribe { topic } => {
            let mut messages = client::subscribe(&config, &topic, format).await?;
            println!("Subscribed to topic: {topic}");
            while let Some(item) = messages.next().await {
                match item {
                    Ok(text) => println!("{text}"),
                    Err(AppError::Decode(msg)) => eprintln!("Skipped message: {msg}"),
                    Err(err) => return Err(err),
                }
            }
        }
        Command::Unsubscribe { topic } => {
            match client::unsubscribe(&config, &topic, format).await? {
                Some(reply) => println!("{reply}"),
                None => println!("Unsubscribed from topic: {topic}"),
            }
        }
        Command::Publish { topic, message } => {
            let reply = client::publish(&config, &topic, &message, format).await?;
            println!("Sent to topic \"{topic}\": {message}");
            if let Some(reply) = reply {
                println!("{reply}");
            }
        }
    }

    Ok(())
}

fn build_config(args: &Cli) -> Result<ClientConfig> {
    let mut config = match args.config {
        Some(ref path) => ClientConfig::load_from_path(path)?,
        None => ClientConfig::default(),
    };
    config.apply_env_overrides()?;

    if let Some(ref host) = args.host {
        config.host.clone_from(host);
    }
    if let Some(port) = args.port {
        config.port = port;
    }
    if let Some(transport) = args.transport {
        config.transport = transport;
    }
    config.validate()?;

    Ok(config)
}

fn init_tracing(log_format: LogFormat) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let subscriber = fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr);

    match log_format {
        LogFormat::Text => subscriber
            .try_init()
            .map_err(|err| AppError::Config(format!("failed to init tracing: {err}")))?,
        LogFormat::Json => subscriber
            .json()
            .try_init()
            .map_err(|err| AppError::Config(format!("failed to init tracing: {err}")))?,
    }

    Ok(())
}
