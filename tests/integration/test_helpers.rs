//! Shared helpers for broker-facing integration tests.
//!
//! Provides a scripted single-connection TCP broker and config builders so
//! individual test modules can focus on behaviour rather than sockets.

use std::net::SocketAddr;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use topic_relay::config::{RetryConfig, TransportKind};
use topic_relay::ClientConfig;

/// A broker that accepts one connection, reads one command frame, writes a
/// scripted byte sequence, and closes.
pub struct MockBroker {
    pub addr: SocketAddr,
    handle: JoinHandle<Vec<u8>>,
}

impl MockBroker {
    /// Bind an ephemeral port and serve `script` to the first client.
    ///
    /// `script` is written verbatim, so it may contain partial or malformed
    /// frames.
    pub async fn spawn(script: Vec<u8>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind mock broker");
        let addr = listener.local_addr().expect("local addr");
        let handle = tokio::spawn(serve_once(listener, script));
        Self { addr, handle }
    }

    /// Client config pointing at this broker over the socket transport.
    pub fn config(&self) -> ClientConfig {
        config_for_port(self.addr.port())
    }

    /// Wait for the broker to finish and return the command payload it read.
    pub async fn received_command(self) -> String {
        let payload = self.handle.await.expect("mock broker task");
        String::from_utf8(payload).expect("command frame is utf-8")
    }
}

/// Accept one client, read its command frame, then play back `script`.
pub async fn serve_once(listener: TcpListener, script: Vec<u8>) -> Vec<u8> {
    let (mut socket, _) = listener.accept().await.expect("accept client");

    let len = socket.read_u32().await.expect("read frame header");
    let mut payload = vec![0u8; usize::try_from(len).expect("frame length fits usize")];
    socket
        .read_exact(&mut payload)
        .await
        .expect("read frame payload");

    socket.write_all(&script).await.expect("write script");
    socket.shutdown().await.expect("shutdown");
    payload
}

/// Frame `payload` with a 4-byte big-endian length prefix.
pub fn frame(payload: &[u8]) -> Vec<u8> {
    let len = u32::try_from(payload.len()).expect("payload fits u32");
    let mut out = len.to_be_bytes().to_vec();
    out.extend_from_slice(payload);
    out
}

/// Concatenate framed payloads into one script.
pub fn frames(payloads: &[&str]) -> Vec<u8> {
    payloads.iter().flat_map(|p| frame(p.as_bytes())).collect()
}

/// Loopback socket config with a short connect timeout.
pub fn config_for_port(port: u16) -> ClientConfig {
    ClientConfig {
        host: "127.0.0.1".into(),
        port,
        transport: TransportKind::Socket,
        connect_timeout_ms: 1000,
        retry: RetryConfig::default(),
        ..ClientConfig::default()
    }
}

/// A loopback port with nothing listening on it.
pub async fn closed_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind probe listener");
    let port = listener.local_addr().expect("local addr").port();
    drop(listener);
    port
}
