//! Connect failure and retry behaviour for both transports.

use std::time::Duration;

use tokio::net::TcpListener;

use topic_relay::client;
use topic_relay::config::{RetryConfig, TransportKind};
use topic_relay::{AppError, Format};

use super::test_helpers::{closed_port, config_for_port, serve_once};

#[tokio::test]
async fn socket_connect_to_closed_port_fails() {
    let config = config_for_port(closed_port().await);

    let result = client::subscribe(&config, "weather", Format::Json).await;

    match result {
        Err(AppError::Connection(msg)) => assert!(msg.contains("127.0.0.1"), "got: {msg}"),
        Err(other) => panic!("expected AppError::Connection, got: {other:?}"),
        Ok(_) => panic!("expected AppError::Connection, got a stream"),
    }
}

#[tokio::test]
async fn rpc_connect_to_closed_port_fails() {
    let mut config = config_for_port(closed_port().await);
    config.transport = TransportKind::Rpc;

    let result = client::publish(&config, "weather", "sunny", Format::Json).await;

    assert!(
        matches!(result, Err(AppError::Connection(_))),
        "expected Err(AppError::Connection), got: {result:?}"
    );
}

#[tokio::test]
async fn publish_to_closed_port_fails_without_retry() {
    let config = config_for_port(closed_port().await);

    let result = client::publish(&config, "weather", "sunny", Format::Json).await;

    assert!(matches!(result, Err(AppError::Connection(_))), "got: {result:?}");
}

#[tokio::test]
async fn retry_reaches_a_broker_that_starts_late() {
    let port = closed_port().await;
    let mut config = config_for_port(port);
    config.retry = RetryConfig {
        max_attempts: 20,
        initial_backoff_ms: 25,
        max_backoff_ms: 100,
    };

    let broker = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(150)).await;
        let listener = TcpListener::bind(("127.0.0.1", port))
            .await
            .expect("rebind late broker");
        serve_once(listener, Vec::new()).await
    });

    let reply = client::publish(&config, "weather", "sunny", Format::Json)
        .await
        .expect("publish succeeds after retry");

    assert_eq!(reply, None);
    let payload = broker.await.expect("broker task");
    assert_eq!(
        String::from_utf8(payload).expect("utf-8"),
        r#"{"command":"publish","topic":"weather","content":"sunny"}"#
    );
}
