//! Subscriber sessions against a scripted socket broker.
//!
//! Validates:
//! - the subscribe command is sent once as a JSON frame
//! - every broker frame is surfaced once, in order, in the chosen format
//! - peer close ends the stream and closes the session
//! - a truncated frame yields one transport error and then ends the stream
//! - a non-UTF-8 frame is skipped without ending the stream

use futures_util::StreamExt;

use topic_relay::client;
use topic_relay::models::Topic;
use topic_relay::session::subscriber::SubscriberSession;
use topic_relay::session::SessionState;
use topic_relay::{AppError, Format};

use super::test_helpers::{frame, frames, MockBroker};

fn weather() -> Topic {
    Topic::new("weather").expect("valid topic")
}

#[tokio::test]
async fn delivers_each_frame_in_order_then_closes() {
    let broker = MockBroker::spawn(frames(&["rain", "sun", "fog"])).await;
    let config = broker.config();

    let mut session = SubscriberSession::open(&config, weather(), Format::Json)
        .await
        .expect("subscribe succeeds");
    assert_eq!(session.state(), SessionState::Streaming);

    let mut delivered = Vec::new();
    while let Some(item) = session.next_message().await {
        delivered.push(item.expect("message decodes"));
    }

    assert_eq!(
        delivered,
        vec![
            r#"{"topic":"weather","content":"rain"}"#,
            r#"{"topic":"weather","content":"sun"}"#,
            r#"{"topic":"weather","content":"fog"}"#,
        ]
    );
    assert_eq!(session.delivered(), 3);
    assert_eq!(session.state(), SessionState::Closed);
    assert!(session.next_message().await.is_none(), "closed stays closed");

    assert_eq!(
        broker.received_command().await,
        r#"{"command":"subscribe","topic":"weather"}"#
    );
}

#[tokio::test]
async fn client_stream_renders_xml() {
    let broker = MockBroker::spawn(frames(&["rain"])).await;
    let config = broker.config();

    let stream = client::subscribe(&config, "weather", Format::Xml)
        .await
        .expect("subscribe succeeds");
    let items: Vec<_> = stream.collect().await;

    assert_eq!(items.len(), 1);
    assert_eq!(
        items[0].as_ref().expect("message decodes"),
        "<Message><Topic>weather</Topic><Content>rain</Content></Message>"
    );
}

#[tokio::test]
async fn empty_stream_ends_immediately() {
    let broker = MockBroker::spawn(Vec::new()).await;
    let config = broker.config();

    let mut session = SubscriberSession::open(&config, weather(), Format::Json)
        .await
        .expect("subscribe succeeds");

    assert!(session.next_message().await.is_none());
    assert_eq!(session.delivered(), 0);
    assert_eq!(session.state(), SessionState::Closed);
}

#[tokio::test]
async fn truncated_frame_yields_one_transport_error() {
    let mut script = frames(&["rain"]);
    let partial = frame(b"sunshine");
    script.extend_from_slice(&partial[..6]);
    let broker = MockBroker::spawn(script).await;
    let config = broker.config();

    let stream = client::subscribe(&config, "weather", Format::Json)
        .await
        .expect("subscribe succeeds");
    let items: Vec<_> = stream.collect().await;

    assert_eq!(items.len(), 2, "one message then one error: {items:?}");
    assert!(items[0].is_ok());
    assert!(
        matches!(items[1], Err(AppError::Transport(_))),
        "expected Err(AppError::Transport), got: {:?}",
        items[1]
    );
}

#[tokio::test]
async fn non_utf8_frame_is_skipped() {
    let mut script = frame(&[0xff, 0xfe, 0xfd]);
    script.extend_from_slice(&frames(&["fog"]));
    let broker = MockBroker::spawn(script).await;
    let config = broker.config();

    let mut session = SubscriberSession::open(&config, weather(), Format::Json)
        .await
        .expect("subscribe succeeds");

    let first = session.next_message().await.expect("first item");
    assert!(matches!(first, Err(AppError::Decode(_))), "got: {first:?}");
    assert_eq!(session.state(), SessionState::Streaming);

    let second = session.next_message().await.expect("second item");
    assert_eq!(
        second.expect("message decodes"),
        r#"{"topic":"weather","content":"fog"}"#
    );
    assert!(session.next_message().await.is_none());
    assert_eq!(session.delivered(), 1);
}

#[tokio::test]
async fn oversize_frame_ends_the_stream() {
    let broker = MockBroker::spawn(frame(&[b'x'; 64])).await;
    let mut config = broker.config();
    config.max_frame_bytes = 16;

    let stream = client::subscribe(&config, "weather", Format::Json)
        .await
        .expect("subscribe succeeds");
    let items: Vec<_> = stream.collect().await;

    assert_eq!(items.len(), 1);
    match &items[0] {
        Err(AppError::Transport(msg)) => assert!(msg.contains("frame too long"), "got: {msg}"),
        other => panic!("expected Err(AppError::Transport), got: {other:?}"),
    }
}
