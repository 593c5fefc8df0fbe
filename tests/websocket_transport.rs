//! WebSocket Adapter Tests - WsTransport Against a Local Server
//!
//! Runs a tokio-tungstenite server on an ephemeral port and checks the
//! event sequence the transport reports for the feed client.

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use reqwest::Url;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio_tungstenite::accept_async;
use tokio_tungstenite::tungstenite::Message;

use vessel_feed::adapters::feeds::WsTransport;
use vessel_feed::ports::transport::{Transport, TransportError, TransportEvent, TransportEvents};

fn channel() -> (TransportEvents, mpsc::UnboundedReceiver<TransportEvent>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let events = TransportEvents::new(move |event| {
        let _ = tx.send(event);
    });
    (events, rx)
}

async fn next(rx: &mut mpsc::UnboundedReceiver<TransportEvent>) -> TransportEvent {
    tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .expect("timed out waiting for transport event")
        .expect("event channel closed")
}

#[tokio::test]
async fn test_open_exchange_and_server_close() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let server = tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let mut ws = accept_async(stream).await.unwrap();

        let first = ws.next().await.unwrap().unwrap();
        ws.send(Message::Text(r#"{"type":"vessels","vessels":[]}"#.to_string()))
            .await
            .unwrap();
        ws.close(None).await.unwrap();
        first
    });

    let (events, mut rx) = channel();
    let url = Url::parse(&format!("ws://{addr}/ws")).unwrap();
    let mut link = WsTransport::default().open(&url, events).unwrap();

    assert_eq!(next(&mut rx).await, TransportEvent::Opened);
    link.send(r#"{"type":"refresh"}"#.to_string()).unwrap();

    assert_eq!(
        next(&mut rx).await,
        TransportEvent::Message(r#"{"type":"vessels","vessels":[]}"#.to_string())
    );
    assert_eq!(next(&mut rx).await, TransportEvent::Closed);

    let first = server.await.unwrap();
    assert_eq!(first, Message::Text(r#"{"type":"refresh"}"#.to_string()));
}

#[tokio::test]
async fn test_refused_connection_reports_error_then_closed() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let (events, mut rx) = channel();
    let url = Url::parse(&format!("ws://{addr}/ws")).unwrap();
    let _link = WsTransport::default().open(&url, events).unwrap();

    assert!(matches!(next(&mut rx).await, TransportEvent::Error(_)));
    assert_eq!(next(&mut rx).await, TransportEvent::Closed);
}

#[tokio::test]
async fn test_rejects_non_websocket_scheme() {
    let (events, _rx) = channel();
    let url = Url::parse("https://tracker.example.com/ws").unwrap();
    let result = WsTransport::default().open(&url, events);
    assert!(matches!(result, Err(TransportError::InvalidUrl(_))));
}

#[tokio::test]
async fn test_local_close_is_silent() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let server = tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let mut ws = accept_async(stream).await.unwrap();
        // Drain until the client's close frame arrives.
        while let Some(Ok(message)) = ws.next().await {
            if message.is_close() {
                return true;
            }
        }
        false
    });

    let (events, mut rx) = channel();
    let url = Url::parse(&format!("ws://{addr}/ws")).unwrap();
    let mut link = WsTransport::default().open(&url, events).unwrap();
    assert_eq!(next(&mut rx).await, TransportEvent::Opened);

    link.close();
    assert!(server.await.unwrap(), "server saw a close frame");
    assert!(
        tokio::time::timeout(Duration::from_millis(200), rx.recv())
            .await
            .map_or(true, |event| event.is_none()),
        "no events after a local close"
    );
}
