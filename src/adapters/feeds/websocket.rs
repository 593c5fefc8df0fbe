//! WebSocket Transport — Primary Vessel Push Feed
//!
//! Implements the `Transport` port with tokio-tungstenite. Each link is
//! one spawned task that:
//! - connects (bounded by a handshake timeout) and reports `Opened`
//! - forwards text frames as `Message` events
//! - writes queued outbound frames
//! - reports `Error` then `Closed` on failure, or just `Closed` on a
//!   clean server close
//!
//! A deliberate `close()` sends a close frame and ends the task without
//! reporting further events.

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use reqwest::Url;
use tokio::sync::mpsc;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info, instrument, warn};

use crate::ports::transport::{
    Transport, TransportError, TransportEvent, TransportEvents, TransportLink,
};

/// Frames queued for the link task.
#[derive(Debug)]
enum Outbound {
    Text(String),
    Close,
}

/// tokio-tungstenite backed transport factory.
#[derive(Debug, Clone)]
pub struct WsTransport {
    /// Maximum time for the TCP + TLS + upgrade handshake.
    connect_timeout: Duration,
}

impl Default for WsTransport {
    fn default() -> Self {
        Self::new(Duration::from_secs(10))
    }
}

impl WsTransport {
    /// Create a transport with the given handshake timeout.
    pub fn new(connect_timeout: Duration) -> Self {
        Self { connect_timeout }
    }
}

impl Transport for WsTransport {
    fn open(
        &self,
        url: &Url,
        events: TransportEvents,
    ) -> Result<Box<dyn TransportLink>, TransportError> {
        if !matches!(url.scheme(), "ws" | "wss") {
            return Err(TransportError::InvalidUrl(format!(
                "expected ws:// or wss://, got {url}"
            )));
        }
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| TransportError::Unavailable(e.to_string()))?;

        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        runtime.spawn(run_link(
            url.clone(),
            events,
            outbound_rx,
            self.connect_timeout,
        ));

        Ok(Box::new(WsLink {
            outbound: outbound_tx,
        }))
    }
}

/// Handle to one link task.
struct WsLink {
    outbound: mpsc::UnboundedSender<Outbound>,
}

impl TransportLink for WsLink {
    fn send(&mut self, text: String) -> Result<(), TransportError> {
        self.outbound
            .send(Outbound::Text(text))
            .map_err(|_| TransportError::Closed)
    }

    fn close(&mut self) {
        let _ = self.outbound.send(Outbound::Close);
    }
}

impl Drop for WsLink {
    fn drop(&mut self) {
        self.close();
    }
}

/// Drive a single WebSocket session until it ends.
#[instrument(skip(events, outbound, connect_timeout), fields(host = url.host_str().unwrap_or_default()))]
async fn run_link(
    url: Url,
    events: TransportEvents,
    mut outbound: mpsc::UnboundedReceiver<Outbound>,
    connect_timeout: Duration,
) {
    let stream = match tokio::time::timeout(connect_timeout, connect_async(url.as_str())).await {
        Ok(Ok((stream, _response))) => stream,
        Ok(Err(e)) => {
            warn!(error = %e, "WebSocket handshake failed");
            events.emit(TransportEvent::Error(e.to_string()));
            events.emit(TransportEvent::Closed);
            return;
        }
        Err(_) => {
            warn!(timeout_secs = connect_timeout.as_secs(), "WebSocket handshake timed out");
            events.emit(TransportEvent::Error("handshake timed out".to_string()));
            events.emit(TransportEvent::Closed);
            return;
        }
    };

    info!("Vessel WebSocket connected");
    events.emit(TransportEvent::Opened);

    let (mut write, mut read) = stream.split();

    loop {
        tokio::select! {
            command = outbound.recv() => {
                match command {
                    Some(Outbound::Text(text)) => {
                        if let Err(e) = write.send(Message::Text(text)).await {
                            warn!(error = %e, "WebSocket write failed");
                            events.emit(TransportEvent::Error(e.to_string()));
                            break;
                        }
                    }
                    Some(Outbound::Close) | None => {
                        debug!("Closing WebSocket on request");
                        let _ = write.send(Message::Close(None)).await;
                        return;
                    }
                }
            }
            msg = read.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        events.emit(TransportEvent::Message(text));
                    }
                    Some(Ok(Message::Close(frame))) => {
                        info!(?frame, "WebSocket closed by server");
                        break;
                    }
                    Some(Ok(Message::Ping(data))) => {
                        // Pong is handled automatically by tungstenite
                        debug!(len = data.len(), "WebSocket ping received");
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        warn!(error = %e, "WebSocket read failed");
                        events.emit(TransportEvent::Error(e.to_string()));
                        break;
                    }
                    None => {
                        info!("WebSocket stream ended");
                        break;
                    }
                }
            }
        }
    }

    events.emit(TransportEvent::Closed);
}
