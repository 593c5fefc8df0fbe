//! Transport Port - Primary Push Connection Interface
//!
//! Models a socket-style connection with the same lifecycle as a browser
//! WebSocket: `open` returns immediately with a link handle, and the
//! asynchronous outcome (opened, messages, errors, close) is reported
//! through a `TransportEvents` sink. The orchestrator never depends on
//! the concrete socket library.

use std::sync::Arc;

use reqwest::Url;
use thiserror::Error;

/// Lifecycle and data events from a live link.
#[derive(Debug, Clone, PartialEq)]
pub enum TransportEvent {
    /// Handshake completed; the link can carry messages.
    Opened,
    /// A text frame arrived.
    Message(String),
    /// Transport-level failure (network drop, handshake failure).
    Error(String),
    /// The link is gone. Last event of a link unless the client closed it.
    Closed,
}

/// Failures raised synchronously by a transport.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The endpoint URL could not be derived or is unsupported.
    #[error("invalid transport url: {0}")]
    InvalidUrl(String),
    /// The link is no longer accepting messages.
    #[error("transport link closed")]
    Closed,
    /// Any other construction failure.
    #[error("transport unavailable: {0}")]
    Unavailable(String),
}

/// Sink for events of one link.
///
/// Cloneable so adapter tasks can own a copy. Emitting after the
/// receiver is gone is a silent no-op.
#[derive(Clone)]
pub struct TransportEvents {
    sink: Arc<dyn Fn(TransportEvent) + Send + Sync>,
}

impl TransportEvents {
    /// Wrap a callback that receives every event of the link.
    pub fn new<F>(sink: F) -> Self
    where
        F: Fn(TransportEvent) + Send + Sync + 'static,
    {
        Self {
            sink: Arc::new(sink),
        }
    }

    /// Report an event.
    pub fn emit(&self, event: TransportEvent) {
        (self.sink)(event);
    }
}

impl std::fmt::Debug for TransportEvents {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransportEvents").finish_non_exhaustive()
    }
}

/// Handle to one live (or opening) link.
pub trait TransportLink: Send {
    /// Queue a text frame. Fails once the link has closed.
    fn send(&mut self, text: String) -> Result<(), TransportError>;

    /// Tear the link down. No further events are reported.
    fn close(&mut self);
}

/// Factory for primary transport links.
pub trait Transport: Send + Sync + 'static {
    /// Start opening a link to `url`.
    ///
    /// An `Err` here is a construction failure: no events will follow.
    fn open(
        &self,
        url: &Url,
        events: TransportEvents,
    ) -> Result<Box<dyn TransportLink>, TransportError>;
}
