//! Push Feed Adapters
//!
//! - `websocket`: tokio-tungstenite implementation of the `Transport` port

pub mod websocket;

pub use websocket::WsTransport;
