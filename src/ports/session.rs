//! Session Port - Bearer Token Supply
//!
//! The authentication layer is external; the feed client only reads
//! the current token opaquely when it builds a URL or a request.

/// Supplies the current session token, if any.
pub trait TokenProvider: Send + Sync + 'static {
    /// Token for the `?token=` query parameter and `Authorization` header.
    fn token(&self) -> Option<String>;
}
