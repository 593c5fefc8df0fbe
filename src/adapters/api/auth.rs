//! Session Token — Bearer Credentials from the Auth Layer
//!
//! The feed client treats the session token as opaque. It is read from
//! `VESSEL_FEED_TOKEN` at startup and can be replaced at runtime when
//! the auth layer rotates it. An absent token is valid: requests are
//! then sent without an `Authorization` header and the WebSocket URL
//! carries no `token` parameter.

use std::sync::{PoisonError, RwLock};

use tracing::{debug, info};

use crate::ports::session::TokenProvider;

/// Environment variable holding the session token.
pub const TOKEN_ENV_VAR: &str = "VESSEL_FEED_TOKEN";

/// Replaceable session token.
#[derive(Debug, Default)]
pub struct SessionToken {
    token: RwLock<Option<String>>,
}

impl SessionToken {
    /// Create with an explicit token.
    pub fn new(token: Option<String>) -> Self {
        Self {
            token: RwLock::new(token.filter(|t| !t.trim().is_empty())),
        }
    }

    /// Load the token from `VESSEL_FEED_TOKEN`, if set.
    pub fn from_env() -> Self {
        let token = std::env::var(TOKEN_ENV_VAR).ok();
        if token.is_some() {
            info!(var = TOKEN_ENV_VAR, "Session token loaded from environment");
        } else {
            info!(var = TOKEN_ENV_VAR, "No session token set, connecting anonymously");
        }
        Self::new(token)
    }

    /// Replace the token (e.g. after the auth layer refreshed the session).
    pub fn set(&self, token: Option<String>) {
        debug!(present = token.is_some(), "Session token replaced");
        *self.token.write().unwrap_or_else(PoisonError::into_inner) =
            token.filter(|t| !t.trim().is_empty());
    }
}

impl TokenProvider for SessionToken {
    fn token(&self) -> Option<String> {
        self.token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}
