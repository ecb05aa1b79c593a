//! # Session State
//!
//! The last-seen session consistency token. One per client; not thread-safe.
//! Interleaved queries sharing one `SessionState` are last-writer-wins.

use http::header::{HeaderMap, HeaderValue};
use tracing::trace;

use crate::headers::SESSION_TOKEN;

/// Last-seen session token, or none.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionState {
    token: Option<String>,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from a known token.
    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            token: Some(token.into()),
        }
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn is_set(&self) -> bool {
        self.token.is_some()
    }

    pub fn set(&mut self, token: impl Into<String>) {
        self.token = Some(token.into());
    }

    /// Forget the token. Subsequent requests carry no session header.
    pub fn reset(&mut self) {
        self.token = None;
    }

    /// Take the session token from response headers, if present.
    ///
    /// Returns `true` when the stored token changed.
    pub fn observe(&mut self, headers: &HeaderMap) -> bool {
        let Some(value) = headers.get(SESSION_TOKEN).and_then(|v| v.to_str().ok()) else {
            return false;
        };
        if self.token.as_deref() == Some(value) {
            return false;
        }
        trace!(token = value, "session token updated");
        self.token = Some(value.to_string());
        true
    }

    /// Attach the token to outbound request headers. A stored token that is
    /// not a valid header value is skipped.
    pub fn apply(&self, headers: &mut HeaderMap) {
        match self.token.as_deref().map(HeaderValue::from_str) {
            Some(Ok(value)) => {
                headers.insert(SESSION_TOKEN, value);
            }
            Some(Err(_)) | None => {
                headers.remove(SESSION_TOKEN);
            }
        }
    }
}
