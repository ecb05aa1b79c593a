//! Auth error types.

use shared_types::ConfigError;
use thiserror::Error;

/// Request authentication errors.
#[derive(Debug, Clone, Error)]
pub enum AuthError {
    /// The master key could not be decoded or used as an HMAC key.
    #[error("Invalid master key: {0}")]
    InvalidMasterKey(String),

    /// The target URL could not be parsed.
    #[error("Invalid request URL: {0}")]
    InvalidUrl(String),

    /// A computed header value is not valid ASCII.
    #[error("Invalid header value for {name}")]
    InvalidHeaderValue {
        /// Header being set
        name: &'static str,
    },
}

impl From<ConfigError> for AuthError {
    fn from(err: ConfigError) -> Self {
        AuthError::InvalidMasterKey(err.to_string())
    }
}
