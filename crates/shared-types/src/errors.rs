//! # Error Types
//!
//! Configuration errors surfaced synchronously at the point of use.

use thiserror::Error;

/// Errors raised while building a connection from its descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// A required key is absent from the connection descriptor.
    #[error("Connection string is missing required key `{key}`")]
    MissingKey { key: &'static str },

    /// A non-empty segment of the descriptor has no `=`.
    #[error("Malformed connection string segment: {pair}")]
    MalformedPair { pair: String },

    /// The account key is not valid base64.
    #[error("Invalid master key: {0}")]
    InvalidMasterKey(String),

    /// The account endpoint is not an http(s) URL.
    #[error("Invalid account endpoint: {0}")]
    InvalidEndpoint(String),

    /// No connection string was supplied and none was found in the environment.
    #[error("No connection string found in environment (tried {tried})")]
    NotInEnvironment { tried: String },
}
