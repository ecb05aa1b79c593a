//! # Domain Errors
//!
//! Error taxonomy of the query engine. Only [`QueryError::Authentication`]
//! is recovered locally (by retry); everything else propagates unchanged.

use cs_01_request_auth::AuthError;
use thiserror::Error;

/// Failures to locate the `Documents` array inside a page.
///
/// Never retried: they mean the response format does not match.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReassemblyError {
    /// The `Documents":[` marker was not found within the scanned prefix.
    #[error("Documents marker not found in first {scanned} bytes of page")]
    DocumentsMarkerMissing {
        /// Bytes examined before giving up
        scanned: usize,
    },

    /// The `,"_count"` marker was not found in the trailing window.
    #[error("Count field marker not found in trailing {window} bytes of page")]
    CountMarkerMissing {
        /// Size of the trailing window searched
        window: usize,
    },

    /// The byte before the count field is not the array's closing bracket.
    #[error("Documents array is not terminated before the count field")]
    UnterminatedDocuments,

    /// A chunk arrived, or a page ended, outside of a page.
    #[error("Chunk received outside of a page")]
    PageNotStarted,
}

/// Transport-level failures.
#[derive(Debug, Clone, Error)]
pub enum TransportError {
    /// Could not connect to the endpoint.
    #[error("Connection failed: {0}")]
    Connection(String),

    /// The transport's timeout elapsed.
    #[error("Request timed out")]
    Timeout,

    /// Reading the response body failed.
    #[error("Body read failed: {0}")]
    Body(String),

    /// Building the underlying client failed.
    #[error("Client build failed: {0}")]
    Build(String),

    /// Any other network error.
    #[error("Network error: {0}")]
    Network(String),
}

/// Query failures surfaced to callers.
#[derive(Debug, Error)]
pub enum QueryError {
    /// HTTP 401. Retried up to the configured bound, then surfaced.
    #[error("Authentication failed ({status}): {body}")]
    Authentication {
        /// HTTP status code
        status: u16,
        /// Response body text
        body: String,
    },

    /// Any other non-success status. Surfaced immediately.
    #[error("Request failed with status {status}: {body}")]
    ResponseFailure {
        /// HTTP status code
        status: u16,
        /// Response body text
        body: String,
    },

    /// The page could not be reassembled.
    #[error("Malformed response: {0}")]
    Malformed(#[from] ReassemblyError),

    /// The transport failed.
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// The request could not be signed.
    #[error("Signing failed: {0}")]
    Signing(#[from] AuthError),

    /// The reassembled bytes did not decode.
    #[error("Decode failed: {0}")]
    Decode(#[from] serde_json::Error),

    /// A request could not be built from the given inputs.
    #[error("Invalid request: {0}")]
    Configuration(String),
}

impl QueryError {
    /// True only for authentication failures.
    pub fn is_retryable(&self) -> bool {
        matches!(self, QueryError::Authentication { .. })
    }

    /// HTTP status, for response failures.
    pub fn status(&self) -> Option<u16> {
        match self {
            QueryError::Authentication { status, .. }
            | QueryError::ResponseFailure { status, .. } => Some(*status),
            _ => None,
        }
    }
}
