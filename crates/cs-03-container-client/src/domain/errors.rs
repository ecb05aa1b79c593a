//! # Domain Errors

use cs_02_query_engine::QueryError;
use shared_types::ConfigError;
use thiserror::Error;

/// Container client errors.
#[derive(Debug, Error)]
pub enum ContainerError {
    /// A write had no partition key: not in the record, no default set.
    #[error("Must specify a partition key: record has no `{property}` field and no default is set")]
    MissingPartitionKey {
        /// Partition-key property that was looked up
        property: String,
    },

    /// The record carries its partition-key property, but not as a string.
    #[error("Partition key `{property}` must be a string, found {found}")]
    InvalidPartitionKey {
        /// Partition-key property that was looked up
        property: String,
        /// JSON type of the value found
        found: &'static str,
    },

    /// The container's partition key is composite or absent.
    #[error("Unsupported partition key definition: {paths:?}")]
    UnsupportedPartitionKey {
        /// Paths declared by the container
        paths: Vec<String>,
    },

    /// The underlying request failed.
    #[error(transparent)]
    Query(#[from] QueryError),

    /// The connection could not be configured.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// A response did not decode.
    #[error("Decode failed: {0}")]
    Decode(#[from] serde_json::Error),
}

impl ContainerError {
    /// HTTP status, for response failures.
    pub fn status(&self) -> Option<u16> {
        match self {
            ContainerError::Query(err) => err.status(),
            _ => None,
        }
    }
}
