//! # CS-03 Container Client
//!
//! Everyday operations on one container, layered on the query engine.
//!
//! **Subsystem ID:** 03
//! **Architecture:** Thin application service over `cs-02-query-engine`
//!
//! ## Purpose
//!
//! - Load the container's metadata on connect and resolve the
//!   partition-key property from a single-path definition.
//! - Create, upsert, read, and delete single documents, resolving the
//!   partition key from the record or a default.
//! - List partition-key ranges.
//! - Run queries with the default partition key applied.
//!
//! Every request goes through the same signing, 401 retry, and session
//! handling as queries.
//!
//! ## Module Structure
//!
//! ```text
//! cs-03-container-client/
//! ├── domain/          # ContainerMetadata, PartitionKeyRange, errors, key resolution
//! ├── application/     # ContainerClient
//! └── config.rs        # ContainerClientConfig
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod application;
pub mod config;
pub mod domain;

// Re-exports
pub use application::ContainerClient;
pub use config::ContainerClientConfig;
pub use domain::{
    resolve_write_partition_key, ContainerError, ContainerMetadata, PartitionKeyDefinition,
    PartitionKeyRange,
};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
