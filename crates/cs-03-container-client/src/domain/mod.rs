//! # Domain Module

pub mod errors;
pub mod metadata;
pub mod partition;

pub use errors::*;
pub use metadata::{ContainerMetadata, PartitionKeyDefinition, PartitionKeyRange};
pub use partition::resolve_write_partition_key;
