//! # Container Metadata
//!
//! Typed views of the container resource and its partition-key ranges.
//! Fields this crate does not use are kept in `extra`.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::errors::ContainerError;

/// Partition-key definition of a container.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PartitionKeyDefinition {
    /// Key paths, e.g. `["/tenant"]`.
    #[serde(default)]
    pub paths: Vec<String>,
    /// `Hash`, `MultiHash`, ...
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    /// Hash version.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<u32>,
}

/// Container resource.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ContainerMetadata {
    /// Container id.
    pub id: String,
    /// Resource id.
    #[serde(rename = "_rid", default, skip_serializing_if = "Option::is_none")]
    pub rid: Option<String>,
    /// Partition-key definition.
    #[serde(
        rename = "partitionKey",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub partition_key: Option<PartitionKeyDefinition>,
    /// Everything else.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ContainerMetadata {
    /// Name of the partition-key property: the single path without its
    /// leading slashes (`/tenant` -> `tenant`).
    pub fn partition_key_name(&self) -> Result<String, ContainerError> {
        let paths = self
            .partition_key
            .as_ref()
            .map(|definition| definition.paths.clone())
            .unwrap_or_default();
        match paths.as_slice() {
            [path] => {
                let name = path.trim_start_matches('/');
                if name.is_empty() {
                    Err(ContainerError::UnsupportedPartitionKey { paths })
                } else {
                    Ok(name.to_string())
                }
            }
            _ => Err(ContainerError::UnsupportedPartitionKey { paths }),
        }
    }
}

/// One partition-key range.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PartitionKeyRange {
    /// Range id, usable as `x-ms-documentdb-partitionkeyrangeid`.
    pub id: String,
    /// Inclusive lower bound of the effective partition key.
    #[serde(rename = "minInclusive")]
    pub min_inclusive: String,
    /// Exclusive upper bound.
    #[serde(rename = "maxExclusive")]
    pub max_exclusive: String,
    /// Ranges this one was split from.
    #[serde(default)]
    pub parents: Vec<String>,
    /// Everything else.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Body of the partition-key range feed.
#[derive(Clone, Debug, Deserialize)]
pub(crate) struct PartitionKeyRangeFeed {
    #[serde(rename = "PartitionKeyRanges", default)]
    pub ranges: Vec<PartitionKeyRange>,
}
