//! # Resource Types
//!
//! Service-specific classifiers that feed the request signature.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Resource classifier used only to compute the authorization signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceType {
    Dbs,
    Colls,
    Sprocs,
    Udfs,
    Triggers,
    Users,
    Permissions,
    Docs,
    PkRanges,
}

impl ResourceType {
    /// Wire form, as it appears in the signed message.
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceType::Dbs => "dbs",
            ResourceType::Colls => "colls",
            ResourceType::Sprocs => "sprocs",
            ResourceType::Udfs => "udfs",
            ResourceType::Triggers => "triggers",
            ResourceType::Users => "users",
            ResourceType::Permissions => "permissions",
            ResourceType::Docs => "docs",
            ResourceType::PkRanges => "pkranges",
        }
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
