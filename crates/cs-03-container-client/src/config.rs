//! # Container Client Configuration

use cs_02_query_engine::{QueryEngineConfig, TransportConfig};
use serde::{Deserialize, Serialize};

/// Container client configuration.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ContainerClientConfig {
    /// Query engine settings (retries, paging, session policy).
    pub engine: QueryEngineConfig,
    /// HTTP transport settings.
    pub transport: TransportConfig,
    /// Partition key used when a call does not name one.
    pub default_partition_key: Option<String>,
}

impl ContainerClientConfig {
    /// Create a config for testing.
    pub fn for_testing() -> Self {
        Self {
            engine: QueryEngineConfig::for_testing(),
            transport: TransportConfig::for_testing(),
            default_partition_key: None,
        }
    }

    /// Validate configuration.
    pub fn validate(&self) -> Result<(), String> {
        self.engine.validate()?;
        self.transport.validate()?;
        if matches!(self.default_partition_key.as_deref(), Some("")) {
            return Err("default_partition_key cannot be empty".into());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(ContainerClientConfig::default().validate().is_ok());
        assert!(ContainerClientConfig::for_testing().validate().is_ok());
    }

    #[test]
    fn test_empty_default_partition_key_rejected() {
        let config = ContainerClientConfig {
            default_partition_key: Some(String::new()),
            ..ContainerClientConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
