//! # Query Engine Configuration
//!
//! Knobs for retry, paging, and wire identity. Transport timeouts live in
//! [`crate::adapters::TransportConfig`]; the engine computes none itself.

use serde::{Deserialize, Serialize};
use shared_types::headers::API_VERSION;

/// What happens to the session token when a query is retried after a 401.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionRetryPolicy {
    /// Keep the token; the retried attempt continues the same session.
    #[default]
    Preserve,
    /// Drop the token; the retried attempt starts a fresh session.
    Reset,
}

/// Query engine configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryEngineConfig {
    /// Retries after an authentication failure (attempts = retries + 1).
    pub max_retries: u32,

    /// Page size hint sent as `x-ms-max-item-count` when the query sets none.
    pub max_item_count: Option<u32>,

    /// Session handling across 401 retries.
    pub session_on_retry: SessionRetryPolicy,

    /// REST API version sent as `x-ms-version`.
    pub api_version: String,

    /// `user-agent` header.
    pub user_agent: String,

    /// Dispatch page N+1 while page N's body is still streaming.
    pub pipeline_pages: bool,
}

impl Default for QueryEngineConfig {
    fn default() -> Self {
        Self {
            max_retries: 5,
            max_item_count: None,
            session_on_retry: SessionRetryPolicy::Preserve,
            api_version: API_VERSION.to_string(),
            user_agent: concat!("cosmos-stream/", env!("CARGO_PKG_VERSION")).to_string(),
            pipeline_pages: true,
        }
    }
}

impl QueryEngineConfig {
    /// Create a config for testing (small retry bound).
    pub fn for_testing() -> Self {
        Self {
            max_retries: 2,
            ..Self::default()
        }
    }

    /// Validate configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.api_version.trim().is_empty() {
            return Err("api_version cannot be empty".into());
        }
        if self.max_item_count == Some(0) {
            return Err("max_item_count cannot be 0".into());
        }
        if self.user_agent.trim().is_empty() {
            return Err("user_agent cannot be empty".into());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = QueryEngineConfig::default();
        assert_eq!(config.max_retries, 5);
        assert_eq!(config.api_version, "2020-07-15");
        assert_eq!(config.session_on_retry, SessionRetryPolicy::Preserve);
        assert!(config.pipeline_pages);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_testing_config() {
        let config = QueryEngineConfig::for_testing();
        assert_eq!(config.max_retries, 2);
    }

    #[test]
    fn test_validate_rejects_zero_page_size() {
        let config = QueryEngineConfig {
            max_item_count: Some(0),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_deserialize_partial() {
        let config: QueryEngineConfig =
            serde_json::from_str(r#"{"max_retries": 1, "session_on_retry": "reset"}"#).unwrap();
        assert_eq!(config.max_retries, 1);
        assert_eq!(config.session_on_retry, SessionRetryPolicy::Reset);
        assert_eq!(config.api_version, "2020-07-15");
    }
}
