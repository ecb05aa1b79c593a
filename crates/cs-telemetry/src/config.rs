//! Telemetry configuration from environment variables.

use std::env;

use serde::{Deserialize, Serialize};

/// Default service name attached to every log line.
pub const DEFAULT_SERVICE_NAME: &str = "cosmos-stream";

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TelemetryConfig {
    /// Service name recorded on the startup line
    pub service_name: String,

    /// Filter directive (`info`, `cs_02_query_engine=debug`, ...)
    pub log_level: String,

    /// Emit one JSON object per line instead of human-readable text
    pub json_logs: bool,

    /// Colour the plain-text output
    pub ansi: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            service_name: DEFAULT_SERVICE_NAME.to_string(),
            log_level: "info".to_string(),
            json_logs: false,
            ansi: true,
        }
    }
}

impl TelemetryConfig {
    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `CS_SERVICE_NAME`: Service name (default: cosmos-stream)
    /// - `CS_LOG_LEVEL` or `RUST_LOG`: Filter directive (default: info)
    /// - `CS_JSON_LOGS`: JSON output (default: false)
    /// - `NO_COLOR`: Disables ANSI colours when set
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        Self {
            service_name: lookup("CS_SERVICE_NAME")
                .filter(|v| !v.trim().is_empty())
                .unwrap_or(defaults.service_name),
            log_level: lookup("CS_LOG_LEVEL")
                .or_else(|| lookup("RUST_LOG"))
                .filter(|v| !v.trim().is_empty())
                .unwrap_or(defaults.log_level),
            json_logs: lookup("CS_JSON_LOGS")
                .map(|v| parse_flag(&v))
                .unwrap_or(defaults.json_logs),
            ansi: lookup("NO_COLOR").is_none(),
        }
    }

    /// Quiet configuration for tests.
    pub fn for_testing() -> Self {
        Self {
            log_level: "warn".to_string(),
            ansi: false,
            ..Self::default()
        }
    }

    /// Override the filter directive.
    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = TelemetryConfig::default();
        assert_eq!(config.service_name, "cosmos-stream");
        assert_eq!(config.log_level, "info");
        assert!(!config.json_logs);
    }

    #[test]
    fn test_cs_log_level_wins_over_rust_log() {
        let config = TelemetryConfig::from_lookup(lookup(&[
            ("CS_LOG_LEVEL", "debug"),
            ("RUST_LOG", "trace"),
        ]));
        assert_eq!(config.log_level, "debug");

        let config = TelemetryConfig::from_lookup(lookup(&[("RUST_LOG", "trace")]));
        assert_eq!(config.log_level, "trace");
    }

    #[test]
    fn test_json_flag_parsing() {
        for value in ["1", "true", "TRUE", " yes "] {
            let config = TelemetryConfig::from_lookup(lookup(&[("CS_JSON_LOGS", value)]));
            assert!(config.json_logs, "{value}");
        }
        for value in ["0", "false", "nope"] {
            let config = TelemetryConfig::from_lookup(lookup(&[("CS_JSON_LOGS", value)]));
            assert!(!config.json_logs, "{value}");
        }
    }

    #[test]
    fn test_service_name_and_no_color() {
        let config = TelemetryConfig::from_lookup(lookup(&[
            ("CS_SERVICE_NAME", "orders-sync"),
            ("NO_COLOR", "1"),
        ]));
        assert_eq!(config.service_name, "orders-sync");
        assert!(!config.ansi);
    }

    #[test]
    fn test_blank_values_fall_back() {
        let config = TelemetryConfig::from_lookup(lookup(&[
            ("CS_SERVICE_NAME", "  "),
            ("CS_LOG_LEVEL", ""),
        ]));
        assert_eq!(config, TelemetryConfig::default());
    }

    #[test]
    fn test_serde_defaults() {
        let config: TelemetryConfig = serde_json::from_str(r#"{"json_logs":true}"#).unwrap();
        assert!(config.json_logs);
        assert_eq!(config.log_level, "info");
    }
}
