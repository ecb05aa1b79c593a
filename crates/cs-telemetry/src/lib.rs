//! # Cosmos-Stream Telemetry
//!
//! Structured logging for the Cosmos-Stream crates. The library crates only
//! emit `tracing` events; binaries call [`init_logging`] once at startup.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use cs_telemetry::{init_logging, TelemetryConfig};
//!
//! let config = TelemetryConfig::from_env();
//! init_logging(&config)?;
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `CS_LOG_LEVEL` | `info` | Filter directive, falls back to `RUST_LOG` |
//! | `CS_JSON_LOGS` | `false` | JSON lines instead of text |
//! | `CS_SERVICE_NAME` | `cosmos-stream` | Service name on the startup line |

#![warn(missing_docs)]
#![warn(clippy::all)]

mod config;
mod logging;

pub use config::{TelemetryConfig, DEFAULT_SERVICE_NAME};
pub use logging::{build_filter, init_logging};

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    /// The filter directive could not be parsed.
    #[error("Invalid log filter: {0}")]
    Filter(String),
}

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
