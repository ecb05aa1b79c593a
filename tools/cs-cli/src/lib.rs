//! # cs-cli
//!
//! Command-line front end over the container client. Results are written
//! to stdout as JSON; logs go to stderr.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod cli;
pub mod commands;

pub use cli::{build_query, parse_param, Args, Command};
pub use commands::{client_config, connection_context, run};
