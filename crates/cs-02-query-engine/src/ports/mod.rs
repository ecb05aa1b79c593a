//! # Ports Module
//!
//! Outbound dependencies of the query engine.

pub mod outbound;

pub use outbound::*;
