//! # Domain Module
//!
//! Core domain types for the query engine.

pub mod errors;
pub mod query;

pub use errors::*;
pub use query::*;
