//! # Adapters Layer (Hexagonal Architecture)
//!
//! Implements the outbound transport port over HTTP.

mod reqwest_transport;

pub use reqwest_transport::{ReqwestTransport, TransportConfig};
