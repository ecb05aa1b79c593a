//! # Shared Types Crate
//!
//! Types shared by every Cosmos-Stream crate: the immutable connection
//! context, the per-client session token, resource classifiers used for
//! signing, and the names of the headers exchanged with the service.
//!
//! ## Design Principles
//!
//! - **Immutable connection**: `ConnectionContext` is built once from a
//!   connection descriptor and never mutated.
//! - **Explicit session**: `SessionState` is an owned value passed by
//!   reference into each query, never a global.
//! - **Secrets stay secret**: `MasterKey` zeroizes on drop and redacts itself
//!   in `Debug` output.

pub mod connection;
pub mod errors;
pub mod headers;
pub mod resource;
pub mod session;

pub use connection::{ConnectionContext, ConnectionString, MasterKey};
pub use errors::ConfigError;
pub use resource::ResourceType;
pub use session::SessionState;
