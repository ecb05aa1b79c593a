//! # CS-01 Request Auth
//!
//! Master-key authentication for every outbound request.
//!
//! **Subsystem ID:** 01
//! **Architecture:** Pure signing core + per-request hook
//!
//! ## Purpose
//!
//! The service authenticates each request with an HMAC-SHA256 signature over
//! a canonical message bound to the verb, the resource being addressed, and
//! the request timestamp. Signatures are computed fresh for every request,
//! including retries and follow-up pages.
//!
//! ## Module Structure
//!
//! ```text
//! cs-01-request-auth/
//! ├── signature.rs      # SignatureEngine: canonical message, HMAC, token encoding
//! ├── resource_link.rs  # Resource id derivation from a target path
//! ├── clock.rs          # Clock port (system / fixed)
//! ├── authenticator.rs  # RequestAuthenticator: OutboundRequest -> SignedRequest
//! └── errors.rs         # AuthError
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod authenticator;
pub mod clock;
pub mod errors;
pub mod resource_link;
pub mod signature;

// Re-exports
pub use authenticator::{OutboundRequest, RequestAuthenticator, SignedRequest};
pub use clock::{format_x_ms_date, Clock, FixedClock, SystemClock};
pub use errors::AuthError;
pub use resource_link::{resource_link_from_path, resource_link_from_url};
pub use signature::{generate_signature, sign, SignatureInput, AUTH_TOKEN_ENCODE_SET};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
