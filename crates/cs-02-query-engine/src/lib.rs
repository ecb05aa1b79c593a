//! # CS-02 Query Engine
//!
//! Paginated, streamed queries against the document feed.
//!
//! **Subsystem ID:** 02
//! **Architecture:** Hexagonal (DDD + Ports/Adapters)
//!
//! ## Purpose
//!
//! A query response is a JSON object whose `Documents` array holds the
//! results, followed by a trailing `_count` field. Large result sets arrive
//! as several pages linked by continuation tokens, and each page arrives as
//! several network chunks. This crate:
//!
//! - signs and sends each page request (via `cs-01-request-auth`),
//! - follows `x-ms-continuation` until the last page,
//! - carries the session token from response to request,
//! - cuts the `Documents` array out of each page with bounded marker scans
//!   (no JSON parse) and stitches all pages into one JSON array,
//! - retries the whole query from page one on 401 with a fresh connection.
//!
//! ## Module Structure
//!
//! ```text
//! cs-02-query-engine/
//! ├── domain/          # QueryRequest, PageState, errors
//! ├── algorithms/      # WindowScanner, ChunkReassembler
//! ├── ports/           # CosmosTransport (outbound) + MockTransport
//! ├── adapters/        # ReqwestTransport
//! ├── application/     # PaginatedQueryExecutor, RetryingClient, headers
//! └── config.rs        # QueryEngineConfig
//! ```
//!
//! ## Data Flow
//!
//! ```text
//! caller -> RetryingClient -> PaginatedQueryExecutor
//!        -> RequestAuthenticator -> CosmosTransport
//!        -> ChunkReassembler -> caller
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod adapters;
pub mod algorithms;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;

// Re-exports
pub use adapters::{ReqwestTransport, TransportConfig};
pub use algorithms::{
    extract_documents, locate_count_field, locate_documents_start, stitch_pages,
    ChunkReassembler, ScanOutcome, WindowScanner, COUNT_MARKER, DOCUMENTS_MARKER,
    DOCUMENTS_SEARCH_LIMIT, TRAILING_WINDOW,
};
pub use application::{
    base_headers, partition_key_header_value, point_headers, query_headers, PaginatedQueryExecutor,
    PointResponse, RetryingClient,
};
pub use config::{QueryEngineConfig, SessionRetryPolicy};
pub use domain::{
    PageState, QueryError, QueryParameter, QueryRequest, ReassemblyError, TransportError,
};
pub use ports::{BodyStream, CosmosTransport, MockResponse, MockTransport, TransportResponse};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
