//! # Application Layer
//!
//! Query execution and retry, built on the algorithms and the transport
//! port.

pub mod executor;
pub mod headers;
pub mod retrying;

pub use executor::{PaginatedQueryExecutor, PointResponse};
pub use headers::{base_headers, partition_key_header_value, point_headers, query_headers};
pub use retrying::RetryingClient;
