//! # Wire Header Names
//!
//! Header names exchanged with the service. All lowercase, as `http`
//! requires for `HeaderName::from_static`.

/// REST API version header.
pub const X_MS_VERSION: &str = "x-ms-version";
/// Request timestamp that the signature is bound to.
pub const X_MS_DATE: &str = "x-ms-date";
/// Signed authorization token.
pub const AUTHORIZATION: &str = "authorization";
/// Marks a POST to the docs feed as a query.
pub const IS_QUERY: &str = "x-ms-documentdb-isquery";
/// Partition key scope, a JSON array with one string element.
pub const PARTITION_KEY: &str = "x-ms-documentdb-partitionkey";
/// Pins a query to a single partition-key range.
pub const PARTITION_KEY_RANGE_ID: &str = "x-ms-documentdb-partitionkeyrangeid";
/// Allows fan-out when no partition key is given.
pub const ENABLE_CROSS_PARTITION: &str = "x-ms-documentdb-query-enablecrosspartition";
/// Turns a create into an upsert.
pub const IS_UPSERT: &str = "x-ms-documentdb-is-upsert";
/// Page size hint.
pub const MAX_ITEM_COUNT: &str = "x-ms-max-item-count";
/// Continuation token; present on a response when another page exists.
pub const CONTINUATION: &str = "x-ms-continuation";
/// Session consistency token.
pub const SESSION_TOKEN: &str = "x-ms-session-token";

/// REST API version spoken by this client.
pub const API_VERSION: &str = "2020-07-15";

/// Content type of a query body.
pub const QUERY_CONTENT_TYPE: &str = "application/query+json";
