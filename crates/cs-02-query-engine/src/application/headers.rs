//! Request header sets.
//!
//! Authentication headers (`x-ms-date`, `authorization`) are not built here;
//! the authenticator adds them. The session token is applied by the
//! executor right before signing.

use http::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE, USER_AGENT};
use shared_types::headers::{
    ENABLE_CROSS_PARTITION, IS_QUERY, IS_UPSERT, MAX_ITEM_COUNT, PARTITION_KEY,
    PARTITION_KEY_RANGE_ID, QUERY_CONTENT_TYPE, X_MS_VERSION,
};

use crate::config::QueryEngineConfig;
use crate::domain::{QueryError, QueryRequest};

/// Headers sent on every request: API version and user agent.
pub fn base_headers(config: &QueryEngineConfig) -> Result<HeaderMap, QueryError> {
    let mut headers = HeaderMap::new();
    insert(&mut headers, HeaderName::from_static(X_MS_VERSION), &config.api_version)?;
    insert(&mut headers, USER_AGENT, &config.user_agent)?;
    Ok(headers)
}

/// Headers for a query POST to the docs feed.
///
/// Cross-partition fan-out is enabled exactly when the query has no
/// partition key.
pub fn query_headers(
    config: &QueryEngineConfig,
    query: &QueryRequest,
) -> Result<HeaderMap, QueryError> {
    let mut headers = base_headers(config)?;
    headers.insert(HeaderName::from_static(IS_QUERY), HeaderValue::from_static("true"));
    headers.insert(CONTENT_TYPE, HeaderValue::from_static(QUERY_CONTENT_TYPE));

    match query.partition_key.as_deref() {
        Some(partition_key) => {
            headers.insert(
                HeaderName::from_static(PARTITION_KEY),
                partition_key_header_value(partition_key)?,
            );
            headers.insert(
                HeaderName::from_static(ENABLE_CROSS_PARTITION),
                HeaderValue::from_static("false"),
            );
        }
        None => {
            headers.insert(
                HeaderName::from_static(ENABLE_CROSS_PARTITION),
                HeaderValue::from_static("true"),
            );
        }
    }

    if let Some(max_item_count) = query.max_item_count.or(config.max_item_count) {
        insert(
            &mut headers,
            HeaderName::from_static(MAX_ITEM_COUNT),
            &max_item_count.to_string(),
        )?;
    }
    if let Some(range_id) = query.partition_key_range_id.as_deref() {
        insert(
            &mut headers,
            HeaderName::from_static(PARTITION_KEY_RANGE_ID),
            range_id,
        )?;
    }
    Ok(headers)
}

/// Headers for a point operation (read, create, upsert, delete).
///
/// `is_upsert` is sent only when given.
pub fn point_headers(
    config: &QueryEngineConfig,
    partition_key: Option<&str>,
    is_upsert: Option<bool>,
) -> Result<HeaderMap, QueryError> {
    let mut headers = base_headers(config)?;
    if let Some(partition_key) = partition_key {
        headers.insert(
            HeaderName::from_static(PARTITION_KEY),
            partition_key_header_value(partition_key)?,
        );
    }
    if let Some(is_upsert) = is_upsert {
        headers.insert(
            HeaderName::from_static(IS_UPSERT),
            HeaderValue::from_static(if is_upsert { "true" } else { "false" }),
        );
    }
    Ok(headers)
}

/// `x-ms-documentdb-partitionkey` value: a JSON array holding one string.
///
/// The key is JSON-escaped, so quotes and backslashes survive.
pub fn partition_key_header_value(partition_key: &str) -> Result<HeaderValue, QueryError> {
    let encoded = serde_json::to_string(&[partition_key])?;
    HeaderValue::from_str(&encoded).map_err(|_| {
        QueryError::Configuration(format!(
            "partition key cannot be sent as a header: {partition_key}"
        ))
    })
}

fn insert(headers: &mut HeaderMap, name: HeaderName, value: &str) -> Result<(), QueryError> {
    let value = HeaderValue::from_str(value)
        .map_err(|_| QueryError::Configuration(format!("invalid value for header {name}")))?;
    headers.insert(name, value);
    Ok(())
}
