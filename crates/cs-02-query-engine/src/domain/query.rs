//! # Query Value Objects
//!
//! The query as the caller states it, and the per-page state that advances
//! as continuation tokens come back.

use bytes::Bytes;
use http::header::{HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};
use shared_types::headers::CONTINUATION;

use super::errors::QueryError;

/// A named query parameter, e.g. `@id`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct QueryParameter {
    /// Parameter name including the leading `@`.
    pub name: String,
    /// Parameter value.
    pub value: serde_json::Value,
}

/// A query. The text is opaque to this crate.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct QueryRequest {
    /// Query text.
    pub query: String,
    /// Bound parameters.
    pub parameters: Vec<QueryParameter>,
    /// Partition key scope. `None` enables cross-partition fan-out.
    pub partition_key: Option<String>,
    /// Page size hint; overrides the engine default.
    pub max_item_count: Option<u32>,
    /// Pin the query to one partition-key range.
    pub partition_key_range_id: Option<String>,
}

#[derive(Serialize)]
struct QueryBody<'a> {
    query: &'a str,
    parameters: &'a [QueryParameter],
}

impl QueryRequest {
    /// Query with no parameters, spanning all partitions.
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..Self::default()
        }
    }

    /// Bind a parameter.
    pub fn with_parameter(
        mut self,
        name: impl Into<String>,
        value: impl Into<serde_json::Value>,
    ) -> Self {
        self.parameters.push(QueryParameter {
            name: name.into(),
            value: value.into(),
        });
        self
    }

    /// Scope the query to one partition key.
    pub fn with_partition_key(mut self, partition_key: impl Into<String>) -> Self {
        self.partition_key = Some(partition_key.into());
        self
    }

    /// Set the page size hint.
    pub fn with_max_item_count(mut self, max_item_count: u32) -> Self {
        self.max_item_count = Some(max_item_count);
        self
    }

    /// Pin to a partition-key range.
    pub fn with_partition_key_range_id(mut self, range_id: impl Into<String>) -> Self {
        self.partition_key_range_id = Some(range_id.into());
        self
    }

    /// Whether the query fans out across partitions.
    pub fn is_cross_partition(&self) -> bool {
        self.partition_key.is_none()
    }

    /// JSON body: `{"query": ..., "parameters": [...]}`.
    pub fn to_body(&self) -> Result<Bytes, QueryError> {
        let body = serde_json::to_vec(&QueryBody {
            query: &self.query,
            parameters: &self.parameters,
        })?;
        Ok(Bytes::from(body))
    }
}

/// State of one page of a query.
///
/// Replaced, never mutated, as pagination advances. The headers (including
/// the partition-key scope) are fixed by the first page and inherited by
/// every later page; only the continuation token changes.
#[derive(Clone, Debug)]
pub struct PageState {
    headers: HeaderMap,
    continuation: Option<HeaderValue>,
    index: usize,
    is_last: bool,
}

impl PageState {
    /// First page of a query.
    pub fn first(headers: HeaderMap) -> Self {
        Self {
            headers,
            continuation: None,
            index: 0,
            is_last: false,
        }
    }

    /// The page that follows this one. The token is echoed back byte for
    /// byte, whatever it contains.
    pub fn next(&self, continuation: HeaderValue) -> PageState {
        let mut headers = self.headers.clone();
        headers.insert(CONTINUATION, continuation.clone());
        PageState {
            headers,
            continuation: Some(continuation),
            index: self.index + 1,
            is_last: false,
        }
    }

    /// The same page, known to be the last.
    pub fn into_last(self) -> PageState {
        PageState {
            is_last: true,
            ..self
        }
    }

    /// Request headers for this page.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Token that fetches this page.
    pub fn continuation(&self) -> Option<&HeaderValue> {
        self.continuation.as_ref()
    }

    /// Zero-based page number.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Whether this is the query's first page.
    pub fn is_first(&self) -> bool {
        self.index == 0
    }

    /// Whether the response for this page carried no continuation.
    pub fn is_last(&self) -> bool {
        self.is_last
    }
}

/// Continuation token from response headers, raw. Presence alone means
/// another page exists, even when the value is empty or not ASCII.
pub fn continuation_from(headers: &HeaderMap) -> Option<HeaderValue> {
    headers.get(CONTINUATION).cloned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_types::headers::PARTITION_KEY;

    #[test]
    fn test_query_body() {
        let query = QueryRequest::new("SELECT * FROM c WHERE c.id = @id").with_parameter("@id", "a1");
        let body: serde_json::Value = serde_json::from_slice(&query.to_body().unwrap()).unwrap();
        assert_eq!(body["query"], "SELECT * FROM c WHERE c.id = @id");
        assert_eq!(body["parameters"][0]["name"], "@id");
        assert_eq!(body["parameters"][0]["value"], "a1");
    }

    #[test]
    fn test_empty_parameters_serialize_as_array() {
        let body = QueryRequest::new("SELECT * FROM c").to_body().unwrap();
        assert_eq!(&body[..], br#"{"query":"SELECT * FROM c","parameters":[]}"#);
    }

    #[test]
    fn test_cross_partition() {
        assert!(QueryRequest::new("q").is_cross_partition());
        assert!(!QueryRequest::new("q").with_partition_key("pk").is_cross_partition());
    }

    #[test]
    fn test_page_state_advances_without_touching_scope() {
        let mut headers = HeaderMap::new();
        headers.insert(PARTITION_KEY, HeaderValue::from_static(r#"["tenant-1"]"#));
        let first = PageState::first(headers);
        assert!(first.is_first());
        assert!(first.continuation().is_none());

        let second = first.next(HeaderValue::from_static("token-1"));
        assert_eq!(second.index(), 1);
        assert!(!second.is_first());
        assert_eq!(second.headers().get(CONTINUATION).unwrap(), "token-1");
        assert_eq!(second.headers().get(PARTITION_KEY).unwrap(), r#"["tenant-1"]"#);

        let third = second.next(HeaderValue::from_static("token-2")).into_last();
        assert_eq!(third.headers().get(CONTINUATION).unwrap(), "token-2");
        assert!(third.is_last());

        // The earlier state is untouched.
        assert!(first.headers().get(CONTINUATION).is_none());
    }

    #[test]
    fn test_continuation_from_headers() {
        let mut headers = HeaderMap::new();
        assert_eq!(continuation_from(&headers), None);
        headers.insert(CONTINUATION, HeaderValue::from_static(""));
        assert_eq!(continuation_from(&headers).unwrap(), "");
        headers.insert(CONTINUATION, HeaderValue::from_static("+RID:abc"));
        assert_eq!(continuation_from(&headers).unwrap(), "+RID:abc");
    }

    #[test]
    fn test_opaque_token_echoed_verbatim() {
        let token = HeaderValue::from_bytes(b"tok\xe9n").unwrap();
        let mut response = HeaderMap::new();
        response.insert(CONTINUATION, token.clone());

        let next = PageState::first(HeaderMap::new()).next(continuation_from(&response).unwrap());
        assert_eq!(next.headers().get(CONTINUATION).unwrap().as_bytes(), b"tok\xe9n");
        assert_eq!(next.continuation(), Some(&token));
    }
}
