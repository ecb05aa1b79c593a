//! # Retrying Client
//!
//! Owns the transport, the session, and an executor. A 401 on any page
//! reconnects the transport and reruns the whole query from page one, up to
//! `max_retries` times; the last authentication failure is surfaced after
//! that. Every other failure is returned on first sight.

use bytes::Bytes;
use cs_01_request_auth::OutboundRequest;
use futures::Stream;
use serde::de::DeserializeOwned;
use shared_types::{ConnectionContext, SessionState};
use tracing::warn;

use super::executor::{PaginatedQueryExecutor, PointResponse};
use crate::config::{QueryEngineConfig, SessionRetryPolicy};
use crate::domain::{QueryError, QueryRequest};
use crate::ports::outbound::{CosmosTransport, TransportResponse};

/// Query client with authentication retry and session propagation.
///
/// Holds one logical session; not meant to be shared between concurrent
/// queries.
pub struct RetryingClient<T: CosmosTransport> {
    executor: PaginatedQueryExecutor,
    transport: T,
    session: SessionState,
}

impl<T: CosmosTransport> RetryingClient<T> {
    /// Client for the container named by `context`.
    pub fn new(context: &ConnectionContext, transport: T, config: QueryEngineConfig) -> Self {
        Self::with_executor(PaginatedQueryExecutor::new(context, config), transport)
    }

    /// Client around an existing executor.
    pub fn with_executor(executor: PaginatedQueryExecutor, transport: T) -> Self {
        Self {
            executor,
            transport,
            session: SessionState::new(),
        }
    }

    /// Engine configuration.
    pub fn config(&self) -> &QueryEngineConfig {
        self.executor.config()
    }

    /// The executor running each attempt.
    pub fn executor(&self) -> &PaginatedQueryExecutor {
        &self.executor
    }

    /// The transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Current session.
    pub fn session(&self) -> &SessionState {
        &self.session
    }

    /// Mutable session, e.g. to seed a token from elsewhere.
    pub fn session_mut(&mut self) -> &mut SessionState {
        &mut self.session
    }

    /// Reassembled JSON array of all results, retrying with the configured
    /// bound.
    pub async fn query_bytes(&mut self, query: &QueryRequest) -> Result<Bytes, QueryError> {
        let max_retries = self.config().max_retries;
        self.query_bytes_with_retries(query, max_retries).await
    }

    /// As [`query_bytes`](Self::query_bytes) with an explicit retry bound.
    pub async fn query_bytes_with_retries(
        &mut self,
        query: &QueryRequest,
        max_retries: u32,
    ) -> Result<Bytes, QueryError> {
        let mut attempt = 0;
        loop {
            match self
                .executor
                .execute(&self.transport, &mut self.session, query)
                .await
            {
                Err(err) if err.is_retryable() && attempt < max_retries => {
                    attempt += 1;
                    self.recover(attempt, max_retries, &err)?;
                }
                result => return result,
            }
        }
    }

    /// Results decoded into `D`.
    pub async fn query_documents<D: DeserializeOwned>(
        &mut self,
        query: &QueryRequest,
    ) -> Result<Vec<D>, QueryError> {
        let bytes = self.query_bytes(query).await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// First page's response, unread. Retried like a full query.
    pub async fn query_response(
        &mut self,
        query: &QueryRequest,
    ) -> Result<TransportResponse, QueryError> {
        let max_retries = self.config().max_retries;
        let mut attempt = 0;
        loop {
            match self
                .executor
                .first_page(&self.transport, &mut self.session, query)
                .await
            {
                Err(err) if err.is_retryable() && attempt < max_retries => {
                    attempt += 1;
                    self.recover(attempt, max_retries, &err)?;
                }
                result => return result,
            }
        }
    }

    /// Lazy stream of reassembled fragments. Not retried: fragments may
    /// already have been handed out when a 401 arrives.
    pub fn query_stream(
        &mut self,
        query: QueryRequest,
    ) -> impl Stream<Item = Result<Bytes, QueryError>> + '_ {
        self.executor
            .stream(&self.transport, &mut self.session, query)
    }

    /// Send a point operation, retrying on 401.
    pub async fn send(&mut self, request: OutboundRequest) -> Result<PointResponse, QueryError> {
        let max_retries = self.config().max_retries;
        let mut attempt = 0;
        loop {
            match self
                .executor
                .send_point(&self.transport, &mut self.session, request.clone())
                .await
            {
                Err(err) if err.is_retryable() && attempt < max_retries => {
                    attempt += 1;
                    self.recover(attempt, max_retries, &err)?;
                }
                result => return result,
            }
        }
    }

    fn recover(&mut self, attempt: u32, max_retries: u32, err: &QueryError) -> Result<(), QueryError> {
        warn!(
            attempt,
            max_retries,
            error = %err,
            "[cs-02] Authentication failed, reconnecting and retrying from the first page"
        );
        self.transport.reconnect()?;
        if self.config().session_on_retry == SessionRetryPolicy::Reset {
            self.session.reset();
        }
        Ok(())
    }
}

impl<T: CosmosTransport> std::fmt::Debug for RetryingClient<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetryingClient")
            .field("executor", &self.executor)
            .field("session", &self.session)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::outbound::{MockResponse, MockTransport};
    use futures::TryStreamExt;
    use http::{Method, StatusCode};
    use serde::Deserialize;
    use shared_types::headers::{CONTINUATION, SESSION_TOKEN};
    use shared_types::{MasterKey, ResourceType};

    const TEST_KEY: &str = "Y29zbW9zLXN0cmVhbS10ZXN0LW1hc3Rlci1rZXktMDEyMzQ1Njc4OQ==";

    fn context() -> ConnectionContext {
        ConnectionContext::new(
            "https://acct.documents.azure.com:443/",
            "testdb",
            "testcoll",
            MasterKey::from_base64(TEST_KEY).unwrap(),
        )
        .unwrap()
    }

    fn client(mock: &MockTransport, config: QueryEngineConfig) -> RetryingClient<MockTransport> {
        RetryingClient::new(&context(), mock.clone(), config)
    }

    fn page(documents: &str) -> String {
        format!(r#"{{"_rid":"x==","Documents":{documents},"_count":1}}"#)
    }

    fn unauthorized() -> MockResponse {
        MockResponse::status(StatusCode::UNAUTHORIZED, "The input authorization token can't serve the request")
    }

    #[derive(Debug, Deserialize, PartialEq)]
    struct Doc {
        id: String,
    }

    #[tokio::test]
    async fn test_401_then_200_returns_second_attempt() {
        let mock = MockTransport::with_responses([
            unauthorized(),
            MockResponse::ok(page(r#"[{"id":"a"}]"#)),
        ]);
        let mut client = client(&mock, QueryEngineConfig::default());
        let bytes = client.query_bytes(&QueryRequest::new("q")).await.unwrap();
        assert_eq!(&bytes[..], br#"[{"id":"a"}]"#);
        assert_eq!(mock.reconnects(), 1);
        assert_eq!(mock.request_count(), 2);
    }

    #[tokio::test]
    async fn test_401_on_later_page_restarts_from_first_page() {
        let mock = MockTransport::with_responses([
            MockResponse::ok(page(r#"[{"id":"a"}]"#)).with_header(CONTINUATION, "c1"),
            unauthorized(),
            MockResponse::ok(page(r#"[{"id":"a"}]"#)).with_header(CONTINUATION, "c1"),
            MockResponse::ok(page(r#"[{"id":"b"}]"#)),
        ]);
        let mut client = client(&mock, QueryEngineConfig::default());
        let docs: Vec<Doc> = client
            .query_documents(&QueryRequest::new("q"))
            .await
            .unwrap();
        assert_eq!(
            docs,
            vec![
                Doc { id: "a".into() },
                Doc { id: "b".into() }
            ]
        );

        let requests = mock.requests();
        assert_eq!(requests.len(), 4);
        assert!(requests[2].headers.get(CONTINUATION).is_none());
        assert_eq!(requests[3].headers.get(CONTINUATION).unwrap(), "c1");
    }

    #[tokio::test]
    async fn test_always_401_surfaces_authentication_failure() {
        let config = QueryEngineConfig::for_testing();
        let attempts = config.max_retries as usize + 1;
        let mock = MockTransport::with_responses((0..attempts).map(|_| unauthorized()));
        let mut client = client(&mock, config);

        let err = client.query_bytes(&QueryRequest::new("q")).await.unwrap_err();
        assert!(matches!(err, QueryError::Authentication { status: 401, .. }));
        assert_eq!(mock.request_count(), attempts);
        assert_eq!(mock.reconnects(), attempts - 1);
    }

    #[tokio::test]
    async fn test_explicit_retry_bound() {
        let mock = MockTransport::with_responses([unauthorized(), unauthorized()]);
        let mut client = client(&mock, QueryEngineConfig::default());
        let err = client
            .query_bytes_with_retries(&QueryRequest::new("q"), 0)
            .await
            .unwrap_err();
        assert!(err.is_retryable());
        assert_eq!(mock.request_count(), 1);
        assert_eq!(mock.remaining(), 1);
    }

    #[tokio::test]
    async fn test_other_failures_are_not_retried() {
        let mock = MockTransport::with_responses([
            MockResponse::status(StatusCode::FORBIDDEN, "forbidden"),
            MockResponse::ok(page("[]")),
        ]);
        let mut client = client(&mock, QueryEngineConfig::default());
        let err = client.query_bytes(&QueryRequest::new("q")).await.unwrap_err();
        assert_eq!(err.status(), Some(403));
        assert_eq!(mock.reconnects(), 0);
        assert_eq!(mock.remaining(), 1);
    }

    #[tokio::test]
    async fn test_session_preserved_across_retry_by_default() {
        let mock = MockTransport::with_responses([
            MockResponse::ok(page(r#"[{"id":"a"}]"#))
                .with_header(CONTINUATION, "c1")
                .with_header(SESSION_TOKEN, "0:1#1"),
            unauthorized(),
            MockResponse::ok(page(r#"[{"id":"a"}]"#)),
        ]);
        let mut client = client(&mock, QueryEngineConfig::default());
        client.query_bytes(&QueryRequest::new("q")).await.unwrap();
        assert_eq!(
            mock.requests()[2].headers.get(SESSION_TOKEN).unwrap(),
            "0:1#1"
        );
    }

    #[tokio::test]
    async fn test_session_reset_policy() {
        let mock = MockTransport::with_responses([
            MockResponse::ok(page(r#"[{"id":"a"}]"#))
                .with_header(CONTINUATION, "c1")
                .with_header(SESSION_TOKEN, "0:1#1"),
            unauthorized(),
            MockResponse::ok(page(r#"[{"id":"a"}]"#)),
        ]);
        let config = QueryEngineConfig {
            session_on_retry: SessionRetryPolicy::Reset,
            ..QueryEngineConfig::default()
        };
        let mut client = client(&mock, config);
        client.query_bytes(&QueryRequest::new("q")).await.unwrap();
        assert!(mock.requests()[2].headers.get(SESSION_TOKEN).is_none());
    }

    #[tokio::test]
    async fn test_query_response_retries() {
        let mock = MockTransport::with_responses([
            unauthorized(),
            MockResponse::ok(page("[]")).with_header(CONTINUATION, "c1"),
        ]);
        let mut client = client(&mock, QueryEngineConfig::default());
        let response = client.query_response(&QueryRequest::new("q")).await.unwrap();
        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(response.headers.get(CONTINUATION).unwrap(), "c1");
        assert_eq!(mock.reconnects(), 1);
    }

    #[tokio::test]
    async fn test_query_stream_does_not_retry() {
        let mock = MockTransport::with_responses([
            unauthorized(),
            MockResponse::ok(page(r#"[{"id":"a"}]"#)),
        ]);
        let mut client = client(&mock, QueryEngineConfig::default());
        let result: Result<Vec<Bytes>, QueryError> = client
            .query_stream(QueryRequest::new("q"))
            .try_collect()
            .await;
        assert!(matches!(result, Err(QueryError::Authentication { .. })));
        assert_eq!(mock.reconnects(), 0);
    }

    #[tokio::test]
    async fn test_point_send_retries_on_401() {
        let mock = MockTransport::with_responses([
            unauthorized(),
            MockResponse::ok(r#"{"id":"a"}"#).with_header(SESSION_TOKEN, "0:1#8"),
        ]);
        let mut client = client(&mock, QueryEngineConfig::default());
        let url = context().document_url("a");
        let response = client
            .send(OutboundRequest::new(Method::GET, url, ResourceType::Docs))
            .await
            .unwrap();
        assert_eq!(response.json::<Doc>().unwrap(), Doc { id: "a".into() });
        assert_eq!(client.session().token(), Some("0:1#8"));
        assert_eq!(mock.reconnects(), 1);
    }
}
