//! # Paginated Query Executor
//!
//! One query attempt, page by page:
//!
//! ```text
//! FIRST_PAGE --continuation--> NEXT_PAGE --...--> LAST_PAGE --> DONE
//! ```
//!
//! Every page request is signed afresh and carries the latest session
//! token. Response headers are inspected before the body is read: the
//! session token is recorded and the continuation token decides whether
//! another page follows. Bodies are streamed through a [`ChunkReassembler`].
//!
//! With `pipeline_pages` set, page N+1 is requested while page N's body is
//! still being read. Both run inside one `try_join!`, so output order
//! follows page order and dropping the query future cancels both.
//!
//! No retry happens here; see [`RetryingClient`](super::RetryingClient).

use std::collections::VecDeque;

use bytes::{Bytes, BytesMut};
use cs_01_request_auth::{OutboundRequest, RequestAuthenticator};
use futures::stream::{self, Stream, StreamExt};
use http::header::HeaderMap;
use http::{Method, StatusCode};
use shared_types::{ConnectionContext, ResourceType, SessionState};
use tracing::{debug, info};

use crate::algorithms::ChunkReassembler;
use crate::application::headers::query_headers;
use crate::config::QueryEngineConfig;
use crate::domain::{continuation_from, PageState, QueryError, QueryRequest};
use crate::ports::outbound::{BodyStream, CosmosTransport, TransportResponse};

/// Fully read response of a point operation.
#[derive(Debug, Clone)]
pub struct PointResponse {
    /// HTTP status (always 2xx).
    pub status: StatusCode,
    /// Response headers.
    pub headers: HeaderMap,
    /// Response body.
    pub body: Bytes,
}

impl PointResponse {
    /// Decode the body as JSON.
    pub fn json<D: serde::de::DeserializeOwned>(&self) -> Result<D, QueryError> {
        Ok(serde_json::from_slice(&self.body)?)
    }
}

/// Runs single query attempts against the docs feed of one container.
#[derive(Debug, Clone)]
pub struct PaginatedQueryExecutor {
    docs_url: String,
    authenticator: RequestAuthenticator,
    config: QueryEngineConfig,
}

impl PaginatedQueryExecutor {
    /// Executor for the container named by `context`.
    pub fn new(context: &ConnectionContext, config: QueryEngineConfig) -> Self {
        Self::with_authenticator(
            context.docs_url(),
            RequestAuthenticator::new(context.master_key().clone()),
            config,
        )
    }

    /// Executor with an explicit docs URL and authenticator.
    pub fn with_authenticator(
        docs_url: impl Into<String>,
        authenticator: RequestAuthenticator,
        config: QueryEngineConfig,
    ) -> Self {
        Self {
            docs_url: docs_url.into(),
            authenticator,
            config,
        }
    }

    /// Engine configuration.
    pub fn config(&self) -> &QueryEngineConfig {
        &self.config
    }

    /// URL queries are posted to.
    pub fn docs_url(&self) -> &str {
        &self.docs_url
    }

    /// Run every page of `query` and return the reassembled JSON array.
    ///
    /// Nothing is returned unless every page succeeds.
    pub async fn execute<T>(
        &self,
        transport: &T,
        session: &mut SessionState,
        query: &QueryRequest,
    ) -> Result<Bytes, QueryError>
    where
        T: CosmosTransport + ?Sized,
    {
        let body = query.to_body()?;
        let mut page = PageState::first(query_headers(&self.config, query)?);
        let mut response = self.open_page(transport, session, &body, &page).await?;
        let mut reassembler = ChunkReassembler::new();
        let mut out = Vec::new();

        loop {
            let Some(token) = continuation_from(&response.headers) else {
                page = page.into_last();
                drain_page(response.body, &mut reassembler, true, &mut out).await?;
                break;
            };

            let next = page.next(token);
            let next_response = if self.config.pipeline_pages {
                let ((), next_response) = tokio::try_join!(
                    drain_page(response.body, &mut reassembler, false, &mut out),
                    self.open_page(transport, session, &body, &next),
                )?;
                next_response
            } else {
                drain_page(response.body, &mut reassembler, false, &mut out).await?;
                self.open_page(transport, session, &body, &next).await?
            };
            page = next;
            response = next_response;
        }

        let mut result = BytesMut::with_capacity(out.iter().map(Bytes::len).sum());
        for fragment in out {
            result.extend_from_slice(&fragment);
        }
        info!(
            pages = page.index() + 1,
            bytes = result.len(),
            "[cs-02] Query complete"
        );
        Ok(result.freeze())
    }

    /// Request the first page only and hand back its response unread.
    pub async fn first_page<T>(
        &self,
        transport: &T,
        session: &mut SessionState,
        query: &QueryRequest,
    ) -> Result<TransportResponse, QueryError>
    where
        T: CosmosTransport + ?Sized,
    {
        let body = query.to_body()?;
        let page = PageState::first(query_headers(&self.config, query)?);
        self.open_page(transport, session, &body, &page).await
    }

    /// Lazy form of [`execute`](Self::execute): fragments are yielded as
    /// chunks arrive, and their concatenation equals the eager result.
    ///
    /// Pages are fetched one after another. The first error ends the stream.
    pub fn stream<'a, T>(
        &'a self,
        transport: &'a T,
        session: &'a mut SessionState,
        query: QueryRequest,
    ) -> impl Stream<Item = Result<Bytes, QueryError>> + 'a
    where
        T: CosmosTransport + ?Sized + 'a,
    {
        let state = QueryStream {
            executor: self,
            transport,
            session,
            query,
            body: None,
            next_page: None,
            current: None,
            reassembler: ChunkReassembler::new(),
            pending: Vec::new(),
            ready: VecDeque::new(),
            started: false,
            done: false,
        };

        stream::try_unfold(state, |mut state| async move {
            loop {
                if let Some(fragment) = state.ready.pop_front() {
                    return Ok(Some((fragment, state)));
                }
                if state.done {
                    return Ok(None);
                }
                state.advance().await?;
                let QueryStream { pending, ready, .. } = &mut state;
                ready.extend(pending.drain(..));
            }
        })
    }

    /// Sign and send a point operation. 401 maps to `Authentication`, any
    /// other non-2xx to `ResponseFailure`.
    pub async fn send_point<T>(
        &self,
        transport: &T,
        session: &mut SessionState,
        mut request: OutboundRequest,
    ) -> Result<PointResponse, QueryError>
    where
        T: CosmosTransport + ?Sized,
    {
        session.apply(&mut request.headers);
        let method = request.method.clone();
        let signed = self.authenticator.authenticate(request)?;
        debug!("[cs-02] {} {}", method, signed.url);

        let response = transport.send(signed).await?;
        let response = check_status(response, |status| status.is_success()).await?;
        let status = response.status;
        session.observe(&response.headers);
        let headers = response.headers.clone();
        let body = response.collect_body().await?;
        Ok(PointResponse {
            status,
            headers,
            body,
        })
    }

    async fn open_page<T>(
        &self,
        transport: &T,
        session: &mut SessionState,
        body: &Bytes,
        page: &PageState,
    ) -> Result<TransportResponse, QueryError>
    where
        T: CosmosTransport + ?Sized,
    {
        let mut headers = page.headers().clone();
        session.apply(&mut headers);
        let request = OutboundRequest::new(Method::POST, self.docs_url.clone(), ResourceType::Docs)
            .with_headers(headers)
            .with_body(body.clone());
        let signed = self.authenticator.authenticate(request)?;

        let response = transport.send(signed).await?;
        let status = response.status;
        debug!(
            page = page.index(),
            status = status.as_u16(),
            "[cs-02] Page response received"
        );

        let response = check_status(response, |status| status == StatusCode::OK).await?;
        session.observe(&response.headers);
        Ok(response)
    }
}

/// 401 becomes `Authentication`; any other status `accept` rejects becomes
/// `ResponseFailure`. The body is read only on failure.
async fn check_status(
    response: TransportResponse,
    accept: fn(StatusCode) -> bool,
) -> Result<TransportResponse, QueryError> {
    let status = response.status;
    if status != StatusCode::UNAUTHORIZED && accept(status) {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(if status == StatusCode::UNAUTHORIZED {
        QueryError::Authentication {
            status: status.as_u16(),
            body,
        }
    } else {
        QueryError::ResponseFailure {
            status: status.as_u16(),
            body,
        }
    })
}

async fn drain_page(
    mut body: BodyStream,
    reassembler: &mut ChunkReassembler,
    is_last: bool,
    out: &mut Vec<Bytes>,
) -> Result<(), QueryError> {
    reassembler.begin_page();
    while let Some(chunk) = body.next().await {
        reassembler.push_chunk(chunk?, out)?;
    }
    reassembler.end_page(is_last, out)?;
    Ok(())
}

struct QueryStream<'a, T: ?Sized> {
    executor: &'a PaginatedQueryExecutor,
    transport: &'a T,
    session: &'a mut SessionState,
    query: QueryRequest,
    body: Option<Bytes>,
    next_page: Option<PageState>,
    current: Option<(BodyStream, bool)>,
    reassembler: ChunkReassembler,
    pending: Vec<Bytes>,
    ready: VecDeque<Bytes>,
    started: bool,
    done: bool,
}

impl<T> QueryStream<'_, T>
where
    T: CosmosTransport + ?Sized,
{
    /// Make progress: read one chunk, finish a page, or open the next page.
    async fn advance(&mut self) -> Result<(), QueryError> {
        if let Some((body, is_last)) = self.current.as_mut() {
            let is_last = *is_last;
            match body.next().await {
                Some(chunk) => {
                    self.reassembler.push_chunk(chunk?, &mut self.pending)?;
                }
                None => {
                    self.current = None;
                    self.reassembler.end_page(is_last, &mut self.pending)?;
                    if is_last {
                        self.done = true;
                        info!(
                            pages = self.reassembler.pages(),
                            "[cs-02] Streamed query complete"
                        );
                    }
                }
            }
            return Ok(());
        }

        if !self.started {
            self.started = true;
            self.body = Some(self.query.to_body()?);
            self.next_page = Some(PageState::first(query_headers(
                self.executor.config(),
                &self.query,
            )?));
        }

        let (Some(page), Some(body)) = (self.next_page.take(), self.body.as_ref()) else {
            self.done = true;
            return Ok(());
        };

        let response = self
            .executor
            .open_page(self.transport, self.session, body, &page)
            .await?;
        let is_last = match continuation_from(&response.headers) {
            Some(token) => {
                self.next_page = Some(page.next(token));
                false
            }
            None => true,
        };
        self.reassembler.begin_page();
        self.current = Some((response.body, is_last));
        Ok(())
    }
}
