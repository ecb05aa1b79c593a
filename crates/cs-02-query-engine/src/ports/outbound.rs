//! # Outbound Ports
//!
//! The HTTP transport the engine depends on, plus a scripted mock.

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use cs_01_request_auth::SignedRequest;
use futures::stream::{self, BoxStream, StreamExt};
use http::header::{HeaderMap, HeaderName, HeaderValue};
use http::StatusCode;
use parking_lot::Mutex;

use crate::domain::TransportError;

/// Response body as a stream of chunks, in arrival order.
pub type BodyStream = BoxStream<'static, Result<Bytes, TransportError>>;

/// A response whose body has not been read yet.
pub struct TransportResponse {
    /// HTTP status.
    pub status: StatusCode,
    /// Response headers.
    pub headers: HeaderMap,
    /// Body chunks.
    pub body: BodyStream,
}

impl TransportResponse {
    /// Read the whole body.
    pub async fn collect_body(mut self) -> Result<Bytes, TransportError> {
        let mut buffer = BytesMut::new();
        while let Some(chunk) = self.body.next().await {
            buffer.extend_from_slice(&chunk?);
        }
        Ok(buffer.freeze())
    }

    /// Read the whole body as text, replacing invalid UTF-8.
    pub async fn text(self) -> Result<String, TransportError> {
        let body = self.collect_body().await?;
        Ok(String::from_utf8_lossy(&body).into_owned())
    }
}

impl std::fmt::Debug for TransportResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransportResponse")
            .field("status", &self.status)
            .field("headers", &self.headers)
            .finish_non_exhaustive()
    }
}

/// HTTP transport - outbound port.
///
/// `send` is called concurrently when pages are pipelined. `reconnect` is
/// called between retry attempts, never while a request is in flight.
#[async_trait]
pub trait CosmosTransport: Send + Sync {
    /// Send a signed request and return as soon as headers arrive.
    async fn send(&self, request: SignedRequest) -> Result<TransportResponse, TransportError>;

    /// Drop pooled connections and start fresh.
    fn reconnect(&mut self) -> Result<(), TransportError>;
}

// =============================================================================
// Mock Implementations for Testing
// =============================================================================

/// A scripted response for [`MockTransport`].
#[derive(Clone, Debug)]
pub struct MockResponse {
    /// Status to return.
    pub status: StatusCode,
    /// Headers to return.
    pub headers: HeaderMap,
    /// Body chunks; an `Err` entry fails the body read at that point.
    pub chunks: Vec<Result<Bytes, TransportError>>,
}

impl MockResponse {
    /// 200 with `body` as a single chunk.
    pub fn ok(body: impl Into<Bytes>) -> Self {
        Self::status(StatusCode::OK, body)
    }

    /// Any status with `body` as a single chunk.
    pub fn status(status: StatusCode, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            chunks: vec![Ok(body.into())],
        }
    }

    /// Add a response header. Invalid names or values are ignored.
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        if let (Ok(name), Ok(value)) = (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            self.headers.insert(name, value);
        }
        self
    }

    /// Re-split the body into chunks of at most `size` bytes.
    pub fn chunked(mut self, size: usize) -> Self {
        let size = size.max(1);
        let mut body = BytesMut::new();
        for chunk in self.chunks.iter().flatten() {
            body.extend_from_slice(chunk);
        }
        let mut body = body.freeze();
        let mut chunks = Vec::new();
        while !body.is_empty() {
            let take = size.min(body.len());
            chunks.push(Ok(body.split_to(take)));
        }
        self.chunks = chunks;
        self
    }

    /// Fail the body read after the chunks so far.
    pub fn with_body_error(mut self, error: TransportError) -> Self {
        self.chunks.push(Err(error));
        self
    }
}

#[derive(Default)]
struct MockState {
    responses: VecDeque<Result<MockResponse, TransportError>>,
    requests: Vec<SignedRequest>,
    reconnects: usize,
}

/// Mock transport replaying scripted responses in order.
///
/// Clones share state, so a test can keep one handle for inspection while
/// the client owns another.
#[derive(Clone, Default)]
pub struct MockTransport {
    state: Arc<Mutex<MockState>>,
}

impl MockTransport {
    /// Mock with nothing scripted.
    pub fn new() -> Self {
        Self::default()
    }

    /// Mock that replays `responses` in order.
    pub fn with_responses(responses: impl IntoIterator<Item = MockResponse>) -> Self {
        let mock = Self::new();
        for response in responses {
            mock.push_response(response);
        }
        mock
    }

    /// Queue a response.
    pub fn push_response(&self, response: MockResponse) {
        self.state.lock().responses.push_back(Ok(response));
    }

    /// Queue a transport failure.
    pub fn push_error(&self, error: TransportError) {
        self.state.lock().responses.push_back(Err(error));
    }

    /// Requests sent so far, in order.
    pub fn requests(&self) -> Vec<SignedRequest> {
        self.state.lock().requests.clone()
    }

    /// Number of requests sent.
    pub fn request_count(&self) -> usize {
        self.state.lock().requests.len()
    }

    /// Number of reconnects.
    pub fn reconnects(&self) -> usize {
        self.state.lock().reconnects
    }

    /// Scripted responses not yet consumed.
    pub fn remaining(&self) -> usize {
        self.state.lock().responses.len()
    }
}

#[async_trait]
impl CosmosTransport for MockTransport {
    async fn send(&self, request: SignedRequest) -> Result<TransportResponse, TransportError> {
        let next = {
            let mut state = self.state.lock();
            state.requests.push(request);
            state.responses.pop_front()
        };
        let response = next.unwrap_or_else(|| {
            Err(TransportError::Connection(
                "mock transport has no scripted response".to_string(),
            ))
        })?;
        Ok(TransportResponse {
            status: response.status,
            headers: response.headers,
            body: stream::iter(response.chunks).boxed(),
        })
    }

    fn reconnect(&mut self) -> Result<(), TransportError> {
        self.state.lock().reconnects += 1;
        Ok(())
    }
}
