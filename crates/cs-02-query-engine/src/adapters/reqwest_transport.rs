//! HTTP transport over `reqwest`.
//!
//! Bodies are exposed as chunk streams so the reassembler sees bytes as they
//! arrive. Timeouts are applied here, not by the engine.

use std::time::Duration;

use async_trait::async_trait;
use cs_01_request_auth::SignedRequest;
use futures::StreamExt;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::domain::TransportError;
use crate::ports::outbound::{CosmosTransport, TransportResponse};

/// Transport configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct TransportConfig {
    /// Whole-request timeout in seconds.
    pub timeout_secs: u64,
    /// Connect timeout in seconds.
    pub connect_timeout_secs: u64,
    /// Idle pooled connections kept per host.
    pub pool_max_idle_per_host: usize,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 60,
            connect_timeout_secs: 10,
            pool_max_idle_per_host: 8,
        }
    }
}

impl TransportConfig {
    /// Short timeouts for tests against a local server.
    pub fn for_testing() -> Self {
        Self {
            timeout_secs: 5,
            connect_timeout_secs: 2,
            pool_max_idle_per_host: 1,
        }
    }

    /// Validate configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.timeout_secs == 0 {
            return Err("timeout_secs must be > 0".into());
        }
        if self.connect_timeout_secs == 0 {
            return Err("connect_timeout_secs must be > 0".into());
        }
        Ok(())
    }
}

/// `reqwest`-backed transport.
///
/// `reconnect` replaces the client, dropping its connection pool.
pub struct ReqwestTransport {
    client: Client,
    config: TransportConfig,
}

impl ReqwestTransport {
    /// Build a transport.
    pub fn new(config: TransportConfig) -> Result<Self, TransportError> {
        let client = build_client(&config)?;
        Ok(Self { client, config })
    }

    /// Current configuration.
    pub fn config(&self) -> &TransportConfig {
        &self.config
    }
}

fn build_client(config: &TransportConfig) -> Result<Client, TransportError> {
    Client::builder()
        .timeout(Duration::from_secs(config.timeout_secs))
        .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
        .pool_max_idle_per_host(config.pool_max_idle_per_host)
        .build()
        .map_err(|e| TransportError::Build(e.to_string()))
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            TransportError::Timeout
        } else if err.is_connect() {
            TransportError::Connection(err.to_string())
        } else if err.is_body() || err.is_decode() {
            TransportError::Body(err.to_string())
        } else if err.is_builder() {
            TransportError::Build(err.to_string())
        } else {
            TransportError::Network(err.to_string())
        }
    }
}

#[async_trait]
impl CosmosTransport for ReqwestTransport {
    async fn send(&self, request: SignedRequest) -> Result<TransportResponse, TransportError> {
        debug!("[cs-02] {} {}", request.method, request.url);

        let mut builder = self
            .client
            .request(request.method, &request.url)
            .headers(request.headers);
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder.send().await?;
        let status = response.status();
        let headers = response.headers().clone();
        let body = response
            .bytes_stream()
            .map(|chunk| chunk.map_err(TransportError::from))
            .boxed();

        Ok(TransportResponse {
            status,
            headers,
            body,
        })
    }

    fn reconnect(&mut self) -> Result<(), TransportError> {
        self.client = build_client(&self.config)?;
        info!("[cs-02] Transport reconnected with a fresh connection pool");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = TransportConfig::default();
        assert_eq!(config.timeout_secs, 60);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let config = TransportConfig {
            timeout_secs: 0,
            ..TransportConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_reconnect_rebuilds_client() {
        let mut transport = ReqwestTransport::new(TransportConfig::for_testing()).unwrap();
        transport.reconnect().unwrap();
        assert_eq!(transport.config().timeout_secs, 5);
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_transport_error() {
        let transport = ReqwestTransport::new(TransportConfig::for_testing()).unwrap();
        let request = SignedRequest {
            method: http::Method::GET,
            url: "http://127.0.0.1:1/dbs".to_string(),
            headers: http::HeaderMap::new(),
            body: None,
        };
        let err = transport.send(request).await.unwrap_err();
        assert!(matches!(
            err,
            TransportError::Connection(_) | TransportError::Network(_) | TransportError::Timeout
        ));
    }
}
