//! # Container Client
//!
//! Convenience operations on one container, all routed through the
//! [`RetryingClient`] so they are signed per request, retried on 401, and
//! keep the session token current.
//!
//! | Operation | Request | Resource type |
//! |-----------|---------|---------------|
//! | metadata | `GET .../colls/{c}` | `colls` |
//! | create / upsert | `POST .../docs` | `docs` |
//! | read | `GET .../docs/{id}` | `docs` |
//! | delete | `DELETE .../docs/{id}` | `docs` |
//! | partition_key_ranges | `GET .../pkranges` | `pkranges` |
//! | query | `POST .../docs` | `docs` |

use bytes::Bytes;
use cs_01_request_auth::OutboundRequest;
use cs_02_query_engine::{
    base_headers, point_headers, CosmosTransport, QueryEngineConfig, QueryError, QueryRequest,
    ReqwestTransport, RetryingClient, TransportResponse,
};
use futures::Stream;
use http::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use shared_types::{ConnectionContext, ConnectionString, ResourceType, SessionState};
use tracing::{debug, info, warn};

use crate::config::ContainerClientConfig;
use crate::domain::metadata::PartitionKeyRangeFeed;
use crate::domain::{
    resolve_write_partition_key, ContainerError, ContainerMetadata, PartitionKeyRange,
};

/// Client for one container.
#[derive(Debug)]
pub struct ContainerClient<T: CosmosTransport = ReqwestTransport> {
    context: ConnectionContext,
    client: RetryingClient<T>,
    metadata: ContainerMetadata,
    partition_key_name: Option<String>,
    default_partition_key: Option<String>,
}

impl ContainerClient<ReqwestTransport> {
    /// Connect over HTTP and load the container's metadata.
    pub async fn connect(
        context: ConnectionContext,
        config: ContainerClientConfig,
    ) -> Result<Self, ContainerError> {
        let transport = ReqwestTransport::new(config.transport.clone()).map_err(QueryError::from)?;
        Self::connect_with_transport(context, transport, config).await
    }

    /// Connect using the connection descriptor from the environment.
    pub async fn from_env(
        database: &str,
        container: &str,
        config: ContainerClientConfig,
    ) -> Result<Self, ContainerError> {
        let connection = ConnectionString::from_env()?;
        let context = ConnectionContext::from_connection_string(&connection, database, container)?;
        Self::connect(context, config).await
    }
}

impl<T: CosmosTransport> ContainerClient<T> {
    /// Connect over `transport` and load the container's metadata.
    ///
    /// A composite or absent partition-key definition is logged and leaves
    /// the partition-key property unset; writes then need a default.
    pub async fn connect_with_transport(
        context: ConnectionContext,
        transport: T,
        config: ContainerClientConfig,
    ) -> Result<Self, ContainerError> {
        config.validate().map_err(QueryError::Configuration)?;
        let mut client = RetryingClient::new(&context, transport, config.engine);
        let metadata = fetch_metadata(&mut client, &context).await?;

        let partition_key_name = match metadata.partition_key_name() {
            Ok(name) => Some(name),
            Err(err) => {
                warn!("[cs-03] {} on container {}", err, context.container());
                None
            }
        };
        info!(
            "[cs-03] Connected to {}/{} (partition key: {})",
            context.database(),
            context.container(),
            partition_key_name.as_deref().unwrap_or("<none>")
        );

        Ok(Self {
            context,
            client,
            metadata,
            partition_key_name,
            default_partition_key: config.default_partition_key,
        })
    }

    /// Connection context.
    pub fn context(&self) -> &ConnectionContext {
        &self.context
    }

    /// Metadata loaded at connect time.
    pub fn metadata(&self) -> &ContainerMetadata {
        &self.metadata
    }

    /// Partition-key property name, if the container has a single-path key.
    pub fn partition_key_name(&self) -> Option<&str> {
        self.partition_key_name.as_deref()
    }

    /// Default partition key.
    pub fn default_partition_key(&self) -> Option<&str> {
        self.default_partition_key.as_deref()
    }

    /// Change the default partition key used by queries, reads, deletes,
    /// and writes.
    pub fn set_default_partition_key(&mut self, partition_key: Option<String>) {
        self.default_partition_key = partition_key;
    }

    /// Engine configuration.
    pub fn engine_config(&self) -> &QueryEngineConfig {
        self.client.config()
    }

    /// Current session.
    pub fn session(&self) -> &SessionState {
        self.client.session()
    }

    /// Underlying query client.
    pub fn query_client(&mut self) -> &mut RetryingClient<T> {
        &mut self.client
    }

    /// Fetch the container metadata again.
    pub async fn container_metadata(&mut self) -> Result<ContainerMetadata, ContainerError> {
        fetch_metadata(&mut self.client, &self.context).await
    }

    /// Partition-key ranges of the container.
    pub async fn partition_key_ranges(&mut self) -> Result<Vec<PartitionKeyRange>, ContainerError> {
        let headers = base_headers(self.client.config())?;
        let request = OutboundRequest::new(
            Method::GET,
            self.context.pk_ranges_url(),
            ResourceType::PkRanges,
        )
        .with_headers(headers);
        let response = self.client.send(request).await?;
        let feed: PartitionKeyRangeFeed = serde_json::from_slice(&response.body)?;
        debug!("[cs-03] {} partition key ranges", feed.ranges.len());
        Ok(feed.ranges)
    }

    /// Create a record.
    pub async fn create<R: Serialize>(&mut self, record: &R) -> Result<Value, ContainerError> {
        self.write(record, false).await
    }

    /// Create or replace a record.
    pub async fn upsert<R: Serialize>(&mut self, record: &R) -> Result<Value, ContainerError> {
        self.write(record, true).await
    }

    /// Read a record by id.
    pub async fn read<D: DeserializeOwned>(
        &mut self,
        id: &str,
        partition_key: Option<&str>,
    ) -> Result<D, ContainerError> {
        let partition_key = partition_key.or(self.default_partition_key.as_deref());
        let headers = point_headers(self.client.config(), partition_key, None)?;
        let request = OutboundRequest::new(
            Method::GET,
            self.context.document_url(id),
            ResourceType::Docs,
        )
        .with_headers(headers);
        let response = self.client.send(request).await?;
        Ok(response.json()?)
    }

    /// Delete a record by id.
    pub async fn delete(
        &mut self,
        id: &str,
        partition_key: Option<&str>,
    ) -> Result<(), ContainerError> {
        let partition_key = partition_key.or(self.default_partition_key.as_deref());
        let headers = point_headers(self.client.config(), partition_key, None)?;
        let request = OutboundRequest::new(
            Method::DELETE,
            self.context.document_url(id),
            ResourceType::Docs,
        )
        .with_headers(headers);
        let response = self.client.send(request).await?;
        info!("[cs-03] Deleted {} ({})", id, response.status);
        Ok(())
    }

    /// Reassembled JSON array of query results.
    pub async fn query_bytes(&mut self, query: QueryRequest) -> Result<Bytes, ContainerError> {
        let query = self.scoped(query);
        Ok(self.client.query_bytes(&query).await?)
    }

    /// Query results decoded into `D`.
    pub async fn query_documents<D: DeserializeOwned>(
        &mut self,
        query: QueryRequest,
    ) -> Result<Vec<D>, ContainerError> {
        let query = self.scoped(query);
        Ok(self.client.query_documents(&query).await?)
    }

    /// First page's response, unread.
    pub async fn query_response(
        &mut self,
        query: QueryRequest,
    ) -> Result<TransportResponse, ContainerError> {
        let query = self.scoped(query);
        Ok(self.client.query_response(&query).await?)
    }

    /// Lazy stream of reassembled fragments.
    pub fn query_stream(
        &mut self,
        query: QueryRequest,
    ) -> impl Stream<Item = Result<Bytes, QueryError>> + '_ {
        let query = self.scoped(query);
        self.client.query_stream(query)
    }

    fn scoped(&self, mut query: QueryRequest) -> QueryRequest {
        if query.partition_key.is_none() {
            query.partition_key = self.default_partition_key.clone();
        }
        query
    }

    async fn write<R: Serialize>(&mut self, record: &R, is_upsert: bool) -> Result<Value, ContainerError> {
        let record = serde_json::to_value(record)?;
        let partition_key = resolve_write_partition_key(
            &record,
            self.partition_key_name.as_deref(),
            self.default_partition_key.as_deref(),
        )?;
        let headers = point_headers(self.client.config(), Some(&partition_key), Some(is_upsert))?;
        let body = serde_json::to_vec(&record)?;
        let request = OutboundRequest::new(Method::POST, self.context.docs_url(), ResourceType::Docs)
            .with_headers(headers)
            .with_body(body);

        let response = self.client.send(request).await?;
        debug!(
            "[cs-03] {} into partition {} ({})",
            if is_upsert { "Upserted" } else { "Created" },
            partition_key,
            response.status
        );
        Ok(response.json()?)
    }
}

async fn fetch_metadata<T: CosmosTransport>(
    client: &mut RetryingClient<T>,
    context: &ConnectionContext,
) -> Result<ContainerMetadata, ContainerError> {
    let headers = base_headers(client.config())?;
    let request = OutboundRequest::new(Method::GET, context.collection_url(), ResourceType::Colls)
        .with_headers(headers);
    let response = client.send(request).await?;
    Ok(serde_json::from_slice(&response.body)?)
}
