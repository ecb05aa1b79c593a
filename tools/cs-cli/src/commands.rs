//! Subcommand execution.

use std::io::Write;

use anyhow::{Context, Result};
use cs_02_query_engine::CosmosTransport;
use cs_03_container_client::{ContainerClient, ContainerClientConfig};
use futures::StreamExt;
use serde::Serialize;
use serde_json::Value;
use shared_types::{ConnectionContext, ConnectionString};
use tracing::info;

use crate::cli::{build_query, Args, Command};

/// Client configuration from the command-line overrides.
pub fn client_config(args: &Args) -> ContainerClientConfig {
    let mut config = ContainerClientConfig::default();
    if let Some(max_retries) = args.max_retries {
        config.engine.max_retries = max_retries;
    }
    if let Some(count) = args.max_item_count {
        config.engine.max_item_count = Some(count);
    }
    config.default_partition_key = args.partition_key.clone();
    config
}

/// Connection context from `--connection-string` or the environment.
pub fn connection_context(args: &Args) -> Result<ConnectionContext> {
    let connection = match &args.connection_string {
        Some(descriptor) => ConnectionString::parse(descriptor)?,
        None => ConnectionString::from_env()
            .context("no --connection-string given and none found in the environment")?,
    };
    Ok(ConnectionContext::from_connection_string(
        &connection,
        args.db.as_str(),
        args.container.as_str(),
    )?)
}

/// Run `command` and write its result to `out`.
pub async fn run<T, W>(
    client: &mut ContainerClient<T>,
    command: &Command,
    pretty: bool,
    out: &mut W,
) -> Result<()>
where
    T: CosmosTransport,
    W: Write,
{
    match command {
        Command::Query { sql, params, stream } => {
            let query = build_query(sql, params, None)?;
            if *stream {
                let mut fragments = Box::pin(client.query_stream(query));
                let mut written = 0usize;
                while let Some(fragment) = fragments.next().await {
                    let fragment = fragment?;
                    written += fragment.len();
                    out.write_all(&fragment)?;
                }
                writeln!(out)?;
                info!("[cs-cli] Streamed {} bytes", written);
            } else {
                let documents: Vec<Value> = client.query_documents(query).await?;
                info!("[cs-cli] {} documents", documents.len());
                print_json(out, &documents, pretty)?;
            }
        }
        Command::Read { id } => {
            let document: Value = client.read(id, None).await?;
            print_json(out, &document, pretty)?;
        }
        Command::Create { json } => {
            let record: Value = serde_json::from_str(json).context("document is not valid JSON")?;
            let created = client.create(&record).await?;
            print_json(out, &created, pretty)?;
        }
        Command::Upsert { json } => {
            let record: Value = serde_json::from_str(json).context("document is not valid JSON")?;
            let stored = client.upsert(&record).await?;
            print_json(out, &stored, pretty)?;
        }
        Command::Delete { id } => {
            client.delete(id, None).await?;
            print_json(out, &serde_json::json!({ "deleted": id }), pretty)?;
        }
        Command::Meta => {
            let metadata = client.container_metadata().await?;
            print_json(out, &metadata, pretty)?;
        }
        Command::Pkranges => {
            let ranges = client.partition_key_ranges().await?;
            print_json(out, &ranges, pretty)?;
        }
    }
    out.flush()?;
    Ok(())
}

fn print_json<W: Write, V: Serialize>(out: &mut W, value: &V, pretty: bool) -> Result<()> {
    if pretty {
        serde_json::to_writer_pretty(&mut *out, value)?;
    } else {
        serde_json::to_writer(&mut *out, value)?;
    }
    writeln!(out)?;
    Ok(())
}
