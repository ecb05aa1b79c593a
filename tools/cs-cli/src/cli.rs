//! Command-line arguments.

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use cs_02_query_engine::QueryRequest;
use serde_json::Value;

/// Query and edit one container from the command line.
#[derive(Parser, Debug)]
#[command(name = "cs-cli", version)]
#[command(about = "Signed, paginated queries and point operations against one container")]
pub struct Args {
    /// Database id
    #[arg(long)]
    pub db: String,

    /// Container id
    #[arg(long)]
    pub container: String,

    /// Connection descriptor (`AccountEndpoint=...;AccountKey=...;`).
    /// Read from the environment when omitted.
    #[arg(long)]
    pub connection_string: Option<String>,

    /// Partition key for queries, reads, deletes, and keyless writes
    #[arg(long)]
    pub partition_key: Option<String>,

    /// Retry bound for authentication failures
    #[arg(long)]
    pub max_retries: Option<u32>,

    /// Page size hint sent with queries
    #[arg(long)]
    pub max_item_count: Option<u32>,

    /// Pretty-print JSON output
    #[arg(long)]
    pub pretty: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Operation to run.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a query and print the documents as one JSON array
    Query {
        /// Query text
        sql: String,

        /// Query parameter as `name=value`; the value is JSON when it parses,
        /// a string otherwise
        #[arg(long = "param", value_name = "NAME=VALUE")]
        params: Vec<String>,

        /// Write fragments as they arrive instead of buffering the result
        #[arg(long)]
        stream: bool,
    },
    /// Read one document
    Read {
        /// Document id
        id: String,
    },
    /// Create a document from inline JSON
    Create {
        /// Document body
        json: String,
    },
    /// Create or replace a document from inline JSON
    Upsert {
        /// Document body
        json: String,
    },
    /// Delete one document
    Delete {
        /// Document id
        id: String,
    },
    /// Print the container metadata
    Meta,
    /// Print the partition-key ranges
    Pkranges,
}

/// Split `name=value` into a query parameter. The name gains a leading
/// `@` when it lacks one.
pub fn parse_param(raw: &str) -> Result<(String, Value)> {
    let Some((name, value)) = raw.split_once('=') else {
        bail!("parameter `{raw}` is not of the form name=value");
    };
    let name = name.trim();
    if name.is_empty() || name == "@" {
        bail!("parameter `{raw}` has an empty name");
    }
    let name = if name.starts_with('@') {
        name.to_string()
    } else {
        format!("@{name}")
    };
    let value = serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.to_string()));
    Ok((name, value))
}

/// Build the query request for the `query` subcommand.
pub fn build_query(sql: &str, params: &[String], max_item_count: Option<u32>) -> Result<QueryRequest> {
    let mut query = QueryRequest::new(sql);
    for raw in params {
        let (name, value) = parse_param(raw)?;
        query = query.with_parameter(name, value);
    }
    if let Some(count) = max_item_count {
        query = query.with_max_item_count(count);
    }
    Ok(query)
}
