//! cs-cli: signed, paginated queries and point operations against one
//! container.

use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use cs_03_container_client::ContainerClient;
use cs_telemetry::{init_logging, TelemetryConfig};
use tracing::error;

use cs_cli::{client_config, connection_context, run, Args};

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    if let Err(e) = init_logging(&TelemetryConfig::from_env()) {
        eprintln!("Warning: {e}");
    }

    match execute(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("[cs-cli] {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn execute(args: Args) -> Result<()> {
    let context = connection_context(&args)?;
    let config = client_config(&args);
    let mut client = ContainerClient::connect(context, config)
        .await
        .with_context(|| format!("connecting to {}/{}", args.db, args.container))?;

    let mut stdout = std::io::stdout().lock();
    run(&mut client, &args.command, args.pretty, &mut stdout).await
}
