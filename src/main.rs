//! yooreed-api: HTTP server entry point

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use yooreed::config::AppConfig;
use yooreed::server::{AppState, ServerBuilder, open_repositories};

#[derive(Debug, Parser)]
#[command(name = "yooreed-api", version, about = "Yooreed Event REST API")]
struct Cli {
    /// YAML configuration file
    #[arg(long, env = "YOOREED_CONFIG")]
    config: Option<PathBuf>,

    /// Port to listen on (overrides the configuration)
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("yooreed=info,yooreed_api=info,tower_http=info")),
        )
        .init();

    let cli = Cli::parse();
    let mut config = AppConfig::load(cli.config.as_deref())?;
    if let Some(port) = cli.port {
        config.server.port = port;
    }
    tracing::info!(environment = ?config.server.environment, "starting Yooreed Event API");

    let repositories = open_repositories(&config).await.inspect_err(|e| {
        tracing::error!(error = %format!("{:#}", e), "storage initialization failed");
    })?;
    let addr = config.bind_address();
    let state = AppState::from_config(config, repositories)?;

    ServerBuilder::new(state).register_all().serve(&addr).await
}
