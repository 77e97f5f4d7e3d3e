//! Serve command for running the HTTP API

use std::sync::Arc;

use anyhow::Result;
use clap::Args;
use tracing::info;
use varlab_server::{AppState, ServerConfig, VariantLabServer};

use crate::config::ConfigLoader;

/// Arguments for the serve command
#[derive(Debug, Args)]
pub struct ServeArgs {
    /// Port to listen on (overrides config)
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Host to bind to (overrides config)
    #[arg(long)]
    pub host: Option<String>,

    /// Keep events in memory only (nothing survives exit)
    #[arg(long)]
    pub memory: bool,
}

/// Run the serve command
pub async fn run(args: ServeArgs) -> Result<()> {
    let config = ConfigLoader::load()?;

    let server_config = ServerConfig::new(
        args.host.unwrap_or(config.server.host.clone()),
        args.port.unwrap_or(config.server.port),
    );

    let state = if args.memory {
        info!("using in-memory event store");
        AppState::in_memory().await?
    } else {
        AppState::new(Arc::new(super::open_service(&config).await?))
    };

    info!("Starting variant-lab server on {}", server_config.addr());
    VariantLabServer::new(server_config, Arc::new(state))
        .run()
        .await
        .map_err(Into::into)
}
