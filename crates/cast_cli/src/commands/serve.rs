//! Serve command - Run the HTTP API.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use tracing::info;

use cast_service::{router, CloudcastConfig, ForecastService};

#[derive(Args)]
pub struct ServeArgs {
    /// Bind host (overrides HOST)
    #[arg(long)]
    host: Option<String>,

    /// Bind port (overrides PORT)
    #[arg(long)]
    port: Option<u16>,
}

pub async fn execute(args: ServeArgs) -> Result<()> {
    let mut config = CloudcastConfig::from_env();
    if let Some(host) = args.host {
        config.host = host;
    }
    if let Some(port) = args.port {
        config.port = port;
    }

    let addr = config.bind_address();
    let service = ForecastService::from_config(config).context("Failed to load forecasters")?;
    let app = router(Arc::new(service));

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("Listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;
    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("Shutdown requested");
    }
}
