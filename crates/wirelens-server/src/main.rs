#![forbid(unsafe_code)]

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;
use wirelens_contracts::RelayConfig;
use wirelens_engine::{GalleryCache, HttpRoomDirectory, OpenAiGateway};
use wirelens_server::{build_router, AppState};

#[derive(Debug, Parser)]
#[command(name = "wirelens-server", version, about = "Visual-inspection relay server")]
struct Cli {
    /// Address the HTTP server listens on.
    #[arg(long, default_value = "0.0.0.0:8000")]
    listen: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = Arc::new(RelayConfig::from_env()?);

    let directory = HttpRoomDirectory::new(&config.metadata_base_url, config.metadata_timeout)
        .context("failed building metadata client")?;
    let gateway = OpenAiGateway::new(
        &config.inference_base_url,
        &config.inference_api_key,
        config.inference_timeout,
    )
    .context("failed building inference client")?;
    let cache = GalleryCache::new(Arc::new(directory), config.uploads_root.clone());

    let state = AppState::new(Arc::new(cache), Arc::new(gateway), config);
    let app = build_router(state);

    let listener = TcpListener::bind(&cli.listen)
        .await
        .with_context(|| format!("failed to bind {}", cli.listen))?;
    info!(listen = %cli.listen, "wirelens relay started");
    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
