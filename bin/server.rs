// Transit Catalog - Web Server
// REST API over the aggregated catalog

use anyhow::{Context, Result};
use clap::Parser;
use log::{info, warn};
use std::path::PathBuf;
use std::sync::Arc;
use transit_catalog::api;
use transit_catalog::{CatalogConfig, CatalogLoader, CatalogStore, DefaultFetcher};

#[derive(Debug, Parser)]
#[command(name = "catalog-server", version, about = "Serve the unified transit catalog over HTTP")]
struct ServerCli {
    #[arg(long, value_name = "PATH", help = "JSON config file listing catalog sources")]
    config: Option<PathBuf>,
    #[arg(long, value_name = "ADDR", help = "Overrides bind_addr from the config")]
    bind: Option<String>,
}

// ============================================================================
// Main Server
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    let cli = ServerCli::parse();
    let config = CatalogConfig::resolve(cli.config.as_deref())?;

    println!("🌐 Transit Catalog - Web Server");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let fetcher = Arc::new(DefaultFetcher::new(config.http_timeout()));
    let store = Arc::new(CatalogStore::new(config.sources.clone(), CatalogLoader::new(fetcher)));

    // One load at startup; later loads only via POST /api/catalog/reload
    let snapshot = store.reload().await;
    info!("initial catalog: {} records", snapshot.len());
    for stats in &snapshot.stats {
        println!("  {}", stats.summary());
    }
    if let Some(summary) = snapshot.error_summary() {
        warn!("{}", summary);
    }

    let app = api::router(Arc::clone(&store));

    let addr = cli.bind.unwrap_or_else(|| config.bind_addr.clone());
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to address {addr}"))?;

    println!("\n🚀 Server running on http://{}", addr);
    println!("   API: http://{}/api/catalog", addr);
    println!("\n   Press Ctrl+C to stop\n");

    axum::serve(listener, app)
        .await
        .context("Failed to start server")?;

    Ok(())
}
