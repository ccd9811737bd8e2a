//! Leakboard - gas leak survey dashboard API
//!
//! Aggregates survey reports and driving sessions stored in PocketBase into
//! dashboard statistics and work-hour estimates.

mod backend;
mod config;
mod report;
mod web;
mod workhours;

use backend::PocketBase;
use config::ServerConfig;
use web::Server;

use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env()
            .add_directive("leakboard=info".parse()?))
        .init();

    // Load configuration
    let cfg = ServerConfig::load();
    tracing::info!("Starting leakboard on port {}...", cfg.http_port);
    tracing::info!("Using PocketBase at {}", cfg.pocketbase_url);

    let store = PocketBase::new(&cfg.pocketbase_url)?;
    if let Err(e) = backend::RecordStore::health(&store).await {
        tracing::warn!("PocketBase not reachable at startup: {}", e);
    }

    // Start web server
    let server = Server::new(cfg, Arc::new(store));
    server.start().await?;

    Ok(())
}
