//! Hearth - household calendar, holiday and meal planning backend
//!
//! Loads configuration, wires the application context and runs the
//! background jobs until interrupted.

use anyhow::Context;
use hearth_api::utils::logging::init_tracing;
use hearth_api::AppContext;
use hearth_infra::config;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Environment first so RUST_LOG from .env applies to the subscriber
    let dotenv = dotenvy::dotenv();
    init_tracing();

    match dotenv {
        Ok(path) => info!(path = %path.display(), "Loaded .env"),
        Err(e) => warn!(error = %e, "Could not load .env file"),
    }

    let config = config::load().context("failed to load configuration")?;
    let context = AppContext::new(config).await.context("failed to initialise application")?;

    let health = context.health_check().await;
    if health.is_healthy {
        info!(score = health.score, "Startup health check passed");
    } else {
        for component in health.components.iter().filter(|c| !c.is_healthy) {
            warn!(
                component = %component.name,
                message = component.message.as_deref().unwrap_or_default(),
                "Component unhealthy at startup"
            );
        }
    }

    let scheduled = context.start_scheduler().await.context("failed to start scheduler")?;
    info!(scheduled, "Hearth running; press Ctrl+C to stop");

    tokio::signal::ctrl_c().await.context("failed to listen for shutdown signal")?;
    info!("Shutdown signal received");

    context.shutdown().await.context("failed to stop background jobs")?;
    info!("Hearth stopped");
    Ok(())
}
