//! Gatherly background worker
//!
//! Main application entry point: loads configuration, connects to the
//! database, and runs the lifecycle worker (expiry sweeps and event
//! reminders) until shutdown.

use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use gatherly::config::Settings;
use gatherly::database::{connection::create_pool, PoolConfig};
use gatherly::services::{LifecycleWorker, ServiceFactory};
use gatherly::utils::logging;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    // Load configuration
    let settings = Settings::new()?;
    settings.validate()?;

    // Initialize logging
    let _log_guard = logging::init_logging(&settings.logging)?;

    info!("Starting Gatherly worker...");

    // Initialize database connection
    info!("Connecting to database...");
    let pool_config = PoolConfig::from_settings(&settings.database);
    let pool = create_pool(&pool_config).await?;

    // Run database migrations
    gatherly::database::run_migrations(&pool).await?;

    // Initialize services
    info!("Initializing services...");
    let services = ServiceFactory::new(pool, settings.clone())?;

    let cancel_token = CancellationToken::new();
    let worker = LifecycleWorker::new(
        services.lifecycle.clone(),
        settings.scheduler.clone(),
        cancel_token.clone(),
    );

    let worker_handle = tokio::spawn(async move {
        worker.run().await;
    });

    info!("Gatherly worker is ready");

    // Shut down cleanly on ctrl-c
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for shutdown signal");
    }

    info!("Shutdown signal received, stopping worker...");
    cancel_token.cancel();

    if let Err(e) = worker_handle.await {
        error!(error = %e, "Lifecycle worker task panicked");
    }

    info!("Gatherly worker has been shut down.");

    Ok(())
}
