//! CDN Offload server
//!
//! Main entry point that wires all crates together, starts the periodic
//! offload cycle and serves the control API.

use std::sync::Arc;
use std::time::Duration;

use tracing;
use tracing_subscriber::{EnvFilter, fmt};

use offload_api::{AppState, build_router};
use offload_core::config::AppConfig;
use offload_core::error::AppError;
use offload_core::traits::settings::StaticSettings;
use offload_core::traits::tenant::NoopTenantContext;
use offload_core::types::clock::{Clock, SystemClock};
use offload_database::{DatabasePool, QueueRepository, ResourceRepository};
use offload_storage::BunnyStore;
use offload_worker::{CronScheduler, IntakeHook, OffloadControl, OffloadProcessor, UrlResolver};

#[tokio::main]
async fn main() {
    let config = match load_configuration() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    init_logging(&config);

    if let Err(e) = run(config).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}

/// Load configuration from file and environment
fn load_configuration() -> Result<AppConfig, AppError> {
    let config_path = std::env::var("OFFLOAD_CONFIG").ok();
    let env = std::env::var("OFFLOAD_ENV").unwrap_or_else(|_| "development".to_string());
    AppConfig::load(config_path.as_deref(), &env)
}

/// Initialize tracing/logging
fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format.as_str() {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .with_thread_ids(true)
                .init();
        }
        _ => {
            fmt()
                .pretty()
                .with_env_filter(filter)
                .with_target(true)
                .init();
        }
    }
}

/// Main server run function
async fn run(config: AppConfig) -> Result<(), AppError> {
    tracing::info!("Starting CDN Offload v{}", env!("CARGO_PKG_VERSION"));

    // ── Step 1: Database connection + migrations ─────────────────
    let db = DatabasePool::connect(&config.database).await?;
    offload_database::migration::run_migrations(db.pool()).await?;

    // ── Step 2: Stores, settings and remote client ──────────────
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let queue = Arc::new(QueueRepository::new(db.pool().clone(), clock.clone()));
    let resources = Arc::new(ResourceRepository::new(db.pool().clone(), clock));
    let settings = Arc::new(StaticSettings::new(config.offload.clone()));
    let remote = Arc::new(BunnyStore::new()?);

    let missing = config.offload.missing_fields();
    if !missing.is_empty() {
        tracing::warn!(
            "Offload settings incomplete (missing {}), uploads will stay local",
            missing.join(", ")
        );
    }

    // ── Step 3: Processor, intake and control surface ───────────
    let processor = Arc::new(OffloadProcessor::new(
        queue.clone(),
        resources.clone(),
        remote,
        settings.clone(),
        Arc::new(NoopTenantContext),
        config.worker.clone(),
    ));
    let intake = IntakeHook::new(queue, resources.clone(), settings.clone());
    let resolver = UrlResolver::new(resources, settings);
    let control = OffloadControl::new(Arc::clone(&processor));

    // ── Step 4: Periodic offload cycle ──────────────────────────
    let mut scheduler = if config.worker.enabled {
        let scheduler = CronScheduler::new(Arc::clone(&processor)).await?;
        scheduler
            .register_offload_cycle(&config.worker.schedule)
            .await?;
        scheduler.start().await?;
        Some(scheduler)
    } else {
        tracing::info!("Offload worker disabled, cycles run only on manual trigger");
        None
    };

    // ── Step 5: HTTP server ─────────────────────────────────────
    if config.server.admin_token.trim().is_empty() {
        tracing::warn!("No admin token configured, privileged endpoints will refuse every caller");
    }
    let state = AppState::new(
        control,
        intake,
        resolver,
        Some(config.server.admin_token.clone()),
    )
    .with_database(db.clone());
    let app = build_router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::internal(format!("Failed to bind {}: {}", addr, e)))?;
    tracing::info!("CDN Offload listening on {}", addr);

    // ── Step 6: Graceful shutdown ───────────────────────────────
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            shutdown_signal().await;
            tracing::info!("Shutdown signal received, starting graceful shutdown...");
        })
        .await
        .map_err(|e| AppError::internal(format!("Server error: {}", e)))?;

    if let Some(scheduler) = scheduler.as_mut() {
        let grace = Duration::from_secs(config.server.shutdown_grace_seconds);
        match tokio::time::timeout(grace, scheduler.shutdown()).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => tracing::warn!("Scheduler shutdown failed: {}", e),
            Err(_) => tracing::warn!("Scheduler did not stop within {:?}", grace),
        }
    }

    db.close().await;
    tracing::info!("CDN Offload shut down gracefully");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
