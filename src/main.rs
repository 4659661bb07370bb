//! FieldSync Agent — background media upload daemon.
//!
//! Wires the crates together: configuration, logging, sqlite, the auth
//! gateway, the upload pipeline, and the worker loop. Runs until Ctrl+C
//! or SIGTERM, then drains in-flight jobs.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing_subscriber::{fmt, EnvFilter};

use fieldsync_auth::{AuthGateway, AuthedClient};
use fieldsync_core::config::AppConfig;
use fieldsync_core::error::AppError;
use fieldsync_store::{DatabasePool, JobStore, SqlitePartStore, SqliteTokenStore};
use fieldsync_upload::{
    ChunkedUploader, HttpObjectTransport, PresignedUrlClient, SimpleUploader,
};
use fieldsync_worker::{JobExecutor, JobQueue, MediaUploadJobHandler, WorkerRunner};

#[tokio::main]
async fn main() {
    let env = std::env::var("FIELDSYNC_ENV").unwrap_or_else(|_| "default".to_string());
    let config = match AppConfig::load(&env) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    init_logging(&config);

    if let Err(e) = run(config).await {
        tracing::error!("Agent error: {}", e);
        std::process::exit(1);
    }
}

/// Initialize tracing/logging
fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format.as_str() {
        "json" => {
            fmt().json()
                .with_env_filter(filter)
                .with_target(true)
                .init();
        }
        _ => {
            fmt().pretty().with_env_filter(filter).with_target(true).init();
        }
    }
}

/// Main agent run function
async fn run(config: AppConfig) -> Result<(), AppError> {
    tracing::info!("Starting FieldSync agent v{}", env!("CARGO_PKG_VERSION"));

    if let Some(parent) = std::path::Path::new(&config.database.path).parent() {
        tokio::fs::create_dir_all(parent).await?;
    }

    tracing::info!("Opening local database...");
    let pool = DatabasePool::connect(&config.database).await?.into_pool();
    fieldsync_store::migration::run_migrations(&pool).await?;
    tracing::info!("Database migrations complete");

    let http = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.api.timeout_seconds))
        .build()?;

    let token_store = Arc::new(SqliteTokenStore::new(pool.clone()));
    let gateway = Arc::new(AuthGateway::new(
        http.clone(),
        config.api.clone(),
        token_store,
    ));
    let authed = AuthedClient::new(http.clone(), Arc::clone(&gateway));

    let api = Arc::new(PresignedUrlClient::new(authed, config.api.clone()));
    let transport = Arc::new(HttpObjectTransport::new(http));
    let part_store = Arc::new(SqlitePartStore::new(pool.clone()));

    let chunked = Arc::new(ChunkedUploader::new(
        api.clone(),
        transport.clone(),
        part_store,
        &config.upload,
    ));
    let simple = Arc::new(SimpleUploader::new(api, transport, &config.upload));

    if !config.worker.enabled {
        tracing::warn!("Worker disabled in configuration, nothing to do");
        return Ok(());
    }

    let worker_id = format!("agent-{}", &uuid::Uuid::new_v4().to_string()[..8]);
    let queue = Arc::new(JobQueue::new(
        Arc::new(JobStore::new(pool)),
        worker_id.clone(),
    ));

    let mut executor = JobExecutor::new();
    executor.register(Arc::new(MediaUploadJobHandler::new(chunked, simple)));
    let executor = Arc::new(executor);

    let runner = WorkerRunner::new(queue, executor, config.worker.clone());

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let worker_handle = tokio::spawn(async move {
        runner.run(shutdown_rx).await;
    });
    tracing::info!(worker_id = %worker_id, "Background worker started");

    shutdown_signal().await;
    tracing::info!("Shutdown signal received, draining worker...");
    let _ = shutdown_tx.send(true);
    let _ = tokio::time::timeout(Duration::from_secs(35), worker_handle).await;

    tracing::info!("FieldSync agent shut down gracefully");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if tokio::signal::ctrl_c().await.is_err() {
            tracing::error!("Failed to install Ctrl+C handler");
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
