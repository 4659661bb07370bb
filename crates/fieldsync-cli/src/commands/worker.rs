//! Worker loop command.

use std::sync::Arc;

use clap::Args;
use tokio::sync::watch;
use tracing::info;

use fieldsync_core::error::AppError;
use fieldsync_store::JobStore;
use fieldsync_worker::{JobExecutor, JobQueue, MediaUploadJobHandler, WorkerRunner};

/// Arguments for the worker command
#[derive(Debug, Args)]
pub struct WorkerArgs {
    /// Worker identifier (defaults to the host name)
    #[arg(long)]
    pub worker_id: Option<String>,
}

/// Execute the worker loop until Ctrl-C
pub async fn execute(args: &WorkerArgs, env: &str) -> Result<(), AppError> {
    let config = super::load_config(env)?;
    let pool = super::create_db_pool(&config).await?;
    fieldsync_store::migration::run_migrations(&pool).await?;

    let worker_id = args.worker_id.clone().unwrap_or_else(|| {
        gethostname()
            .map(|h| format!("fieldsync-{h}"))
            .unwrap_or_else(|| "fieldsync-worker".to_string())
    });

    let stack = super::build_uploaders(&config, pool.clone())?;
    let queue = Arc::new(JobQueue::new(
        Arc::new(JobStore::new(pool)),
        worker_id.clone(),
    ));

    let mut executor = JobExecutor::new();
    executor.register(Arc::new(MediaUploadJobHandler::new(
        stack.chunked,
        stack.simple,
    )));

    let runner = WorkerRunner::new(queue, Arc::new(executor), config.worker.clone());

    let (cancel_tx, cancel_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Ctrl-C received, stopping worker");
            let _ = cancel_tx.send(true);
        }
    });

    info!(worker_id = %worker_id, "Starting worker loop");
    runner.run(cancel_rx).await;
    Ok(())
}

fn gethostname() -> Option<String> {
    std::env::var("HOSTNAME")
        .ok()
        .filter(|h| !h.is_empty())
}
