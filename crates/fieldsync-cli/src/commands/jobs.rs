//! Job inspection and management commands.

use clap::{Args, Subcommand};
use serde::Serialize;
use tabled::Tabled;
use uuid::Uuid;

use crate::output::{self, OutputFormat};
use fieldsync_core::error::AppError;
use fieldsync_core::types::job::JobStatus;
use fieldsync_store::JobStore;

/// Arguments for job commands
#[derive(Debug, Args)]
pub struct JobsArgs {
    /// Jobs subcommand
    #[command(subcommand)]
    pub command: JobsCommand,
}

/// Job subcommands
#[derive(Debug, Subcommand)]
pub enum JobsCommand {
    /// List recent jobs
    List {
        /// Maximum number of jobs to show
        #[arg(short, long, default_value_t = 20)]
        limit: i64,
    },
    /// Show queue status counts
    Status,
    /// Cancel a pending job
    Cancel {
        /// Job id
        id: Uuid,
    },
}

/// Job display row for table output
#[derive(Debug, Serialize, Tabled)]
struct JobRow {
    /// Job ID
    id: String,
    /// Job type
    job_type: String,
    /// Status
    status: String,
    /// Attempts used
    attempts: String,
    /// Created at
    created_at: String,
    /// Last error
    error: String,
}

/// Execute job commands
pub async fn execute(args: &JobsArgs, env: &str, format: OutputFormat) -> Result<(), AppError> {
    let config = super::load_config(env)?;
    let pool = super::create_db_pool(&config).await?;
    let store = JobStore::new(pool);

    match &args.command {
        JobsCommand::List { limit } => {
            let jobs = store.list_recent(*limit).await?;
            let rows: Vec<JobRow> = jobs
                .iter()
                .map(|j| JobRow {
                    id: j.id.to_string(),
                    job_type: j.job_type.clone(),
                    status: format!("{:?}", j.status),
                    attempts: format!("{}/{}", j.attempts, j.max_attempts),
                    created_at: j.created_at.format("%Y-%m-%d %H:%M").to_string(),
                    error: j.error_message.clone().unwrap_or_default(),
                })
                .collect();
            output::print_list(&rows, format);
        }
        JobsCommand::Status => {
            println!("Job Queue Status:");
            for status in [
                JobStatus::Pending,
                JobStatus::Running,
                JobStatus::Completed,
                JobStatus::Failed,
                JobStatus::Cancelled,
            ] {
                let count = store.count_by_status(status).await?;
                output::print_kv(&format!("{:?}", status), &count.to_string());
            }
        }
        JobsCommand::Cancel { id } => {
            let job = store
                .find_by_id(*id)
                .await?
                .ok_or_else(|| AppError::not_found(format!("Job '{}' not found", id)))?;
            if job.status != JobStatus::Pending {
                return Err(AppError::validation(format!(
                    "Only pending jobs can be cancelled (job is {:?})",
                    job.status
                )));
            }
            store.mark_cancelled(*id).await?;
            output::print_success(&format!("Job '{}' cancelled", id));
        }
    }

    Ok(())
}
