//! Job queue over the durable job table.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;
use uuid::Uuid;

use fieldsync_core::result::AppResult;
use fieldsync_core::types::job::{CreateJob, Job, JobStatus};
use fieldsync_store::JobStore;

/// Longest delay between retry attempts.
const MAX_BACKOFF: Duration = Duration::from_secs(15 * 60);

/// Exponential backoff delay for the next attempt after `attempts` tries:
/// `base * 2^(attempts-1)`, capped at [`MAX_BACKOFF`].
pub(crate) fn backoff_delay(base_seconds: u64, attempts: i32) -> Duration {
    let exponent = attempts.saturating_sub(1).clamp(0, 20) as u32;
    let delay = base_seconds.saturating_mul(1u64 << exponent);
    Duration::from_secs(delay).min(MAX_BACKOFF)
}

/// Queue for enqueuing and claiming durable background jobs.
#[derive(Debug, Clone)]
pub struct JobQueue {
    store: Arc<JobStore>,
    worker_id: String,
}

impl JobQueue {
    /// Create a new queue claiming jobs under `worker_id`.
    pub fn new(store: Arc<JobStore>, worker_id: String) -> Self {
        Self { store, worker_id }
    }

    /// Enqueue a new job.
    pub async fn enqueue(&self, data: CreateJob) -> AppResult<Job> {
        let job = self.store.create(&data).await?;
        debug!(job_id = %job.id, job_type = %job.job_type, "Enqueued job");
        Ok(job)
    }

    /// Claim the next runnable job, if any. The claim is atomic: a job id
    /// is never active on more than one worker task.
    pub async fn dequeue(&self) -> AppResult<Option<Job>> {
        let job = self.store.claim_next(&self.worker_id).await?;
        if let Some(job) = &job {
            debug!(job_id = %job.id, job_type = %job.job_type, "Dequeued job");
        }
        Ok(job)
    }

    /// Mark a job as completed successfully.
    pub async fn complete(&self, job_id: Uuid, result: Option<Value>) -> AppResult<()> {
        self.store.mark_completed(job_id, result.as_ref()).await?;
        debug!(job_id = %job_id, "Job completed");
        Ok(())
    }

    /// Mark a job as failed (terminal).
    pub async fn fail(&self, job_id: Uuid, error: &str) -> AppResult<()> {
        self.store.mark_failed(job_id, error).await?;
        debug!(job_id = %job_id, error = %error, "Job failed");
        Ok(())
    }

    /// Mark a job as cancelled.
    pub async fn cancel(&self, job_id: Uuid) -> AppResult<()> {
        self.store.mark_cancelled(job_id).await?;
        debug!(job_id = %job_id, "Job cancelled");
        Ok(())
    }

    /// Reschedule a job for another attempt with exponential backoff.
    pub async fn retry(&self, job: &Job, base_seconds: u64, error: &str) -> AppResult<()> {
        let delay = backoff_delay(base_seconds, job.attempts);
        let run_after = Utc::now()
            + chrono::Duration::from_std(delay).unwrap_or(chrono::Duration::seconds(900));
        self.store.reschedule(job.id, run_after, error).await?;
        debug!(job_id = %job.id, delay_seconds = delay.as_secs(), "Job scheduled for retry");
        Ok(())
    }

    /// Current queue statistics.
    pub async fn stats(&self) -> AppResult<QueueStats> {
        Ok(QueueStats {
            pending: self.store.count_by_status(JobStatus::Pending).await?,
            running: self.store.count_by_status(JobStatus::Running).await?,
            failed: self.store.count_by_status(JobStatus::Failed).await?,
            worker_id: self.worker_id.clone(),
        })
    }
}

/// Queue statistics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueStats {
    /// Number of pending jobs.
    pub pending: i64,
    /// Number of running jobs.
    pub running: i64,
    /// Number of failed jobs.
    pub failed: i64,
    /// Identifier of the reporting worker.
    pub worker_id: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use fieldsync_store::{migration, DatabasePool};

    async fn queue() -> JobQueue {
        let pool = DatabasePool::connect_in_memory().await.unwrap().into_pool();
        migration::run_migrations(&pool).await.unwrap();
        JobQueue::new(Arc::new(JobStore::new(pool)), "worker-1".to_string())
    }

    fn upload_job() -> CreateJob {
        CreateJob {
            job_type: "media_upload".to_string(),
            payload: serde_json::json!({"folder": "scouting", "files": ["/tmp/a.mp4"]}),
            max_attempts: 3,
        }
    }

    #[test]
    fn test_backoff_doubles_per_attempt() {
        assert_eq!(backoff_delay(30, 1), Duration::from_secs(30));
        assert_eq!(backoff_delay(30, 2), Duration::from_secs(60));
        assert_eq!(backoff_delay(30, 3), Duration::from_secs(120));
    }

    #[test]
    fn test_backoff_is_capped() {
        assert_eq!(backoff_delay(30, 10), MAX_BACKOFF);
        assert_eq!(backoff_delay(30, 1000), MAX_BACKOFF);
    }

    #[tokio::test]
    async fn test_enqueue_dequeue_roundtrip() {
        let queue = queue().await;
        let job = queue.enqueue(upload_job()).await.unwrap();

        let claimed = queue.dequeue().await.unwrap().unwrap();
        assert_eq!(claimed.id, job.id);
        assert!(queue.dequeue().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_retried_job_is_not_immediately_runnable() {
        let queue = queue().await;
        queue.enqueue(upload_job()).await.unwrap();
        let claimed = queue.dequeue().await.unwrap().unwrap();

        queue.retry(&claimed, 30, "network down").await.unwrap();
        assert!(queue.dequeue().await.unwrap().is_none());

        let stats = queue.stats().await.unwrap();
        assert_eq!(stats.pending, 1);
    }
}
