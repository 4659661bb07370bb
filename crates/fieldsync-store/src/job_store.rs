//! Durable job table operations.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use uuid::Uuid;

use fieldsync_core::error::{AppError, ErrorKind};
use fieldsync_core::result::AppResult;
use fieldsync_core::types::job::{CreateJob, Job, JobStatus};

/// Repository for background job CRUD and queue operations.
///
/// The claim operation transitions `pending -> running` atomically, which
/// is what guarantees at most one active execution per job id.
#[derive(Debug, Clone)]
pub struct JobStore {
    pool: SqlitePool,
}

impl JobStore {
    /// Create a new job store.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Find a job by ID.
    pub async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Job>> {
        sqlx::query_as::<_, Job>("SELECT * FROM jobs WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find job", e))
    }

    /// List the most recently created jobs.
    pub async fn list_recent(&self, limit: i64) -> AppResult<Vec<Job>> {
        sqlx::query_as::<_, Job>("SELECT * FROM jobs ORDER BY created_at DESC LIMIT ?1")
            .bind(limit)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list jobs", e))
    }

    /// Create a new pending job.
    pub async fn create(&self, data: &CreateJob) -> AppResult<Job> {
        let now = Utc::now();
        let job = Job {
            id: Uuid::new_v4(),
            job_type: data.job_type.clone(),
            payload: data.payload.clone(),
            result: None,
            error_message: None,
            status: JobStatus::Pending,
            attempts: 0,
            max_attempts: data.max_attempts,
            scheduled_at: None,
            started_at: None,
            completed_at: None,
            worker_id: None,
            created_at: now,
            updated_at: now,
        };

        sqlx::query(
            "INSERT INTO jobs (id, job_type, payload, status, attempts, max_attempts, created_at, updated_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        )
        .bind(job.id)
        .bind(&job.job_type)
        .bind(&job.payload)
        .bind(job.status)
        .bind(job.attempts)
        .bind(job.max_attempts)
        .bind(job.created_at)
        .bind(job.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to create job", e))?;

        Ok(job)
    }

    /// Claim the next runnable job: oldest pending job whose scheduled time
    /// has passed. The update and select happen in one statement so a job
    /// id is never claimed twice.
    pub async fn claim_next(&self, worker_id: &str) -> AppResult<Option<Job>> {
        let now = Utc::now();
        sqlx::query_as::<_, Job>(
            "UPDATE jobs SET status = 'running', started_at = ?1, worker_id = ?2, \
                attempts = attempts + 1, updated_at = ?1 \
             WHERE id = ( \
                SELECT id FROM jobs \
                WHERE status = 'pending' \
                AND (scheduled_at IS NULL OR scheduled_at <= ?1) \
                ORDER BY created_at ASC \
                LIMIT 1 \
             ) RETURNING *",
        )
        .bind(now)
        .bind(worker_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to claim job", e))
    }

    /// Mark a job as completed.
    pub async fn mark_completed(
        &self,
        job_id: Uuid,
        result: Option<&serde_json::Value>,
    ) -> AppResult<()> {
        let now = Utc::now();
        sqlx::query(
            "UPDATE jobs SET status = 'completed', result = ?2, completed_at = ?3, updated_at = ?3 \
             WHERE id = ?1",
        )
        .bind(job_id)
        .bind(result)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to complete job", e))?;
        Ok(())
    }

    /// Mark a job as failed (terminal).
    pub async fn mark_failed(&self, job_id: Uuid, error_message: &str) -> AppResult<()> {
        let now = Utc::now();
        sqlx::query(
            "UPDATE jobs SET status = 'failed', error_message = ?2, completed_at = ?3, \
                updated_at = ?3 WHERE id = ?1",
        )
        .bind(job_id)
        .bind(error_message)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to mark job failed", e))?;
        Ok(())
    }

    /// Mark a job as cancelled.
    pub async fn mark_cancelled(&self, job_id: Uuid) -> AppResult<()> {
        let now = Utc::now();
        sqlx::query(
            "UPDATE jobs SET status = 'cancelled', completed_at = ?2, updated_at = ?2 \
             WHERE id = ?1",
        )
        .bind(job_id)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to cancel job", e))?;
        Ok(())
    }

    /// Return a failed or running job to the pending state, scheduled no
    /// earlier than `run_after`. Attempt count is preserved.
    pub async fn reschedule(
        &self,
        job_id: Uuid,
        run_after: DateTime<Utc>,
        error_message: &str,
    ) -> AppResult<()> {
        let now = Utc::now();
        sqlx::query(
            "UPDATE jobs SET status = 'pending', scheduled_at = ?2, error_message = ?3, \
                worker_id = NULL, updated_at = ?4 WHERE id = ?1",
        )
        .bind(job_id)
        .bind(run_after)
        .bind(error_message)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to reschedule job", e))?;
        Ok(())
    }

    /// Count jobs in a given status.
    pub async fn count_by_status(&self, status: JobStatus) -> AppResult<i64> {
        sqlx::query_scalar("SELECT COUNT(*) FROM jobs WHERE status = ?1")
            .bind(status)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to count jobs", e))
    }
}
