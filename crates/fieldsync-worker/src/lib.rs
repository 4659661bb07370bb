//! # fieldsync-worker
//!
//! Durable background processing: [`JobQueue`] persists jobs in sqlite,
//! [`JobExecutor`] dispatches them to registered [`JobHandler`]s, and
//! [`WorkerRunner`] polls with bounded concurrency, retrying transient
//! failures with exponential backoff. Jobs survive restarts; the atomic
//! claim keeps each job on at most one worker task.

pub mod executor;
pub mod jobs;
pub mod queue;
pub mod runner;

pub use executor::{JobExecutionError, JobExecutor, JobHandler};
pub use jobs::MediaUploadJobHandler;
pub use queue::{JobQueue, QueueStats};
pub use runner::WorkerRunner;
