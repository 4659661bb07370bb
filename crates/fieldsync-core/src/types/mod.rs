//! Domain types for the media-upload pipeline.

pub mod job;
pub mod token;
pub mod upload;

pub use job::{CreateJob, Job, JobStatus};
pub use token::TokenPair;
pub use upload::{PartReceipt, UploadSession};
