//! Media upload job handler.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use tracing::info;

use fieldsync_core::types::job::Job;
use fieldsync_upload::{ChunkedUploader, SimpleUploader};

use crate::executor::{JobExecutionError, JobHandler};

/// Payload of a `media_upload` job.
#[derive(Debug, Deserialize)]
struct MediaUploadPayload {
    folder: String,
    files: Vec<PathBuf>,
}

fn is_image(path: &Path) -> bool {
    mime_guess::from_path(path)
        .first()
        .is_some_and(|mime| mime.type_() == mime_guess::mime::IMAGE)
}

/// Uploads the media files named in the job payload.
///
/// Images go to storage as one simple-upload batch; everything else
/// (video, mainly) goes through the chunked uploader one file at a time.
/// Sequential on purpose: field devices are bandwidth-constrained and the
/// chunked uploader's persisted state is per destination.
#[derive(Debug)]
pub struct MediaUploadJobHandler {
    chunked: Arc<ChunkedUploader>,
    simple: Arc<SimpleUploader>,
}

impl MediaUploadJobHandler {
    /// Create a new handler.
    pub fn new(chunked: Arc<ChunkedUploader>, simple: Arc<SimpleUploader>) -> Self {
        Self { chunked, simple }
    }
}

#[async_trait]
impl JobHandler for MediaUploadJobHandler {
    fn job_type(&self) -> &str {
        "media_upload"
    }

    async fn execute(&self, job: &Job) -> Result<Option<Value>, JobExecutionError> {
        let payload: MediaUploadPayload = serde_json::from_value(job.payload.clone())
            .map_err(|e| JobExecutionError::Permanent(format!("Invalid payload: {e}")))?;

        if payload.files.is_empty() {
            return Err(JobExecutionError::Permanent(
                "Payload names no files".to_string(),
            ));
        }

        // A file that vanished from the device will never come back;
        // anything else is worth another attempt after backoff.
        for path in &payload.files {
            if !tokio::fs::try_exists(path).await.unwrap_or(false) {
                return Err(JobExecutionError::Permanent(format!(
                    "File no longer exists: {}",
                    path.display()
                )));
            }
        }

        let (images, media): (Vec<_>, Vec<_>) = payload
            .files
            .iter()
            .cloned()
            .partition(|path| is_image(path));

        let mut urls = Vec::with_capacity(payload.files.len());

        if !images.is_empty() {
            let batch = self
                .simple
                .upload_images(&images, &payload.folder)
                .await
                .map_err(|e| JobExecutionError::Transient(e.to_string()))?;
            urls.extend(batch);
        }

        for path in &media {
            let url = self
                .chunked
                .upload(path, &payload.folder)
                .await
                .map_err(|e| JobExecutionError::Transient(e.to_string()))?;
            urls.push(url);
        }

        info!(
            job_id = %job.id,
            folder = %payload.folder,
            count = urls.len(),
            "Media upload job finished"
        );

        Ok(Some(serde_json::json!({ "urls": urls })))
    }
}
