//! Resumable chunked uploads.
//!
//! The chunked uploader drives a multipart upload end to end: initiate,
//! per-part presign + PUT, complete. Progress is persisted through the
//! [`PartStore`] after the initiate call and after every confirmed part,
//! so an interrupted run resumes at the first unconfirmed part and never
//! re-sends more than one chunk of bytes.

use std::io::SeekFrom;
use std::path::Path;
use std::sync::Arc;

use bytes::Bytes;
use tokio::io::{AsyncReadExt, AsyncSeekExt};
use tracing::{debug, info, warn};

use fieldsync_core::config::UploadConfig;
use fieldsync_core::error::AppError;
use fieldsync_core::result::AppResult;
use fieldsync_core::traits::PartStore;
use fieldsync_core::types::upload::{PartReceipt, UploadSession};

use crate::api::UploadApi;
use crate::file_name_of;
use crate::transport::ObjectTransport;

/// Resumable multipart uploader for large media files.
///
/// No internal retries: any remote or storage failure aborts the run with
/// session state intact, and the caller (normally the worker layer)
/// decides when to try again.
#[derive(Debug)]
pub struct ChunkedUploader {
    api: Arc<dyn UploadApi>,
    transport: Arc<dyn ObjectTransport>,
    parts: Arc<dyn PartStore>,
    chunk_size: u64,
}

impl ChunkedUploader {
    /// Create a new uploader with the configured chunk size.
    pub fn new(
        api: Arc<dyn UploadApi>,
        transport: Arc<dyn ObjectTransport>,
        parts: Arc<dyn PartStore>,
        config: &UploadConfig,
    ) -> Self {
        Self {
            api,
            transport,
            parts,
            chunk_size: config.effective_chunk_size(),
        }
    }

    /// Upload `file_path` into `folder`, resuming any persisted progress
    /// for the same destination. Returns the final object URL.
    pub async fn upload(&self, file_path: &Path, folder: &str) -> AppResult<String> {
        let file_name = file_name_of(file_path)?;
        let file_size = tokio::fs::metadata(file_path)
            .await
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound => {
                    AppError::not_found(format!("File not found: {}", file_path.display()))
                }
                _ => AppError::from(e),
            })?
            .len();
        if file_size == 0 {
            return Err(AppError::validation(format!(
                "Refusing to upload empty file: {}",
                file_path.display()
            )));
        }

        let session_key = UploadSession::key(folder, &file_name);
        let mut session = match self.parts.load(&session_key).await? {
            Some(session) => {
                info!(
                    session_key = %session_key,
                    confirmed_parts = session.parts.len(),
                    "Resuming chunked upload"
                );
                session
            }
            None => {
                let upload_id = self.api.initiate_multipart(&file_name, folder).await?;
                let session = UploadSession::new(&session_key, upload_id);
                // Persist before the first part so a crash here still
                // resumes against the same upload id.
                self.parts.save(&session).await?;
                session
            }
        };

        let total_parts = file_size.div_ceil(self.chunk_size) as i32;
        let start_part = session.next_part_number();
        let content_type = mime_guess::from_path(file_path)
            .first_or_octet_stream()
            .essence_str()
            .to_string();

        debug!(
            session_key = %session_key,
            file_size,
            total_parts,
            start_part,
            "Uploading parts"
        );

        let mut file = tokio::fs::File::open(file_path).await?;

        for part_number in start_part..=total_parts {
            if session.has_part(part_number) {
                continue;
            }

            let url = self
                .api
                .part_url(&session.upload_id, &file_name, folder, part_number)
                .await?;

            let offset = (part_number as u64 - 1) * self.chunk_size;
            let len = self.chunk_size.min(file_size - offset) as usize;
            let mut buf = vec![0u8; len];
            file.seek(SeekFrom::Start(offset)).await?;
            file.read_exact(&mut buf).await?;

            let etag = self
                .transport
                .put_part(&url, Bytes::from(buf), &content_type)
                .await?;

            session.add_receipt(PartReceipt { part_number, etag });
            self.parts.save(&session).await?;
            debug!(session_key = %session_key, part_number, total_parts, "Part confirmed");
        }

        let response = self
            .api
            .complete_multipart(
                &session.upload_id,
                &file_name,
                folder,
                &session.receipts_ordered(),
            )
            .await?;

        let final_url = match (response.success, response.url) {
            (true, Some(url)) => url,
            _ => {
                // Session stays persisted: a retry re-sends only the
                // complete call, zero bytes.
                return Err(AppError::remote_api(format!(
                    "Complete multipart failed for '{session_key}'"
                )));
            }
        };

        self.parts.delete(&session_key).await?;
        info!(session_key = %session_key, url = %final_url, "Chunked upload complete");
        Ok(final_url)
    }

    /// Abandon any in-progress upload for this destination.
    ///
    /// The remote abort is best effort; local session state is cleared
    /// regardless so the next upload starts fresh.
    pub async fn abort(&self, file_name: &str, folder: &str) -> AppResult<()> {
        let session_key = UploadSession::key(folder, file_name);
        if let Some(session) = self.parts.load(&session_key).await? {
            if let Err(e) = self
                .api
                .abort_multipart(&session.upload_id, file_name, folder)
                .await
            {
                warn!(session_key = %session_key, error = %e, "Remote abort failed");
            }
        }
        self.parts.delete(&session_key).await?;
        info!(session_key = %session_key, "Upload aborted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{MemoryPartStore, MockTransport, MockUploadApi};
    use fieldsync_core::error::ErrorKind;
    use std::io::Write;

    const CHUNK: u64 = 1024;

    fn uploader(
        api: Arc<MockUploadApi>,
        transport: Arc<MockTransport>,
        parts: Arc<MemoryPartStore>,
    ) -> ChunkedUploader {
        let config = UploadConfig {
            chunk_size_bytes: CHUNK,
            presign_expiry_hours: 1,
        };
        ChunkedUploader::new(api, transport, parts, &config)
    }

    fn media_file(dir: &tempfile::TempDir, name: &str, size: usize) -> std::path::PathBuf {
        let path = dir.path().join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(&vec![7u8; size]).unwrap();
        path
    }

    #[tokio::test]
    async fn test_two_full_chunks_upload_two_parts() {
        let dir = tempfile::tempdir().unwrap();
        let path = media_file(&dir, "evidence.mp4", 2 * CHUNK as usize);

        let api = Arc::new(MockUploadApi::default());
        let transport = Arc::new(MockTransport::default());
        let parts = Arc::new(MemoryPartStore::default());

        let url = uploader(api.clone(), transport.clone(), parts.clone())
            .upload(&path, "scouting")
            .await
            .unwrap();
        assert_eq!(url, "https://storage.example/final/evidence.mp4");

        let puts = transport.puts();
        assert_eq!(puts.len(), 2);
        assert_eq!(puts[0].len, CHUNK as usize);
        assert_eq!(puts[1].len, CHUNK as usize);

        let completed = api.completed_parts();
        assert_eq!(completed, vec![1, 2]);
        assert!(parts.load("scouting/evidence.mp4").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_chunk_plus_one_byte_uploads_tiny_second_part() {
        let dir = tempfile::tempdir().unwrap();
        let path = media_file(&dir, "evidence.mp4", CHUNK as usize + 1);

        let api = Arc::new(MockUploadApi::default());
        let transport = Arc::new(MockTransport::default());
        let parts = Arc::new(MemoryPartStore::default());

        uploader(api.clone(), transport.clone(), parts)
            .upload(&path, "scouting")
            .await
            .unwrap();

        let puts = transport.puts();
        assert_eq!(puts.len(), 2);
        assert_eq!(puts[0].len, CHUNK as usize);
        assert_eq!(puts[1].len, 1);
    }

    #[tokio::test]
    async fn test_resume_uploads_only_remaining_parts() {
        let dir = tempfile::tempdir().unwrap();
        let path = media_file(&dir, "evidence.mp4", 3 * CHUNK as usize);

        let api = Arc::new(MockUploadApi::default());
        let transport = Arc::new(MockTransport::default());
        let parts = Arc::new(MemoryPartStore::default());

        // Parts 1 and 2 were confirmed in an earlier, interrupted run.
        let mut session = UploadSession::new("scouting/evidence.mp4", "upl-1");
        session.add_receipt(PartReceipt {
            part_number: 2,
            etag: "old-2".to_string(),
        });
        session.add_receipt(PartReceipt {
            part_number: 1,
            etag: "old-1".to_string(),
        });
        parts.save(&session).await.unwrap();

        uploader(api.clone(), transport.clone(), parts.clone())
            .upload(&path, "scouting")
            .await
            .unwrap();

        // No new initiate, one PUT (part 3), original receipts reused.
        assert_eq!(api.initiate_count(), 0);
        assert_eq!(transport.puts().len(), 1);
        assert_eq!(api.completed_parts(), vec![1, 2, 3]);
        assert_eq!(api.completed_upload_id().as_deref(), Some("upl-1"));
    }

    #[tokio::test]
    async fn test_completion_failure_preserves_state_and_retry_sends_no_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let path = media_file(&dir, "evidence.mp4", 2 * CHUNK as usize);

        let api = Arc::new(MockUploadApi::default());
        let transport = Arc::new(MockTransport::default());
        let parts = Arc::new(MemoryPartStore::default());
        api.fail_complete(true);

        let uploader = uploader(api.clone(), transport.clone(), parts.clone());
        let err = uploader
            .upload(&path, "scouting")
            .await
            .expect_err("completion failure must surface");
        assert_eq!(err.kind, ErrorKind::RemoteApi);

        let persisted = parts
            .load("scouting/evidence.mp4")
            .await
            .unwrap()
            .expect("session must survive completion failure");
        assert_eq!(persisted.parts.len(), 2);

        // Retry: only the complete call is re-sent.
        api.fail_complete(false);
        uploader.upload(&path, "scouting").await.unwrap();
        assert_eq!(transport.puts().len(), 2);
        assert!(parts.load("scouting/evidence.mp4").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_upload_id_persisted_before_first_part() {
        let dir = tempfile::tempdir().unwrap();
        let path = media_file(&dir, "evidence.mp4", CHUNK as usize);

        let api = Arc::new(MockUploadApi::default());
        let transport = Arc::new(MockTransport::default());
        let parts = Arc::new(MemoryPartStore::default());
        transport.fail_puts(true);

        uploader(api.clone(), transport, parts.clone())
            .upload(&path, "scouting")
            .await
            .expect_err("put failure must surface");

        let persisted = parts
            .load("scouting/evidence.mp4")
            .await
            .unwrap()
            .expect("session must exist after initiate");
        assert!(!persisted.upload_id.is_empty());
        assert!(persisted.parts.is_empty());
    }

    #[tokio::test]
    async fn test_empty_file_is_local_validation_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = media_file(&dir, "empty.mp4", 0);

        let api = Arc::new(MockUploadApi::default());
        let parts = Arc::new(MemoryPartStore::default());

        let err = uploader(api.clone(), Arc::new(MockTransport::default()), parts)
            .upload(&path, "scouting")
            .await
            .expect_err("empty file must be rejected");
        assert_eq!(err.kind, ErrorKind::Validation);
        assert_eq!(api.initiate_count(), 0);
    }

    #[tokio::test]
    async fn test_missing_file_is_not_found() {
        let api = Arc::new(MockUploadApi::default());
        let err = uploader(
            api.clone(),
            Arc::new(MockTransport::default()),
            Arc::new(MemoryPartStore::default()),
        )
        .upload(Path::new("/nonexistent/evidence.mp4"), "scouting")
        .await
        .expect_err("missing file must be rejected");
        assert_eq!(err.kind, ErrorKind::NotFound);
        assert_eq!(api.initiate_count(), 0);
    }

    #[tokio::test]
    async fn test_abort_clears_local_state_even_when_remote_abort_fails() {
        let api = Arc::new(MockUploadApi::default());
        let parts = Arc::new(MemoryPartStore::default());
        api.fail_abort(true);

        let session = UploadSession::new("scouting/evidence.mp4", "upl-1");
        parts.save(&session).await.unwrap();

        uploader(api.clone(), Arc::new(MockTransport::default()), parts.clone())
            .abort("evidence.mp4", "scouting")
            .await
            .unwrap();

        assert_eq!(api.abort_count(), 1);
        assert!(parts.load("scouting/evidence.mp4").await.unwrap().is_none());
    }
}
