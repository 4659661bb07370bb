//! Single-shot image uploads.

use std::path::PathBuf;
use std::sync::Arc;

use bytes::Bytes;
use tracing::{debug, info};

use fieldsync_core::config::UploadConfig;
use fieldsync_core::error::AppError;
use fieldsync_core::result::AppResult;

use crate::api::UploadApi;
use crate::file_name_of;
use crate::transport::ObjectTransport;

/// Whole-file uploader for photo batches.
///
/// One batch presign call for the whole set, then one PUT per file.
/// All-or-nothing: any failure fails the batch, and the caller retries
/// the whole thing (image PUTs are idempotent).
#[derive(Debug)]
pub struct SimpleUploader {
    api: Arc<dyn UploadApi>,
    transport: Arc<dyn ObjectTransport>,
    expiry_hours: i64,
}

impl SimpleUploader {
    /// Create a new uploader with the configured presign expiry.
    pub fn new(
        api: Arc<dyn UploadApi>,
        transport: Arc<dyn ObjectTransport>,
        config: &UploadConfig,
    ) -> Self {
        Self {
            api,
            transport,
            expiry_hours: i64::from(config.presign_expiry_hours),
        }
    }

    /// Upload a batch of images into `folder`.
    ///
    /// Returns the stored object URLs (presigned URLs with the query
    /// string stripped), in input order.
    pub async fn upload_images(&self, paths: &[PathBuf], folder: &str) -> AppResult<Vec<String>> {
        if paths.is_empty() {
            return Err(AppError::validation("No images to upload"));
        }

        let file_names = paths
            .iter()
            .map(|p| file_name_of(p))
            .collect::<AppResult<Vec<_>>>()?;

        let response = self
            .api
            .batch_presign(&file_names, self.expiry_hours, folder)
            .await?;
        if !response.success {
            return Err(AppError::remote_api(
                response
                    .message
                    .unwrap_or_else(|| "Batch presign failed".to_string()),
            ));
        }
        if response.presigned_urls.is_empty() {
            return Err(AppError::remote_api("Batch presign returned no URLs"));
        }

        let mut stored_urls = Vec::with_capacity(paths.len());
        for (path, file_name) in paths.iter().zip(&file_names) {
            let url = response.presigned_urls.get(file_name).ok_or_else(|| {
                AppError::remote_api(format!("No presigned URL returned for '{file_name}'"))
            })?;

            let body = tokio::fs::read(path).await?;
            debug!(file_name = %file_name, bytes = body.len(), "Uploading image");
            self.transport
                .put_object(url, Bytes::from(body), "image/jpeg")
                .await?;

            // The signature query string is temporary; the stored URL is
            // the durable object address.
            let stored = url
                .split_once('?')
                .map(|(base, _)| base)
                .unwrap_or(url)
                .to_string();
            stored_urls.push(stored);
        }

        info!(count = stored_urls.len(), folder = %folder, "Image batch uploaded");
        Ok(stored_urls)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{MockTransport, MockUploadApi};
    use fieldsync_core::error::ErrorKind;
    use std::io::Write;

    fn uploader(api: Arc<MockUploadApi>, transport: Arc<MockTransport>) -> SimpleUploader {
        SimpleUploader::new(api, transport, &UploadConfig::default())
    }

    fn image(dir: &tempfile::TempDir, name: &str) -> PathBuf {
        let path = dir.path().join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(b"jpeg-bytes").unwrap();
        path
    }

    #[tokio::test]
    async fn test_batch_returns_urls_with_query_stripped() {
        let dir = tempfile::tempdir().unwrap();
        let paths = vec![image(&dir, "a.jpg"), image(&dir, "b.jpg")];

        let api = Arc::new(MockUploadApi::default());
        let transport = Arc::new(MockTransport::default());

        let urls = uploader(api, transport.clone())
            .upload_images(&paths, "scouting")
            .await
            .unwrap();

        assert_eq!(
            urls,
            vec![
                "https://storage.example/scouting/a.jpg",
                "https://storage.example/scouting/b.jpg",
            ]
        );
        let puts = transport.puts();
        assert_eq!(puts.len(), 2);
        assert!(puts.iter().all(|p| p.content_type == "image/jpeg"));
        assert!(puts.iter().all(|p| p.url.contains("?sig=")));
    }

    #[tokio::test]
    async fn test_empty_batch_is_local_validation_error() {
        let api = Arc::new(MockUploadApi::default());
        let err = uploader(api.clone(), Arc::new(MockTransport::default()))
            .upload_images(&[], "scouting")
            .await
            .expect_err("empty batch must be rejected");
        assert_eq!(err.kind, ErrorKind::Validation);
        assert_eq!(api.presign_count(), 0);
    }

    #[tokio::test]
    async fn test_presign_failure_fails_fast() {
        let dir = tempfile::tempdir().unwrap();
        let paths = vec![image(&dir, "a.jpg")];

        let api = Arc::new(MockUploadApi::default());
        let transport = Arc::new(MockTransport::default());
        api.fail_presign(true);

        let err = uploader(api, transport.clone())
            .upload_images(&paths, "scouting")
            .await
            .expect_err("presign failure must surface");
        assert_eq!(err.kind, ErrorKind::RemoteApi);
        assert!(transport.puts().is_empty());
    }

    #[tokio::test]
    async fn test_missing_url_for_file_fails_batch() {
        let dir = tempfile::tempdir().unwrap();
        let paths = vec![image(&dir, "a.jpg"), image(&dir, "b.jpg")];

        let api = Arc::new(MockUploadApi::default());
        api.omit_from_presign("b.jpg");

        let err = uploader(api, Arc::new(MockTransport::default()))
            .upload_images(&paths, "scouting")
            .await
            .expect_err("missing URL must fail the batch");
        assert_eq!(err.kind, ErrorKind::RemoteApi);
    }

    #[tokio::test]
    async fn test_single_put_failure_fails_whole_batch() {
        let dir = tempfile::tempdir().unwrap();
        let paths = vec![image(&dir, "a.jpg"), image(&dir, "b.jpg")];

        let api = Arc::new(MockUploadApi::default());
        let transport = Arc::new(MockTransport::default());
        transport.fail_put_at(1);

        let err = uploader(api, transport)
            .upload_images(&paths, "scouting")
            .await
            .expect_err("second PUT failure must fail the batch");
        assert_eq!(err.kind, ErrorKind::Storage);
    }
}
