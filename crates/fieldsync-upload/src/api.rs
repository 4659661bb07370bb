//! Presigned-URL API client.
//!
//! [`UploadApi`] is the seam between the uploaders and the remote backend:
//! pure request/response, no retries, no state. The HTTP implementation,
//! [`PresignedUrlClient`], routes every call through the authenticated
//! client so the bearer token and 401-replay behavior apply uniformly.

use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use fieldsync_core::config::ApiConfig;
use fieldsync_core::error::AppError;
use fieldsync_core::result::AppResult;
use fieldsync_core::types::upload::PartReceipt;

use fieldsync_auth::AuthedClient;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct BatchPresignRequest<'a> {
    file_names: &'a [String],
    expiry_hours: i64,
    folder: &'a str,
}

/// Response of the batch presign endpoint.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchPresignResponse {
    /// Presigned PUT URL per file name.
    #[serde(default)]
    pub presigned_urls: HashMap<String, String>,
    /// Whether the backend presigned every requested name.
    pub success: bool,
    /// Optional human-readable failure detail.
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct InitiateMultipartRequest<'a> {
    file_name: &'a str,
    folder: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InitiateMultipartResponse {
    upload_id: String,
}

#[derive(Debug, Deserialize)]
struct PartUrlResponse {
    url: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CompleteMultipartRequest<'a> {
    upload_id: &'a str,
    file_name: &'a str,
    folder: &'a str,
    parts: &'a [PartReceipt],
}

/// Response of the complete-multipart endpoint.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompleteMultipartResponse {
    /// Whether storage assembled the object.
    pub success: bool,
    /// Final object URL, present on success.
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AbortMultipartRequest<'a> {
    upload_id: &'a str,
    file_name: &'a str,
    folder: &'a str,
}

/// Backend operations for presigned uploads.
///
/// Callers own all error handling and state; implementations translate
/// each operation into exactly one HTTP exchange.
#[async_trait]
pub trait UploadApi: Send + Sync + std::fmt::Debug + 'static {
    /// Presign PUT URLs for a batch of file names in one call.
    async fn batch_presign(
        &self,
        file_names: &[String],
        expiry_hours: i64,
        folder: &str,
    ) -> AppResult<BatchPresignResponse>;

    /// Start a multipart upload; returns the opaque upload id.
    async fn initiate_multipart(&self, file_name: &str, folder: &str) -> AppResult<String>;

    /// Presign the PUT URL for one part of a multipart upload.
    async fn part_url(
        &self,
        upload_id: &str,
        file_name: &str,
        folder: &str,
        part_number: i32,
    ) -> AppResult<String>;

    /// Ask storage to assemble the uploaded parts into the final object.
    async fn complete_multipart(
        &self,
        upload_id: &str,
        file_name: &str,
        folder: &str,
        parts: &[PartReceipt],
    ) -> AppResult<CompleteMultipartResponse>;

    /// Discard a multipart upload and its parts on the remote side.
    async fn abort_multipart(&self, upload_id: &str, file_name: &str, folder: &str)
        -> AppResult<()>;
}

/// HTTP implementation of [`UploadApi`] over the authenticated client.
#[derive(Debug, Clone)]
pub struct PresignedUrlClient {
    client: AuthedClient,
    api: ApiConfig,
}

impl PresignedUrlClient {
    /// Create a new client for the configured API base URL.
    pub fn new(client: AuthedClient, api: ApiConfig) -> Self {
        Self { client, api }
    }
}

#[async_trait]
impl UploadApi for PresignedUrlClient {
    async fn batch_presign(
        &self,
        file_names: &[String],
        expiry_hours: i64,
        folder: &str,
    ) -> AppResult<BatchPresignResponse> {
        self.client
            .post_json(
                &self.api.url("/presigned-url/upload"),
                &BatchPresignRequest {
                    file_names,
                    expiry_hours,
                    folder,
                },
            )
            .await
    }

    async fn initiate_multipart(&self, file_name: &str, folder: &str) -> AppResult<String> {
        let response: InitiateMultipartResponse = self
            .client
            .post_json(
                &self.api.url("/presigned-url/multipart/initiate"),
                &InitiateMultipartRequest { file_name, folder },
            )
            .await?;
        Ok(response.upload_id)
    }

    async fn part_url(
        &self,
        upload_id: &str,
        file_name: &str,
        folder: &str,
        part_number: i32,
    ) -> AppResult<String> {
        let request = self
            .client
            .get(&self.api.url("/presigned-url/multipart/part-url"))
            .query(&[
                ("uploadId", upload_id),
                ("fileName", file_name),
                ("folder", folder),
                ("partNumber", &part_number.to_string()),
            ]);
        let response: PartUrlResponse = self.client.send_json(request).await?;
        Ok(response.url)
    }

    async fn complete_multipart(
        &self,
        upload_id: &str,
        file_name: &str,
        folder: &str,
        parts: &[PartReceipt],
    ) -> AppResult<CompleteMultipartResponse> {
        self.client
            .post_json(
                &self.api.url("/presigned-url/multipart/complete"),
                &CompleteMultipartRequest {
                    upload_id,
                    file_name,
                    folder,
                    parts,
                },
            )
            .await
    }

    async fn abort_multipart(
        &self,
        upload_id: &str,
        file_name: &str,
        folder: &str,
    ) -> AppResult<()> {
        let request = self
            .client
            .post(&self.api.url("/presigned-url/multipart/abort"))
            .json(&AbortMultipartRequest {
                upload_id,
                file_name,
                folder,
            });
        let response = self.client.send(request).await?;
        if !response.status().is_success() {
            return Err(AppError::remote_api(format!(
                "Abort multipart failed ({})",
                response.status()
            )));
        }
        Ok(())
    }
}
