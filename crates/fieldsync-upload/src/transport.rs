//! Direct-to-storage transfers over presigned URLs.
//!
//! Presigned URLs carry their own authorization in the query string, so
//! these PUTs deliberately bypass the authenticated client.

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::header;

use fieldsync_core::error::AppError;
use fieldsync_core::result::AppResult;

/// Byte transfer to object storage.
#[async_trait]
pub trait ObjectTransport: Send + Sync + std::fmt::Debug + 'static {
    /// PUT one part of a multipart upload; returns the entity tag storage
    /// confirmed for it, with surrounding quotes stripped.
    async fn put_part(&self, url: &str, body: Bytes, content_type: &str) -> AppResult<String>;

    /// PUT a whole object.
    async fn put_object(&self, url: &str, body: Bytes, content_type: &str) -> AppResult<()>;
}

/// [`ObjectTransport`] over a plain `reqwest` client.
#[derive(Debug, Clone)]
pub struct HttpObjectTransport {
    http: reqwest::Client,
}

impl HttpObjectTransport {
    /// Create a new transport.
    pub fn new(http: reqwest::Client) -> Self {
        Self { http }
    }
}

#[async_trait]
impl ObjectTransport for HttpObjectTransport {
    async fn put_part(&self, url: &str, body: Bytes, content_type: &str) -> AppResult<String> {
        let response = self
            .http
            .put(url)
            .header(header::CONTENT_TYPE, content_type)
            .body(body)
            .send()
            .await
            .map_err(|e| AppError::with_source(
                fieldsync_core::error::ErrorKind::Storage,
                "Part upload failed",
                e,
            ))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::storage(format!(
                "Storage rejected part upload ({status})"
            )));
        }

        // Storage quotes the tag (`"abc123"`); receipts carry it bare.
        let etag = response
            .headers()
            .get(header::ETAG)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.trim().trim_matches('"').trim().to_string())
            .filter(|v| !v.is_empty())
            .ok_or_else(|| AppError::storage("Storage returned no entity tag for part"))?;

        Ok(etag)
    }

    async fn put_object(&self, url: &str, body: Bytes, content_type: &str) -> AppResult<()> {
        let response = self
            .http
            .put(url)
            .header(header::CONTENT_TYPE, content_type)
            .body(body)
            .send()
            .await
            .map_err(|e| AppError::with_source(
                fieldsync_core::error::ErrorKind::Storage,
                "Object upload failed",
                e,
            ))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::storage(format!(
                "Storage rejected object upload ({status})"
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fieldsync_core::error::ErrorKind;
    use httptest::{matchers::*, responders::*, Expectation, Server};

    #[tokio::test]
    async fn test_put_part_strips_etag_quotes() {
        let server = Server::run();
        server.expect(
            Expectation::matching(all_of![
                request::method_path("PUT", "/part-1"),
                request::headers(contains(("content-type", "video/mp4"))),
            ])
            .respond_with(status_code(200).append_header("etag", "\"abc123\"")),
        );

        let transport = HttpObjectTransport::new(reqwest::Client::new());
        let etag = transport
            .put_part(&server.url_str("/part-1"), Bytes::from_static(b"data"), "video/mp4")
            .await
            .unwrap();
        assert_eq!(etag, "abc123");
    }

    #[tokio::test]
    async fn test_put_part_trims_padded_etag() {
        let server = Server::run();
        server.expect(
            Expectation::matching(request::method_path("PUT", "/part-1"))
                .respond_with(status_code(200).append_header("etag", "  \"abc123\"  ")),
        );

        let transport = HttpObjectTransport::new(reqwest::Client::new());
        let etag = transport
            .put_part(&server.url_str("/part-1"), Bytes::from_static(b"data"), "video/mp4")
            .await
            .unwrap();
        assert_eq!(etag, "abc123");
    }

    #[tokio::test]
    async fn test_put_part_blank_quoted_etag_is_storage_error() {
        let server = Server::run();
        server.expect(
            Expectation::matching(request::method_path("PUT", "/part-1"))
                .respond_with(status_code(200).append_header("etag", "\"  \"")),
        );

        let transport = HttpObjectTransport::new(reqwest::Client::new());
        let err = transport
            .put_part(&server.url_str("/part-1"), Bytes::from_static(b"data"), "video/mp4")
            .await
            .expect_err("blank etag must fail");
        assert_eq!(err.kind, ErrorKind::Storage);
    }

    #[tokio::test]
    async fn test_put_part_missing_etag_is_storage_error() {
        let server = Server::run();
        server.expect(
            Expectation::matching(request::method_path("PUT", "/part-1"))
                .respond_with(status_code(200)),
        );

        let transport = HttpObjectTransport::new(reqwest::Client::new());
        let err = transport
            .put_part(&server.url_str("/part-1"), Bytes::from_static(b"data"), "video/mp4")
            .await
            .expect_err("missing etag must fail");
        assert_eq!(err.kind, ErrorKind::Storage);
    }

    #[tokio::test]
    async fn test_put_part_rejected_is_storage_error() {
        let server = Server::run();
        server.expect(
            Expectation::matching(request::method_path("PUT", "/part-1"))
                .respond_with(status_code(403)),
        );

        let transport = HttpObjectTransport::new(reqwest::Client::new());
        let err = transport
            .put_part(&server.url_str("/part-1"), Bytes::from_static(b"data"), "video/mp4")
            .await
            .expect_err("403 must fail");
        assert_eq!(err.kind, ErrorKind::Storage);
    }

    #[tokio::test]
    async fn test_put_object_needs_no_etag() {
        let server = Server::run();
        server.expect(
            Expectation::matching(request::method_path("PUT", "/whole"))
                .respond_with(status_code(200)),
        );

        let transport = HttpObjectTransport::new(reqwest::Client::new());
        transport
            .put_object(&server.url_str("/whole"), Bytes::from_static(b"img"), "image/jpeg")
            .await
            .unwrap();
    }
}
