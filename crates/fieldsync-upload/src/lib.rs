//! # fieldsync-upload
//!
//! The media upload pipeline: [`PresignedUrlClient`] talks to the
//! presigned-URL endpoints, [`HttpObjectTransport`] moves bytes to
//! storage, [`ChunkedUploader`] drives resumable multipart uploads for
//! large files and [`SimpleUploader`] handles photo batches.

pub mod api;
pub mod chunked;
pub mod simple;
pub mod transport;

#[cfg(test)]
pub(crate) mod test_support;

pub use api::{PresignedUrlClient, UploadApi};
pub use chunked::ChunkedUploader;
pub use simple::SimpleUploader;
pub use transport::{HttpObjectTransport, ObjectTransport};

use std::path::Path;

use fieldsync_core::error::AppError;
use fieldsync_core::result::AppResult;

/// Extract a UTF-8 file name from a path.
pub(crate) fn file_name_of(path: &Path) -> AppResult<String> {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(|n| n.to_string())
        .ok_or_else(|| AppError::validation(format!("Path has no file name: {}", path.display())))
}
