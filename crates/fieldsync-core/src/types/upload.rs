//! Chunked-upload session state.
//!
//! An [`UploadSession`] records everything needed to resume an interrupted
//! multipart upload: the remote `upload_id` and the receipts storage has
//! already confirmed. It is owned exclusively by the chunked uploader; the
//! `PartStore` trait only persists it.

use serde::{Deserialize, Serialize};

/// Confirmation for one successfully uploaded part.
///
/// Produced from the entity-tag header of the storage PUT response and
/// required verbatim at completion time. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartReceipt {
    /// 1-based part number.
    pub part_number: i32,
    /// Entity tag returned by storage, with surrounding quotes stripped.
    pub etag: String,
}

/// Durable record of one in-progress chunked upload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadSession {
    /// Unique key: `"<folder>/<file_name>"`.
    pub session_key: String,
    /// Opaque token issued by the remote initiate-multipart call.
    pub upload_id: String,
    /// Receipts for parts already confirmed by storage. Interpreted as a
    /// set keyed by part number; storage may have returned them out of
    /// numeric order.
    pub parts: Vec<PartReceipt>,
}

impl UploadSession {
    /// Create a fresh session with no confirmed parts.
    pub fn new(session_key: impl Into<String>, upload_id: impl Into<String>) -> Self {
        Self {
            session_key: session_key.into(),
            upload_id: upload_id.into(),
            parts: Vec::new(),
        }
    }

    /// Compute the session key for a destination folder and file name.
    pub fn key(folder: &str, file_name: &str) -> String {
        format!("{folder}/{file_name}")
    }

    /// Check whether a receipt exists for the given part number.
    pub fn has_part(&self, part_number: i32) -> bool {
        self.parts.iter().any(|p| p.part_number == part_number)
    }

    /// The first part that still needs uploading: highest confirmed part
    /// number plus one, floor 1.
    pub fn next_part_number(&self) -> i32 {
        self.parts.iter().map(|p| p.part_number).max().unwrap_or(0) + 1
    }

    /// Record a receipt. At most one receipt per part number is kept; a
    /// duplicate replaces the existing entry.
    pub fn add_receipt(&mut self, receipt: PartReceipt) {
        self.parts.retain(|p| p.part_number != receipt.part_number);
        self.parts.push(receipt);
    }

    /// Receipts ordered by part number, as required by complete-multipart.
    pub fn receipts_ordered(&self) -> Vec<PartReceipt> {
        let mut ordered = self.parts.clone();
        ordered.sort_by_key(|p| p.part_number);
        ordered
    }
}
