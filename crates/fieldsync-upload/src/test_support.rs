//! In-memory fakes for uploader tests.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::RwLock;

use fieldsync_core::error::AppError;
use fieldsync_core::result::AppResult;
use fieldsync_core::traits::PartStore;
use fieldsync_core::types::upload::{PartReceipt, UploadSession};

use crate::api::{BatchPresignResponse, CompleteMultipartResponse, UploadApi};
use crate::transport::ObjectTransport;

/// Scripted [`UploadApi`] that records calls and can be told to fail.
#[derive(Debug, Default)]
pub struct MockUploadApi {
    initiate_count: AtomicUsize,
    presign_count: AtomicUsize,
    abort_count: AtomicUsize,
    fail_complete: AtomicBool,
    fail_abort: AtomicBool,
    fail_presign: AtomicBool,
    omit_from_presign: Mutex<HashSet<String>>,
    completes: Mutex<Vec<(String, Vec<PartReceipt>)>>,
}

impl MockUploadApi {
    pub fn initiate_count(&self) -> usize {
        self.initiate_count.load(Ordering::SeqCst)
    }

    pub fn presign_count(&self) -> usize {
        self.presign_count.load(Ordering::SeqCst)
    }

    pub fn abort_count(&self) -> usize {
        self.abort_count.load(Ordering::SeqCst)
    }

    pub fn fail_complete(&self, fail: bool) {
        self.fail_complete.store(fail, Ordering::SeqCst);
    }

    pub fn fail_abort(&self, fail: bool) {
        self.fail_abort.store(fail, Ordering::SeqCst);
    }

    pub fn fail_presign(&self, fail: bool) {
        self.fail_presign.store(fail, Ordering::SeqCst);
    }

    pub fn omit_from_presign(&self, name: &str) {
        self.omit_from_presign
            .lock()
            .unwrap()
            .insert(name.to_string());
    }

    /// Part numbers from the most recent complete call, in sent order.
    pub fn completed_parts(&self) -> Vec<i32> {
        self.completes
            .lock()
            .unwrap()
            .last()
            .map(|(_, parts)| parts.iter().map(|p| p.part_number).collect())
            .unwrap_or_default()
    }

    pub fn completed_upload_id(&self) -> Option<String> {
        self.completes
            .lock()
            .unwrap()
            .last()
            .map(|(id, _)| id.clone())
    }
}

#[async_trait]
impl UploadApi for MockUploadApi {
    async fn batch_presign(
        &self,
        file_names: &[String],
        _expiry_hours: i64,
        folder: &str,
    ) -> AppResult<BatchPresignResponse> {
        self.presign_count.fetch_add(1, Ordering::SeqCst);
        if self.fail_presign.load(Ordering::SeqCst) {
            return Ok(BatchPresignResponse {
                presigned_urls: HashMap::new(),
                success: false,
                message: Some("bucket unavailable".to_string()),
            });
        }
        let omitted = self.omit_from_presign.lock().unwrap();
        let presigned_urls = file_names
            .iter()
            .filter(|name| !omitted.contains(*name))
            .map(|name| {
                (
                    name.clone(),
                    format!("https://storage.example/{folder}/{name}?sig=abc&exp=3600"),
                )
            })
            .collect();
        Ok(BatchPresignResponse {
            presigned_urls,
            success: true,
            message: None,
        })
    }

    async fn initiate_multipart(&self, _file_name: &str, _folder: &str) -> AppResult<String> {
        let n = self.initiate_count.fetch_add(1, Ordering::SeqCst);
        Ok(format!("upl-new-{n}"))
    }

    async fn part_url(
        &self,
        _upload_id: &str,
        file_name: &str,
        folder: &str,
        part_number: i32,
    ) -> AppResult<String> {
        Ok(format!(
            "https://storage.example/{folder}/{file_name}/part-{part_number}?sig=abc"
        ))
    }

    async fn complete_multipart(
        &self,
        upload_id: &str,
        file_name: &str,
        _folder: &str,
        parts: &[PartReceipt],
    ) -> AppResult<CompleteMultipartResponse> {
        self.completes
            .lock()
            .unwrap()
            .push((upload_id.to_string(), parts.to_vec()));
        if self.fail_complete.load(Ordering::SeqCst) {
            return Ok(CompleteMultipartResponse {
                success: false,
                url: None,
            });
        }
        Ok(CompleteMultipartResponse {
            success: true,
            url: Some(format!("https://storage.example/final/{file_name}")),
        })
    }

    async fn abort_multipart(
        &self,
        _upload_id: &str,
        _file_name: &str,
        _folder: &str,
    ) -> AppResult<()> {
        self.abort_count.fetch_add(1, Ordering::SeqCst);
        if self.fail_abort.load(Ordering::SeqCst) {
            return Err(AppError::remote_api("Abort endpoint unavailable"));
        }
        Ok(())
    }
}

/// One recorded PUT.
#[derive(Debug, Clone)]
pub struct PutRecord {
    pub url: String,
    pub len: usize,
    pub content_type: String,
}

/// Recording [`ObjectTransport`] that never touches the network.
#[derive(Debug, Default)]
pub struct MockTransport {
    puts: Mutex<Vec<PutRecord>>,
    fail_puts: AtomicBool,
    fail_put_at: AtomicUsize,
}

impl MockTransport {
    pub fn puts(&self) -> Vec<PutRecord> {
        self.puts.lock().unwrap().clone()
    }

    pub fn fail_puts(&self, fail: bool) {
        self.fail_puts.store(fail, Ordering::SeqCst);
        self.fail_put_at.store(0, Ordering::SeqCst);
    }

    /// Fail only the `index`-th PUT (0-based); earlier ones succeed.
    pub fn fail_put_at(&self, index: usize) {
        self.fail_puts.store(true, Ordering::SeqCst);
        self.fail_put_at.store(index, Ordering::SeqCst);
    }

    fn record(&self, url: &str, len: usize, content_type: &str) -> AppResult<usize> {
        let mut puts = self.puts.lock().unwrap();
        let index = puts.len();
        if self.fail_puts.load(Ordering::SeqCst) && index >= self.fail_put_at.load(Ordering::SeqCst)
        {
            return Err(AppError::storage("Storage rejected upload"));
        }
        puts.push(PutRecord {
            url: url.to_string(),
            len,
            content_type: content_type.to_string(),
        });
        Ok(index)
    }
}

#[async_trait]
impl ObjectTransport for MockTransport {
    async fn put_part(&self, url: &str, body: Bytes, content_type: &str) -> AppResult<String> {
        let index = self.record(url, body.len(), content_type)?;
        Ok(format!("etag-{index}"))
    }

    async fn put_object(&self, url: &str, body: Bytes, content_type: &str) -> AppResult<()> {
        self.record(url, body.len(), content_type)?;
        Ok(())
    }
}

/// [`PartStore`] backed by a hash map.
#[derive(Debug, Default)]
pub struct MemoryPartStore {
    sessions: RwLock<HashMap<String, UploadSession>>,
}

#[async_trait]
impl PartStore for MemoryPartStore {
    async fn load(&self, session_key: &str) -> AppResult<Option<UploadSession>> {
        Ok(self.sessions.read().await.get(session_key).cloned())
    }

    async fn save(&self, session: &UploadSession) -> AppResult<()> {
        self.sessions
            .write()
            .await
            .insert(session.session_key.clone(), session.clone());
        Ok(())
    }

    async fn delete(&self, session_key: &str) -> AppResult<()> {
        self.sessions.write().await.remove(session_key);
        Ok(())
    }
}
