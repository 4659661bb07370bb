//! Durable persistence of per-file upload progress.

use async_trait::async_trait;

use crate::result::AppResult;
use crate::types::upload::UploadSession;

/// Key-value persistence for [`UploadSession`] records, keyed by
/// session key (`"<folder>/<file_name>"`).
///
/// The trait is defined here in `fieldsync-core` and implemented in
/// `fieldsync-store`. Implementations never mutate session data; the
/// chunked uploader owns it and persists the full session after every
/// confirmed part so the most bytes ever re-uploaded after a crash is
/// one chunk.
#[async_trait]
pub trait PartStore: Send + Sync + std::fmt::Debug + 'static {
    /// Load the persisted session for a key, if any.
    async fn load(&self, session_key: &str) -> AppResult<Option<UploadSession>>;

    /// Persist the full session, replacing any previous record.
    async fn save(&self, session: &UploadSession) -> AppResult<()>;

    /// Remove the persisted session for a key. Removing an absent key is
    /// not an error.
    async fn delete(&self, session_key: &str) -> AppResult<()>;
}
