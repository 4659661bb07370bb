//! Sqlite implementation of the [`PartStore`] trait.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::SqlitePool;

use fieldsync_core::error::{AppError, ErrorKind};
use fieldsync_core::result::AppResult;
use fieldsync_core::traits::PartStore;
use fieldsync_core::types::upload::{PartReceipt, UploadSession};

/// Durable per-file upload progress, one row per session key.
///
/// The `parts` column holds the receipts as a JSON array of
/// `{partNumber, etag}` objects.
#[derive(Debug, Clone)]
pub struct SqlitePartStore {
    pool: SqlitePool,
}

impl SqlitePartStore {
    /// Create a new part store over an open pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PartStore for SqlitePartStore {
    async fn load(&self, session_key: &str) -> AppResult<Option<UploadSession>> {
        let row: Option<(String, String)> = sqlx::query_as(
            "SELECT upload_id, parts FROM upload_sessions WHERE session_key = ?1",
        )
        .bind(session_key)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to load upload session", e)
        })?;

        match row {
            None => Ok(None),
            Some((upload_id, parts_json)) => {
                let parts: Vec<PartReceipt> = serde_json::from_str(&parts_json)?;
                Ok(Some(UploadSession {
                    session_key: session_key.to_string(),
                    upload_id,
                    parts,
                }))
            }
        }
    }

    async fn save(&self, session: &UploadSession) -> AppResult<()> {
        let parts_json = serde_json::to_string(&session.parts)?;

        sqlx::query(
            "INSERT INTO upload_sessions (session_key, upload_id, parts, updated_at) \
             VALUES (?1, ?2, ?3, ?4) \
             ON CONFLICT(session_key) DO UPDATE SET \
                upload_id = excluded.upload_id, \
                parts = excluded.parts, \
                updated_at = excluded.updated_at",
        )
        .bind(&session.session_key)
        .bind(&session.upload_id)
        .bind(&parts_json)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to save upload session", e)
        })?;

        Ok(())
    }

    async fn delete(&self, session_key: &str) -> AppResult<()> {
        sqlx::query("DELETE FROM upload_sessions WHERE session_key = ?1")
            .bind(session_key)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to delete upload session", e)
            })?;
        Ok(())
    }
}
