//! Sqlite implementation of the [`TokenStore`] trait.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::SqlitePool;

use fieldsync_core::error::{AppError, ErrorKind};
use fieldsync_core::result::AppResult;
use fieldsync_core::traits::TokenStore;
use fieldsync_core::types::token::TokenPair;

/// Single-row table holding the current token pair.
#[derive(Debug, Clone)]
pub struct SqliteTokenStore {
    pool: SqlitePool,
}

impl SqliteTokenStore {
    /// Create a new token store over an open pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TokenStore for SqliteTokenStore {
    async fn load(&self) -> AppResult<Option<TokenPair>> {
        let row: Option<(String, String, String, String, String, String)> = sqlx::query_as(
            "SELECT access_token, refresh_token, user_id, email, name, role \
             FROM auth_tokens WHERE id = 1",
        )
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to load tokens", e))?;

        Ok(row.map(
            |(access_token, refresh_token, user_id, email, name, role)| TokenPair {
                access_token,
                refresh_token,
                user_id,
                email,
                name,
                role,
            },
        ))
    }

    async fn save(&self, pair: &TokenPair) -> AppResult<()> {
        sqlx::query(
            "INSERT INTO auth_tokens (id, access_token, refresh_token, user_id, email, name, role, updated_at) \
             VALUES (1, ?1, ?2, ?3, ?4, ?5, ?6, ?7) \
             ON CONFLICT(id) DO UPDATE SET \
                access_token = excluded.access_token, \
                refresh_token = excluded.refresh_token, \
                user_id = excluded.user_id, \
                email = excluded.email, \
                name = excluded.name, \
                role = excluded.role, \
                updated_at = excluded.updated_at",
        )
        .bind(&pair.access_token)
        .bind(&pair.refresh_token)
        .bind(&pair.user_id)
        .bind(&pair.email)
        .bind(&pair.name)
        .bind(&pair.role)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to save tokens", e))?;

        Ok(())
    }

    async fn clear(&self) -> AppResult<()> {
        sqlx::query("DELETE FROM auth_tokens WHERE id = 1")
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to clear tokens", e))?;
        Ok(())
    }
}
