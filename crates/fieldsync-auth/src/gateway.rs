//! Token pair ownership: login, coordinated refresh, logout.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::{Mutex, Notify, RwLock};
use tracing::{debug, warn};

use fieldsync_core::config::ApiConfig;
use fieldsync_core::error::AppError;
use fieldsync_core::result::AppResult;
use fieldsync_core::traits::TokenStore;
use fieldsync_core::types::token::TokenPair;

#[derive(Debug, Serialize)]
struct LoginRequest<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RefreshRequest<'a> {
    refresh_token: &'a str,
}

/// Holds the current access/refresh token pair and exposes
/// login/refresh/logout.
///
/// The gateway talks to the auth endpoints on a *bare* HTTP client, never
/// through [`AuthedClient`](crate::AuthedClient) — so a 401 from the
/// refresh endpoint can never recurse into another refresh attempt.
///
/// Refresh is single-flight: concurrent callers that hit 401 at the same
/// time coalesce into one refresh call and share its outcome. Late
/// arrivals wait on a [`Notify`] instead of issuing their own request.
#[derive(Debug)]
pub struct AuthGateway {
    http: reqwest::Client,
    api: ApiConfig,
    store: Arc<dyn TokenStore>,
    // The cached pair; lazily loaded from the durable store on first read.
    current: RwLock<Option<TokenPair>>,
    // If the lock is held, a refresh is in flight.
    refresh_in_progress: Mutex<()>,
    refresh_notify: Notify,
}

impl AuthGateway {
    /// Create a new gateway over a bare HTTP client and a durable store.
    pub fn new(http: reqwest::Client, api: ApiConfig, store: Arc<dyn TokenStore>) -> Self {
        Self {
            http,
            api,
            store,
            current: RwLock::new(None),
            refresh_in_progress: Mutex::new(()),
            refresh_notify: Notify::new(),
        }
    }

    /// The current token pair, loading it from the durable store if the
    /// in-memory cache is cold.
    pub async fn current_pair(&self) -> AppResult<Option<TokenPair>> {
        if let Some(pair) = self.current.read().await.clone() {
            return Ok(Some(pair));
        }
        let loaded = self.store.load().await?;
        if let Some(pair) = &loaded {
            *self.current.write().await = Some(pair.clone());
        }
        Ok(loaded)
    }

    /// The current access token, if logged in.
    pub async fn access_token(&self) -> AppResult<Option<String>> {
        Ok(self.current_pair().await?.map(|p| p.access_token))
    }

    /// Authenticate with the backend and persist the returned pair.
    pub async fn login(&self, email: &str, password: &str) -> AppResult<TokenPair> {
        let response = self
            .http
            .post(self.api.url("/auth/login"))
            .json(&LoginRequest { email, password })
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(AppError::authentication(format!(
                "Login failed ({})",
                response.status()
            )));
        }

        let pair: TokenPair = response.json().await?;
        self.replace_pair(&pair).await?;
        debug!(user_id = %pair.user_id, "Logged in");
        Ok(pair)
    }

    /// Clear the stored pair (in memory and durable).
    pub async fn logout(&self) -> AppResult<()> {
        self.clear_pair().await
    }

    /// Coordinated refresh after an authenticated request came back
    /// 401/403 while carrying `stale_access`.
    ///
    /// Returns the access token to retry with. On unrecoverable refresh
    /// failure the stored pair is cleared (logout side-effect) and an
    /// authentication error is returned.
    pub async fn refresh_after_unauthorized(&self, stale_access: &str) -> AppResult<String> {
        // Another caller may already have replaced the rejected token.
        if let Some(pair) = self.current_pair().await? {
            if pair.access_token != stale_access {
                return Ok(pair.access_token);
            }
        }

        // Register for the wakeup before probing the lock. `notify_waiters`
        // stores no permit, so a waiter that only registers when it first
        // polls `notified()` can miss a winner that finishes in between and
        // park forever.
        let notified = self.refresh_notify.notified();
        tokio::pin!(notified);
        notified.as_mut().enable();

        match self.refresh_in_progress.try_lock() {
            Ok(guard) => {
                // Re-check under the guard: the previous winner may have
                // finished between our read and the try_lock.
                if let Some(pair) = self.current_pair().await? {
                    if pair.access_token != stale_access {
                        drop(guard);
                        self.refresh_notify.notify_waiters();
                        return Ok(pair.access_token);
                    }
                }

                let outcome = self.do_refresh().await;

                drop(guard);
                self.refresh_notify.notify_waiters();
                outcome
            }
            Err(_) => {
                // A refresh is already in flight; await its shared outcome.
                notified.await;
                match self.current_pair().await? {
                    Some(pair) => Ok(pair.access_token),
                    None => Err(AppError::authentication("Token refresh failed")),
                }
            }
        }
    }

    /// Perform the actual refresh call and update stored state.
    async fn do_refresh(&self) -> AppResult<String> {
        let refresh_token = match self.current_pair().await? {
            Some(pair) => pair.refresh_token,
            None => return Err(AppError::authentication("Not logged in")),
        };

        debug!("Refreshing access token");

        let result = async {
            let response = self
                .http
                .post(self.api.url("/auth/refresh-token"))
                .json(&RefreshRequest {
                    refresh_token: &refresh_token,
                })
                .send()
                .await?;

            if !response.status().is_success() {
                return Err(AppError::authentication(format!(
                    "Token refresh rejected ({})",
                    response.status()
                )));
            }

            let pair: TokenPair = response.json().await?;
            Ok(pair)
        }
        .await;

        match result {
            Ok(pair) => {
                self.replace_pair(&pair).await?;
                Ok(pair.access_token)
            }
            Err(e) => {
                warn!(error = %e, "Token refresh failed, clearing credentials");
                self.clear_pair().await?;
                Err(e)
            }
        }
    }

    async fn replace_pair(&self, pair: &TokenPair) -> AppResult<()> {
        self.store.save(pair).await?;
        *self.current.write().await = Some(pair.clone());
        Ok(())
    }

    async fn clear_pair(&self) -> AppResult<()> {
        self.store.clear().await?;
        *self.current.write().await = None;
        Ok(())
    }
}
