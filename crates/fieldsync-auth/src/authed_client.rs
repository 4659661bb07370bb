//! Authenticated HTTP client decorator.
//!
//! Wraps `reqwest` so every outbound API request carries the bearer token
//! and a 401/403 response triggers one coordinated token refresh followed
//! by exactly one replay of the original request.

use std::sync::Arc;

use reqwest::{RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use fieldsync_core::error::AppError;
use fieldsync_core::result::AppResult;

use crate::gateway::AuthGateway;

fn is_unauthorized(status: StatusCode) -> bool {
    status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN
}

/// `reqwest::Client` decorated with bearer attachment and 401-retry.
///
/// All FieldSync API calls go through this client. Direct-to-storage PUTs
/// do not — presigned URLs carry their own authorization.
#[derive(Debug, Clone)]
pub struct AuthedClient {
    http: reqwest::Client,
    gateway: Arc<AuthGateway>,
}

impl AuthedClient {
    /// Create a new authenticated client.
    pub fn new(http: reqwest::Client, gateway: Arc<AuthGateway>) -> Self {
        Self { http, gateway }
    }

    /// The gateway this client authenticates with.
    pub fn gateway(&self) -> &Arc<AuthGateway> {
        &self.gateway
    }

    /// Start a GET request.
    pub fn get(&self, url: &str) -> RequestBuilder {
        self.http.get(url)
    }

    /// Start a POST request.
    pub fn post(&self, url: &str) -> RequestBuilder {
        self.http.post(url)
    }

    /// Send a request with the bearer token attached.
    ///
    /// On 401/403 the gateway performs a single-flight refresh and the
    /// request is replayed exactly once with the new token. A second
    /// rejection is surfaced as a terminal authentication error.
    ///
    /// The request body must be replayable (buffered); all FieldSync
    /// request bodies are JSON, so this holds by construction.
    pub async fn send(&self, request: RequestBuilder) -> AppResult<Response> {
        let token = self
            .gateway
            .access_token()
            .await?
            .ok_or_else(|| AppError::authentication("Not logged in"))?;

        let replay = request.try_clone();
        let response = request.bearer_auth(&token).send().await?;

        if !is_unauthorized(response.status()) {
            return Ok(response);
        }

        let replay = replay
            .ok_or_else(|| AppError::internal("Request with streaming body cannot be replayed"))?;

        debug!(status = %response.status(), "Request unauthorized, refreshing token");
        let fresh = self.gateway.refresh_after_unauthorized(&token).await?;

        let response = replay.bearer_auth(&fresh).send().await?;
        if is_unauthorized(response.status()) {
            return Err(AppError::authentication(format!(
                "Request rejected again after token refresh ({})",
                response.status()
            )));
        }
        Ok(response)
    }

    /// Send a request and deserialize a JSON response body.
    pub async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> AppResult<T> {
        let response = self.send(request).await?;
        let status = response.status();
        if !status.is_success() {
            return Err(AppError::remote_api(format!("API call failed ({status})")));
        }
        Ok(response.json().await?)
    }

    /// POST a JSON body and deserialize a JSON response.
    pub async fn post_json<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        url: &str,
        body: &B,
    ) -> AppResult<T> {
        self.send_json(self.http.post(url).json(body)).await
    }
}
