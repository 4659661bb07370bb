//! Durable persistence of the authentication token pair.

use async_trait::async_trait;

use crate::result::AppResult;
use crate::types::token::TokenPair;

/// Durable storage for the single [`TokenPair`].
///
/// The auth gateway replaces the pair wholesale on login/refresh and
/// clears it wholesale on logout or unrecoverable refresh failure.
#[async_trait]
pub trait TokenStore: Send + Sync + std::fmt::Debug + 'static {
    /// Load the stored pair, if any.
    async fn load(&self) -> AppResult<Option<TokenPair>>;

    /// Store the pair, replacing any previous one.
    async fn save(&self, pair: &TokenPair) -> AppResult<()>;

    /// Remove the stored pair. Clearing an empty store is not an error.
    async fn clear(&self) -> AppResult<()>;
}
