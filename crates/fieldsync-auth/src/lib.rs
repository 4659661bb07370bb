//! # fieldsync-auth
//!
//! Authentication for the FieldSync client: the [`AuthGateway`] owns the
//! token pair (login, single-flight refresh, logout) and [`AuthedClient`]
//! decorates `reqwest` so every API call carries a bearer token and is
//! replayed exactly once after a coordinated refresh when it comes back
//! 401/403.

pub mod authed_client;
pub mod gateway;

pub use authed_client::AuthedClient;
pub use gateway::AuthGateway;

#[cfg(test)]
pub(crate) mod test_support {
    use async_trait::async_trait;
    use tokio::sync::RwLock;

    use fieldsync_core::result::AppResult;
    use fieldsync_core::traits::TokenStore;
    use fieldsync_core::types::token::TokenPair;

    /// In-memory token store for tests.
    #[derive(Debug, Default)]
    pub struct MemoryTokenStore {
        pair: RwLock<Option<TokenPair>>,
    }

    impl MemoryTokenStore {
        pub fn with_pair(pair: TokenPair) -> Self {
            Self {
                pair: RwLock::new(Some(pair)),
            }
        }
    }

    #[async_trait]
    impl TokenStore for MemoryTokenStore {
        async fn load(&self) -> AppResult<Option<TokenPair>> {
            Ok(self.pair.read().await.clone())
        }

        async fn save(&self, pair: &TokenPair) -> AppResult<()> {
            *self.pair.write().await = Some(pair.clone());
            Ok(())
        }

        async fn clear(&self) -> AppResult<()> {
            *self.pair.write().await = None;
            Ok(())
        }
    }

    pub fn token_pair(access: &str, refresh: &str) -> TokenPair {
        TokenPair {
            access_token: access.to_string(),
            refresh_token: refresh.to_string(),
            user_id: "u-1".to_string(),
            email: "sup@example.com".to_string(),
            name: "Supervisor".to_string(),
            role: "supervisor".to_string(),
        }
    }
}
