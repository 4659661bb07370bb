//! Remote API configuration.

use serde::{Deserialize, Serialize};

/// Remote FieldSync API configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL of the FieldSync backend (no trailing slash).
    pub base_url: String,
    /// Uniform connect/read/write timeout in seconds, applied to every
    /// HTTP call including chunk PUTs.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
}

impl ApiConfig {
    /// Build a path relative to the configured base URL.
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }
}

fn default_timeout() -> u64 {
    30
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_joins_without_double_slash() {
        let config = ApiConfig {
            base_url: "https://api.example.com/".to_string(),
            timeout_seconds: 30,
        };
        assert_eq!(
            config.url("/auth/login"),
            "https://api.example.com/auth/login"
        );
    }
}
