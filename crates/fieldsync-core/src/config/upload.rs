//! Upload pipeline configuration.

use serde::{Deserialize, Serialize};

/// Minimum accepted chunk size. Anything smaller is clamped up to avoid
/// pathological tiny-chunk loops.
pub const MIN_CHUNK_SIZE_BYTES: u64 = 1024;

/// Media upload configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadConfig {
    /// Chunk size in bytes for chunked uploads (default 5 MiB).
    #[serde(default = "default_chunk_size")]
    pub chunk_size_bytes: u64,
    /// Expiry in hours requested for batch presigned URLs.
    #[serde(default = "default_presign_expiry")]
    pub presign_expiry_hours: u32,
}

impl UploadConfig {
    /// Return the configured chunk size, clamped to the sane floor.
    pub fn effective_chunk_size(&self) -> u64 {
        self.chunk_size_bytes.max(MIN_CHUNK_SIZE_BYTES)
    }
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            chunk_size_bytes: default_chunk_size(),
            presign_expiry_hours: default_presign_expiry(),
        }
    }
}

fn default_chunk_size() -> u64 {
    5 * 1024 * 1024
}

fn default_presign_expiry() -> u32 {
    1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunk_size_clamped_to_floor() {
        let config = UploadConfig {
            chunk_size_bytes: 16,
            presign_expiry_hours: 1,
        };
        assert_eq!(config.effective_chunk_size(), MIN_CHUNK_SIZE_BYTES);
    }

    #[test]
    fn test_default_chunk_size_is_5_mib() {
        assert_eq!(UploadConfig::default().effective_chunk_size(), 5_242_880);
    }
}
