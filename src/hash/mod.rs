//! Content hashing
//!
//! Fragment names and table entries carry a digest of the fragment bytes.
//! Hashing is asynchronous so every fragment of a build can be hashed
//! concurrently.

use async_trait::async_trait;
use thiserror::Error;

use crate::utils::hash_content;

/// Failure of a hash computation
#[derive(Debug, Error)]
pub enum HashError {
    #[error("hash task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    #[error("{0}")]
    Backend(String),
}

/// Computes the content hash of a fragment
#[async_trait]
pub trait ContentHasher: Send + Sync {
    async fn hash(&self, content: &[u8]) -> Result<String, HashError>;
}

/// SHA-256, hex encoded and truncated, computed on the blocking pool
#[derive(Debug, Clone)]
pub struct Sha256Hasher {
    length: usize,
}

impl Sha256Hasher {
    pub fn new(length: usize) -> Self {
        Self { length }
    }
}

#[async_trait]
impl ContentHasher for Sha256Hasher {
    async fn hash(&self, content: &[u8]) -> Result<String, HashError> {
        let content = content.to_vec();
        let length = self.length;
        let digest = tokio::task::spawn_blocking(move || hash_content(&content, length)).await?;
        Ok(digest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_sha256_hasher_is_deterministic() {
        let hasher = Sha256Hasher::new(16);
        let a = hasher.hash(b"a{color:red}").await.unwrap();
        let b = hasher.hash(b"a{color:red}").await.unwrap();
        let c = hasher.hash(b"a{color:blue}").await.unwrap();

        assert_eq!(a.len(), 16);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[tokio::test]
    async fn test_length_is_capped_by_digest() {
        let hasher = Sha256Hasher::new(1000);
        assert_eq!(hasher.hash(b"").await.unwrap().len(), 64);
    }
}
