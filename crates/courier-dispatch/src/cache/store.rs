//! Key-value store trait.

use async_trait::async_trait;
use bytes::Bytes;
use std::time::Duration;

/// Store operation result.
pub type StoreResult<T> = Result<T, StoreError>;

/// Store errors.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Serialization error: {0}")]
    Serialization(String),
    #[error("Backend error: {0}")]
    Backend(String),
}

/// Byte-oriented key-value storage with per-entry TTL.
///
/// Only single-key operations are required to be linearizable.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Get a live value.
    async fn get(&self, key: &str) -> StoreResult<Option<Bytes>>;

    /// Set a value, replacing any previous one, expiring after `ttl`.
    async fn set(&self, key: &str, value: Bytes, ttl: Duration) -> StoreResult<()>;
}

/// Store statistics.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoreStats {
    pub hits: u64,
    pub misses: u64,
    pub size: u64,
    pub expired: u64,
}

impl StoreStats {
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}
