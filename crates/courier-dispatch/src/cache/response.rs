//! Response cache keyed by request fingerprint.

use super::memory::MemoryStore;
use super::store::{KeyValueStore, StoreError};
use bytes::Bytes;
use courier_common_config::CacheConfig;
use courier_common_http::{Method, Response};
use sha2::{Digest, Sha256};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

const KEY_PREFIX: &str = "courier:response:";

/// Deterministic cache key for a request.
///
/// Hashes the method, the URL and the payload. An absent payload and an
/// empty one hash differently.
pub fn fingerprint(method: Method, url: &str, payload: Option<&[u8]>) -> String {
    let mut hasher = Sha256::new();
    hasher.update(method.as_str().as_bytes());
    hasher.update([0u8]);
    hasher.update(url.as_bytes());
    hasher.update([0u8]);
    match payload {
        Some(payload) => {
            hasher.update([1u8]);
            hasher.update(payload);
        }
        None => hasher.update([0u8]),
    }
    format!("{KEY_PREFIX}{:x}", hasher.finalize())
}

/// When and for how long responses are cached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CachePolicy {
    /// Lifetime of a stored entry.
    pub ttl: Duration,
    /// Bodies of this many bytes or more are never cached.
    pub max_size: usize,
}

impl CachePolicy {
    pub fn new(ttl: Duration, max_size: usize) -> Self {
        Self { ttl, max_size }
    }

    /// Policy from configuration; `None` unless both TTL and size are set.
    pub fn from_config(config: &CacheConfig) -> Option<Self> {
        match (config.ttl(), config.max_size_bytes) {
            (Some(ttl), Some(max_size)) => Some(Self::new(ttl, max_size)),
            _ => None,
        }
    }

    /// Whether a body of `len` bytes fits under the limit.
    pub fn admits(&self, len: usize) -> bool {
        len < self.max_size
    }
}

/// Caches responses in a [`KeyValueStore`].
///
/// Store failures never reach the caller: a failed read is a miss and a
/// failed write is skipped.
#[derive(Clone)]
pub struct ResponseCache {
    store: Arc<dyn KeyValueStore>,
    policy: Option<CachePolicy>,
}

impl ResponseCache {
    pub fn new(store: Arc<dyn KeyValueStore>, policy: Option<CachePolicy>) -> Self {
        Self { store, policy }
    }

    /// A cache that never stores anything.
    pub fn disabled() -> Self {
        Self::new(Arc::new(MemoryStore::new()), None)
    }

    pub fn is_enabled(&self) -> bool {
        self.policy.is_some()
    }

    /// Look up a response. Hits are flagged as served from the cache.
    pub async fn lookup(&self, key: &str) -> Option<Response> {
        let policy = self.policy?;

        let bytes = match self.store.get(key).await {
            Ok(Some(bytes)) => bytes,
            Ok(None) => return None,
            Err(e) => {
                warn!(key = key, error = %e, "cache lookup failed, treating as miss");
                return None;
            }
        };

        let response: Response = match serde_json::from_slice(&bytes) {
            Ok(response) => response,
            Err(e) => {
                warn!(key = key, error = %e, "discarding unreadable cache entry");
                return None;
            }
        };

        if !policy.admits(response.body().len()) {
            debug!(
                key = key,
                bytes = response.body().len(),
                limit = policy.max_size,
                "cached body over size limit"
            );
            return None;
        }

        Some(response.mark_cached())
    }

    /// Store a response if caching is on and its body is under the limit.
    /// Returns whether the entry was written.
    pub async fn store(&self, key: &str, response: &Response) -> bool {
        let Some(policy) = self.policy else {
            return false;
        };

        if !policy.admits(response.body().len()) {
            debug!(
                key = key,
                bytes = response.body().len(),
                limit = policy.max_size,
                "response too large to cache"
            );
            return false;
        }

        let encoded = match serde_json::to_vec(response) {
            Ok(encoded) => Bytes::from(encoded),
            Err(e) => {
                let e = StoreError::Serialization(e.to_string());
                warn!(key = key, error = %e, "cache store skipped");
                return false;
            }
        };

        match self.store.set(key, encoded, policy.ttl).await {
            Ok(()) => true,
            Err(e) => {
                warn!(key = key, error = %e, "cache store failed");
                false
            }
        }
    }
}
