//! Typed, failure-tolerant access to the fast cache.

use std::sync::Arc;
use std::time::Duration;

use log::{debug, warn};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use nexus_registry::{CanonicalRecord, Identifier};

use super::{CacheStats, FastCache};
use crate::errors::CacheError;

/// What the cache remembers about one identifier.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum CachedLookup {
    Found { record: Box<CanonicalRecord> },
    /// The provider confirmed the entity does not exist.
    NotFound,
}

/// Cache key for a resolved record (or its negative entry).
pub fn record_key(identifier: &Identifier) -> String {
    format!("record:{}", identifier.key())
}

/// Cache key for a complete result graph rooted at `identifier`.
pub fn graph_key(identifier: &Identifier) -> String {
    format!("graph:{}", identifier.key())
}

/// Wraps a [`FastCache`] with JSON encoding and a per-operation timeout.
///
/// None of the methods fail: a read error is a miss, a write error is logged.
#[derive(Clone)]
pub struct CacheLayer {
    cache: Arc<dyn FastCache>,
    op_timeout: Duration,
}

impl CacheLayer {
    pub fn new(cache: Arc<dyn FastCache>, op_timeout: Duration) -> Self {
        Self { cache, op_timeout }
    }

    pub async fn get_json<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = match tokio::time::timeout(self.op_timeout, self.cache.get(key)).await {
            Ok(Ok(raw)) => raw?,
            Ok(Err(e)) => {
                warn!("Cache read for '{}' failed, treating as miss: {}", key, e);
                return None;
            }
            Err(_) => {
                warn!(
                    "Cache read for '{}' failed, treating as miss: {}",
                    key,
                    CacheError::Timeout
                );
                return None;
            }
        };

        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!("Dropping undecodable cache entry '{}': {}", key, e);
                self.delete(key).await;
                None
            }
        }
    }

    pub async fn put_json<T: Serialize>(&self, key: &str, value: &T, ttl: Duration) {
        let raw = match serde_json::to_string(value) {
            Ok(raw) => raw,
            Err(e) => {
                warn!("Could not encode cache entry '{}': {}", key, e);
                return;
            }
        };

        match tokio::time::timeout(self.op_timeout, self.cache.put(key, raw, ttl)).await {
            Ok(Ok(())) => debug!("Cached '{}' for {:?}", key, ttl),
            Ok(Err(e)) => warn!("Cache write for '{}' failed: {}", key, e),
            Err(_) => warn!("Cache write for '{}' failed: {}", key, CacheError::Timeout),
        }
    }

    pub fn stats(&self) -> Option<CacheStats> {
        self.cache.stats()
    }

    pub async fn delete(&self, key: &str) {
        match tokio::time::timeout(self.op_timeout, self.cache.delete(key)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!("Cache delete for '{}' failed: {}", key, e),
            Err(_) => warn!("Cache delete for '{}' failed: {}", key, CacheError::Timeout),
        }
    }
}
