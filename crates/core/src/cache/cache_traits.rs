//! Fast cache traits.

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;

use crate::errors::CacheError;

/// Entry counts and payload size, for the stats endpoint.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStats {
    pub live: usize,
    /// Entries past their TTL that have not been purged yet
    pub expired: usize,
    /// Total length of live values
    pub bytes: usize,
}

/// A key/value cache with per-entry TTL.
///
/// Values are opaque strings (JSON written by [`super::CacheLayer`]), so a
/// networked cache can implement this trait without knowing engine types.
/// An expired entry must read as absent.
#[async_trait]
pub trait FastCache: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;

    async fn put(&self, key: &str, value: String, ttl: Duration) -> Result<(), CacheError>;

    async fn delete(&self, key: &str) -> Result<(), CacheError>;

    /// Entry counts, when the backend can report them cheaply.
    fn stats(&self) -> Option<CacheStats> {
        None
    }
}
