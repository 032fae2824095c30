//! In-process fast cache.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use log::{debug, warn};
use tokio::task::JoinHandle;
use tokio::time::Instant;

use super::{CacheStats, FastCache};
use crate::config::MAX_TTL_SECS;
use crate::errors::CacheError;

struct CacheEntry {
    value: String,
    expires_at: Instant,
}

impl CacheEntry {
    fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

/// A process-local [`FastCache`].
///
/// Expired entries are dropped lazily on read and in bulk by
/// [`MemoryCache::purge_expired`], which [`MemoryCache::spawn_purge`] runs
/// periodically.
#[derive(Default)]
pub struct MemoryCache {
    entries: RwLock<HashMap<String, CacheEntry>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stats(&self) -> CacheStats {
        let entries = self.entries.read().unwrap_or_else(|poisoned| {
            warn!("Memory cache lock poisoned, recovering");
            poisoned.into_inner()
        });
        let now = Instant::now();
        let mut stats = CacheStats::default();
        for entry in entries.values() {
            if entry.is_expired(now) {
                stats.expired += 1;
            } else {
                stats.live += 1;
                stats.bytes += entry.value.len();
            }
        }
        stats
    }

    /// Drop every expired entry. Returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let mut entries = self.entries.write().unwrap_or_else(|poisoned| {
            warn!("Memory cache lock poisoned, recovering");
            poisoned.into_inner()
        });
        let now = Instant::now();
        let before = entries.len();
        entries.retain(|_, entry| !entry.is_expired(now));
        let removed = before - entries.len();
        if removed > 0 {
            debug!("Purged {} expired cache entries", removed);
        }
        removed
    }

    /// Run `purge_expired` every `interval` on the tokio runtime.
    pub fn spawn_purge(self: Arc<Self>, interval: Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                self.purge_expired();
            }
        })
    }
}

#[async_trait]
impl FastCache for MemoryCache {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let now = Instant::now();
        {
            let entries = self.entries.read().unwrap_or_else(|poisoned| {
                warn!("Memory cache lock poisoned, recovering");
                poisoned.into_inner()
            });
            match entries.get(key) {
                None => return Ok(None),
                Some(entry) if !entry.is_expired(now) => return Ok(Some(entry.value.clone())),
                Some(_) => {}
            }
        }

        let mut entries = self.entries.write().unwrap_or_else(|poisoned| {
            warn!("Memory cache lock poisoned, recovering");
            poisoned.into_inner()
        });
        if entries.get(key).is_some_and(|entry| entry.is_expired(now)) {
            entries.remove(key);
        }
        Ok(None)
    }

    async fn put(&self, key: &str, value: String, ttl: Duration) -> Result<(), CacheError> {
        let now = Instant::now();
        let expires_at = now
            .checked_add(ttl)
            .unwrap_or_else(|| now + Duration::from_secs(MAX_TTL_SECS));
        let mut entries = self.entries.write().unwrap_or_else(|poisoned| {
            warn!("Memory cache lock poisoned, recovering");
            poisoned.into_inner()
        });
        entries.insert(key.to_string(), CacheEntry { value, expires_at });
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        let mut entries = self.entries.write().unwrap_or_else(|poisoned| {
            warn!("Memory cache lock poisoned, recovering");
            poisoned.into_inner()
        });
        entries.remove(key);
        Ok(())
    }

    fn stats(&self) -> Option<CacheStats> {
        Some(MemoryCache::stats(self))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_entry_expires_after_ttl() {
        let cache = MemoryCache::new();
        cache
            .put("record:a", "1".to_string(), Duration::from_secs(10))
            .await
            .unwrap();
        assert_eq!(cache.get("record:a").await.unwrap().as_deref(), Some("1"));

        tokio::time::advance(Duration::from_secs(11)).await;
        assert_eq!(cache.get("record:a").await.unwrap(), None);
        assert_eq!(cache.stats(), CacheStats::default());
    }

    #[tokio::test(start_paused = true)]
    async fn test_purge_and_stats() {
        let cache = MemoryCache::new();
        cache
            .put("short", "x".to_string(), Duration::from_secs(1))
            .await
            .unwrap();
        cache
            .put("long", "y".to_string(), Duration::from_secs(100))
            .await
            .unwrap();

        tokio::time::advance(Duration::from_secs(2)).await;
        let expected = CacheStats {
            live: 1,
            expired: 1,
            bytes: 1,
        };
        assert_eq!(cache.stats(), expected);
        assert_eq!(cache.purge_expired(), 1);
        assert_eq!(
            cache.stats(),
            CacheStats {
                expired: 0,
                ..expected
            }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_purge_task_drops_one_off_entries() {
        let cache = Arc::new(MemoryCache::new());
        for key in ["record:a", "record:b", "graph:a"] {
            cache
                .put(key, "x".to_string(), Duration::from_secs(5))
                .await
                .unwrap();
        }
        let task = Arc::clone(&cache).spawn_purge(Duration::from_secs(10));

        tokio::time::sleep(Duration::from_secs(11)).await;
        assert_eq!(cache.stats(), CacheStats::default());
        task.abort();
    }

    #[tokio::test]
    async fn test_huge_ttl_does_not_overflow() {
        let cache = MemoryCache::new();
        cache
            .put("k", "v".to_string(), Duration::MAX)
            .await
            .unwrap();
        assert_eq!(cache.get("k").await.unwrap().as_deref(), Some("v"));
    }

    #[tokio::test]
    async fn test_put_overwrites_and_delete_removes() {
        let cache = MemoryCache::new();
        let ttl = Duration::from_secs(60);
        cache.put("k", "old".to_string(), ttl).await.unwrap();
        cache.put("k", "new".to_string(), ttl).await.unwrap();
        assert_eq!(cache.get("k").await.unwrap().as_deref(), Some("new"));

        cache.delete("k").await.unwrap();
        assert_eq!(cache.get("k").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_stats_through_trait_object() {
        let cache: Arc<dyn FastCache> = Arc::new(MemoryCache::new());
        cache
            .put("graph:a", "{}".to_string(), Duration::from_secs(60))
            .await
            .unwrap();

        let stats = cache.stats().unwrap();
        assert_eq!(stats.live, 1);
        assert_eq!(stats.bytes, 2);
    }
}
