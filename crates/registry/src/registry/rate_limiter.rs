//! Non-blocking token bucket rate limiter.
//!
//! One bucket per key. The engine keys buckets by caller tier (`tier:free`,
//! `tier:pro`, ...) for inbound volume and by provider id for outbound volume
//! against each registry. Keys never share a bucket, so exhausting one can
//! never starve another.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, RwLock};
use std::time::{Duration, Instant};

use log::{debug, warn};
use serde::{Deserialize, Serialize};

/// Default rate limit: 30 requests per minute.
const DEFAULT_REQUESTS_PER_MINUTE: u32 = 30;

/// Default bucket capacity (allows bursting).
const DEFAULT_BUCKET_CAPACITY: u32 = 30;

/// Token bucket for a single key.
#[derive(Debug)]
struct TokenBucket {
    /// Current number of available tokens.
    tokens: f64,
    /// Last time the bucket was updated.
    last_update: Instant,
    /// Token refill rate (tokens per second).
    rate: f64,
    /// Maximum bucket capacity.
    capacity: f64,
}

impl TokenBucket {
    fn with_config(config: &RateLimitConfig) -> Self {
        let capacity = f64::from(config.burst_capacity);
        Self {
            tokens: capacity,
            last_update: Instant::now(),
            rate: f64::from(config.requests_per_minute) / 60.0,
            capacity,
        }
    }

    /// Refill tokens based on elapsed time.
    fn refill(&mut self) {
        let now = Instant::now();
        let elapsed = now.duration_since(self.last_update).as_secs_f64();

        self.tokens = (self.tokens + elapsed * self.rate).min(self.capacity);
        self.last_update = now;
    }

    /// Try to take one token. Returns false when the bucket is empty.
    fn try_acquire(&mut self) -> bool {
        self.refill();

        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            true
        } else {
            false
        }
    }

    /// Wait until one token will be available.
    fn time_until_available(&mut self) -> Duration {
        self.refill();

        if self.tokens >= 1.0 {
            Duration::ZERO
        } else if self.rate <= 0.0 {
            Duration::MAX
        } else {
            Duration::from_secs_f64((1.0 - self.tokens) / self.rate)
        }
    }
}

/// Bucket configuration.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct RateLimitConfig {
    /// Steady-state refill, in requests per minute.
    pub requests_per_minute: u32,
    /// Bucket capacity: how many calls may succeed back to back.
    pub burst_capacity: u32,
}

impl RateLimitConfig {
    pub fn new(requests_per_minute: u32, burst_capacity: u32) -> Self {
        Self {
            requests_per_minute,
            burst_capacity,
        }
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self::new(DEFAULT_REQUESTS_PER_MINUTE, DEFAULT_BUCKET_CAPACITY)
    }
}

/// Outcome of a rejected acquisition.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct RateLimited {
    /// Time until one token is available again.
    pub retry_after: Duration,
}

/// Token level and limits of one configured key.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BucketStats {
    pub key: String,
    pub tokens: f64,
    pub requests_per_minute: u32,
    pub burst_capacity: u32,
}

/// Token bucket rate limiter for many independent keys.
///
/// Buckets are created on demand from the key's configuration, falling back
/// to the limiter's default configuration for unknown keys. Each bucket has
/// its own lock.
pub struct RateLimiter {
    buckets: RwLock<HashMap<String, Arc<Mutex<TokenBucket>>>>,
    configs: RwLock<HashMap<String, RateLimitConfig>>,
    default_config: RateLimitConfig,
}

impl RateLimiter {
    /// Create a new rate limiter with default settings.
    pub fn new() -> Self {
        Self::with_default(RateLimitConfig::default())
    }

    /// Create a rate limiter whose unconfigured keys use `default_config`.
    pub fn with_default(default_config: RateLimitConfig) -> Self {
        Self {
            buckets: RwLock::new(HashMap::new()),
            configs: RwLock::new(HashMap::new()),
            default_config,
        }
    }

    /// Lock a bucket, recovering from poison if necessary.
    ///
    /// The worst case after recovery is slightly incorrect rate limiting,
    /// which is better than panicking.
    fn lock_bucket(bucket: &Mutex<TokenBucket>) -> MutexGuard<'_, TokenBucket> {
        bucket.lock().unwrap_or_else(|poisoned| {
            warn!("Rate limiter bucket mutex was poisoned, recovering");
            poisoned.into_inner()
        })
    }

    fn config_for(&self, key: &str) -> RateLimitConfig {
        let configs = self.configs.read().unwrap_or_else(|poisoned| {
            warn!("Rate limiter configs lock was poisoned, recovering");
            poisoned.into_inner()
        });
        configs
            .get(key)
            .cloned()
            .unwrap_or_else(|| self.default_config.clone())
    }

    /// Configure limits for a key. An existing bucket is replaced (full).
    pub fn configure(&self, key: &str, config: RateLimitConfig) {
        {
            let mut configs = self.configs.write().unwrap_or_else(|poisoned| {
                warn!("Rate limiter configs lock was poisoned, recovering");
                poisoned.into_inner()
            });
            configs.insert(key.to_string(), config);
        }

        // Release configs lock before touching buckets
        self.reset(key);
    }

    fn bucket(&self, key: &str) -> Arc<Mutex<TokenBucket>> {
        {
            let buckets = self.buckets.read().unwrap_or_else(|poisoned| {
                warn!("Rate limiter buckets lock was poisoned, recovering");
                poisoned.into_inner()
            });
            if let Some(bucket) = buckets.get(key) {
                return Arc::clone(bucket);
            }
        }

        let config = self.config_for(key);
        let mut buckets = self.buckets.write().unwrap_or_else(|poisoned| {
            warn!("Rate limiter buckets lock was poisoned, recovering");
            poisoned.into_inner()
        });
        Arc::clone(
            buckets
                .entry(key.to_string())
                .or_insert_with(|| Arc::new(Mutex::new(TokenBucket::with_config(&config)))),
        )
    }

    /// Try to take a token for `key` without waiting.
    pub fn try_acquire(&self, key: &str) -> Result<(), RateLimited> {
        let bucket = self.bucket(key);
        let mut bucket = Self::lock_bucket(&bucket);

        if bucket.try_acquire() {
            debug!("Rate limiter: acquired token for '{}'", key);
            Ok(())
        } else {
            let retry_after = bucket.time_until_available();
            debug!(
                "Rate limiter: '{}' exhausted, retry after {:?}",
                key, retry_after
            );
            Err(RateLimited { retry_after })
        }
    }

    /// Current token level for a key (full capacity for untouched keys).
    pub fn remaining_tokens(&self, key: &str) -> f64 {
        let bucket = {
            let buckets = self.buckets.read().unwrap_or_else(|poisoned| {
                warn!("Rate limiter buckets lock was poisoned, recovering");
                poisoned.into_inner()
            });
            buckets.get(key).cloned()
        };

        match bucket {
            Some(bucket) => {
                let mut bucket = Self::lock_bucket(&bucket);
                bucket.refill();
                bucket.tokens
            }
            None => f64::from(self.config_for(key).burst_capacity),
        }
    }

    /// Every configured key with its current token level, sorted by key.
    pub fn stats(&self) -> Vec<BucketStats> {
        let mut configured: Vec<(String, RateLimitConfig)> = {
            let configs = self.configs.read().unwrap_or_else(|poisoned| {
                warn!("Rate limiter configs lock was poisoned, recovering");
                poisoned.into_inner()
            });
            configs
                .iter()
                .map(|(key, config)| (key.clone(), config.clone()))
                .collect()
        };
        configured.sort_by(|a, b| a.0.cmp(&b.0));

        configured
            .into_iter()
            .map(|(key, config)| BucketStats {
                tokens: self.remaining_tokens(&key),
                key,
                requests_per_minute: config.requests_per_minute,
                burst_capacity: config.burst_capacity,
            })
            .collect()
    }

    /// Refill a key's bucket to capacity.
    pub fn reset(&self, key: &str) {
        let mut buckets = self.buckets.write().unwrap_or_else(|poisoned| {
            warn!("Rate limiter buckets lock was poisoned, recovering");
            poisoned.into_inner()
        });
        buckets.remove(key);
    }

    /// Refill every bucket.
    pub fn reset_all(&self) {
        let mut buckets = self.buckets.write().unwrap_or_else(|poisoned| {
            warn!("Rate limiter buckets lock was poisoned, recovering");
            poisoned.into_inner()
        });
        buckets.clear();
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new()
    }
}
