//! Fast cache tier.
//!
//! The fast cache is an optimization, never a source of truth: every failure
//! (error, timeout, undecodable entry) is logged and treated as a miss by
//! [`CacheLayer`].

mod cache_layer;
mod cache_traits;
mod memory_cache;

pub use cache_layer::{graph_key, record_key, CacheLayer, CachedLookup};
pub use cache_traits::{CacheStats, FastCache};
pub use memory_cache::MemoryCache;
