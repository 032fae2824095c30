use async_trait::async_trait;

use nexus_registry::Country;

use super::{NewSearch, SearchRecord};
use crate::errors::Result;

/// Append-only log of searches.
#[async_trait]
pub trait SearchHistoryRepository: Send + Sync {
    async fn record(&self, search: NewSearch) -> Result<()>;

    /// Up to `limit` searches, newest first, optionally for one country.
    async fn recent(&self, limit: usize, country: Option<Country>) -> Result<Vec<SearchRecord>>;

    async fn count(&self) -> Result<u64>;
}
