use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use log::warn;

use nexus_registry::Country;

use super::{NewSearch, SearchHistoryRepository, SearchRecord};
use crate::errors::Result;

/// Searches kept when no capacity is given.
const DEFAULT_CAPACITY: usize = 1_000;

struct Window {
    next_id: i64,
    /// Oldest first.
    searches: VecDeque<SearchRecord>,
}

/// [`SearchHistoryRepository`] that keeps the latest `capacity` searches.
///
/// Older searches are dropped as new ones arrive; `count` reports what is
/// still held.
pub struct MemorySearchHistory {
    capacity: usize,
    window: Mutex<Window>,
}

impl MemorySearchHistory {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            window: Mutex::new(Window {
                next_id: 1,
                searches: VecDeque::new(),
            }),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Window> {
        self.window.lock().unwrap_or_else(|poisoned| {
            warn!("Search history lock poisoned, recovering");
            poisoned.into_inner()
        })
    }
}

impl Default for MemorySearchHistory {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SearchHistoryRepository for MemorySearchHistory {
    async fn record(&self, search: NewSearch) -> Result<()> {
        let mut window = self.lock();
        let id = window.next_id;
        window.next_id += 1;
        if window.searches.len() == self.capacity {
            window.searches.pop_front();
        }
        window.searches.push_back(SearchRecord { id, search });
        Ok(())
    }

    async fn recent(&self, limit: usize, country: Option<Country>) -> Result<Vec<SearchRecord>> {
        let window = self.lock();
        Ok(window
            .searches
            .iter()
            .rev()
            .filter(|record| country.is_none() || record.search.country == country)
            .take(limit)
            .cloned()
            .collect())
    }

    async fn count(&self) -> Result<u64> {
        Ok(self.lock().searches.len() as u64)
    }
}
