use std::sync::Arc;

use async_trait::async_trait;
use diesel::prelude::*;

use nexus_core::history::{NewSearch, SearchHistoryRepository, SearchRecord};
use nexus_core::Result;
use nexus_registry::Country;

use super::model::{NewSearchDB, SearchDB};
use crate::db::{get_connection, DbPool};
use crate::errors::{IntoCore, StorageError};
use crate::schema::search_history;

/// [`SearchHistoryRepository`] writing to the `search_history` table.
///
/// Shares its pool with [`crate::SqliteRecordStore`].
#[derive(Clone)]
pub struct SqliteSearchHistory {
    pool: Arc<DbPool>,
}

impl SqliteSearchHistory {
    pub fn new(pool: Arc<DbPool>) -> Self {
        Self { pool }
    }

    async fn blocking<F, T>(&self, job: F) -> Result<T>
    where
        F: FnOnce(&mut SqliteConnection) -> std::result::Result<T, StorageError> + Send + 'static,
        T: Send + 'static,
    {
        let pool = Arc::clone(&self.pool);
        tokio::task::spawn_blocking(move || {
            let mut conn = get_connection(&pool)?;
            job(&mut conn).into_core()
        })
        .await
        .into_core()?
    }
}

#[async_trait]
impl SearchHistoryRepository for SqliteSearchHistory {
    async fn record(&self, search: NewSearch) -> Result<()> {
        let row = NewSearchDB::from(search);
        self.blocking(move |conn| {
            diesel::insert_into(search_history::table)
                .values(&row)
                .execute(conn)?;
            Ok(())
        })
        .await
    }

    async fn recent(&self, limit: usize, country: Option<Country>) -> Result<Vec<SearchRecord>> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        self.blocking(move |conn| {
            let mut query = search_history::table
                .select(SearchDB::as_select())
                .order((search_history::searched_at.desc(), search_history::id.desc()))
                .limit(limit)
                .into_boxed();
            if let Some(country) = country {
                query = query.filter(search_history::country.eq(country.code()));
            }
            query
                .load::<SearchDB>(conn)?
                .into_iter()
                .map(SearchDB::decode)
                .collect()
        })
        .await
    }

    async fn count(&self) -> Result<u64> {
        self.blocking(|conn| {
            let rows: i64 = search_history::table.count().get_result(conn)?;
            Ok(u64::try_from(rows).unwrap_or_default())
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};
    use nexus_core::store::RecordStore;
    use tempfile::TempDir;

    use crate::SqliteRecordStore;

    fn open_history() -> (SqliteSearchHistory, SqliteRecordStore, TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.db");
        let store = SqliteRecordStore::open(path.to_str().unwrap()).unwrap();
        let history = SqliteSearchHistory::new(store.pool());
        (history, store, dir)
    }

    fn search(query: &str, country: Option<Country>, minutes: i64) -> NewSearch {
        NewSearch {
            query: query.to_string(),
            country,
            identifier: country.map(|c| format!("{}:registration-number:{}", c, query)),
            tier: "free".to_string(),
            outcome: "ok".to_string(),
            result_count: 4,
            risk_score: Some(6.5),
            searched_at: Utc.with_ymd_and_hms(2026, 10, 16, 9, 0, 0).unwrap()
                + Duration::minutes(minutes),
        }
    }

    #[tokio::test]
    async fn test_record_then_read_back() {
        let (history, _store, _dir) = open_history();
        let written = search("88888888", Some(Country::Sk), 0);

        history.record(written.clone()).await.unwrap();

        let read = history.recent(10, None).await.unwrap();
        assert_eq!(read.len(), 1);
        assert_eq!(read[0].id, 1);
        assert_eq!(read[0].search, written);
    }

    #[tokio::test]
    async fn test_recent_orders_limits_and_filters() {
        let (history, _store, _dir) = open_history();
        history
            .record(search("88888888", Some(Country::Sk), 0))
            .await
            .unwrap();
        history
            .record(search("27074358", Some(Country::Cz), 5))
            .await
            .unwrap();
        history
            .record(search("12345678", Some(Country::Sk), 10))
            .await
            .unwrap();
        history.record(search("hello?", None, 15)).await.unwrap();

        let latest = history.recent(2, None).await.unwrap();
        let queries: Vec<_> = latest.iter().map(|r| r.search.query.as_str()).collect();
        assert_eq!(queries, vec!["hello?", "12345678"]);

        let slovak = history.recent(10, Some(Country::Sk)).await.unwrap();
        let queries: Vec<_> = slovak.iter().map(|r| r.search.query.as_str()).collect();
        assert_eq!(queries, vec!["12345678", "88888888"]);

        assert!(history.recent(10, Some(Country::Hu)).await.unwrap().is_empty());
        assert_eq!(history.count().await.unwrap(), 4);
    }

    #[tokio::test]
    async fn test_history_and_records_share_the_database() {
        let (history, store, _dir) = open_history();
        history.record(search("hello?", None, 0)).await.unwrap();

        assert_eq!(store.count().await.unwrap(), 0);
        assert_eq!(history.count().await.unwrap(), 1);
    }
}
