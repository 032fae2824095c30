use std::sync::Arc;

use async_trait::async_trait;
use diesel::prelude::*;
use log::debug;

use nexus_core::store::RecordStore;
use nexus_core::Result;
use nexus_registry::{CanonicalRecord, Identifier};

use super::model::RecordDB;
use crate::db::{self, get_connection, DbPool};
use crate::errors::{IntoCore, StorageError};
use crate::schema::records;

/// [`RecordStore`] backed by a SQLite file.
///
/// Every call checks a connection out of the pool on the blocking thread
/// pool, so the async workers never wait on SQLite.
#[derive(Clone)]
pub struct SqliteRecordStore {
    pool: Arc<DbPool>,
}

impl SqliteRecordStore {
    pub fn new(pool: Arc<DbPool>) -> Self {
        Self { pool }
    }

    /// Create or open the database at `db_path` and bring its schema up to date.
    pub fn open(db_path: &str) -> Result<Self> {
        db::init(db_path)?;
        let pool = db::create_pool(db_path)?;
        db::run_migrations(&pool)?;
        Ok(Self::new(pool))
    }

    /// The pool this store draws connections from.
    pub fn pool(&self) -> Arc<DbPool> {
        Arc::clone(&self.pool)
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
impl RecordStore for SqliteRecordStore {
    async fn get(&self, identifier: &Identifier) -> Result<Option<CanonicalRecord>> {
        let key = identifier.key();
        self.blocking(move |conn| {
            let row = records::table
                .find(&key)
                .select(RecordDB::as_select())
                .first(conn)
                .optional()?;
            row.map(|row| row.decode()).transpose()
        })
        .await
    }

    async fn put(&self, identifier: &Identifier, record: &CanonicalRecord) -> Result<()> {
        let row = RecordDB::encode(identifier, record).into_core()?;
        self.blocking(move |conn| {
            diesel::insert_into(records::table)
                .values(&row)
                .on_conflict(records::record_key)
                .do_update()
                .set(&row)
                .execute(conn)?;
            debug!("Stored record {}", row.record_key);
            Ok(())
        })
        .await
    }

    async fn delete(&self, identifier: &Identifier) -> Result<bool> {
        let key = identifier.key();
        self.blocking(move |conn| {
            let removed = diesel::delete(records::table.find(&key)).execute(conn)?;
            Ok(removed > 0)
        })
        .await
    }

    async fn count(&self) -> Result<u64> {
        self.blocking(|conn| {
            let rows: i64 = records::table.count().get_result(conn)?;
            Ok(u64::try_from(rows).unwrap_or_default())
        })
        .await
    }
}
