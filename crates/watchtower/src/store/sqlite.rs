use std::path::Path;

use async_trait::async_trait;
use deadpool::managed::Object;
use libsql::params;
use tracing::info;

use super::migrations::run_migrations;
use super::{KvStore, StoreError};
use crate::pool::{LibsqlManager, LibsqlPool};

/// Key-value store on a local libsql database file.
///
/// Every call checks a connection out of the pool, so concurrent probe tasks
/// each get their own connection.
pub struct LibsqlStore {
    pool: LibsqlPool,
}

impl LibsqlStore {
    /// Open (or create) the database at `path` and apply the schema.
    pub async fn open(path: impl AsRef<Path>, max_connections: usize) -> Result<Self, StoreError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .map_err(|source| StoreError::CreateDirFailed { path: parent.to_path_buf(), source })?;
        }

        let database = libsql::Builder::new_local(path).build().await?;
        let pool = LibsqlPool::builder(LibsqlManager::new(database))
            .max_size(max_connections.max(1))
            .build()
            .map_err(|e| StoreError::Pool(e.to_string()))?;

        let store = Self::from_pool(pool);
        run_migrations(&*store.conn().await?).await?;
        info!("Opened key-value store at {}", path.display());

        Ok(store)
    }

    /// Wrap an existing pool. The schema is assumed to be in place.
    pub fn from_pool(pool: LibsqlPool) -> Self {
        Self { pool }
    }

    async fn conn(&self) -> Result<Object<LibsqlManager>, StoreError> {
        self.pool.get().await.map_err(|e| StoreError::Pool(e.to_string()))
    }
}

#[async_trait]
impl KvStore for LibsqlStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let conn = self.conn().await?;
        let mut rows = conn.query("SELECT value FROM kv_entries WHERE key = ?1", params![key]).await?;

        match rows.next().await? {
            Some(row) => Ok(Some(row.get::<String>(0)?)),
            None => Ok(None),
        }
    }

    async fn put(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let conn = self.conn().await?;
        conn.execute(
            "INSERT INTO kv_entries (key, value, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            params![key, value, chrono::Utc::now().timestamp()],
        )
        .await?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        let conn = self.conn().await?;
        conn.execute("DELETE FROM kv_entries WHERE key = ?1", params![key]).await?;
        Ok(())
    }

    async fn list(&self, prefix: &str, limit: usize) -> Result<Vec<String>, StoreError> {
        let conn = self.conn().await?;
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let mut rows = conn
            .query(
                "SELECT key FROM kv_entries WHERE substr(key, 1, length(?1)) = ?1 ORDER BY key LIMIT ?2",
                params![prefix, limit],
            )
            .await?;

        let mut keys = Vec::new();
        while let Some(row) = rows.next().await? {
            keys.push(row.get::<String>(0)?);
        }
        Ok(keys)
    }

    async fn put_if(
        &self,
        key: &str,
        expected: Option<&str>,
        value: &str,
    ) -> Result<bool, StoreError> {
        let conn = self.conn().await?;
        let now = chrono::Utc::now().timestamp();

        let changed = match expected {
            None => {
                conn.execute(
                    "INSERT OR IGNORE INTO kv_entries (key, value, updated_at) VALUES (?1, ?2, ?3)",
                    params![key, value, now],
                )
                .await?
            }
            Some(expected) => {
                conn.execute(
                    "UPDATE kv_entries SET value = ?1, updated_at = ?2 WHERE key = ?3 AND value = ?4",
                    params![value, now, key, expected],
                )
                .await?
            }
        };

        Ok(changed == 1)
    }

    fn supports_conditional_put(&self) -> bool {
        true
    }
}
