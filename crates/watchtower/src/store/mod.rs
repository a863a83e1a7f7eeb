//! Store adapter
//!
//! Target records live in an external key-value store. [`KvStore`] is the
//! uniform surface over that store and [`TargetStore`] layers key derivation
//! and JSON encoding of [`Target`] records on top of it.
//!
//! ## Consistency
//! [`KvStore::put`] is an unconditional overwrite. Two writers that read the
//! same record and then both put it lose one of the updates. Stores that can
//! compare-and-swap advertise it through
//! [`KvStore::supports_conditional_put`] and implement [`KvStore::put_if`].

pub mod memory;
mod migrations;
pub mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::LibsqlStore;

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::model::{KEY_PREFIX, Target, target_key};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store backend error: {0}")]
    Backend(#[from] libsql::Error),

    #[error("store connection pool error: {0}")]
    Pool(String),

    #[error("failed to create store directory {path}: {source}")]
    CreateDirFailed { path: PathBuf, source: std::io::Error },

    #[error("record encoding error: {0}")]
    Codec(#[from] serde_json::Error),

    #[error("conditional writes are not supported by this store")]
    Unsupported,
}

/// Associative store with prefix listing.
///
/// Implementations must be safe to share between concurrently running probe
/// tasks.
#[async_trait]
pub trait KvStore: Send + Sync {
    /// Value stored under `key`, `None` if there is none
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Store `value` under `key`, replacing whatever was there
    async fn put(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Remove `key`. Removing a missing key is not an error.
    async fn delete(&self, key: &str) -> Result<(), StoreError>;

    /// Up to `limit` keys starting with `prefix`, in ascending order
    async fn list(&self, prefix: &str, limit: usize) -> Result<Vec<String>, StoreError>;

    /// Store `value` only if the current value equals `expected` (`None`
    /// meaning the key must be absent). Returns whether the write happened.
    async fn put_if(
        &self,
        _key: &str,
        _expected: Option<&str>,
        _value: &str,
    ) -> Result<bool, StoreError> {
        Err(StoreError::Unsupported)
    }

    fn supports_conditional_put(&self) -> bool {
        false
    }
}

/// Typed access to target records.
#[derive(Clone)]
pub struct TargetStore {
    inner: Arc<dyn KvStore>,
}

impl TargetStore {
    pub fn new(inner: Arc<dyn KvStore>) -> Self {
        Self { inner }
    }

    pub fn inner(&self) -> &Arc<dyn KvStore> {
        &self.inner
    }

    pub fn supports_conditional_put(&self) -> bool {
        self.inner.supports_conditional_put()
    }

    /// Keys of up to `limit` stored targets
    pub async fn list_keys(&self, limit: usize) -> Result<Vec<String>, StoreError> {
        self.inner.list(KEY_PREFIX, limit).await
    }

    /// Raw JSON stored under `key`
    pub async fn get_raw(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.inner.get(key).await
    }

    pub async fn get_target(&self, url: &str) -> Result<Option<Target>, StoreError> {
        match self.inner.get(&target_key(url)).await? {
            Some(raw) => Ok(Some(decode(&raw)?)),
            None => Ok(None),
        }
    }

    pub async fn put_target(&self, target: &Target) -> Result<(), StoreError> {
        self.inner.put(&target.key(), &encode(target)?).await
    }

    /// Write `target` only if the stored record still reads exactly `expected`.
    pub async fn put_target_if(
        &self,
        target: &Target,
        expected: Option<&str>,
    ) -> Result<bool, StoreError> {
        self.inner.put_if(&target.key(), expected, &encode(target)?).await
    }

    pub async fn delete_target(&self, url: &str) -> Result<(), StoreError> {
        self.inner.delete(&target_key(url)).await
    }
}

pub fn encode(target: &Target) -> Result<String, StoreError> {
    Ok(serde_json::to_string(target)?)
}

pub fn decode(raw: &str) -> Result<Target, StoreError> {
    Ok(serde_json::from_str(raw)?)
}
