//! Target management
//!
//! Create, read, update and delete operations on target records, used by
//! the HTTP API. The monitoring engine never goes through here: it only
//! reads and updates records during a cycle.

use thiserror::Error;
use tracing::{info, warn};

use crate::badge::Badge;
use crate::config::EngineConfig;
use crate::model::{Target, clamp_frequency, target_key};
use crate::store::{StoreError, TargetStore, decode, encode};
use crate::validation::validate_target_url;

/// Attempts at a conditional frequency update before giving up
const UPDATE_ATTEMPTS: usize = 3;

#[derive(Debug, Error)]
pub enum TargetError {
    #[error("{0}")]
    InvalidUrl(String),

    #[error("Website already exists")]
    AlreadyExists,

    #[error("Website not found")]
    NotFound,

    #[error("Website is being updated concurrently, try again")]
    Contended,

    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Clone)]
pub struct TargetService {
    store: TargetStore,
    min_frequency: u64,
    list_limit: usize,
}

impl TargetService {
    pub fn new(store: TargetStore, config: &EngineConfig) -> Self {
        Self { store, min_frequency: config.frequency_floor(), list_limit: config.list_limit }
    }

    pub fn store(&self) -> &TargetStore {
        &self.store
    }

    /// Start monitoring `url` every `frequency` seconds (raised to the floor).
    pub async fn create(&self, url: &str, frequency: u64) -> Result<Target, TargetError> {
        validate_target_url(url).map_err(TargetError::InvalidUrl)?;

        let target =
            Target::new(url, clamp_frequency(frequency, self.min_frequency), chrono::Utc::now().timestamp());

        if self.store.supports_conditional_put() {
            if !self.store.put_target_if(&target, None).await? {
                return Err(TargetError::AlreadyExists);
            }
        } else {
            if self.store.get_raw(&target.key()).await?.is_some() {
                return Err(TargetError::AlreadyExists);
            }
            self.store.put_target(&target).await?;
        }

        info!("Website {} added to monitoring every {}s", target.url, target.frequency);
        Ok(target)
    }

    pub async fn get(&self, url: &str) -> Result<Target, TargetError> {
        self.store.get_target(url).await?.ok_or(TargetError::NotFound)
    }

    /// Every readable target, in key order. Unreadable records are skipped.
    pub async fn list(&self) -> Result<Vec<Target>, TargetError> {
        let keys = self.store.list_keys(self.list_limit).await?;
        let mut targets = Vec::with_capacity(keys.len());

        for key in keys {
            match self.store.get_raw(&key).await {
                Ok(Some(raw)) => match decode(&raw) {
                    Ok(target) => targets.push(target),
                    Err(e) => warn!("Skipping malformed record {}: {}", key, e),
                },
                Ok(None) => {}
                Err(e) => warn!("Skipping unreadable record {}: {}", key, e),
            }
        }

        Ok(targets)
    }

    /// Change the check interval of `url`. The floor is applied before the
    /// record is written.
    ///
    /// On stores with conditional writes the update is retried if a probe
    /// result lands in between, otherwise a concurrent write-back may be lost.
    pub async fn update_frequency(&self, url: &str, frequency: u64) -> Result<Target, TargetError> {
        let frequency = clamp_frequency(frequency, self.min_frequency);

        if !self.store.supports_conditional_put() {
            let mut target = self.get(url).await?;
            target.frequency = frequency;
            self.store.put_target(&target).await?;
            return Ok(target);
        }

        let key = target_key(url);
        for _ in 0..UPDATE_ATTEMPTS {
            let raw = self.store.get_raw(&key).await?.ok_or(TargetError::NotFound)?;
            let mut target = decode(&raw)?;
            target.frequency = frequency;

            if self.store.inner().put_if(&key, Some(&raw), &encode(&target)?).await? {
                info!("Website {} now checked every {}s", url, frequency);
                return Ok(target);
            }
        }

        warn!("Gave up updating {} after {} conflicting writes", url, UPDATE_ATTEMPTS);
        Err(TargetError::Contended)
    }

    /// Stop monitoring `url`. Deleting an unknown URL succeeds.
    pub async fn delete(&self, url: &str) -> Result<(), TargetError> {
        self.store.delete_target(url).await?;
        info!("Website {} removed from monitoring", url);
        Ok(())
    }

    /// Badge for the last known status of `url`
    pub async fn badge(&self, url: &str) -> Result<Badge, TargetError> {
        Ok(Badge::for_status(self.get(url).await?.status))
    }
}
