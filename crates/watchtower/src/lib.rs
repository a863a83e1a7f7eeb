//! # watchtower
//!
//! Periodic website availability monitoring.
//!
//! Targets (a URL and a check interval) are kept in a key-value store. Each
//! time the engine is triggered it selects the targets whose interval has
//! elapsed, probes them concurrently over HTTP, classifies each outcome and
//! writes the result back to the target's record.
//!
//! ## Modules
//! - [`model`]: the target record and its wire format
//! - [`store`]: key-value store adapter (libsql and in-memory)
//! - [`prober`] / [`classifier`]: one HTTP probe and its verdict
//! - [`selector`]: which targets are due
//! - [`engine`]: the monitoring cycle
//! - [`targets`] / [`badge`]: management operations used by the API

pub mod badge;
pub mod classifier;
pub mod config;
pub mod engine;
pub mod model;
pub mod pool;
pub mod prober;
pub mod selector;
pub mod store;
pub mod targets;
pub mod validation;

pub use badge::Badge;
pub use classifier::classify;
pub use config::{Config, EngineConfig, ProbeConfig, StoreBackend, StoreConfig, WriteMode};
pub use engine::{CycleOutcome, CycleReport, EngineError, MonitoringEngine};
pub use model::{KEY_PREFIX, Target, TargetStatus, target_key};
pub use prober::{HttpProber, ProbeResult, Prober};
pub use selector::{DueTarget, is_due, select_due};
pub use store::{KvStore, LibsqlStore, MemoryStore, StoreError, TargetStore};
pub use targets::{TargetError, TargetService};

use std::sync::Arc;

/// Open the store described by `config`.
pub async fn open_store(config: &StoreConfig) -> Result<Arc<dyn KvStore>, StoreError> {
    match config.backend {
        StoreBackend::Libsql => Ok(Arc::new(LibsqlStore::open(&config.path, config.max_connections).await?)),
        StoreBackend::Memory => Ok(Arc::new(MemoryStore::new())),
    }
}
