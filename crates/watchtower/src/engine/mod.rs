//! Monitoring engine - runs select, probe, classify and write-back cycles
//!
//! One call to [`MonitoringEngine::run_cycle`] is one cycle:
//! - SELECTING: list the stored targets and keep the due ones
//! - PROBING: one task per due target probes it, classifies the outcome and
//!   writes the record back, all tasks joined before the cycle ends
//! - DONE
//!
//! Nothing about a cycle is persisted besides the per-target writes. A
//! trigger that arrives while a cycle is in flight is ignored, not queued.

mod guard;


use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use thiserror::Error;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use crate::config::{EngineConfig, WriteMode};
use crate::prober::Prober;
use crate::selector::{DueTarget, select_due};
use crate::store::{StoreError, TargetStore};
use guard::CycleGuard;

#[derive(Debug, Error)]
pub enum EngineError {
    /// Listing the stored targets failed, no target was probed
    #[error("failed to select due targets: {0}")]
    Selection(#[source] StoreError),

    #[error("conditional writes are configured but the store does not support them")]
    ConditionalWritesUnsupported,
}

/// Per-cycle counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleReport {
    /// Targets selected, one probe launched for each
    pub due: usize,
    /// Records written back
    pub written: usize,
    /// Conditional writes rejected because the record changed meanwhile
    pub stale: usize,
    /// Units whose write failed or that panicked
    pub failed: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    /// Another cycle of this engine was still running
    Skipped,
    Completed(CycleReport),
}

enum UnitOutcome {
    Written,
    Stale,
    WriteFailed,
}

/// Owns the probing side of the system. Each instance has its own cycle
/// flag, so several engines can live in one process.
pub struct MonitoringEngine {
    store: TargetStore,
    prober: Arc<dyn Prober>,
    config: EngineConfig,
    running: AtomicBool,
}

impl MonitoringEngine {
    pub fn new(
        store: TargetStore,
        prober: Arc<dyn Prober>,
        config: EngineConfig,
    ) -> Result<Self, EngineError> {
        if config.write_mode == WriteMode::Conditional && !store.supports_conditional_put() {
            return Err(EngineError::ConditionalWritesUnsupported);
        }

        Ok(Self { store, prober, config, running: AtomicBool::new(false) })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Whether a cycle is currently in flight
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Run one cycle using the current wall-clock time.
    pub async fn run_cycle_now(&self) -> Result<CycleOutcome, EngineError> {
        self.run_cycle(chrono::Utc::now().timestamp()).await
    }

    /// Run one cycle for a trigger fired at `now` (epoch seconds).
    ///
    /// Returns once every launched probe-and-write unit finished. Per-target
    /// failures are logged and counted, never returned; the only error is a
    /// selection that could not run.
    pub async fn run_cycle(&self, now: i64) -> Result<CycleOutcome, EngineError> {
        let Some(_guard) = CycleGuard::acquire(&self.running) else {
            info!("Monitoring cycle already in progress, ignoring trigger at {}", now);
            return Ok(CycleOutcome::Skipped);
        };

        debug!(phase = "SELECTING", now, "Selecting due targets");
        let floor = self.config.frequency_floor();
        let due = select_due(&self.store, now, self.config.list_limit, floor).await.map_err(|e| {
            error!("Error listing targets, cycle aborted: {}", e);
            EngineError::Selection(e)
        })?;

        let mut report = CycleReport { due: due.len(), ..CycleReport::default() };
        if due.is_empty() {
            info!("No targets due for checking");
            return Ok(CycleOutcome::Completed(report));
        }

        info!(phase = "PROBING", "Checking {} due targets", due.len());
        let mut units = self.spawn_units(due);

        while let Some(joined) = units.join_next().await {
            match joined {
                Ok(UnitOutcome::Written) => report.written += 1,
                Ok(UnitOutcome::Stale) => report.stale += 1,
                Ok(UnitOutcome::WriteFailed) => report.failed += 1,
                Err(e) => {
                    error!("Probe task did not complete: {}", e);
                    report.failed += 1;
                }
            }
        }

        info!(
            phase = "DONE",
            due = report.due,
            written = report.written,
            stale = report.stale,
            failed = report.failed,
            "Targets check complete"
        );
        Ok(CycleOutcome::Completed(report))
    }

    /// Launch one task per due target, gated by `max_in_flight` when set.
    fn spawn_units(&self, due: Vec<DueTarget>) -> JoinSet<UnitOutcome> {
        let limiter = self.config.max_in_flight.map(|n| Arc::new(Semaphore::new(n.max(1))));
        let mut units = JoinSet::new();

        for due_target in due {
            let store = self.store.clone();
            let prober = Arc::clone(&self.prober);
            let limiter = limiter.clone();
            let write_mode = self.config.write_mode;

            units.spawn(async move {
                let _permit = match limiter {
                    Some(limiter) => limiter.acquire_owned().await.ok(),
                    None => None,
                };
                probe_and_write(&store, prober.as_ref(), due_target, write_mode).await
            });
        }

        units
    }
}

/// Probe one target, fold the outcome into its record and write it back.
async fn probe_and_write(
    store: &TargetStore,
    prober: &dyn Prober,
    due: DueTarget,
    write_mode: WriteMode,
) -> UnitOutcome {
    let DueTarget { key, mut target, snapshot } = due;

    debug!(key = %key, "Checking target {}", target.url);
    let result = prober.probe(&target.url).await;
    target.record_probe(&result, chrono::Utc::now().timestamp());

    debug!(
        url = %target.url,
        status = %target.status,
        status_code = ?target.status_code,
        response_time_ms = ?target.response_time_ms,
        error = ?target.error,
        "Target checked"
    );

    let written = match write_mode {
        WriteMode::Overwrite => store.put_target(&target).await.map(|()| true),
        WriteMode::Conditional => store.put_target_if(&target, Some(&snapshot)).await,
    };

    match written {
        Ok(true) => UnitOutcome::Written,
        Ok(false) => {
            warn!("Record for {} changed during the check, result dropped", target.url);
            UnitOutcome::Stale
        }
        Err(e) => {
            error!("Error updating status for {}: {}", target.url, e);
            UnitOutcome::WriteFailed
        }
    }
}
