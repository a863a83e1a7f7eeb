use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinSet;
use tokio::time::{MissedTickBehavior, interval};
use tracing::{error, info, warn};
use watchtower::{CycleOutcome, EngineError, MonitoringEngine};

/// What a scheduler run triggered
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub triggers: usize,
    pub completed: usize,
    /// Triggers that found a cycle already in flight
    pub skipped: usize,
    pub failed: usize,
}

/// Fires the engine at a fixed period.
///
/// Each tick starts its own cycle task, so a slow cycle never delays the
/// next trigger. The engine turns overlapping triggers into no-ops.
pub struct Scheduler {
    engine: Arc<MonitoringEngine>,
    tick: Duration,
}

impl Scheduler {
    pub fn new(engine: Arc<MonitoringEngine>, tick: Duration) -> Self {
        Self { engine, tick }
    }

    /// Trigger on every tick, the first one immediately, until `shutdown`
    /// resolves. Cycles still in flight at that point are awaited.
    pub async fn run(self, shutdown: impl Future<Output = ()>) -> RunSummary {
        let mut ticker = interval(self.tick);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        let mut cycles = JoinSet::new();
        let mut summary = RunSummary::default();
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = &mut shutdown => break,
                _ = ticker.tick() => {
                    summary.triggers += 1;
                    let engine = Arc::clone(&self.engine);
                    let now = chrono::Utc::now().timestamp();
                    cycles.spawn(async move { engine.run_cycle(now).await });
                }
                Some(joined) = cycles.join_next(), if !cycles.is_empty() => {
                    tally(&mut summary, joined);
                }
            }
        }

        if !cycles.is_empty() {
            info!("Waiting for {} in-flight cycle(s)", cycles.len());
        }
        while let Some(joined) = cycles.join_next().await {
            tally(&mut summary, joined);
        }

        summary
    }
}

fn tally(summary: &mut RunSummary, joined: Result<Result<CycleOutcome, EngineError>, tokio::task::JoinError>) {
    match joined {
        Ok(Ok(CycleOutcome::Completed(_))) => summary.completed += 1,
        Ok(Ok(CycleOutcome::Skipped)) => summary.skipped += 1,
        Ok(Err(e)) => {
            warn!("Monitoring cycle failed: {}", e);
            summary.failed += 1;
        }
        Err(e) => {
            error!("Monitoring cycle task did not complete: {}", e);
            summary.failed += 1;
        }
    }
}
