use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use watchtower::{Config, CycleOutcome, HttpProber, MonitoringEngine, TargetStore, open_store};

mod scheduler;

use scheduler::Scheduler;

#[derive(Debug, Parser)]
#[command(name = "watchtower-service", version, about = "Periodic website availability checks")]
struct Cli {
    /// Path of the TOML configuration, created with defaults if missing
    #[arg(short, long, env = "WATCHTOWER_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Trigger a monitoring cycle on every scheduler tick until interrupted
    Run,
    /// Run a single monitoring cycle and exit
    Once,
    /// Print the effective configuration
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    logger::init_tracing();

    let cli = Cli::parse();
    let config = Config::from_config(cli.config.as_ref()).context("failed to load configuration")?;

    match cli.command.unwrap_or(Command::Run) {
        Command::Run => {
            let engine = build_engine(&config).await?;
            let tick = Duration::from_secs(config.scheduler.tick_seconds.max(1));
            info!("Starting watchtower scheduler, one trigger every {}s", tick.as_secs());

            let summary = Scheduler::new(engine, tick).run(shutdown_signal()).await;
            info!(
                triggers = summary.triggers,
                completed = summary.completed,
                skipped = summary.skipped,
                failed = summary.failed,
                "Scheduler stopped"
            );
        }
        Command::Once => {
            let engine = build_engine(&config).await?;
            match engine.run_cycle_now().await? {
                CycleOutcome::Completed(report) => println!(
                    "due: {}, written: {}, stale: {}, failed: {}",
                    report.due, report.written, report.stale, report.failed
                ),
                CycleOutcome::Skipped => println!("a cycle was already running"),
            }
        }
        Command::Config => print!("{config}"),
    }

    Ok(())
}

async fn build_engine(config: &Config) -> Result<Arc<MonitoringEngine>> {
    let kv = open_store(&config.store).await.context("failed to open target store")?;
    let prober = HttpProber::new(&config.probe).context("failed to build HTTP client")?;
    let engine = MonitoringEngine::new(TargetStore::new(kv), Arc::new(prober), config.engine.clone())?;
    Ok(Arc::new(engine))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown requested, waiting for the running cycle to finish");
}
