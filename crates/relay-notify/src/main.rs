//! Notification processor entry point
//!
//! Run with:
//! ```bash
//! cargo run -p relay-notify
//! ```
//!
//! Runs one guarded pass and exits, which suits cron. With
//! `NOTIFY_INTERVAL_SECS` set it keeps running a pass per interval until
//! interrupted.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use relay_cache::{LocalRunLock, RedisPool, RedisRunLock};
use relay_common::{try_init_tracing, AppConfig};
use relay_core::traits::RunLock;
use relay_db::{create_lazy_pool, DatabaseConfig};
use relay_notify::{AdapterSet, NotificationProcessor, NotifyRepositories, RunOutcome};
use tracing::{error, info, warn};

#[tokio::main]
async fn main() {
    // Initialize tracing
    if let Err(e) = try_init_tracing() {
        eprintln!("Warning: Failed to initialize tracing: {e}");
    }

    if let Err(e) = run().await {
        error!(error = %e, "Notification processor failed");
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    info!("Starting notification processor...");

    let config = AppConfig::from_env().context("Failed to load configuration")?;

    let pool = create_lazy_pool(&DatabaseConfig::from(&config.database))
        .context("Invalid database configuration")?;
    let repos = NotifyRepositories::postgres(pool);

    let lock: Arc<dyn RunLock> = match &config.redis {
        Some(redis) => {
            let pool = RedisPool::from_config(redis).context("Failed to create Redis pool")?;
            info!("Using Redis run lock");
            Arc::new(RedisRunLock::new(pool))
        }
        None => {
            warn!("REDIS_URL not set; run lock only guards this process");
            Arc::new(LocalRunLock::new())
        }
    };

    let adapters = AdapterSet::from_config(&config.notify, repos.in_app.clone())?;
    info!(adapters = ?adapters, "Channel adapters ready");

    let interval = config.notify.interval_secs;
    let processor = NotificationProcessor::new(repos, adapters, lock, config.notify);

    let Some(secs) = interval else {
        log_outcome(&processor.run().await?);
        return Ok(());
    };

    let mut ticker = tokio::time::interval(Duration::from_secs(secs.max(1)));
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    info!(interval_secs = secs, "Running on an interval");

    loop {
        tokio::select! {
            _ = ticker.tick() => match processor.run().await {
                Ok(outcome) => log_outcome(&outcome),
                Err(e) => warn!(error = %e, "Run failed"),
            },
            _ = tokio::signal::ctrl_c() => {
                info!("Shutdown signal received");
                return Ok(());
            }
        }
    }
}

fn log_outcome(outcome: &RunOutcome) {
    match outcome {
        RunOutcome::Skipped => info!("Run skipped; lock held elsewhere"),
        RunOutcome::Completed(report) => match serde_json::to_string(report) {
            Ok(json) => info!(report = %json, "Run complete"),
            Err(_) => info!(picked = report.picked, "Run complete"),
        },
    }
}
