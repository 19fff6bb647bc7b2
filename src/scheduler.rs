// src/scheduler.rs
use metrics::counter;
use std::path::Path;
use std::time::Duration;
use tokio::time::MissedTickBehavior;

use crate::collector::Collector;

/// Loop mode for hosts without cron: run, write, wait, repeat.
///
/// Runs are awaited inline so two never overlap; a slow run delays the next
/// tick instead of bunching ticks up. Returns on Ctrl-C, or with the error of
/// a failed snapshot write.
pub async fn run_every(
    collector: &Collector,
    output: &Path,
    interval: Duration,
) -> anyhow::Result<()> {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = tokio::signal::ctrl_c() => {
                tracing::info!(target: "scheduler", "shutdown requested");
                return Ok(());
            }
        }

        let report = collector.run_and_write(output).await?;
        counter!("occ_runs_total").increment(1);
        tracing::info!(
            target: "scheduler",
            ok = report.ok_count(),
            total = report.total(),
            next_in_secs = interval.as_secs(),
            "scheduled run finished"
        );
    }
}
