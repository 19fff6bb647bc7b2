// src/collector.rs
//! One collection run: every adapter in order, merged into a single snapshot.
//!
//! A source failing never stops the run. Its placeholder section stays in
//! place and `fetchStatus` says why; consumers detect degradation from there.

use chrono::{DateTime, Utc};
use metrics::{counter, gauge, histogram};
use std::path::Path;

use crate::config::Settings;
use crate::error::Result;
use crate::fetch::HttpFetcher;
use crate::snapshot::Snapshot;
use crate::sources::{build_adapters, FetchContext, SourceAdapter, SourceId};
use crate::status::{FetchStatus, SourceOutcome, StatusMap, NOT_REGISTERED_NOTE};
use crate::writer;

/// Result of a run, before or after it was written.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub snapshot: Snapshot,
}

impl RunReport {
    pub fn statuses(&self) -> &StatusMap {
        &self.snapshot.fetch_status
    }

    pub fn ok_count(&self) -> usize {
        self.statuses().ok_count()
    }

    pub fn total(&self) -> usize {
        self.statuses().len()
    }

    /// No source produced data or was deliberately disabled.
    pub fn all_failed(&self) -> bool {
        self.total() > 0 && self.ok_count() == 0
    }
}

pub struct Collector {
    adapters: Vec<Box<dyn SourceAdapter>>,
    http: HttpFetcher,
}

impl Collector {
    pub fn new(adapters: Vec<Box<dyn SourceAdapter>>, http: HttpFetcher) -> Self {
        Self { adapters, http }
    }

    /// The six production adapters configured from `settings`.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        Ok(Self::new(
            build_adapters(settings),
            HttpFetcher::new(&settings.http)?,
        ))
    }

    pub async fn run(&self) -> RunReport {
        self.run_at(Utc::now()).await
    }

    /// Run every adapter once, with `now` as the run's clock.
    pub async fn run_at(&self, now: DateTime<Utc>) -> RunReport {
        tracing::info!(sources = self.adapters.len(), "starting collection run");
        let mut snapshot = Snapshot::fallback(now);
        let mut statuses = StatusMap::default();
        let ctx = FetchContext {
            http: &self.http,
            now,
        };

        for adapter in &self.adapters {
            let id = adapter.id();
            let outcome = self.collect_one(adapter.as_ref(), &ctx).await;
            statuses.record(id, FetchStatus::from_outcome(now, &outcome));
            counter!("occ_source_fetch_total", "source" => id.key(), "outcome" => outcome.label())
                .increment(1);

            match outcome {
                SourceOutcome::Live(summary) => {
                    tracing::info!(source = %id, "source ok");
                    snapshot.merge_live(summary);
                }
                SourceOutcome::Disabled => {
                    tracing::info!(source = %id, "source disabled, keeping mock data");
                }
                SourceOutcome::Degraded(e) => {
                    tracing::error!(
                        source = %id,
                        error = %e,
                        transient = e.is_retryable(),
                        "source failed, keeping mock data"
                    );
                }
            }
        }

        for id in SourceId::ALL {
            if !statuses.contains(id) {
                statuses.record(id, FetchStatus::disabled(now, NOT_REGISTERED_NOTE));
            }
            let api_url = self
                .adapters
                .iter()
                .find(|a| a.id() == id)
                .map(|a| a.api_url().to_string())
                .unwrap_or_else(|| id.default_url().to_string());
            snapshot.source_urls.insert(id, id.browse_url(&api_url));
        }

        snapshot.last_updated = crate::sources::iso_utc(now);
        snapshot.fetch_status = statuses;

        let report = RunReport { snapshot };
        gauge!("occ_run_sources_ok").set(report.ok_count() as f64);
        gauge!("occ_last_run_ts").set(now.timestamp() as f64);
        tracing::info!(
            ok = report.ok_count(),
            total = report.total(),
            "collection run complete"
        );
        report
    }

    async fn collect_one(&self, adapter: &dyn SourceAdapter, ctx: &FetchContext<'_>) -> SourceOutcome {
        if !adapter.is_enabled() {
            return SourceOutcome::Disabled;
        }
        let t0 = std::time::Instant::now();
        let res = adapter.collect(ctx).await;
        histogram!("occ_source_fetch_ms", "source" => adapter.id().key())
            .record(t0.elapsed().as_secs_f64() * 1_000.0);

        match res {
            Ok(summary) if summary.source() == adapter.id() => SourceOutcome::Live(summary),
            Ok(summary) => SourceOutcome::Degraded(crate::error::CollectError::parse(
                adapter.id().key(),
                format!("adapter returned a {} section", summary.source()),
            )),
            Err(e) => SourceOutcome::Degraded(e),
        }
    }

    /// Run and write the snapshot. Only a write failure is an error.
    pub async fn run_and_write(&self, path: &Path) -> anyhow::Result<RunReport> {
        let report = self.run().await;
        writer::write_snapshot(path, &report.snapshot)?;
        tracing::info!(path = %path.display(), "snapshot written");
        Ok(report)
    }
}
