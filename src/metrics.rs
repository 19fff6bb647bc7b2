// src/metrics.rs
//! Prometheus exposition for the collector series.

use anyhow::{Context, Result};
use axum::{routing::get, Router};
use metrics::{describe_counter, describe_gauge, describe_histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::net::SocketAddr;

pub struct Metrics {
    pub handle: PrometheusHandle,
}

impl Metrics {
    /// Install the global Prometheus recorder and describe the collector series.
    pub fn init() -> Result<Self> {
        let handle = PrometheusBuilder::new()
            .install_recorder()
            .context("prometheus: install recorder")?;
        describe();
        Ok(Self { handle })
    }

    pub fn from_handle(handle: PrometheusHandle) -> Self {
        Self { handle }
    }

    /// `/metrics` in the Prometheus exposition format, plus a plain `/health`.
    pub fn router(&self) -> Router {
        let handle = self.handle.clone();
        Router::new()
            .route(
                "/metrics",
                get(move || {
                    let h = handle.clone();
                    async move { h.render() }
                }),
            )
            .route("/health", get(|| async { "OK" }))
    }

    /// Serve the router until the process exits.
    pub async fn serve(&self, addr: SocketAddr) -> Result<()> {
        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .with_context(|| format!("binding metrics listener on {addr}"))?;
        tracing::info!(%addr, "metrics endpoint listening");
        axum::serve(listener, self.router())
            .await
            .context("metrics server")
    }
}

fn describe() {
    describe_counter!(
        "occ_source_fetch_total",
        "Source adapter runs by source and outcome."
    );
    describe_histogram!("occ_source_fetch_ms", "Source fetch+parse time in milliseconds.");
    describe_counter!("occ_http_retries_total", "HTTP attempts that were retried.");
    describe_gauge!("occ_run_sources_ok", "Sources ok (live or disabled) in the last run.");
    describe_gauge!("occ_last_run_ts", "Unix ts of the last collection run.");
    describe_counter!("occ_runs_total", "Collection runs started in loop mode.");
}
