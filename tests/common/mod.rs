#![allow(dead_code)]

use async_trait::async_trait;
use axum::Router;
use chrono::{DateTime, TimeZone, Utc};
use occ_collector::config::HttpSettings;
use occ_collector::fetch::HttpFetcher;
use occ_collector::sources::{FetchContext, SourceAdapter, SourceId, SourceSummary};
use occ_collector::CollectError;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Serve `router` on an ephemeral localhost port; returns `http://127.0.0.1:PORT`.
pub async fn spawn_stub(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind stub listener");
    let addr = listener.local_addr().expect("stub addr");
    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("stub server");
    });
    format!("http://{addr}")
}

/// A localhost URL nothing listens on.
pub async fn closed_port_url() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind throwaway listener");
    let addr = listener.local_addr().expect("throwaway addr");
    drop(listener);
    format!("http://{addr}/status")
}

/// Short delays so retry tests finish quickly.
pub fn fast_http(max_attempts: u32) -> HttpSettings {
    HttpSettings {
        verify_tls: false,
        timeout_secs: 5,
        max_attempts,
        retry_delay_ms: 10,
    }
}

pub fn fetcher(max_attempts: u32) -> HttpFetcher {
    HttpFetcher::new(&fast_http(max_attempts)).expect("build fetcher")
}

pub fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 12, 29, 12, 0, 0).unwrap()
}

pub fn ctx(http: &HttpFetcher) -> FetchContext<'_> {
    FetchContext {
        http,
        now: fixed_now(),
    }
}

#[derive(Clone, Default)]
pub struct HitCounter(Arc<AtomicUsize>);

impl HitCounter {
    pub fn hit(&self) -> usize {
        self.0.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn get(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}

/// Adapter returning a canned result without touching the network.
pub struct CannedAdapter {
    pub id: SourceId,
    pub enabled: bool,
    pub result: fn() -> Result<SourceSummary, CollectError>,
}

#[async_trait]
impl SourceAdapter for CannedAdapter {
    fn id(&self) -> SourceId {
        self.id
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn api_url(&self) -> &str {
        self.id.default_url()
    }

    async fn collect(&self, _ctx: &FetchContext<'_>) -> Result<SourceSummary, CollectError> {
        (self.result)()
    }
}
