// src/sources/bums.rs
//! BUMS (Unix monitoring) server status.
//!
//! Newer BUMS builds expose `{"servers": [...]}`; older ones only render an HTML
//! table. The JSON parse runs first and the table scrape is used when the body
//! is not JSON at all.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::{as_text, iso_utc, FetchContext, SourceAdapter, SourceId, SourceSummary};
use crate::config::SourceConfig;
use crate::error::{CollectError, Result};
use crate::fetch::FetchRequest;

pub const DOWN_LIST_CAP: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DownServer {
    pub name: String,
    pub since: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ServerCounts {
    pub total: u32,
    pub up: u32,
    pub down: u32,
    pub down_list: Vec<DownServer>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FilesystemAlert {
    pub server: String,
    pub mount: String,
    pub usage: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FilesystemAlerts {
    pub alerts: u32,
    pub alert_list: Vec<FilesystemAlert>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BumsSummary {
    pub servers: ServerCounts,
    pub filesystem: FilesystemAlerts,
}

/// Rows stay untyped until read field by field, so one odd row cannot sink the feed.
#[derive(Debug, Default, Deserialize)]
struct StatusFeed {
    #[serde(default)]
    servers: Option<Vec<serde_json::Value>>,
}

#[derive(Debug, Default, Deserialize)]
struct ServerEntry {
    #[serde(default)]
    hostname: Option<serde_json::Value>,
    #[serde(default)]
    status: Option<serde_json::Value>,
    #[serde(default)]
    last_seen: Option<serde_json::Value>,
}

impl ServerEntry {
    fn text(v: &Option<serde_json::Value>) -> Option<String> {
        v.as_ref().and_then(as_text).filter(|s| !s.trim().is_empty())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Status {
    Up,
    Down,
    Other,
}

impl Status {
    fn parse(s: &str) -> Self {
        if s.trim().eq_ignore_ascii_case("up") {
            Self::Up
        } else if s.trim().eq_ignore_ascii_case("down") {
            Self::Down
        } else {
            Self::Other
        }
    }
}

/// Tally `(name, status, last_seen)` rows; down list keeps input order.
fn tally<I>(rows: I, now: DateTime<Utc>) -> ServerCounts
where
    I: IntoIterator<Item = (String, Status, Option<String>)>,
{
    let mut out = ServerCounts::default();
    for (name, status, last_seen) in rows {
        match status {
            Status::Up => out.up += 1,
            Status::Down => {
                out.down += 1;
                if out.down_list.len() < DOWN_LIST_CAP {
                    out.down_list.push(DownServer {
                        name,
                        since: last_seen.unwrap_or_else(|| iso_utc(now)),
                    });
                }
            }
            Status::Other => {}
        }
    }
    out.total = out.up + out.down;
    out
}

/// Primary parse of the JSON status feed.
///
/// Fails only when the body is not JSON. A JSON document of another shape
/// yields zeros; rows with missing or oddly typed fields count as "other".
pub fn parse_json(body: &str, now: DateTime<Utc>) -> Result<ServerCounts> {
    let doc: serde_json::Value = serde_json::from_str(body)
        .map_err(|e| CollectError::parse(SourceId::Bums.key(), e.to_string()))?;
    let feed: StatusFeed = serde_json::from_value(doc).unwrap_or_default();
    let rows = feed.servers.unwrap_or_default().into_iter().map(|row| {
        let s: ServerEntry = serde_json::from_value(row).unwrap_or_default();
        (
            ServerEntry::text(&s.hostname).unwrap_or_else(|| "unknown".to_string()),
            ServerEntry::text(&s.status)
                .map(|v| Status::parse(&v))
                .unwrap_or(Status::Other),
            ServerEntry::text(&s.last_seen),
        )
    });
    Ok(tally(rows, now))
}

static RE_ROW: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)<tr.*?<td>(srv-[^<]+)</td>.*?<td>(UP|DOWN)</td>").unwrap()
});

/// Fallback scrape of the HTML status table. Never fails; no rows means zeros.
pub fn extract_html(body: &str, now: DateTime<Utc>) -> ServerCounts {
    let rows = RE_ROW.captures_iter(body).map(|cap| {
        let name = html_escape::decode_html_entities(cap[1].trim()).to_string();
        (name, Status::parse(&cap[2]), None)
    });
    tally(rows, now)
}

/// JSON first, table scrape when the body is not a JSON status feed.
pub fn parse_status(body: &str, now: DateTime<Utc>) -> ServerCounts {
    match parse_json(body, now) {
        Ok(counts) => counts,
        Err(e) => {
            tracing::debug!(source = "bums", error = %e, "not JSON, scraping status table");
            extract_html(body, now)
        }
    }
}

pub struct BumsAdapter {
    cfg: SourceConfig,
}

impl BumsAdapter {
    pub fn new(cfg: SourceConfig) -> Self {
        Self { cfg }
    }
}

#[async_trait]
impl SourceAdapter for BumsAdapter {
    fn id(&self) -> SourceId {
        SourceId::Bums
    }

    fn is_enabled(&self) -> bool {
        self.cfg.enabled
    }

    fn api_url(&self) -> &str {
        &self.cfg.url
    }

    async fn collect(&self, ctx: &FetchContext<'_>) -> Result<SourceSummary> {
        let req = FetchRequest::get(&self.cfg.url)
            .for_source(SourceId::Bums)
            .basic_auth_opt(self.cfg.basic_auth());
        let body = ctx.http.fetch(&req).await?;

        Ok(SourceSummary::Bums(BumsSummary {
            servers: parse_status(&body, ctx.now),
            filesystem: FilesystemAlerts::default(),
        }))
    }
}
