// src/sources/audit.rs
//! Configuration audit report.
//!
//! The report service answers with JSON when it can; legacy report hosts
//! serve a free text listing such as `srv-web-001: /etc/hosts modified`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::{as_text, iso_utc, FetchContext, SourceAdapter, SourceId, SourceSummary};
use crate::config::SourceConfig;
use crate::error::{CollectError, Result};
use crate::fetch::FetchRequest;

pub const ALERTS_CAP: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigChange {
    pub server: String,
    pub file: String,
    pub change: String,
    pub time: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ConfigChanges {
    /// Every change found, including those past the list cap.
    pub total: u32,
    pub alerts: Vec<ConfigChange>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuditSummary {
    pub last_scan: String,
    pub config_changes: ConfigChanges,
}

#[derive(Debug, Default, Deserialize)]
struct Report {
    #[serde(default)]
    changes: Option<Vec<serde_json::Value>>,
}

#[derive(Debug, Default, Deserialize)]
struct ReportEntry {
    #[serde(default)]
    server: Option<serde_json::Value>,
    #[serde(default)]
    file: Option<serde_json::Value>,
    #[serde(default, alias = "action")]
    change: Option<serde_json::Value>,
    #[serde(default)]
    time: Option<serde_json::Value>,
}

fn field(v: &Option<serde_json::Value>) -> Option<String> {
    v.as_ref().and_then(as_text).filter(|s| !s.trim().is_empty())
}

fn collect_capped<I>(changes: I) -> ConfigChanges
where
    I: IntoIterator<Item = ConfigChange>,
{
    let mut out = ConfigChanges::default();
    for c in changes {
        out.total += 1;
        if out.alerts.len() < ALERTS_CAP {
            out.alerts.push(c);
        }
    }
    out
}

/// `MODIFIED` -> `Modified`.
pub fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}

/// A bare action word is normalised (`MODIFIED` -> `Modified`); longer
/// descriptions are reported as written.
fn normalize_change(change: &str) -> String {
    let change = change.trim();
    if change.split_whitespace().count() == 1 {
        capitalize(change)
    } else {
        change.to_string()
    }
}

/// Primary parse of a JSON report.
///
/// Fails only when the body is not JSON; every entry of `changes` counts,
/// with blank strings standing in for null or oddly typed fields.
pub fn parse_json(body: &str, now: DateTime<Utc>) -> Result<ConfigChanges> {
    let doc: serde_json::Value = serde_json::from_str(body)
        .map_err(|e| CollectError::parse(SourceId::Audit.key(), e.to_string()))?;
    let report: Report = serde_json::from_value(doc).unwrap_or_default();
    Ok(collect_capped(report.changes.unwrap_or_default().into_iter().map(
        |row| {
            let e: ReportEntry = serde_json::from_value(row).unwrap_or_default();
            ConfigChange {
                server: field(&e.server).unwrap_or_default(),
                file: field(&e.file).unwrap_or_default(),
                change: field(&e.change)
                    .map(|c| normalize_change(&c))
                    .unwrap_or_default(),
                time: field(&e.time).unwrap_or_else(|| iso_utc(now)),
            }
        },
    )))
}

static RE_CHANGE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(srv-[\w-]+):\s*(/[\w/.]+)\s+(modified|changed|added|removed)").unwrap()
});

/// Fallback extraction of `server: /path action` triples from free text.
pub fn extract_text(body: &str, now: DateTime<Utc>) -> ConfigChanges {
    let stamp = iso_utc(now);
    collect_capped(RE_CHANGE.captures_iter(body).map(|cap| ConfigChange {
        server: cap[1].to_string(),
        file: cap[2].to_string(),
        change: capitalize(&cap[3]),
        time: stamp.clone(),
    }))
}

pub fn parse_report(body: &str, now: DateTime<Utc>) -> ConfigChanges {
    match parse_json(body, now) {
        Ok(changes) => changes,
        Err(e) => {
            tracing::debug!(source = "audit", error = %e, "not JSON, scanning report text");
            extract_text(body, now)
        }
    }
}

pub struct AuditAdapter {
    cfg: SourceConfig,
}

impl AuditAdapter {
    pub fn new(cfg: SourceConfig) -> Self {
        Self { cfg }
    }
}

#[async_trait]
impl SourceAdapter for AuditAdapter {
    fn id(&self) -> SourceId {
        SourceId::Audit
    }

    fn is_enabled(&self) -> bool {
        self.cfg.enabled
    }

    fn api_url(&self) -> &str {
        &self.cfg.url
    }

    async fn collect(&self, ctx: &FetchContext<'_>) -> Result<SourceSummary> {
        let req = FetchRequest::get(&self.cfg.url)
            .for_source(SourceId::Audit)
            .basic_auth_opt(self.cfg.basic_auth());
        let body = ctx.http.fetch(&req).await?;

        Ok(SourceSummary::Audit(AuditSummary {
            last_scan: iso_utc(ctx.now),
            config_changes: parse_report(&body, ctx.now),
        }))
    }
}
