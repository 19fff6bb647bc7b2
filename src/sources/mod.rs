// src/sources/mod.rs
//! Upstream adapters.
//!
//! Each adapter turns one monitoring or ITSM system into a small fixed-shape
//! summary. Adapters are stateless: a request, a parse and a reduction.
//!
//! - [`servicenow::ServiceNowAdapter`] - incident counts by priority
//! - [`bums::BumsAdapter`] - servers up/down (JSON or HTML status page)
//! - [`solarwinds::SolarWindsAdapter`] - active CPU / memory alerts via SWQL
//! - [`aap::AapAdapter`] - automation job results of the last 24 hours
//! - [`audit::AuditAdapter`] - config-file changes (JSON or free text report)
//! - [`tenable::TenableAdapter`] - vulnerability counts by severity

pub mod aap;
pub mod audit;
pub mod bums;
pub mod servicenow;
pub mod solarwinds;
pub mod tenable;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::config::Settings;
use crate::error::Result;
use crate::fetch::HttpFetcher;

/// The fixed set of sources, in run order. Serializes as the snapshot key.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum SourceId {
    ServiceNow,
    Bums,
    SolarWinds,
    Aap,
    Audit,
    Tenable,
}

impl SourceId {
    pub const ALL: [SourceId; 6] = [
        SourceId::ServiceNow,
        SourceId::Bums,
        SourceId::SolarWinds,
        SourceId::Aap,
        SourceId::Audit,
        SourceId::Tenable,
    ];

    pub fn key(self) -> &'static str {
        match self {
            Self::ServiceNow => "servicenow",
            Self::Bums => "bums",
            Self::SolarWinds => "solarwinds",
            Self::Aap => "aap",
            Self::Audit => "audit",
            Self::Tenable => "tenable",
        }
    }

    /// Prefix of the environment variables configuring this source.
    pub fn env_prefix(self) -> &'static str {
        match self {
            Self::ServiceNow => "SNOW",
            Self::Bums => "BUMS",
            Self::SolarWinds => "SOLARWINDS",
            Self::Aap => "AAP",
            Self::Audit => "AUDIT",
            Self::Tenable => "TENABLE",
        }
    }

    pub fn default_url(self) -> &'static str {
        match self {
            Self::ServiceNow => "https://your-instance.service-now.com/api/now/table/incident",
            Self::Bums => "http://your-bums-server/status",
            Self::SolarWinds => "https://your-solarwinds/api/alerts",
            Self::Aap => "http://your-aap-server/api/v2/jobs/",
            Self::Audit => "http://your-audit-server/report",
            Self::Tenable => "https://your-tenable-server/rest/analysis",
        }
    }

    /// Human-facing page for the dashboard link, derived from the API URL.
    pub fn browse_url(self, api_url: &str) -> String {
        match self {
            Self::ServiceNow => {
                api_url.replace("/api/now/table/incident", "/nav_to.do?uri=incident_list.do")
            }
            Self::SolarWinds => api_url.replace("/api/alerts", "/Orion/Alerts"),
            Self::Aap => api_url.replace("/api/v2/jobs/", "/#/jobs"),
            Self::Tenable => api_url.replace("/rest/analysis", "/dashboard"),
            Self::Bums | Self::Audit => api_url.to_string(),
        }
    }
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Normalized section of the snapshot, one variant per source.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SourceSummary {
    ServiceNow(servicenow::ServiceNowSummary),
    Bums(bums::BumsSummary),
    SolarWinds(solarwinds::SolarWindsSummary),
    Aap(aap::AapSummary),
    Audit(audit::AuditSummary),
    Tenable(tenable::TenableSummary),
}

impl SourceSummary {
    pub fn source(&self) -> SourceId {
        match self {
            Self::ServiceNow(_) => SourceId::ServiceNow,
            Self::Bums(_) => SourceId::Bums,
            Self::SolarWinds(_) => SourceId::SolarWinds,
            Self::Aap(_) => SourceId::Aap,
            Self::Audit(_) => SourceId::Audit,
            Self::Tenable(_) => SourceId::Tenable,
        }
    }
}

/// What an adapter gets to work with during one run.
pub struct FetchContext<'a> {
    pub http: &'a HttpFetcher,
    /// Run time; every "now" inside a summary uses it.
    pub now: DateTime<Utc>,
}

#[async_trait]
pub trait SourceAdapter: Send + Sync {
    fn id(&self) -> SourceId;

    fn is_enabled(&self) -> bool;

    /// Configured API endpoint, also the base of the dashboard link.
    fn api_url(&self) -> &str;

    /// Fetch and reduce. Only called for enabled adapters.
    async fn collect(&self, ctx: &FetchContext<'_>) -> Result<SourceSummary>;
}

/// All adapters in run order.
pub fn build_adapters(settings: &Settings) -> Vec<Box<dyn SourceAdapter>> {
    vec![
        Box::new(servicenow::ServiceNowAdapter::new(settings.servicenow.clone())),
        Box::new(bums::BumsAdapter::new(settings.bums.clone())),
        Box::new(solarwinds::SolarWindsAdapter::new(settings.solarwinds.clone())),
        Box::new(aap::AapAdapter::new(settings.aap.clone())),
        Box::new(audit::AuditAdapter::new(settings.audit.clone())),
        Box::new(tenable::TenableAdapter::new(settings.tenable.clone())),
    ]
}

/// `YYYY-MM-DDTHH:MM:SSZ`, the only timestamp format in the snapshot.
pub fn iso_utc(t: DateTime<Utc>) -> String {
    t.format("%Y-%m-%dT%H:%M:%SZ").to_string()
}

/// Lenient number read: accepts JSON numbers and numeric strings.
pub(crate) fn as_i64(v: &serde_json::Value) -> Option<i64> {
    match v {
        serde_json::Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        serde_json::Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Lenient text read: strings as-is, numbers and booleans rendered, null and
/// containers treated as absent.
pub(crate) fn as_text(v: &serde_json::Value) -> Option<String> {
    match v {
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        serde_json::Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}
