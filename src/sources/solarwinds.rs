// src/sources/solarwinds.rs
//! SolarWinds Orion active alerts through the SWIS query endpoint.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{as_i64, FetchContext, SourceAdapter, SourceId, SourceSummary};
use crate::config::SourceConfig;
use crate::error::{CollectError, Result};
use crate::fetch::FetchRequest;

pub const ALERT_LIST_CAP: usize = 10;

pub const ACTIVE_ALERTS_SWQL: &str = "SELECT AlertActive.AlertObjectID, AlertActive.ObjectName, AlertActive.Severity FROM Orion.AlertActive";

/// `AlertActive` carries no utilisation reading; these are the alert trigger levels.
pub const CPU_ALERT_LEVEL: u32 = 95;
pub const MEMORY_ALERT_LEVEL: u32 = 90;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertSeverity {
    Critical,
    Warning,
}

impl AlertSeverity {
    /// Orion severity 2 and above is critical.
    pub fn from_level(level: i64) -> Self {
        if level >= 2 {
            Self::Critical
        } else {
            Self::Warning
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CpuAlert {
    pub node: String,
    pub cpu: u32,
    pub severity: AlertSeverity,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MemoryAlert {
    pub node: String,
    pub memory: u32,
    pub severity: AlertSeverity,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AlertGroup<T> {
    pub critical: u32,
    pub warning: u32,
    pub alert_list: Vec<T>,
}

impl<T> Default for AlertGroup<T> {
    fn default() -> Self {
        Self {
            critical: 0,
            warning: 0,
            alert_list: Vec::new(),
        }
    }
}

impl<T> AlertGroup<T> {
    fn push(&mut self, severity: AlertSeverity, alert: T) {
        match severity {
            AlertSeverity::Critical => self.critical += 1,
            AlertSeverity::Warning => self.warning += 1,
        }
        if self.alert_list.len() < ALERT_LIST_CAP {
            self.alert_list.push(alert);
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SolarWindsSummary {
    pub cpu_alerts: AlertGroup<CpuAlert>,
    pub memory_alerts: AlertGroup<MemoryAlert>,
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    results: Vec<ActiveAlert>,
}

#[derive(Debug, Deserialize)]
struct ActiveAlert {
    #[serde(rename = "ObjectName", default)]
    object_name: Option<String>,
    #[serde(rename = "Severity", default)]
    severity: Option<serde_json::Value>,
}

/// Split active alerts into CPU and memory groups by object name.
pub fn parse_alerts(body: &str) -> Result<SolarWindsSummary> {
    let resp: QueryResponse = serde_json::from_str(body)
        .map_err(|e| CollectError::parse(SourceId::SolarWinds.key(), e.to_string()))?;

    let mut out = SolarWindsSummary::default();
    for alert in resp.results {
        let node = alert.object_name.unwrap_or_default();
        let severity =
            AlertSeverity::from_level(alert.severity.as_ref().and_then(as_i64).unwrap_or(0));

        if node.contains("CPU") {
            out.cpu_alerts.push(
                severity,
                CpuAlert {
                    node,
                    cpu: CPU_ALERT_LEVEL,
                    severity,
                },
            );
        } else if node.contains("Memory") {
            out.memory_alerts.push(
                severity,
                MemoryAlert {
                    node,
                    memory: MEMORY_ALERT_LEVEL,
                    severity,
                },
            );
        }
    }
    Ok(out)
}

pub struct SolarWindsAdapter {
    cfg: SourceConfig,
}

impl SolarWindsAdapter {
    pub fn new(cfg: SourceConfig) -> Self {
        Self { cfg }
    }
}

#[async_trait]
impl SourceAdapter for SolarWindsAdapter {
    fn id(&self) -> SourceId {
        SourceId::SolarWinds
    }

    fn is_enabled(&self) -> bool {
        self.cfg.enabled
    }

    fn api_url(&self) -> &str {
        &self.cfg.url
    }

    async fn collect(&self, ctx: &FetchContext<'_>) -> Result<SourceSummary> {
        let creds = self.cfg.require_basic_auth(self.id())?;
        let req = FetchRequest::post_json(
            &self.cfg.url,
            serde_json::json!({ "query": ACTIVE_ALERTS_SWQL }),
        )
        .for_source(SourceId::SolarWinds)
        .basic_auth_opt(Some(creds));
        let body = ctx.http.fetch(&req).await?;
        Ok(SourceSummary::SolarWinds(parse_alerts(&body)?))
    }
}
