// src/sources/servicenow.rs
//! ServiceNow incident table (REST, basic auth).

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{FetchContext, SourceAdapter, SourceId, SourceSummary};
use crate::config::SourceConfig;
use crate::error::{CollectError, Result};
use crate::fetch::FetchRequest;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct IncidentCounts {
    pub critical: u32,
    pub high: u32,
    pub medium: u32,
    pub low: u32,
    pub total: u32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RequestCounts {
    pub open: u32,
    pub pending: u32,
    pub completed_today: u32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ChangeCounts {
    pub scheduled: u32,
    pub in_progress: u32,
    pub pending_approval: u32,
}

/// Service level targets, in percent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SltPercentages {
    pub incident_response: f64,
    pub incident_resolution: f64,
    pub request_fulfillment: f64,
}

/// Targets shown next to live incident counts; the incident table has no SLA data.
pub const SLT_TARGETS: SltPercentages = SltPercentages {
    incident_response: 95.0,
    incident_resolution: 90.0,
    request_fulfillment: 92.0,
};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServiceNowSummary {
    pub incidents: IncidentCounts,
    pub requests: RequestCounts,
    pub changes: ChangeCounts,
    pub slt: SltPercentages,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriorityBucket {
    Critical,
    High,
    Medium,
    Low,
}

impl PriorityBucket {
    /// `1` critical, `2` high, `3` medium, anything else low.
    pub fn from_code(code: &str) -> Self {
        match code.trim() {
            "1" => Self::Critical,
            "2" => Self::High,
            "3" => Self::Medium,
            _ => Self::Low,
        }
    }
}

impl IncidentCounts {
    pub fn add(&mut self, bucket: PriorityBucket) {
        match bucket {
            PriorityBucket::Critical => self.critical += 1,
            PriorityBucket::High => self.high += 1,
            PriorityBucket::Medium => self.medium += 1,
            PriorityBucket::Low => self.low += 1,
        }
        self.total += 1;
    }
}

#[derive(Debug, Deserialize)]
struct TableResponse {
    #[serde(default)]
    result: Vec<IncidentRecord>,
}

#[derive(Debug, Deserialize)]
struct IncidentRecord {
    #[serde(default)]
    priority: Option<serde_json::Value>,
}

/// Count active incidents by priority bucket.
pub fn parse_incidents(body: &str) -> Result<IncidentCounts> {
    let table: TableResponse = serde_json::from_str(body)
        .map_err(|e| CollectError::parse(SourceId::ServiceNow.key(), e.to_string()))?;

    let mut counts = IncidentCounts::default();
    for rec in &table.result {
        let code = match &rec.priority {
            Some(serde_json::Value::String(s)) => s.clone(),
            Some(serde_json::Value::Number(n)) => n.to_string(),
            _ => "4".to_string(),
        };
        counts.add(PriorityBucket::from_code(&code));
    }
    Ok(counts)
}

pub struct ServiceNowAdapter {
    cfg: SourceConfig,
}

impl ServiceNowAdapter {
    pub fn new(cfg: SourceConfig) -> Self {
        Self { cfg }
    }
}

#[async_trait]
impl SourceAdapter for ServiceNowAdapter {
    fn id(&self) -> SourceId {
        SourceId::ServiceNow
    }

    fn is_enabled(&self) -> bool {
        self.cfg.enabled
    }

    fn api_url(&self) -> &str {
        &self.cfg.url
    }

    async fn collect(&self, ctx: &FetchContext<'_>) -> Result<SourceSummary> {
        let creds = self.cfg.require_basic_auth(self.id())?;
        let req = FetchRequest::get(&self.cfg.url)
            .for_source(SourceId::ServiceNow)
            .query("sysparm_query", "active=true")
            .query("sysparm_fields", "priority,state")
            .basic_auth_opt(Some(creds));
        let body = ctx.http.fetch(&req).await?;
        let incidents = parse_incidents(&body)?;

        Ok(SourceSummary::ServiceNow(ServiceNowSummary {
            incidents,
            requests: RequestCounts::default(),
            changes: ChangeCounts::default(),
            slt: SLT_TARGETS,
        }))
    }
}
