// src/sources/tenable.rs
//! Tenable.sc vulnerability analysis.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{as_i64, iso_utc, FetchContext, SourceAdapter, SourceId, SourceSummary};
use crate::config::SourceConfig;
use crate::error::{CollectError, Result};
use crate::fetch::{Auth, FetchRequest};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct VulnerabilityCounts {
    pub critical: u32,
    pub high: u32,
    pub medium: u32,
    pub low: u32,
}

impl VulnerabilityCounts {
    /// Tenable severity ids: 4 critical, 3 high, 2 medium, 1 low. 0 (info) is ignored.
    pub fn add_severity(&mut self, id: i64) {
        match id {
            4 => self.critical += 1,
            3 => self.high += 1,
            2 => self.medium += 1,
            1 => self.low += 1,
            _ => {}
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScanFailure {
    pub host: String,
    pub reason: String,
    pub time: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScanFailures {
    pub total: u32,
    pub failed_list: Vec<ScanFailure>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ComplianceStatus {
    NotImplemented,
}

/// Compliance pass/fail counts.
///
/// Live runs leave both counts empty and set `status`, so the dashboard never
/// shows invented numbers as scanner output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ComplianceCounts {
    pub passed: Option<u32>,
    pub failed: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<ComplianceStatus>,
}

impl ComplianceCounts {
    // TODO: derive passed/failed from a second analysis query over compliance (audit) plugin results.
    pub const fn not_implemented() -> Self {
        Self {
            passed: None,
            failed: None,
            status: Some(ComplianceStatus::NotImplemented),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TenableSummary {
    pub last_scan: String,
    pub vulnerabilities: VulnerabilityCounts,
    pub scan_failures: ScanFailures,
    pub compliance: ComplianceCounts,
}

#[derive(Debug, Deserialize)]
struct AnalysisEnvelope {
    #[serde(default)]
    response: AnalysisResponse,
}

#[derive(Debug, Default, Deserialize)]
struct AnalysisResponse {
    #[serde(default)]
    results: Vec<Finding>,
}

#[derive(Debug, Deserialize)]
struct Finding {
    #[serde(default)]
    severity: Option<Severity>,
}

#[derive(Debug, Deserialize)]
struct Severity {
    #[serde(default)]
    id: Option<serde_json::Value>,
}

pub fn parse_findings(body: &str) -> Result<VulnerabilityCounts> {
    let env: AnalysisEnvelope = serde_json::from_str(body)
        .map_err(|e| CollectError::parse(SourceId::Tenable.key(), e.to_string()))?;

    let mut counts = VulnerabilityCounts::default();
    for f in &env.response.results {
        if let Some(id) = f
            .severity
            .as_ref()
            .and_then(|s| s.id.as_ref())
            .and_then(as_i64)
        {
            counts.add_severity(id);
        }
    }
    Ok(counts)
}

pub fn api_keys_header(access_key: &str, secret_key: &str) -> String {
    format!("accessKey={access_key};secretKey={secret_key}")
}

pub struct TenableAdapter {
    cfg: SourceConfig,
}

impl TenableAdapter {
    pub fn new(cfg: SourceConfig) -> Self {
        Self { cfg }
    }
}

#[async_trait]
impl SourceAdapter for TenableAdapter {
    fn id(&self) -> SourceId {
        SourceId::Tenable
    }

    fn is_enabled(&self) -> bool {
        self.cfg.enabled
    }

    fn api_url(&self) -> &str {
        &self.cfg.url
    }

    async fn collect(&self, ctx: &FetchContext<'_>) -> Result<SourceSummary> {
        let (access, secret) = self.cfg.require_key_pair(self.id())?;
        let req = FetchRequest::get(&self.cfg.url)
            .for_source(SourceId::Tenable)
            .auth(Auth::Header {
                name: "X-ApiKeys".to_string(),
                value: api_keys_header(access, secret),
            })
            .header("Content-Type", "application/json");
        let body = ctx.http.fetch(&req).await?;
        let vulnerabilities = parse_findings(&body)?;

        tracing::debug!(source = "tenable", "compliance counts not implemented; emitting nulls");
        Ok(SourceSummary::Tenable(TenableSummary {
            last_scan: iso_utc(ctx.now),
            vulnerabilities,
            scan_failures: ScanFailures::default(),
            compliance: ComplianceCounts::not_implemented(),
        }))
    }
}
