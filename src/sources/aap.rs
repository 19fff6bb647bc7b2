// src/sources/aap.rs
//! Ansible Automation Platform job results for the last 24 hours.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::{iso_utc, FetchContext, SourceAdapter, SourceId, SourceSummary};
use crate::config::SourceConfig;
use crate::error::{CollectError, Result};
use crate::fetch::{Auth, FetchRequest};

pub const FAILED_LIST_CAP: usize = 5;
pub const ERROR_TEXT_MAX_CHARS: usize = 100;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedJob {
    pub name: String,
    pub error: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct JobCounts {
    pub total: u32,
    pub passed: u32,
    pub failed: u32,
    pub failed_list: Vec<FailedJob>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AapSummary {
    pub last_run: String,
    pub jobs: JobCounts,
}

#[derive(Debug, Deserialize)]
struct JobPage {
    #[serde(default)]
    results: Vec<Job>,
}

#[derive(Debug, Deserialize)]
struct Job {
    name: Option<String>,
    #[serde(default)]
    status: String,
    created: Option<String>,
    result_stdout: Option<String>,
}

fn created_after(job: &Job, cutoff: DateTime<Utc>) -> bool {
    // Unknown or unparseable creation time: trust the server-side filter.
    match job
        .created
        .as_deref()
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
    {
        Some(t) => t.with_timezone(&Utc) > cutoff,
        None => true,
    }
}

fn truncate_chars(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

/// Window start for "recent" jobs.
pub fn cutoff(now: DateTime<Utc>) -> DateTime<Utc> {
    now - Duration::hours(24)
}

pub fn parse_jobs(body: &str, now: DateTime<Utc>) -> Result<JobCounts> {
    let page: JobPage = serde_json::from_str(body)
        .map_err(|e| CollectError::parse(SourceId::Aap.key(), e.to_string()))?;
    let since = cutoff(now);

    let mut out = JobCounts::default();
    for job in page.results.iter().filter(|j| created_after(j, since)) {
        out.total += 1;
        match job.status.as_str() {
            "successful" => out.passed += 1,
            "failed" => {
                out.failed += 1;
                if out.failed_list.len() < FAILED_LIST_CAP {
                    out.failed_list.push(FailedJob {
                        name: job.name.clone().unwrap_or_else(|| "Unknown".to_string()),
                        error: truncate_chars(
                            job.result_stdout.as_deref().unwrap_or("Unknown error"),
                            ERROR_TEXT_MAX_CHARS,
                        ),
                    });
                }
            }
            _ => {}
        }
    }
    Ok(out)
}

pub struct AapAdapter {
    cfg: SourceConfig,
}

impl AapAdapter {
    pub fn new(cfg: SourceConfig) -> Self {
        Self { cfg }
    }
}

#[async_trait]
impl SourceAdapter for AapAdapter {
    fn id(&self) -> SourceId {
        SourceId::Aap
    }

    fn is_enabled(&self) -> bool {
        self.cfg.enabled
    }

    fn api_url(&self) -> &str {
        &self.cfg.url
    }

    async fn collect(&self, ctx: &FetchContext<'_>) -> Result<SourceSummary> {
        let token = self.cfg.require_token(self.id())?;
        let req = FetchRequest::get(&self.cfg.url)
            .for_source(SourceId::Aap)
            .query("created__gt", iso_utc(cutoff(ctx.now)))
            .query("order_by", "-created")
            .auth(Auth::Bearer(token.to_string()));
        let body = ctx.http.fetch(&req).await?;

        Ok(SourceSummary::Aap(AapSummary {
            last_run: iso_utc(ctx.now),
            jobs: parse_jobs(&body, ctx.now)?,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 12, 29, 12, 0, 0).unwrap()
    }

    #[test]
    fn seven_failures_keep_first_five_in_order() {
        let jobs: Vec<String> = (1..=7)
            .map(|i| format!(r#"{{"name":"job-{i}","status":"failed","result_stdout":"boom {i}"}}"#))
            .collect();
        let body = format!(
            r#"{{"results":[{},{{"name":"ok","status":"successful"}}]}}"#,
            jobs.join(",")
        );
        let c = parse_jobs(&body, now()).unwrap();
        assert_eq!((c.total, c.passed, c.failed), (8, 1, 7));
        let names: Vec<&str> = c.failed_list.iter().map(|j| j.name.as_str()).collect();
        assert_eq!(names, vec!["job-1", "job-2", "job-3", "job-4", "job-5"]);
    }

    #[test]
    fn error_text_truncated_to_100_chars_and_defaults_filled() {
        let long = "é".repeat(150);
        let body = format!(
            r#"{{"results":[{{"status":"failed","result_stdout":"{long}"}},{{"status":"failed","result_stdout":null}}]}}"#
        );
        let c = parse_jobs(&body, now()).unwrap();
        assert_eq!(c.failed_list[0].error.chars().count(), ERROR_TEXT_MAX_CHARS);
        assert_eq!(c.failed_list[0].name, "Unknown");
        assert_eq!(c.failed_list[1].error, "Unknown error");
    }

    #[test]
    fn jobs_older_than_a_day_are_dropped() {
        let body = r#"{"results":[
            {"name":"fresh","status":"successful","created":"2025-12-29T06:00:00Z"},
            {"name":"stale","status":"failed","created":"2025-12-27T06:00:00Z"},
            {"name":"undated","status":"canceled"}
        ]}"#;
        let c = parse_jobs(body, now()).unwrap();
        assert_eq!((c.total, c.passed, c.failed), (2, 1, 0));
    }
}
