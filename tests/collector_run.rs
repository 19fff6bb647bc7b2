// tests/collector_run.rs
//
// Whole runs: one entry per source, disabled annotation, fault isolation,
// idempotence, and the full adapter set against stub upstreams.

mod common;

use axum::{routing::get, routing::post, Json, Router};
use chrono::Duration;
use occ_collector::collector::Collector;
use occ_collector::config::Settings;
use occ_collector::fallback;
use occ_collector::sources::{SourceAdapter, SourceId, SourceSummary};
use occ_collector::status::DISABLED_NOTE;
use occ_collector::{writer, CollectError};
use serde_json::{json, Value};

use common::{fast_http, fetcher, fixed_now, spawn_stub, CannedAdapter};

fn all_disabled_collector() -> Collector {
    let settings = Settings {
        http: fast_http(1),
        ..Settings::default()
    };
    Collector::from_settings(&settings).expect("collector")
}

fn as_json(c: &occ_collector::Snapshot) -> Value {
    serde_json::to_value(c).expect("snapshot json")
}

#[tokio::test]
async fn every_source_appears_once_in_sections_and_status() {
    let report = all_disabled_collector().run_at(fixed_now()).await;
    let v = as_json(&report.snapshot);

    for id in SourceId::ALL {
        assert!(v.get(id.key()).is_some(), "missing section {id}");
        assert!(v["fetchStatus"].get(id.key()).is_some(), "missing status {id}");
        assert!(v["sourceUrls"].get(id.key()).is_some(), "missing url {id}");
    }
    assert_eq!(v["fetchStatus"].as_object().unwrap().len(), SourceId::ALL.len());
    assert_eq!(v["sourceUrls"].as_object().unwrap().len(), SourceId::ALL.len());
    // lastUpdated + six sections + sourceUrls + fetchStatus
    assert_eq!(v.as_object().unwrap().len(), 9);
}

#[tokio::test]
async fn disabled_sources_keep_fallback_and_are_annotated() {
    let now = fixed_now();
    let report = all_disabled_collector().run_at(now).await;

    for id in SourceId::ALL {
        let st = report.statuses().get(id).expect("status");
        assert!(st.ok);
        assert!(st.disabled);
        assert_eq!(st.error.as_deref(), Some(DISABLED_NOTE));
        assert_eq!(
            report.snapshot.section(id),
            Some(&fallback::summary(id, now))
        );
    }
    assert_eq!(report.ok_count(), 6);
    assert!(!report.all_failed());

    let v = as_json(&report.snapshot);
    assert_eq!(
        v["sourceUrls"]["servicenow"],
        "https://your-instance.service-now.com/nav_to.do?uri=incident_list.do"
    );
    assert_eq!(v["lastUpdated"], "2025-12-29T12:00:00Z");
}

fn strip_timestamps(mut v: Value) -> Value {
    v.as_object_mut().unwrap().remove("lastUpdated");
    for (_, st) in v["fetchStatus"].as_object_mut().unwrap().iter_mut() {
        st.as_object_mut().unwrap().remove("timestamp");
    }
    v
}

#[tokio::test]
async fn repeated_disabled_runs_differ_only_in_timestamps() {
    let collector = all_disabled_collector();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("data.json");

    let first = collector.run_at(fixed_now()).await;
    writer::write_snapshot(&path, &first.snapshot).unwrap();
    let bytes_a = std::fs::read(&path).unwrap();

    let again = collector.run_at(fixed_now()).await;
    writer::write_snapshot(&path, &again.snapshot).unwrap();
    let bytes_b = std::fs::read(&path).unwrap();
    assert_eq!(bytes_a, bytes_b, "same clock, same bytes");

    let later = collector.run_at(fixed_now() + Duration::minutes(5)).await;
    assert_ne!(as_json(&later.snapshot), as_json(&first.snapshot));
    assert_eq!(
        strip_timestamps(as_json(&later.snapshot)),
        strip_timestamps(as_json(&first.snapshot))
    );
}

fn live_servicenow() -> Result<SourceSummary, CollectError> {
    let mut s = fallback::servicenow();
    s.incidents.critical = 9;
    s.incidents.total = 9;
    Ok(SourceSummary::ServiceNow(s))
}

fn live_aap() -> Result<SourceSummary, CollectError> {
    let mut s = fallback::aap(fixed_now());
    s.jobs.total = 1;
    s.jobs.failed_list.clear();
    Ok(SourceSummary::Aap(s))
}

fn broken_bums() -> Result<SourceSummary, CollectError> {
    Err(CollectError::fetch("http://bums/status", 3, "connection refused"))
}

fn wrong_section() -> Result<SourceSummary, CollectError> {
    live_servicenow()
}

#[tokio::test]
async fn one_failing_source_does_not_spoil_the_others() {
    let adapters: Vec<Box<dyn SourceAdapter>> = vec![
        Box::new(CannedAdapter {
            id: SourceId::ServiceNow,
            enabled: true,
            result: live_servicenow,
        }),
        Box::new(CannedAdapter {
            id: SourceId::Bums,
            enabled: true,
            result: broken_bums,
        }),
        Box::new(CannedAdapter {
            id: SourceId::Aap,
            enabled: true,
            result: live_aap,
        }),
    ];
    let collector = Collector::new(adapters, fetcher(1));
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("data.json");

    let report = collector.run_at(fixed_now()).await;
    writer::write_snapshot(&path, &report.snapshot).unwrap();
    let v: Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();

    assert_eq!(v["servicenow"]["incidents"]["critical"], 9);
    assert_eq!(v["aap"]["jobs"]["total"], 1);
    // bums keeps its placeholder and says why
    assert_eq!(v["bums"], serde_json::to_value(fallback::bums()).unwrap());
    assert_eq!(v["fetchStatus"]["bums"]["ok"], false);
    assert!(v["fetchStatus"]["bums"]["error"]
        .as_str()
        .unwrap()
        .contains("connection refused"));
    assert_eq!(v["fetchStatus"]["servicenow"]["ok"], true);
    assert_eq!(v["fetchStatus"]["servicenow"]["error"], Value::Null);

    // sources without an adapter are still present
    assert_eq!(v["fetchStatus"]["tenable"]["disabled"], true);
    assert_eq!(report.total(), 6);
    assert_eq!(report.ok_count(), 5);
}

#[tokio::test]
async fn adapter_returning_another_sources_section_is_degraded() {
    let adapters: Vec<Box<dyn SourceAdapter>> = vec![Box::new(CannedAdapter {
        id: SourceId::Audit,
        enabled: true,
        result: wrong_section,
    })];
    let report = Collector::new(adapters, fetcher(1)).run_at(fixed_now()).await;
    let st = report.statuses().get(SourceId::Audit).unwrap();
    assert!(!st.ok);
    assert_eq!(
        report.snapshot.section(SourceId::ServiceNow),
        Some(&fallback::summary(SourceId::ServiceNow, fixed_now()))
    );
}

#[tokio::test]
async fn all_sources_failing_is_reported() {
    let adapters: Vec<Box<dyn SourceAdapter>> = SourceId::ALL
        .iter()
        .map(|id| {
            Box::new(CannedAdapter {
                id: *id,
                enabled: true,
                result: broken_bums,
            }) as Box<dyn SourceAdapter>
        })
        .collect();
    let report = Collector::new(adapters, fetcher(1)).run_at(fixed_now()).await;
    assert_eq!(report.ok_count(), 0);
    assert!(report.all_failed());
}

#[tokio::test]
async fn full_run_against_stub_upstreams() {
    let app = Router::new()
        .route(
            "/api/now/table/incident",
            get(|| async { Json(json!({"result": [{"priority": "2"}, {"priority": "3"}]})) }),
        )
        .route(
            "/status",
            get(|| async {
                Json(json!({"servers": [
                    {"hostname": "srv-1", "status": "up"},
                    {"hostname": "srv-2", "status": "down", "last_seen": "2025-12-29T11:00:00Z"}
                ]}))
            }),
        )
        .route(
            "/api/alerts",
            post(|| async { Json(json!({"results": [{"ObjectName": "n1 CPU", "Severity": 3}]})) }),
        )
        .route(
            "/api/v2/jobs/",
            get(|| async { Json(json!({"results": [{"name": "j", "status": "successful"}]})) }),
        )
        .route("/report", get(|| async { "srv-a: /etc/hosts changed" }))
        .route(
            "/rest/analysis",
            get(|| async { Json(json!({"response": {"results": [{"severity": {"id": "3"}}]}})) }),
        );
    let base = spawn_stub(app).await;

    let mut settings = Settings {
        http: fast_http(1),
        ..Settings::default()
    };
    let creds = |mut c: occ_collector::config::SourceConfig, path: &str| {
        c.enabled = true;
        c.url = format!("{base}{path}");
        c.username = Some("u".into());
        c.password = Some("p".into());
        c.token = Some("t".into());
        c.access_key = Some("a".into());
        c.secret_key = Some("s".into());
        c
    };
    settings.servicenow = creds(settings.servicenow.clone(), "/api/now/table/incident");
    settings.bums = creds(settings.bums.clone(), "/status");
    settings.solarwinds = creds(settings.solarwinds.clone(), "/api/alerts");
    settings.aap = creds(settings.aap.clone(), "/api/v2/jobs/");
    settings.audit = creds(settings.audit.clone(), "/report");
    settings.tenable = creds(settings.tenable.clone(), "/rest/analysis");

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("data.json");
    let report = Collector::from_settings(&settings)
        .unwrap()
        .run_and_write(&path)
        .await
        .expect("written");

    assert_eq!(report.ok_count(), 6);
    let v: Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(v["servicenow"]["incidents"]["total"], 2);
    assert_eq!(v["bums"]["servers"]["down_list"][0]["name"], "srv-2");
    assert_eq!(v["solarwinds"]["cpu_alerts"]["critical"], 1);
    assert_eq!(v["aap"]["jobs"]["passed"], 1);
    assert_eq!(v["audit"]["config_changes"]["alerts"][0]["change"], "Changed");
    assert_eq!(v["tenable"]["vulnerabilities"]["high"], 1);
    assert_eq!(v["tenable"]["compliance"]["status"], "not_implemented");
    assert_eq!(v["sourceUrls"]["aap"], format!("{base}/#/jobs"));
    assert_eq!(v["sourceUrls"]["tenable"], format!("{base}/dashboard"));
    for id in SourceId::ALL {
        assert_eq!(v["fetchStatus"][id.key()]["ok"], true, "{id}");
        assert!(v["fetchStatus"][id.key()].get("disabled").is_none());
    }
}
