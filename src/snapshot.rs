// src/snapshot.rs
//! The document the dashboard reads.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

use crate::fallback;
use crate::sources::{iso_utc, SourceId, SourceSummary};
use crate::status::StatusMap;

/// Point-in-time snapshot; rewritten in full on every run.
///
/// Source sections are flattened to top-level keys (`servicenow`, `bums`, ...)
/// and always hold either live data or the fallback placeholder.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot {
    #[serde(rename = "lastUpdated")]
    pub last_updated: String,
    #[serde(flatten)]
    pub sections: BTreeMap<SourceId, SourceSummary>,
    #[serde(rename = "sourceUrls")]
    pub source_urls: BTreeMap<SourceId, String>,
    #[serde(rename = "fetchStatus")]
    pub fetch_status: StatusMap,
}

impl Snapshot {
    /// Fallback document: placeholders everywhere, no URLs, no statuses yet.
    pub fn fallback(now: DateTime<Utc>) -> Self {
        Self {
            last_updated: iso_utc(now),
            sections: fallback::sections(now),
            source_urls: BTreeMap::new(),
            fetch_status: StatusMap::default(),
        }
    }

    /// Replace one source section with live data.
    pub fn merge_live(&mut self, summary: SourceSummary) {
        self.sections.insert(summary.source(), summary);
    }

    pub fn section(&self, id: SourceId) -> Option<&SourceSummary> {
        self.sections.get(&id)
    }

    pub fn to_pretty_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
