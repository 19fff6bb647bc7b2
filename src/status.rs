// src/status.rs
//! Per-run fetch outcomes.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

use crate::error::CollectError;
use crate::sources::{iso_utc, SourceId, SourceSummary};

pub const DISABLED_NOTE: &str = "Disabled - using mock data";
pub const NOT_REGISTERED_NOTE: &str = "No adapter registered - using mock data";

/// What one source produced during a run.
#[derive(Debug)]
pub enum SourceOutcome {
    Disabled,
    Live(SourceSummary),
    /// Fetch or parse failed; the fallback section stays in place.
    Degraded(CollectError),
}

impl SourceOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Disabled => "disabled",
            Self::Live(_) => "ok",
            Self::Degraded(e) => e.kind(),
        }
    }
}

/// Status line for one source in `fetchStatus`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FetchStatus {
    pub ok: bool,
    pub timestamp: String,
    pub error: Option<String>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub disabled: bool,
}

impl FetchStatus {
    pub fn ok(at: DateTime<Utc>) -> Self {
        Self {
            ok: true,
            timestamp: iso_utc(at),
            error: None,
            disabled: false,
        }
    }

    pub fn disabled(at: DateTime<Utc>, note: &str) -> Self {
        Self {
            ok: true,
            timestamp: iso_utc(at),
            error: Some(note.to_string()),
            disabled: true,
        }
    }

    pub fn failed(at: DateTime<Utc>, err: &CollectError) -> Self {
        Self {
            ok: false,
            timestamp: iso_utc(at),
            error: Some(err.to_string()),
            disabled: false,
        }
    }

    pub fn from_outcome(at: DateTime<Utc>, outcome: &SourceOutcome) -> Self {
        match outcome {
            SourceOutcome::Disabled => Self::disabled(at, DISABLED_NOTE),
            SourceOutcome::Live(_) => Self::ok(at),
            SourceOutcome::Degraded(e) => Self::failed(at, e),
        }
    }
}

/// Status per source for one run; built fresh every run and returned by value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct StatusMap(BTreeMap<SourceId, FetchStatus>);

impl StatusMap {
    pub fn record(&mut self, id: SourceId, status: FetchStatus) {
        self.0.insert(id, status);
    }

    pub fn get(&self, id: SourceId) -> Option<&FetchStatus> {
        self.0.get(&id)
    }

    pub fn contains(&self, id: SourceId) -> bool {
        self.0.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn ok_count(&self) -> usize {
        self.0.values().filter(|s| s.ok).count()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&SourceId, &FetchStatus)> {
        self.0.iter()
    }
}
