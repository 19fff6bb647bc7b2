// src/lib.rs
// Public library surface for the binary and integration tests.

pub mod collector;
pub mod config;
pub mod error;
pub mod fallback;
pub mod fetch;
pub mod logging;
pub mod metrics;
pub mod scheduler;
pub mod snapshot;
pub mod sources;
pub mod status;
pub mod writer;

// ---- Re-exports for stable public API ----
pub use crate::collector::{Collector, RunReport};
pub use crate::config::Settings;
pub use crate::error::CollectError;
pub use crate::snapshot::Snapshot;
pub use crate::sources::{SourceAdapter, SourceId, SourceSummary};
