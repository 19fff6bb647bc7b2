// src/logging.rs
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Line-based logs to stdout.
///
/// `RUST_LOG` controls the filter (default `info`); `OCC_LOG_FORMAT=json`
/// switches to one JSON object per line for log shippers.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let json = std::env::var("OCC_LOG_FORMAT")
        .ok()
        .is_some_and(|v| v.eq_ignore_ascii_case("json"));

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(fmt::layer().json().with_target(false)).init();
    } else {
        registry.with(fmt::layer().compact().with_target(false)).init();
    }
}
