//! OCC collector binary.
//! One run per invocation (cron), or loop mode when `OCC_INTERVAL_SECS` is set.

use std::process::ExitCode;
use std::time::Duration;

use occ_collector::collector::Collector;
use occ_collector::config::Settings;
use occ_collector::metrics::Metrics;
use occ_collector::{logging, scheduler};

/// Every source failed; the snapshot holds placeholders only.
const EXIT_ALL_SOURCES_FAILED: u8 = 2;

#[tokio::main]
async fn main() -> ExitCode {
    // Load .env in local/dev; no-op when the file is absent.
    let _ = dotenvy::dotenv();
    logging::init_tracing();

    match run().await {
        Ok(code) => code,
        Err(e) => {
            tracing::error!(error = ?e, "collector aborted");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> anyhow::Result<ExitCode> {
    let settings = Settings::load()?;
    let enabled: Vec<&str> = occ_collector::sources::SourceId::ALL
        .iter()
        .filter(|id| settings.source(**id).enabled)
        .map(|id| id.key())
        .collect();
    tracing::info!(
        ?enabled,
        output = %settings.output_path.display(),
        verify_tls = settings.http.verify_tls,
        "starting OCC data fetch"
    );

    let collector = Collector::from_settings(&settings)?;

    if let Some(secs) = settings.interval_secs {
        if let Some(addr) = settings.metrics_addr {
            let metrics = Metrics::init()?;
            tokio::spawn(async move {
                if let Err(e) = metrics.serve(addr).await {
                    tracing::warn!(error = ?e, "metrics endpoint stopped");
                }
            });
        }
        scheduler::run_every(&collector, &settings.output_path, Duration::from_secs(secs)).await?;
        return Ok(ExitCode::SUCCESS);
    }

    let report = collector.run_and_write(&settings.output_path).await?;
    tracing::info!(
        "Fetch complete: {}/{} sources OK",
        report.ok_count(),
        report.total()
    );
    if report.all_failed() {
        tracing::error!("no source succeeded; snapshot contains placeholder data only");
        return Ok(ExitCode::from(EXIT_ALL_SOURCES_FAILED));
    }
    Ok(ExitCode::SUCCESS)
}
