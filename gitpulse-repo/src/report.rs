//! JSON report persistence

use gitpulse_core::{BatchReport, GitPulseResult, ReportDocument};
use std::path::{Path, PathBuf};
use tracing::info;

/// Write `report` to `<dir>/gitpulse-<timestamp>.json`, creating `dir` if needed
pub async fn write_report(dir: &Path, report: &BatchReport) -> GitPulseResult<PathBuf> {
    let generated_at = chrono::Utc::now();
    let document = ReportDocument {
        generated_at,
        repositories: report.results.clone(),
        failures: report.failures.clone(),
    };

    tokio::fs::create_dir_all(dir).await?;
    let path = dir.join(format!(
        "gitpulse-{}.json",
        generated_at.format("%Y%m%d-%H%M%S-%3f")
    ));
    let content = serde_json::to_string_pretty(&document)?;
    tokio::fs::write(&path, content).await?;

    info!(path = %path.display(), "💾 Report written");
    Ok(path)
}
