//! JSON run report.
//!
//! The orchestrator's [`RunReport`] can be written next to the site so the
//! outcome of each run (which pages changed, which articles were skipped and
//! why) is kept after the logs scroll away.

use crate::errors::EngineError;
use crate::models::RunReport;
use std::path::Path;
use tokio::fs;
use tracing::{error, info, instrument};

/// Serialize `report` as pretty JSON to `path`, creating parent directories.
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub async fn write_report(report: &RunReport, path: &Path) -> Result<(), EngineError> {
    let json = serde_json::to_string_pretty(report)?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        if let Err(e) = fs::create_dir_all(parent).await {
            error!(dir = %parent.display(), error = %e, "Failed to create report dir");
            return Err(EngineError::io(parent, e));
        }
    }

    fs::write(path, json)
        .await
        .map_err(|e| EngineError::io(path, e))?;
    info!(documents = report.documents.len(), "Wrote run report");
    Ok(())
}
