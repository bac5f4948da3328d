use super::types::ReportData;
use anyhow::Result;
use std::path::Path;

pub const RESULTS_FILE: &str = "test-results.json";

/// Generate JSON report
pub fn generate_json(data: &ReportData) -> Result<String> {
    Ok(serde_json::to_string_pretty(data)?)
}

/// Load a snapshot previously written by [`generate_json`].
pub fn load(path: &Path) -> Result<ReportData> {
    let raw = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&raw)?)
}
