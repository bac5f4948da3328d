pub mod dashboard;
pub mod format;
pub mod html;
pub mod json;
pub mod junit;
pub mod performance;
pub mod types;

use anyhow::{Context, Result};
use colored::Colorize;
use std::path::{Path, PathBuf};

use crate::runner::category::{Detection, ReportCategory};
use types::ReportData;

/// Write a report, creating parent directories as needed.
pub fn write_file(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    std::fs::write(path, contents).with_context(|| format!("Failed to write {}", path.display()))
}

/// What a report pass produced
#[derive(Debug, Default)]
pub struct ReportOutcome {
    pub written: Vec<PathBuf>,
    /// (report name, error) for every report that could not be produced
    pub failed: Vec<(String, String)>,
}

impl ReportOutcome {
    fn attempt(&mut self, name: &str, path: PathBuf, render: impl FnOnce() -> Result<String>) {
        match render().and_then(|contents| write_file(&path, &contents)) {
            Ok(()) => {
                println!("    Generated {} report: {}", name, path.display());
                self.written.push(path);
            }
            Err(e) => {
                log::error!("Failed to generate {} report: {:#}", name, e);
                self.failed.push((name.to_string(), format!("{:#}", e)));
            }
        }
    }
}

/// Produce every suite-end report. Each one is isolated: a failure is logged and
/// recorded in the outcome, never returned.
pub fn generate_suite_reports(
    data: &ReportData,
    detection: &Detection,
    reports_dir: &Path,
    dashboards_dir: &Path,
) -> ReportOutcome {
    let mut outcome = ReportOutcome::default();

    outcome.attempt("summary", reports_dir.join(html::SUMMARY_FILE), || {
        Ok(html::render_summary(data))
    });
    outcome.attempt("JSON", reports_dir.join(json::RESULTS_FILE), || {
        json::generate_json(data)
    });
    outcome.attempt("JUnit", reports_dir.join(junit::JUNIT_FILE), || {
        junit::generate_junit_xml(data)
    });
    outcome.attempt("dashboard", dashboards_dir.join(dashboard::DASHBOARD_FILE), || {
        Ok(dashboard::render_dashboard(data))
    });
    outcome.attempt("detailed", dashboards_dir.join(dashboard::DETAILED_FILE), || {
        Ok(dashboard::render_detailed(data))
    });
    outcome.attempt("timeline", dashboards_dir.join(dashboard::TIMELINE_FILE), || {
        Ok(dashboard::render_timeline(data))
    });

    for category in &detection.categories {
        outcome.attempt(
            category.label(),
            reports_dir.join(category.report_file()),
            || Ok(performance::render_category_report(*category, data)),
        );
    }

    outcome
}

/// Regenerate reports from a saved `test-results.json`
pub async fn generate_report(
    results_path: &Path,
    format: &str,
    output: Option<&Path>,
) -> Result<()> {
    let data = json::load(results_path)
        .with_context(|| format!("Failed to read results from {}", results_path.display()))?;

    let rendered = match format {
        "html" | "summary" => html::render_summary(&data),
        "json" => json::generate_json(&data)?,
        "junit" => junit::generate_junit_xml(&data)?,
        "dashboard" => dashboard::render_dashboard(&data),
        "detailed" => dashboard::render_detailed(&data),
        "timeline" => dashboard::render_timeline(&data),
        "all" => {
            let dir = output
                .map(Path::to_path_buf)
                .or_else(|| results_path.parent().map(Path::to_path_buf))
                .unwrap_or_default();
            let detection = crate::runner::category::detect(&data.results, &data.metrics);
            let outcome = generate_suite_reports(&data, &detection, &dir, &dir.join("html-reports"));
            if !outcome.failed.is_empty() {
                anyhow::bail!("{} report(s) failed", outcome.failed.len());
            }
            return Ok(());
        }
        other => match ReportCategory::ALL
            .into_iter()
            .find(|c| c.label().eq_ignore_ascii_case(other))
        {
            Some(category) => performance::render_category_report(category, &data),
            None => anyhow::bail!("Unknown format: {}", format),
        },
    };

    if let Some(path) = output {
        write_file(path, &rendered)?;
        println!("{} Report saved to: {}", "✓".green(), path.display());
    } else {
        println!("{}", rendered);
    }

    Ok(())
}
