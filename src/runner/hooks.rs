//! Suite lifecycle: session start, per-scenario reset, and suite-end reporting.

use anyhow::Result;
use std::sync::Arc;

use super::category::detect;
use super::metrics::MetricStore;
use super::results::ResultStore;
use super::session::{BrowserLauncher, BrowserSession};
use crate::driver::traits::Browser;
use crate::report::types::ReportData;
use crate::report::{generate_suite_reports, ReportOutcome};
use crate::utils::clock::now_millis;
use crate::utils::config::Config;

/// Owns the stores and the browser session for one run
pub struct SuiteHooks {
    pub session_id: String,
    pub session: BrowserSession,
    pub metrics: Arc<MetricStore>,
    pub results: Arc<ResultStore>,
    pub config: Arc<Config>,
    suite_started_ms: Option<i64>,
    suite_ended_ms: Option<i64>,
}

impl SuiteHooks {
    pub fn new(session_id: &str, config: Arc<Config>) -> Self {
        Self {
            session_id: session_id.to_string(),
            session: BrowserSession::new(),
            metrics: Arc::new(MetricStore::new()),
            results: Arc::new(ResultStore::new()),
            config,
            suite_started_ms: None,
            suite_ended_ms: None,
        }
    }

    /// Record the suite start and bring up the browser.
    pub async fn before_all(&mut self, launcher: &dyn BrowserLauncher) -> Result<()> {
        self.suite_started_ms = Some(now_millis());
        self.session.initialize(launcher).await?;
        Ok(())
    }

    /// Reset browser state so scenarios do not leak sessions into each other.
    pub async fn before_scenario(&self) -> Result<Arc<dyn Browser>> {
        let browser = self.session.browser().await?;
        browser.clear_cookies().await?;
        browser.navigate("about:blank").await?;
        Ok(browser)
    }

    pub fn snapshot(&self) -> ReportData {
        ReportData::capture(
            &self.session_id,
            &self.results,
            &self.metrics,
            self.suite_started_ms,
            self.suite_ended_ms,
            chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
        )
    }

    /// Write every report the run calls for, then release the browser.
    /// Report failures are collected in the outcome, never returned.
    pub async fn after_all(&mut self) -> ReportOutcome {
        self.suite_ended_ms = Some(now_millis());
        let data = self.snapshot();

        let detection = detect(&data.results, &data.metrics);
        if detection.used_fallback {
            log::warn!("No test results recorded; category reports detected from step metrics");
        }
        let labels: Vec<&str> = detection.categories.iter().map(|c| c.label()).collect();
        log::info!("Category reports to generate: {:?}", labels);

        let outcome = generate_suite_reports(
            &data,
            &detection,
            &self.config.reports_dir,
            &self.config.dashboards_dir,
        );

        if self.session.release().await {
            log::info!("Browser session closed");
        }
        outcome
    }
}
