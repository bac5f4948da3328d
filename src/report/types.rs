use crate::runner::metrics::MetricStore;
use crate::runner::results::ResultStore;
use crate::runner::state::{MetricSummary, PerformanceRecord, ResultSummary, TestResult};
use serde::{Deserialize, Serialize};

/// Snapshot of both stores taken at suite end; every renderer reads only this.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportData {
    pub session_id: String,
    /// Results in first-recorded order
    pub results: Vec<TestResult>,
    /// Step metrics in start order
    pub metrics: Vec<PerformanceRecord>,
    #[serde(default)]
    pub suite_started_ms: Option<i64>,
    #[serde(default)]
    pub suite_ended_ms: Option<i64>,
    pub generated_at: String,
}

impl ReportData {
    pub fn capture(
        session_id: &str,
        results: &ResultStore,
        metrics: &MetricStore,
        suite_started_ms: Option<i64>,
        suite_ended_ms: Option<i64>,
        generated_at: String,
    ) -> Self {
        Self {
            session_id: session_id.to_string(),
            results: results.ordered_results(),
            metrics: metrics.ordered_metrics(),
            suite_started_ms,
            suite_ended_ms,
            generated_at,
        }
    }

    pub fn summary(&self) -> ResultSummary {
        ResultSummary::from_results(&self.results)
    }

    pub fn metric_summary(&self) -> MetricSummary {
        MetricSummary::from_records(&self.metrics)
    }

    /// Suite wall-clock duration in whole seconds, when both ends are known.
    pub fn suite_duration_secs(&self) -> Option<i64> {
        match (self.suite_started_ms, self.suite_ended_ms) {
            (Some(start), Some(end)) if end >= start => Some((end - start) / 1000),
            _ => None,
        }
    }

    /// Copy restricted to one category label.
    pub fn filtered(&self, label: &str) -> ReportData {
        ReportData {
            session_id: self.session_id.clone(),
            results: self
                .results
                .iter()
                .filter(|r| r.in_category(label))
                .cloned()
                .collect(),
            metrics: self
                .metrics
                .iter()
                .filter(|m| m.in_category(label))
                .cloned()
                .collect(),
            suite_started_ms: self.suite_started_ms,
            suite_ended_ms: self.suite_ended_ms,
            generated_at: self.generated_at.clone(),
        }
    }
}
