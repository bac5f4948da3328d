use serde::{Deserialize, Serialize};
use std::fmt;

/// Outcome of a step or a recorded test result
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum Status {
    Passed,
    Failed,
    Skipped,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Passed => "PASSED",
            Status::Failed => "FAILED",
            Status::Skipped => "SKIPPED",
        }
    }

    /// CSS class and icon used by the HTML reports.
    pub fn badge(&self) -> (&'static str, &'static str) {
        match self {
            Status::Passed => ("status-passed", "✅"),
            Status::Failed => ("status-failed", "❌"),
            Status::Skipped => ("status-skipped", "⏭️"),
        }
    }

    pub fn from_passed(passed: bool) -> Self {
        if passed {
            Status::Passed
        } else {
            Status::Failed
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of browser action a metric record measures
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ActionType {
    Navigation,
    Click,
    Input,
    Submit,
    Wait,
    Verification,
    Refresh,
}

impl ActionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionType::Navigation => "navigation",
            ActionType::Click => "click",
            ActionType::Input => "input",
            ActionType::Submit => "submit",
            ActionType::Wait => "wait",
            ActionType::Verification => "verification",
            ActionType::Refresh => "refresh",
        }
    }
}

impl fmt::Display for ActionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Timing record for one browser action
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceRecord {
    pub step_id: String,
    pub step_name: String,
    pub description: String,
    pub action: ActionType,
    #[serde(default)]
    pub category: Option<String>,
    /// Milliseconds from action start until the page responded
    pub response_time_ms: i64,
    /// Milliseconds from response until the page finished loading
    pub load_time_ms: i64,
    pub total_time_ms: i64,
    /// Epoch milliseconds at step start
    pub timestamp_ms: i64,
    pub status: Status,
}

impl PerformanceRecord {
    pub fn new(
        step_id: String,
        step_name: &str,
        description: &str,
        action: ActionType,
        category: Option<String>,
        timestamp_ms: i64,
    ) -> Self {
        Self {
            step_id,
            step_name: step_name.to_string(),
            description: description.to_string(),
            action,
            category,
            response_time_ms: 0,
            load_time_ms: 0,
            total_time_ms: 0,
            timestamp_ms,
            status: Status::Passed,
        }
    }

    pub fn in_category(&self, label: &str) -> bool {
        self.category.as_deref() == Some(label)
    }
}

/// Named test outcome recorded by a step or scenario
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TestResult {
    pub name: String,
    pub status: Status,
    pub duration_ms: u64,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub detail: String,
    pub timestamp_ms: i64,
    #[serde(default)]
    pub response_time_ms: u64,
    #[serde(default)]
    pub load_time_ms: u64,
}

impl TestResult {
    /// Category label with the `General` fallback used for grouping.
    pub fn category_label(&self) -> &str {
        match self.category.as_deref() {
            Some(c) if !c.trim().is_empty() => c,
            _ => "General",
        }
    }

    pub fn in_category(&self, label: &str) -> bool {
        self.category.as_deref() == Some(label)
    }
}

/// Aggregate counts over a set of results
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ResultSummary {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub skipped: usize,
    pub total_duration_ms: u64,
}

impl ResultSummary {
    pub fn from_results<'a>(results: impl IntoIterator<Item = &'a TestResult>) -> Self {
        let mut summary = Self::default();
        for result in results {
            summary.total += 1;
            summary.total_duration_ms += result.duration_ms;
            match result.status {
                Status::Passed => summary.passed += 1,
                Status::Failed => summary.failed += 1,
                Status::Skipped => summary.skipped += 1,
            }
        }
        summary
    }

    pub fn total_duration_secs(&self) -> f64 {
        self.total_duration_ms as f64 / 1000.0
    }

    pub fn average_duration_secs(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.total_duration_secs() / self.total as f64
        }
    }

    /// Passed share in percent; 0 when nothing ran.
    pub fn success_rate(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.passed as f64 * 100.0 / self.total as f64
        }
    }
}

/// Aggregate timings over a set of metric records
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetricSummary {
    pub count: usize,
    pub passed: usize,
    pub failed: usize,
    /// Seconds
    pub average_response: f64,
    /// Seconds
    pub average_load: f64,
    /// Milliseconds from the earliest start to the latest end
    pub total_execution_ms: i64,
}

impl MetricSummary {
    pub fn from_records<'a>(records: impl IntoIterator<Item = &'a PerformanceRecord>) -> Self {
        let mut summary = Self::default();
        let mut response_sum = 0i64;
        let mut load_sum = 0i64;
        let mut first_start: Option<i64> = None;
        let mut last_end: Option<i64> = None;

        for record in records {
            summary.count += 1;
            match record.status {
                Status::Passed => summary.passed += 1,
                Status::Failed => summary.failed += 1,
                Status::Skipped => {}
            }
            response_sum += record.response_time_ms;
            load_sum += record.load_time_ms;

            let end = record.timestamp_ms + record.total_time_ms;
            first_start = Some(first_start.map_or(record.timestamp_ms, |s| s.min(record.timestamp_ms)));
            last_end = Some(last_end.map_or(end, |e| e.max(end)));
        }

        if summary.count > 0 {
            summary.average_response = response_sum as f64 / summary.count as f64 / 1000.0;
            summary.average_load = load_sum as f64 / summary.count as f64 / 1000.0;
        }
        if let (Some(start), Some(end)) = (first_start, last_end) {
            summary.total_execution_ms = end - start;
        }
        summary
    }

    pub fn total_execution_secs(&self) -> f64 {
        self.total_execution_ms as f64 / 1000.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(status: Status, duration_ms: u64) -> TestResult {
        TestResult {
            name: "r".to_string(),
            status,
            duration_ms,
            category: None,
            detail: String::new(),
            timestamp_ms: 0,
            response_time_ms: 0,
            load_time_ms: duration_ms,
        }
    }

    fn record(ts: i64, total: i64, response: i64, load: i64) -> PerformanceRecord {
        let mut r = PerformanceRecord::new(
            format!("step_{}", ts),
            "step",
            "",
            ActionType::Click,
            None,
            ts,
        );
        r.total_time_ms = total;
        r.response_time_ms = response;
        r.load_time_ms = load;
        r
    }

    #[test]
    fn test_status_serializes_uppercase() {
        assert_eq!(serde_json::to_string(&Status::Passed).unwrap(), "\"PASSED\"");
        assert_eq!(
            serde_json::from_str::<Status>("\"SKIPPED\"").unwrap(),
            Status::Skipped
        );
        assert_eq!(Status::Failed.badge(), ("status-failed", "❌"));
    }

    #[test]
    fn test_category_label_fallback() {
        let mut r = result(Status::Passed, 10);
        assert_eq!(r.category_label(), "General");
        r.category = Some("  ".to_string());
        assert_eq!(r.category_label(), "General");
        r.category = Some("SIM".to_string());
        assert_eq!(r.category_label(), "SIM");
    }

    #[test]
    fn test_result_summary() {
        let results = vec![
            result(Status::Passed, 1000),
            result(Status::Failed, 2000),
            result(Status::Passed, 0),
        ];
        let summary = ResultSummary::from_results(&results);
        assert_eq!(summary.total, 3);
        assert_eq!(summary.passed, 2);
        assert_eq!(summary.failed, 1);
        assert!((summary.total_duration_secs() - 3.0).abs() < f64::EPSILON);
        assert!((summary.average_duration_secs() - 1.0).abs() < f64::EPSILON);
        assert_eq!(summary.success_rate().round(), 67.0);
    }

    #[test]
    fn test_empty_summaries_are_zero() {
        let summary = ResultSummary::from_results(&[]);
        assert_eq!(summary.average_duration_secs(), 0.0);
        assert_eq!(summary.success_rate(), 0.0);

        let metrics = MetricSummary::from_records(&[]);
        assert_eq!(metrics.total_execution_ms, 0);
        assert_eq!(metrics.average_response, 0.0);
    }

    #[test]
    fn test_metric_summary_span_and_averages() {
        let records = vec![record(1000, 500, 200, 300), record(1200, 800, 400, 400)];
        let summary = MetricSummary::from_records(&records);
        assert_eq!(summary.total_execution_ms, 1000);
        assert!((summary.average_response - 0.3).abs() < 1e-9);
        assert!((summary.average_load - 0.35).abs() < 1e-9);
    }
}
