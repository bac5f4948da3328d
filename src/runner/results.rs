//! Named test outcomes, keyed by test name.

use colored::Colorize;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard, PoisonError};

use super::state::{ResultSummary, Status, TestResult};
use crate::utils::clock::now_millis;

#[derive(Default)]
struct Inner {
    results: HashMap<String, TestResult>,
    order: Vec<String>,
}

/// Test results for one run. Recording under an existing name overwrites the entry
/// but keeps its original position in execution order.
#[derive(Default)]
pub struct ResultStore {
    inner: Mutex<Inner>,
}

impl ResultStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Record an outcome without separate response/load timings (load = duration).
    pub fn record_test_result(
        &self,
        name: &str,
        status: Status,
        duration_ms: u64,
        category: Option<&str>,
        detail: &str,
    ) {
        self.insert(TestResult {
            name: name.to_string(),
            status,
            duration_ms,
            category: category.map(str::to_string),
            detail: detail.to_string(),
            timestamp_ms: now_millis(),
            response_time_ms: 0,
            load_time_ms: duration_ms,
        });
        println!(
            "📊 Test result recorded: {} - {} ({:.2}s)",
            name,
            colored_status(status),
            duration_ms as f64 / 1000.0
        );
    }

    /// Record an outcome with separately measured response and load times.
    #[allow(clippy::too_many_arguments)]
    pub fn record_timed_test_result(
        &self,
        name: &str,
        status: Status,
        duration_ms: u64,
        category: Option<&str>,
        detail: &str,
        response_time_ms: u64,
        load_time_ms: u64,
    ) {
        self.insert(TestResult {
            name: name.to_string(),
            status,
            duration_ms,
            category: category.map(str::to_string),
            detail: detail.to_string(),
            timestamp_ms: now_millis(),
            response_time_ms,
            load_time_ms,
        });
        println!(
            "📊 Test result recorded: {} - {} (Response: {:.2}s, Load: {:.2}s, Total: {:.2}s)",
            name,
            colored_status(status),
            response_time_ms as f64 / 1000.0,
            load_time_ms as f64 / 1000.0,
            duration_ms as f64 / 1000.0
        );
    }

    fn insert(&self, result: TestResult) {
        let mut inner = self.lock();
        if !inner.results.contains_key(&result.name) {
            inner.order.push(result.name.clone());
        }
        inner.results.insert(result.name.clone(), result);
    }

    pub fn get(&self, name: &str) -> Option<TestResult> {
        self.lock().results.get(name).cloned()
    }

    /// Snapshot of all results keyed by name.
    pub fn all_results(&self) -> HashMap<String, TestResult> {
        self.lock().results.clone()
    }

    /// Snapshot of test names in first-recorded order.
    pub fn execution_order(&self) -> Vec<String> {
        self.lock().order.clone()
    }

    /// Snapshot of results in first-recorded order.
    pub fn ordered_results(&self) -> Vec<TestResult> {
        let inner = self.lock();
        inner
            .order
            .iter()
            .filter_map(|name| inner.results.get(name).cloned())
            .collect()
    }

    pub fn summary(&self) -> ResultSummary {
        ResultSummary::from_results(self.lock().results.values())
    }

    pub fn total_tests(&self) -> usize {
        self.lock().results.len()
    }

    pub fn passed_tests(&self) -> usize {
        self.summary().passed
    }

    pub fn failed_tests(&self) -> usize {
        self.summary().failed
    }

    /// Sum of durations in seconds.
    pub fn total_duration(&self) -> f64 {
        self.summary().total_duration_secs()
    }

    /// Mean duration in seconds, 0 when empty.
    pub fn average_duration(&self) -> f64 {
        self.summary().average_duration_secs()
    }

    pub fn categories(&self) -> BTreeMap<String, CategoryBucket> {
        group_by_category(&self.ordered_results())
    }

    pub fn is_empty(&self) -> bool {
        self.lock().results.is_empty()
    }

    pub fn clear(&self) {
        let mut inner = self.lock();
        inner.results.clear();
        inner.order.clear();
    }
}

fn colored_status(status: Status) -> colored::ColoredString {
    match status {
        Status::Passed => status.as_str().green(),
        Status::Failed => status.as_str().red(),
        Status::Skipped => status.as_str().yellow(),
    }
}

/// Results sharing one category label
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CategoryBucket {
    pub results: Vec<TestResult>,
    pub summary: ResultSummary,
}

/// Partition results by category label, `General` for missing or blank categories.
pub fn group_by_category(results: &[TestResult]) -> BTreeMap<String, CategoryBucket> {
    let mut buckets: BTreeMap<String, CategoryBucket> = BTreeMap::new();
    for result in results {
        buckets
            .entry(result.category_label().to_string())
            .or_default()
            .results
            .push(result.clone());
    }
    for bucket in buckets.values_mut() {
        bucket.summary = ResultSummary::from_results(&bucket.results);
    }
    buckets
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_store() -> ResultStore {
        let store = ResultStore::new();
        store.record_test_result("A", Status::Passed, 1000, Some("X"), "");
        store.record_test_result("B", Status::Failed, 2000, Some("X"), "");
        store.record_test_result("C", Status::Passed, 500, Some("Y"), "");
        store
    }

    #[test]
    fn test_counts_and_durations() {
        let store = sample_store();
        assert_eq!(store.total_tests(), 3);
        assert_eq!(store.passed_tests(), 2);
        assert_eq!(store.failed_tests(), 1);
        assert!((store.total_duration() - 3.5).abs() < 1e-9);
        assert!((store.average_duration() - 1.1667).abs() < 1e-4);
        assert!(store.passed_tests() + store.failed_tests() <= store.total_tests());
    }

    #[test]
    fn test_category_buckets() {
        let store = sample_store();
        let categories = store.categories();
        assert_eq!(categories.len(), 2);

        let x = &categories["X"];
        assert_eq!(x.results.len(), 2);
        assert_eq!(x.summary.passed, 1);
        assert_eq!(x.summary.failed, 1);
        assert!((x.summary.total_duration_secs() - 3.0).abs() < 1e-9);

        let y = &categories["Y"];
        assert_eq!(y.results.len(), 1);
        assert!((y.summary.total_duration_secs() - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_every_result_lands_in_one_bucket() {
        let store = sample_store();
        store.record_test_result("D", Status::Skipped, 0, None, "");
        store.record_test_result("E", Status::Passed, 10, Some(""), "");

        let categories = store.categories();
        let bucketed: usize = categories.values().map(|b| b.results.len()).sum();
        assert_eq!(bucketed, store.total_tests());
        assert_eq!(categories["General"].results.len(), 2);
    }

    #[test]
    fn test_overwrite_keeps_order_position() {
        let store = sample_store();
        store.record_test_result("A", Status::Failed, 4000, Some("X"), "retried");

        assert_eq!(store.execution_order(), vec!["A", "B", "C"]);
        assert_eq!(store.total_tests(), 3);
        let a = store.get("A").unwrap();
        assert_eq!(a.status, Status::Failed);
        assert_eq!(a.detail, "retried");
        assert_eq!(store.ordered_results()[0].duration_ms, 4000);
    }

    #[test]
    fn test_timed_result_keeps_phases() {
        let store = ResultStore::new();
        store.record_timed_test_result("Load", Status::Passed, 900, None, "", 300, 600);
        let result = store.get("Load").unwrap();
        assert_eq!(result.response_time_ms, 300);
        assert_eq!(result.load_time_ms, 600);

        store.record_test_result("Plain", Status::Passed, 700, None, "");
        let plain = store.get("Plain").unwrap();
        assert_eq!(plain.response_time_ms, 0);
        assert_eq!(plain.load_time_ms, 700);
    }

    #[test]
    fn test_empty_store() {
        let store = ResultStore::new();
        assert_eq!(store.average_duration(), 0.0);
        assert_eq!(store.total_duration(), 0.0);
        assert!(store.categories().is_empty());

        let store = sample_store();
        store.clear();
        assert!(store.is_empty());
        assert!(store.execution_order().is_empty());
    }
}
