//! Per-step timing store.
//!
//! Every tracked browser action gets a [`PerformanceRecord`] keyed by a generated
//! step id. Lookups against unknown ids are silent no-ops: metric loss must never
//! fail a scenario.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use super::state::{ActionType, MetricSummary, PerformanceRecord, Status};
use crate::utils::clock::now_millis;

/// Identifier returned by [`MetricStore::start_step`]
pub type StepId = String;

#[derive(Default)]
struct Inner {
    records: HashMap<StepId, PerformanceRecord>,
    order: Vec<StepId>,
}

/// Step metrics for one test run
#[derive(Default)]
pub struct MetricStore {
    inner: Mutex<Inner>,
}

impl MetricStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Create a record with status PASSED and return its id.
    pub fn start_step(&self, name: &str, description: &str, action: ActionType) -> StepId {
        self.insert(name, description, action, None)
    }

    /// Same as [`start_step`](Self::start_step), tagging the record with a category.
    pub fn start_categorized_step(
        &self,
        name: &str,
        description: &str,
        action: ActionType,
        category: Option<&str>,
    ) -> StepId {
        self.insert(name, description, action, category.map(str::to_string))
    }

    fn insert(
        &self,
        name: &str,
        description: &str,
        action: ActionType,
        category: Option<String>,
    ) -> StepId {
        let now = now_millis();
        let mut inner = self.lock();

        let base = format!("{}_{}", name, now);
        let mut id = base.clone();
        let mut n = 1;
        while inner.records.contains_key(&id) {
            id = format!("{}_{}", base, n);
            n += 1;
        }

        let record = PerformanceRecord::new(id.clone(), name, description, action, category, now);
        inner.records.insert(id.clone(), record);
        inner.order.push(id.clone());
        log::debug!("Started step {} ({})", id, action);
        id
    }

    fn update(&self, id: &str, apply: impl FnOnce(&mut PerformanceRecord)) {
        let mut inner = self.lock();
        match inner.records.get_mut(id) {
            Some(record) => apply(record),
            None => log::debug!("Ignoring metric update for unknown step {}", id),
        }
    }

    /// Response time = now - `started_at_ms`.
    pub fn record_response_time(&self, id: &str, started_at_ms: i64) {
        let now = now_millis();
        self.update(id, |r| r.response_time_ms = now - started_at_ms);
    }

    /// Complete using a previously recorded response time:
    /// load = (end - start) - response, total = end - start.
    pub fn complete_step(&self, id: &str, started_at_ms: i64, end_ms: i64) {
        self.update(id, |r| {
            let total = end_ms - started_at_ms;
            r.load_time_ms = total - r.response_time_ms;
            r.total_time_ms = total;
            r.status = Status::Passed;
        });
    }

    /// Complete with an explicit response timestamp:
    /// response = resp - start, load = end - resp, total = end - start.
    pub fn complete_step_with_response(
        &self,
        id: &str,
        started_at_ms: i64,
        response_at_ms: i64,
        end_ms: i64,
    ) {
        self.update(id, |r| {
            r.response_time_ms = response_at_ms - started_at_ms;
            r.load_time_ms = end_ms - response_at_ms;
            r.total_time_ms = end_ms - started_at_ms;
            r.status = Status::Passed;
        });
    }

    /// Mark failed with total = now - `started_at_ms`. Response and load are left as they are.
    pub fn fail_step(&self, id: &str, started_at_ms: i64) {
        let now = now_millis();
        self.update(id, |r| {
            r.total_time_ms = now - started_at_ms;
            r.status = Status::Failed;
        });
    }

    pub fn get(&self, id: &str) -> Option<PerformanceRecord> {
        self.lock().records.get(id).cloned()
    }

    /// Snapshot of all records keyed by step id.
    pub fn all_metrics(&self) -> HashMap<StepId, PerformanceRecord> {
        self.lock().records.clone()
    }

    /// Snapshot of step ids in start order.
    pub fn execution_order(&self) -> Vec<StepId> {
        self.lock().order.clone()
    }

    /// Snapshot of records in start order.
    pub fn ordered_metrics(&self) -> Vec<PerformanceRecord> {
        let inner = self.lock();
        inner
            .order
            .iter()
            .filter_map(|id| inner.records.get(id).cloned())
            .collect()
    }

    pub fn metrics_by_step_name(&self, name: &str) -> Vec<PerformanceRecord> {
        self.ordered_metrics()
            .into_iter()
            .filter(|r| r.step_name == name)
            .collect()
    }

    pub fn summary(&self) -> MetricSummary {
        MetricSummary::from_records(&self.ordered_metrics())
    }

    /// Milliseconds from the earliest step start to the latest step end.
    pub fn total_execution_time_ms(&self) -> i64 {
        self.summary().total_execution_ms
    }

    /// Average response time in seconds, 0 when empty.
    pub fn average_response_time(&self) -> f64 {
        self.summary().average_response
    }

    /// Average load time in seconds, 0 when empty.
    pub fn average_load_time(&self) -> f64 {
        self.summary().average_load
    }

    pub fn len(&self) -> usize {
        self.lock().records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        let mut inner = self.lock();
        inner.records.clear();
        inner.order.clear();
    }
}
