use anyhow::Result;
use regex::Regex;
use std::collections::HashMap;
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use super::metrics::{MetricStore, StepId};
use super::results::ResultStore;
use super::state::{ActionType, Status};
use crate::driver::traits::Browser;
use crate::utils::clock::now_millis;
use crate::utils::config::Config;

/// Values carried from one step of a scenario to a later one
#[derive(Debug, Default, Clone)]
pub struct ScenarioState {
    /// Navigation start for the page-load steps
    pub page_load_started_at: Option<i64>,
    pub page_load_ended_at: Option<i64>,

    /// URL when the first ACM navigation started
    pub initial_url: Option<String>,
    /// URL just before the ACM menu item was selected
    pub url_before_selection: Option<String>,
    /// URL once the selection settled
    pub url_after_selection: Option<String>,

    /// Dashboard button click and full-content load times
    pub dashboard_clicked_at: Option<i64>,
    pub dashboard_loaded_at: Option<i64>,
}

/// A tracked step in progress
#[derive(Debug, Clone)]
pub struct StepTimer {
    pub id: StepId,
    pub started_at: i64,
}

/// Everything a step definition can reach while a scenario runs
pub struct StepContext {
    pub browser: Arc<dyn Browser>,
    pub metrics: Arc<MetricStore>,
    pub results: Arc<ResultStore>,
    pub config: Arc<Config>,

    /// Report category of the running scenario
    pub category: Option<String>,

    /// User-defined variables
    pub vars: HashMap<String, String>,

    pub state: ScenarioState,
}

impl StepContext {
    pub fn new(
        browser: Arc<dyn Browser>,
        metrics: Arc<MetricStore>,
        results: Arc<ResultStore>,
        config: Arc<Config>,
        category: Option<String>,
    ) -> Self {
        Self {
            browser,
            metrics,
            results,
            config,
            category,
            vars: HashMap::new(),
            state: ScenarioState::default(),
        }
    }

    // ============ Metrics ============

    /// Open a metric record tagged with the scenario category.
    pub fn start_step(&self, name: &str, description: &str, action: ActionType) -> StepTimer {
        let started_at = now_millis();
        let id = self.metrics.start_categorized_step(
            name,
            description,
            action,
            self.category.as_deref(),
        );
        StepTimer { id, started_at }
    }

    /// Record the response time and return the response timestamp.
    pub fn responded(&self, timer: &StepTimer) -> i64 {
        self.metrics.record_response_time(&timer.id, timer.started_at);
        now_millis()
    }

    /// Close a step whose body returned the response timestamp.
    /// Errors mark the record failed and are passed through.
    pub fn finish(&self, timer: StepTimer, outcome: Result<i64>) -> Result<()> {
        match outcome {
            Ok(response_at) => {
                self.metrics.complete_step_with_response(
                    &timer.id,
                    timer.started_at,
                    response_at,
                    now_millis(),
                );
                Ok(())
            }
            Err(e) => {
                self.metrics.fail_step(&timer.id, timer.started_at);
                Err(e)
            }
        }
    }

    /// Close a step that has no separate response phase.
    pub fn finish_check(&self, timer: StepTimer, outcome: Result<()>) -> Result<()> {
        match outcome {
            Ok(()) => {
                self.metrics
                    .complete_step(&timer.id, timer.started_at, now_millis());
                Ok(())
            }
            Err(e) => {
                self.metrics.fail_step(&timer.id, timer.started_at);
                Err(e)
            }
        }
    }

    // ============ Results ============

    pub fn record_result(
        &self,
        name: &str,
        passed: bool,
        duration_ms: u64,
        category: &str,
        detail: &str,
    ) {
        self.results.record_test_result(
            name,
            Status::from_passed(passed),
            duration_ms,
            Some(category),
            detail,
        );
    }

    // ============ Timing ============

    /// Pause so client-side rendering can catch up.
    pub async fn settle(&self) {
        self.pause(self.config.settle_delay_ms).await;
    }

    /// Fixed pause for `ms`. Skipped entirely when the settle delay is zero.
    pub async fn pause(&self, ms: u64) {
        if ms > 0 && self.config.settle_delay_ms > 0 {
            tokio::time::sleep(Duration::from_millis(ms)).await;
        }
    }

    // ============ Variables ============

    /// Get a variable from vars or the process environment
    pub fn get_var(&self, name: &str) -> Option<String> {
        self.vars
            .get(name)
            .cloned()
            .or_else(|| std::env::var(name).ok())
    }

    pub fn set_var(&mut self, name: &str, value: &str) {
        let substituted = self.substitute_vars(value);
        self.vars.insert(name.to_string(), substituted);
    }

    /// Substitute `${NAME}` patterns in a string
    pub fn substitute_vars(&self, text: &str) -> String {
        static VAR_RE: OnceLock<Regex> = OnceLock::new();
        let re = VAR_RE.get_or_init(|| {
            Regex::new(r"\$\{([a-zA-Z0-9_.]+)\}").expect("valid variable pattern")
        });

        re.replace_all(text, |caps: &regex::Captures| {
            let key = &caps[1];

            if let Some(val) = self.get_var(key) {
                return val;
            }

            match key {
                "time" => chrono::Local::now().format("%H:%M:%S").to_string(),
                "date" => chrono::Local::now().format("%Y-%m-%d").to_string(),
                "timestamp" => chrono::Utc::now().timestamp().to_string(),
                // Keep original if not found
                _ => format!("${{{}}}", key),
            }
        })
        .to_string()
    }
}
