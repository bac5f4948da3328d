use std::sync::Arc;
use std::time::Instant;

use super::context::StepContext;
use super::events::{EventEmitter, TestEvent};
use super::metrics::MetricStore;
use super::results::ResultStore;
use super::state::Status;
use crate::driver::traits::Browser;
use crate::error::StepError;
use crate::parser::types::{Feature, Scenario};
use crate::steps::{self, StepRegistry};
use crate::utils::config::Config;

/// How one scenario ended
#[derive(Debug, Clone, PartialEq)]
pub struct ScenarioOutcome {
    pub status: Status,
    pub steps_passed: usize,
    pub steps_total: usize,
    pub error: Option<String>,
    pub duration_ms: u64,
}

/// Runs scenarios step by step against the shared stores
pub struct ScenarioExecutor<'a> {
    registry: &'a StepRegistry,
    emitter: &'a EventEmitter,
    metrics: Arc<MetricStore>,
    results: Arc<ResultStore>,
    config: Arc<Config>,
}

impl<'a> ScenarioExecutor<'a> {
    pub fn new(
        registry: &'a StepRegistry,
        emitter: &'a EventEmitter,
        metrics: Arc<MetricStore>,
        results: Arc<ResultStore>,
        config: Arc<Config>,
    ) -> Self {
        Self {
            registry,
            emitter,
            metrics,
            results,
            config,
        }
    }

    /// Run every step of `scenario`, skipping the rest after the first failure,
    /// and record the scenario outcome in the result store.
    pub async fn run_scenario(
        &self,
        browser: Arc<dyn Browser>,
        feature: &Feature,
        scenario: &Scenario,
    ) -> ScenarioOutcome {
        let category = scenario.effective_category(feature);
        let mut ctx = StepContext::new(
            browser,
            self.metrics.clone(),
            self.results.clone(),
            self.config.clone(),
            category.clone(),
        );

        self.emitter.emit(TestEvent::ScenarioStarted {
            feature: feature.name.clone(),
            scenario: scenario.name.clone(),
            step_count: scenario.steps.len(),
        });

        let started = Instant::now();
        let mut steps_passed = 0;
        let mut error: Option<String> = None;

        for (i, step) in scenario.steps.iter().enumerate() {
            let display = step.display_name();
            if error.is_some() {
                self.emitter.emit(TestEvent::StepSkipped {
                    index: i,
                    step: display,
                    reason: "Previous step failed".to_string(),
                });
                continue;
            }

            self.emitter.emit(TestEvent::StepStarted {
                index: i,
                step: display,
            });
            let step_started = Instant::now();

            // Substituted text may carry credentials; errors and logs use the raw text.
            let text = ctx.substitute_vars(&step.text);
            let outcome = match self.registry.resolve(&text) {
                Ok(kind) => steps::execute(&mut ctx, &kind).await,
                Err(e) => match e.downcast_ref::<StepError>() {
                    Some(StepError::Undefined(_)) => {
                        Err(StepError::Undefined(step.text.trim().to_string()).into())
                    }
                    _ => Err(e),
                },
            };
            let duration_ms = step_started.elapsed().as_millis() as u64;

            match outcome {
                Ok(()) => {
                    steps_passed += 1;
                    self.emitter.emit(TestEvent::StepPassed {
                        index: i,
                        duration_ms,
                    });
                }
                Err(e) => {
                    let message = format!("{:#}", e);
                    log::debug!("Step '{}' failed: {}", step.display_name(), message);
                    self.emitter.emit(TestEvent::StepFailed {
                        index: i,
                        error: message.clone(),
                        duration_ms,
                    });
                    error = Some(message);
                }
            }
        }

        let duration_ms = started.elapsed().as_millis() as u64;
        let status = if error.is_some() {
            Status::Failed
        } else if scenario.steps.is_empty() {
            Status::Skipped
        } else {
            Status::Passed
        };
        let detail = match &error {
            Some(message) => message.clone(),
            None => format!("{} steps passed", steps_passed),
        };
        self.results.record_test_result(
            &scenario.name,
            status,
            duration_ms,
            category.as_deref(),
            &detail,
        );

        self.emitter.emit(TestEvent::ScenarioFinished {
            scenario: scenario.name.clone(),
            status,
            duration_ms,
        });

        ScenarioOutcome {
            status,
            steps_passed,
            steps_total: scenario.steps.len(),
            error,
            duration_ms,
        }
    }

    /// Record a scenario that could not start.
    pub fn record_not_run(&self, feature: &Feature, scenario: &Scenario, reason: &str) -> ScenarioOutcome {
        let category = scenario.effective_category(feature);
        self.results.record_test_result(
            &scenario.name,
            Status::Failed,
            0,
            category.as_deref(),
            reason,
        );
        self.emitter.emit(TestEvent::ScenarioFinished {
            scenario: scenario.name.clone(),
            status: Status::Failed,
            duration_ms: 0,
        });
        ScenarioOutcome {
            status: Status::Failed,
            steps_passed: 0,
            steps_total: scenario.steps.len(),
            error: Some(reason.to_string()),
            duration_ms: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::fake::FakeBrowser;
    use crate::driver::traits::Locator;
    use crate::parser::yaml::parse_feature_content;

    struct Harness {
        registry: StepRegistry,
        emitter: EventEmitter,
        metrics: Arc<MetricStore>,
        results: Arc<ResultStore>,
        config: Arc<Config>,
    }

    impl Harness {
        fn new() -> Self {
            Self {
                registry: StepRegistry::builtin().unwrap(),
                emitter: EventEmitter::default(),
                metrics: Arc::new(MetricStore::new()),
                results: Arc::new(ResultStore::new()),
                config: Arc::new(Config::for_tests(std::env::temp_dir().join("yuba-e2e-exec"))),
            }
        }

        fn executor(&self) -> ScenarioExecutor<'_> {
            ScenarioExecutor::new(
                &self.registry,
                &self.emitter,
                self.metrics.clone(),
                self.results.clone(),
                self.config.clone(),
            )
        }
    }

    const FEATURE: &str = r#"
feature: Yuba website
tags: [website]
scenarios:
  - name: Homepage title
    steps:
      - Given I am on the Yuba homepage
      - Then I should see the page title contains "Yuba"
  - name: Broken homepage
    steps:
      - Given I am on the Yuba homepage
      - Then I should see the page title contains "Nowhere"
      - And I should see the "Get Started" button
  - name: Typo
    tags: ["@sim"]
    steps:
      - Given I am on the Yuba homepgae
"#;

    fn browser() -> Arc<dyn Browser> {
        Arc::new(
            FakeBrowser::new()
                .with_page("https://yubanow.com/", "Yuba", "Sounding Board")
                .with_element(Locator::xpath("//button[contains(text(),'Get Started')]"), "Get Started"),
        )
    }

    #[tokio::test]
    async fn test_passing_scenario_records_result() {
        let harness = Harness::new();
        let feature = parse_feature_content(FEATURE).unwrap();
        let outcome = harness
            .executor()
            .run_scenario(browser(), &feature, &feature.scenarios[0])
            .await;

        assert_eq!(outcome.status, Status::Passed);
        assert_eq!(outcome.steps_passed, 2);
        let result = harness.results.get("Homepage title").unwrap();
        assert_eq!(result.detail, "2 steps passed");
    }

    #[tokio::test]
    async fn test_failure_skips_remaining_steps() {
        let harness = Harness::new();
        let mut events = harness.emitter.subscribe();
        let feature = parse_feature_content(FEATURE).unwrap();
        let outcome = harness
            .executor()
            .run_scenario(browser(), &feature, &feature.scenarios[1])
            .await;

        assert_eq!(outcome.status, Status::Failed);
        assert_eq!(outcome.steps_passed, 1);
        assert!(outcome.error.unwrap().contains("Nowhere"));

        let mut skipped = 0;
        while let Ok(event) = events.try_recv() {
            if let TestEvent::StepSkipped { index, .. } = event {
                assert_eq!(index, 2);
                skipped += 1;
            }
        }
        assert_eq!(skipped, 1);
    }

    #[tokio::test]
    async fn test_undefined_step_fails_with_category() {
        let harness = Harness::new();
        let feature = parse_feature_content(FEATURE).unwrap();
        harness
            .executor()
            .run_scenario(browser(), &feature, &feature.scenarios[2])
            .await;

        let result = harness.results.get("Typo").unwrap();
        assert_eq!(result.status, Status::Failed);
        assert_eq!(result.category.as_deref(), Some("SIM"));
        assert_eq!(result.detail, "Undefined step: I am on the Yuba homepgae");
    }

    #[tokio::test]
    async fn test_undefined_step_keeps_variables_unexpanded() {
        std::env::set_var("YUBA_E2E_EXECUTOR_SECRET", "hunter2");
        let harness = Harness::new();
        let feature = parse_feature_content(
            r#"
feature: Sign in
scenarios:
  - name: Mistyped password step
    steps:
      - When I type the pasword "${YUBA_E2E_EXECUTOR_SECRET}"
"#,
        )
        .unwrap();
        let outcome = harness
            .executor()
            .run_scenario(browser(), &feature, &feature.scenarios[0])
            .await;

        let error = outcome.error.unwrap();
        assert!(!error.contains("hunter2"));
        assert_eq!(
            error,
            "Undefined step: I type the pasword \"${YUBA_E2E_EXECUTOR_SECRET}\""
        );
        let result = harness.results.get("Mistyped password step").unwrap();
        assert!(!result.detail.contains("hunter2"));
    }

    #[tokio::test]
    async fn test_record_not_run() {
        let harness = Harness::new();
        let feature = parse_feature_content(FEATURE).unwrap();
        let outcome =
            harness
                .executor()
                .record_not_run(&feature, &feature.scenarios[0], "browser session unavailable");
        assert_eq!(outcome.status, Status::Failed);
        assert_eq!(
            harness.results.get("Homepage title").unwrap().detail,
            "browser session unavailable"
        );
    }
}
