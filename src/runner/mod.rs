pub mod category;
pub mod context;
pub mod events;
pub mod executor;
pub mod hooks;
pub mod metrics;
pub mod results;
pub mod session;
pub mod state;

use anyhow::{Context, Result};
use colored::Colorize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use uuid::Uuid;

pub use events::*;
pub use state::*;

use crate::parser::types::Feature;
use crate::parser::yaml::parse_feature_file;
use crate::steps::StepRegistry;
use crate::utils::config::Config;
use executor::ScenarioExecutor;
use hooks::SuiteHooks;
use session::{BrowserLauncher, PlaywrightLauncher};

/// Collect feature files from a file or directory
pub fn collect_feature_files(path: &Path) -> Vec<PathBuf> {
    if !path.is_dir() {
        return vec![path.to_path_buf()];
    }

    let mut files: Vec<PathBuf> = walkdir::WalkDir::new(path)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| {
            e.file_type().is_file()
                && e.path()
                    .extension()
                    .is_some_and(|ext| ext == "yaml" || ext == "yml")
        })
        .map(|e| e.path().to_path_buf())
        .collect();
    files.sort();
    files
}

/// Keep only scenarios carrying one of `tags`; features left empty are dropped.
pub fn filter_by_tags(features: Vec<Feature>, tags: Option<&[String]>) -> Vec<Feature> {
    let Some(tags) = tags.filter(|t| !t.is_empty()) else {
        return features;
    };
    features
        .into_iter()
        .filter_map(|mut feature| {
            let scenarios = std::mem::take(&mut feature.scenarios);
            feature.scenarios = scenarios
                .into_iter()
                .filter(|s| s.matches_tags(&feature, tags))
                .collect();
            (!feature.scenarios.is_empty()).then_some(feature)
        })
        .collect()
}

/// Run the feature files under `path` in a real browser
pub async fn run_tests(path: &Path, config: Config) -> Result<RunSummary> {
    let files = collect_feature_files(path);
    if files.is_empty() {
        println!("{} No feature files found.", "ℹ".blue());
        return Ok(RunSummary::default());
    }

    let features = files
        .iter()
        .map(|f| parse_feature_file(f).with_context(|| format!("Failed to parse {}", f.display())))
        .collect::<Result<Vec<_>>>()?;
    let features = filter_by_tags(features, config.tags.as_deref());
    if features.is_empty() {
        println!("{} No scenarios match the requested tags.", "ℹ".blue());
        return Ok(RunSummary::default());
    }

    let launcher = PlaywrightLauncher::new(config.browser.clone());
    run_features(&features, config, &launcher).await
}

/// Run parsed features: hooks around every scenario, reports at the end.
pub async fn run_features(
    features: &[Feature],
    config: Config,
    launcher: &dyn BrowserLauncher,
) -> Result<RunSummary> {
    let registry = StepRegistry::builtin()?;
    let config = Arc::new(config);
    let session_id = Uuid::new_v4().to_string();

    let (emitter, receiver) = EventEmitter::new();
    let listener = tokio::spawn(ConsoleEventListener::listen(receiver));
    emitter.emit(TestEvent::SessionStarted {
        session_id: session_id.clone(),
    });

    let mut hooks = SuiteHooks::new(&session_id, config.clone());
    let executor = ScenarioExecutor::new(
        &registry,
        &emitter,
        hooks.metrics.clone(),
        hooks.results.clone(),
        config,
    );

    let started = std::time::Instant::now();
    let mut summary = RunSummary::default();
    let session_error = hooks
        .before_all(launcher)
        .await
        .err()
        .map(|e| format!("browser session unavailable: {:#}", e));
    if let Some(reason) = &session_error {
        log::error!("{}", reason);
    }

    for feature in features {
        for scenario in &feature.scenarios {
            let outcome = match &session_error {
                Some(reason) => executor.record_not_run(feature, scenario, reason),
                None => match hooks.before_scenario().await {
                    Ok(browser) => executor.run_scenario(browser, feature, scenario).await,
                    Err(e) => executor.record_not_run(
                        feature,
                        scenario,
                        &format!("scenario setup failed: {:#}", e),
                    ),
                },
            };

            summary.scenarios += 1;
            summary.steps += outcome.steps_total;
            match outcome.status {
                Status::Passed => summary.passed += 1,
                Status::Failed => summary.failed += 1,
                Status::Skipped => summary.skipped += 1,
            }
        }
    }

    let reports = hooks.after_all().await;
    summary.duration_ms = started.elapsed().as_millis() as u64;

    emitter.emit(TestEvent::SessionFinished {
        summary: summary.clone(),
    });
    drop(executor);
    drop(emitter);
    if let Err(e) = listener.await {
        log::warn!("Console listener stopped abnormally: {}", e);
    }

    if !reports.failed.is_empty() {
        println!(
            "{} {} report(s) could not be written",
            "⚠".yellow(),
            reports.failed.len()
        );
    }
    Ok(summary)
}
