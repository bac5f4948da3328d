use std::path::PathBuf;

use crate::driver::web::{BrowserConfig, BrowserType};

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Site under test
    pub base_url: String,

    /// Public form page used by the form-submission scenarios
    pub web_form_url: String,

    /// Default timeout for element waiting (ms)
    pub default_timeout_ms: u64,

    /// Timeout for slow transitions such as dashboard or workspace loads (ms)
    pub extended_timeout_ms: u64,

    /// Fixed pause after navigation and clicks to let client-side rendering settle (ms)
    pub settle_delay_ms: u64,

    /// Directory for the summary, category, JSON and JUnit reports
    pub reports_dir: PathBuf,

    /// Directory for the dashboard / detailed / timeline pages
    pub dashboards_dir: PathBuf,

    /// Browser launch settings
    pub browser: BrowserConfig,

    /// Only run scenarios carrying at least one of these tags
    pub tags: Option<Vec<String>>,
}

impl Default for Config {
    fn default() -> Self {
        let env_or = |key: &str, fallback: &str| {
            std::env::var(key)
                .ok()
                .filter(|v| !v.trim().is_empty())
                .unwrap_or_else(|| fallback.to_string())
        };

        let settle_delay_ms = std::env::var("YUBA_SETTLE_MS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(2000);

        Self {
            base_url: env_or("YUBA_BASE_URL", "https://yubanow.com/"),
            web_form_url: env_or(
                "YUBA_WEB_FORM_URL",
                "https://www.selenium.dev/selenium/web/web-form.html",
            ),
            default_timeout_ms: 10000,
            extended_timeout_ms: 60000,
            settle_delay_ms,
            reports_dir: PathBuf::from(env_or("YUBA_REPORTS_DIR", "target/custom-reports")),
            dashboards_dir: PathBuf::from(env_or("YUBA_DASHBOARDS_DIR", "target/html-reports")),
            browser: BrowserConfig::default(),
            tags: None,
        }
    }
}

impl Config {
    /// Configuration for in-process runs against a scripted browser: no pauses, short waits.
    pub fn for_tests(reports_dir: PathBuf) -> Self {
        Self {
            base_url: "https://yubanow.com/".to_string(),
            web_form_url: "https://www.selenium.dev/selenium/web/web-form.html".to_string(),
            default_timeout_ms: 50,
            extended_timeout_ms: 50,
            settle_delay_ms: 0,
            dashboards_dir: reports_dir.join("html-reports"),
            reports_dir,
            browser: BrowserConfig {
                browser_type: BrowserType::Chromium,
                headless: true,
                viewport_width: 1280,
                viewport_height: 800,
            },
            tags: None,
        }
    }

    /// Resolve a path relative to the site root.
    pub fn site_url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            return path.to_string();
        }
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}
