//! Browser implementation using Playwright
//!
//! One browser, one context and one page per session. The page is shared behind
//! an async mutex so calls from step code are serialized.

use anyhow::{Context, Result};
use async_trait::async_trait;
use colored::Colorize;
use playwright::api::{Browser as PwBrowser, BrowserContext, Page, Viewport};
use playwright::Playwright;
use serde_json::Value;
use std::str::FromStr;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::driver::traits::{Browser, Locator};

/// Web browser type
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BrowserType {
    #[default]
    Chromium,
    Firefox,
    Webkit,
}

impl BrowserType {
    pub fn as_str(&self) -> &'static str {
        match self {
            BrowserType::Chromium => "chromium",
            BrowserType::Firefox => "firefox",
            BrowserType::Webkit => "webkit",
        }
    }
}

impl FromStr for BrowserType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "chromium" | "chrome" | "edge" => Ok(BrowserType::Chromium),
            "firefox" => Ok(BrowserType::Firefox),
            "webkit" | "safari" => Ok(BrowserType::Webkit),
            other => anyhow::bail!("Unknown browser: {}", other),
        }
    }
}

/// Browser launch configuration
#[derive(Debug, Clone)]
pub struct BrowserConfig {
    pub browser_type: BrowserType,
    pub headless: bool,
    pub viewport_width: u32,
    pub viewport_height: u32,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        let headless = std::env::var("YUBA_HEADLESS")
            .map(|v| v == "true" || v == "1")
            .unwrap_or(false);

        let browser_type = std::env::var("YUBA_BROWSER")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or_default();

        Self {
            browser_type,
            headless,
            viewport_width: 1920,
            viewport_height: 1080,
        }
    }
}

/// Browser driven through Playwright
pub struct PlaywrightBrowser {
    #[allow(dead_code)]
    playwright: Arc<Playwright>,
    browser: Arc<PwBrowser>,
    #[allow(dead_code)]
    context: Arc<BrowserContext>,
    page: Arc<Mutex<Page>>,
    config: BrowserConfig,
}

impl PlaywrightBrowser {
    /// Launch a browser with a fresh context and page.
    pub async fn launch(config: BrowserConfig) -> Result<Self> {
        let playwright = Playwright::initialize()
            .await
            .context("Failed to initialize Playwright")?;

        println!(
            "{} Launching {} ({})",
            "🌐".blue(),
            config.browser_type.as_str().cyan(),
            if config.headless { "headless" } else { "headed" }
        );

        let args: Vec<String> = [
            "--no-sandbox",
            "--disable-dev-shm-usage",
            "--ignore-certificate-errors",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();

        let browser = match config.browser_type {
            BrowserType::Chromium => {
                playwright
                    .chromium()
                    .launcher()
                    .headless(config.headless)
                    .args(&args)
                    .launch()
                    .await?
            }
            BrowserType::Firefox => {
                playwright
                    .firefox()
                    .launcher()
                    .headless(config.headless)
                    .launch()
                    .await?
            }
            BrowserType::Webkit => {
                playwright
                    .webkit()
                    .launcher()
                    .headless(config.headless)
                    .launch()
                    .await?
            }
        };

        let context = browser.context_builder().build().await?;
        let page = context.new_page().await?;

        page.set_viewport_size(Viewport {
            width: config.viewport_width as i32,
            height: config.viewport_height as i32,
        })
        .await?;

        Ok(Self {
            playwright: Arc::new(playwright),
            browser: Arc::new(browser),
            context: Arc::new(context),
            page: Arc::new(Mutex::new(page)),
            config,
        })
    }

    async fn eval<T: serde::de::DeserializeOwned>(&self, script: &str) -> Result<T> {
        let page = self.page.lock().await;
        Ok(page.evaluate::<(), T>(script, ()).await?)
    }
}

#[async_trait]
impl Browser for PlaywrightBrowser {
    fn name(&self) -> &str {
        self.config.browser_type.as_str()
    }

    async fn navigate(&self, url: &str) -> Result<()> {
        let page = self.page.lock().await;
        page.goto_builder(url)
            .goto()
            .await
            .with_context(|| format!("Failed to navigate to {}", url))?;
        Ok(())
    }

    async fn current_url(&self) -> Result<String> {
        self.eval("() => window.location.href").await
    }

    async fn title(&self) -> Result<String> {
        self.eval("() => document.title").await
    }

    async fn count(&self, locator: &Locator) -> Result<usize> {
        let page = self.page.lock().await;
        let elements = page.query_selector_all(&locator.to_playwright()).await?;
        Ok(elements.len())
    }

    async fn is_visible(&self, locator: &Locator) -> Result<bool> {
        let page = self.page.lock().await;
        let element = page.query_selector(&locator.to_playwright()).await?;
        if let Some(el) = element {
            Ok(el.is_visible().await?)
        } else {
            Ok(false)
        }
    }

    async fn click(&self, locator: &Locator) -> Result<()> {
        let page = self.page.lock().await;
        page.click_builder(&locator.to_playwright())
            .click()
            .await
            .with_context(|| format!("Failed to click {}", locator))?;
        Ok(())
    }

    async fn fill(&self, locator: &Locator, text: &str) -> Result<()> {
        let page = self.page.lock().await;
        let element = page.query_selector(&locator.to_playwright()).await?;
        match element {
            Some(el) => {
                el.fill_builder(text).fill().await?;
                Ok(())
            }
            None => anyhow::bail!("Element not found: {}", locator),
        }
    }

    async fn select_option(&self, locator: &Locator, value: &str) -> Result<()> {
        let page = self.page.lock().await;
        let js = "(el, v) => { el.value = v; el.dispatchEvent(new Event('change', { bubbles: true })); return el.value === v; }";
        let selected: bool = page
            .evaluate_on_selector::<String, _>(&locator.to_playwright(), js, Some(value.to_string()))
            .await
            .with_context(|| format!("Failed to select '{}' in {}", value, locator))?;
        if !selected {
            anyhow::bail!("Option '{}' not available in {}", value, locator);
        }
        Ok(())
    }

    async fn text(&self, locator: &Locator) -> Result<String> {
        let page = self.page.lock().await;
        let js = "el => el.value || el.innerText || el.textContent || ''";
        let text: String = page
            .evaluate_on_selector::<String, _>(&locator.to_playwright(), js, None::<String>)
            .await
            .with_context(|| format!("Failed to read text of {}", locator))?;
        Ok(text)
    }

    async fn attribute(&self, locator: &Locator, name: &str) -> Result<Option<String>> {
        let page = self.page.lock().await;
        let value: Option<String> = page
            .evaluate_on_selector::<String, _>(
                &locator.to_playwright(),
                "(el, name) => el.getAttribute(name)",
                Some(name.to_string()),
            )
            .await?;
        Ok(value)
    }

    async fn scroll_into_view(&self, locator: &Locator) -> Result<()> {
        let page = self.page.lock().await;
        let element = page.query_selector(&locator.to_playwright()).await?;
        match element {
            Some(el) => {
                el.scroll_into_view_if_needed(None).await?;
                Ok(())
            }
            None => anyhow::bail!("Element not found: {}", locator),
        }
    }

    async fn wait_for(&self, locator: &Locator, timeout_ms: u64) -> Result<bool> {
        let page = self.page.lock().await;
        let result = page
            .wait_for_selector_builder(&locator.to_playwright())
            .timeout(timeout_ms as f64)
            .wait_for_selector()
            .await;
        Ok(result.is_ok())
    }

    async fn execute_script(&self, script: &str) -> Result<Value> {
        self.eval(script).await
    }

    async fn page_source(&self) -> Result<String> {
        let page = self.page.lock().await;
        Ok(page.content().await?)
    }

    async fn set_viewport(&self, width: u32, height: u32) -> Result<()> {
        let page = self.page.lock().await;
        page.set_viewport_size(Viewport {
            width: width as i32,
            height: height as i32,
        })
        .await?;
        Ok(())
    }

    async fn clear_cookies(&self) -> Result<()> {
        let page = self.page.lock().await;
        page.context().clear_cookies().await?;
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        self.browser.close().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_browser_type_parsing() {
        assert_eq!("Chrome".parse::<BrowserType>().unwrap(), BrowserType::Chromium);
        assert_eq!("firefox".parse::<BrowserType>().unwrap(), BrowserType::Firefox);
        assert_eq!("Safari".parse::<BrowserType>().unwrap(), BrowserType::Webkit);
        assert!("lynx".parse::<BrowserType>().is_err());
    }
}
