//! Scripted in-memory browser for unit tests.

use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use super::traits::{Browser, Locator};

#[derive(Debug, Clone, Default)]
pub struct FakePage {
    pub title: String,
    pub body: String,
}

#[derive(Debug, Clone)]
pub struct FakeElement {
    pub text: String,
    pub visible: bool,
    pub attributes: HashMap<String, String>,
}

#[derive(Default)]
struct State {
    url: String,
    page: FakePage,
    ready_state: String,
    pages: HashMap<String, FakePage>,
    elements: HashMap<Locator, FakeElement>,
    click_targets: HashMap<Locator, String>,
    scripts: Vec<(String, Value)>,
    navigations: Vec<String>,
    clicks: Vec<Locator>,
    fills: Vec<(Locator, String)>,
    selections: Vec<(Locator, String)>,
    viewport: (u32, u32),
    cookies_cleared: usize,
    closed: usize,
}

/// Browser double whose pages, elements and click effects are set up front.
pub struct FakeBrowser {
    state: Mutex<State>,
}

impl Default for FakeBrowser {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeBrowser {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State {
                url: "about:blank".to_string(),
                ready_state: "complete".to_string(),
                viewport: (1280, 800),
                ..Default::default()
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register the page served for `url`.
    pub fn with_page(self, url: &str, title: &str, body: &str) -> Self {
        self.lock().pages.insert(
            url.to_string(),
            FakePage {
                title: title.to_string(),
                body: body.to_string(),
            },
        );
        self
    }

    pub fn with_element(self, locator: Locator, text: &str) -> Self {
        self.lock().elements.insert(
            locator,
            FakeElement {
                text: text.to_string(),
                visible: true,
                attributes: HashMap::new(),
            },
        );
        self
    }

    pub fn with_hidden_element(self, locator: Locator) -> Self {
        self.lock().elements.insert(
            locator,
            FakeElement {
                text: String::new(),
                visible: false,
                attributes: HashMap::new(),
            },
        );
        self
    }

    /// Clicking `locator` navigates to `url`.
    pub fn on_click(self, locator: Locator, url: &str) -> Self {
        self.lock().click_targets.insert(locator, url.to_string());
        self
    }

    /// Scripts containing `fragment` evaluate to `value`.
    pub fn with_script(self, fragment: &str, value: Value) -> Self {
        self.lock().scripts.push((fragment.to_string(), value));
        self
    }

    pub fn with_ready_state(self, state: &str) -> Self {
        self.lock().ready_state = state.to_string();
        self
    }

    pub fn navigations(&self) -> Vec<String> {
        self.lock().navigations.clone()
    }

    pub fn clicks(&self) -> Vec<Locator> {
        self.lock().clicks.clone()
    }

    pub fn fills(&self) -> Vec<(Locator, String)> {
        self.lock().fills.clone()
    }

    pub fn selections(&self) -> Vec<(Locator, String)> {
        self.lock().selections.clone()
    }

    pub fn viewport(&self) -> (u32, u32) {
        self.lock().viewport
    }

    pub fn cookies_cleared(&self) -> usize {
        self.lock().cookies_cleared
    }

    pub fn closed(&self) -> usize {
        self.lock().closed
    }

    fn load(state: &mut State, url: &str) {
        state.url = url.to_string();
        state.page = state.pages.get(url).cloned().unwrap_or_default();
    }

    fn element(&self, locator: &Locator) -> Result<FakeElement> {
        self.lock()
            .elements
            .get(locator)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("Element not found: {}", locator))
    }
}

#[async_trait]
impl Browser for FakeBrowser {
    fn name(&self) -> &str {
        "fake"
    }

    async fn navigate(&self, url: &str) -> Result<()> {
        let mut state = self.lock();
        state.navigations.push(url.to_string());
        Self::load(&mut state, url);
        Ok(())
    }

    async fn current_url(&self) -> Result<String> {
        Ok(self.lock().url.clone())
    }

    async fn title(&self) -> Result<String> {
        Ok(self.lock().page.title.clone())
    }

    async fn count(&self, locator: &Locator) -> Result<usize> {
        Ok(usize::from(self.lock().elements.contains_key(locator)))
    }

    async fn is_visible(&self, locator: &Locator) -> Result<bool> {
        Ok(self
            .lock()
            .elements
            .get(locator)
            .map(|e| e.visible)
            .unwrap_or(false))
    }

    async fn click(&self, locator: &Locator) -> Result<()> {
        let element = self.element(locator)?;
        if !element.visible {
            anyhow::bail!("Element not visible: {}", locator);
        }
        let mut state = self.lock();
        state.clicks.push(locator.clone());
        if let Some(url) = state.click_targets.get(locator).cloned() {
            Self::load(&mut state, &url);
        }
        Ok(())
    }

    async fn fill(&self, locator: &Locator, text: &str) -> Result<()> {
        self.element(locator)?;
        self.lock().fills.push((locator.clone(), text.to_string()));
        Ok(())
    }

    async fn select_option(&self, locator: &Locator, value: &str) -> Result<()> {
        self.element(locator)?;
        self.lock()
            .selections
            .push((locator.clone(), value.to_string()));
        Ok(())
    }

    async fn text(&self, locator: &Locator) -> Result<String> {
        if *locator == Locator::css("body") {
            return Ok(self.lock().page.body.clone());
        }
        Ok(self.element(locator)?.text)
    }

    async fn attribute(&self, locator: &Locator, name: &str) -> Result<Option<String>> {
        Ok(self.element(locator)?.attributes.get(name).cloned())
    }

    async fn scroll_into_view(&self, locator: &Locator) -> Result<()> {
        self.element(locator).map(|_| ())
    }

    async fn wait_for(&self, locator: &Locator, _timeout_ms: u64) -> Result<bool> {
        if *locator == Locator::css("body") {
            return Ok(true);
        }
        self.is_visible(locator).await
    }

    async fn execute_script(&self, script: &str) -> Result<Value> {
        let state = self.lock();
        if let Some((_, value)) = state.scripts.iter().find(|(f, _)| script.contains(f.as_str())) {
            return Ok(value.clone());
        }
        let value = if script.contains("document.readyState") {
            Value::from(state.ready_state.clone())
        } else if script.contains("window.location.href") {
            Value::from(state.url.clone())
        } else if script.contains("document.title") {
            Value::from(state.page.title.clone())
        } else {
            Value::Null
        };
        Ok(value)
    }

    async fn page_source(&self) -> Result<String> {
        let state = self.lock();
        Ok(format!(
            "<html><head><title>{}</title></head><body>{}</body></html>",
            state.page.title, state.page.body
        ))
    }

    async fn set_viewport(&self, width: u32, height: u32) -> Result<()> {
        self.lock().viewport = (width, height);
        Ok(())
    }

    async fn clear_cookies(&self) -> Result<()> {
        self.lock().cookies_cleared += 1;
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        self.lock().closed += 1;
        Ok(())
    }
}
