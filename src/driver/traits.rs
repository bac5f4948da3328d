use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;
use std::fmt;

/// Element locator for web pages
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Locator {
    /// CSS selector
    Css(String),
    /// XPath expression
    XPath(String),
    /// Visible text, exact match
    Text(String),
    /// Element id
    Id(String),
    /// Form field name attribute
    Name(String),
}

impl Locator {
    pub fn css(s: impl Into<String>) -> Self {
        Locator::Css(s.into())
    }

    pub fn xpath(s: impl Into<String>) -> Self {
        Locator::XPath(s.into())
    }

    pub fn id(s: impl Into<String>) -> Self {
        Locator::Id(s.into())
    }

    pub fn text(s: impl Into<String>) -> Self {
        Locator::Text(s.into())
    }

    pub fn name(s: impl Into<String>) -> Self {
        Locator::Name(s.into())
    }

    /// Selector string in Playwright's selector engine syntax.
    pub fn to_playwright(&self) -> String {
        match self {
            Locator::Css(css) => css.clone(),
            Locator::XPath(xpath) => format!("xpath={}", xpath),
            Locator::Text(text) => format!("text=\"{}\"", text.replace('"', "\\\"")),
            Locator::Id(id) => format!("[id=\"{}\"]", id),
            Locator::Name(name) => format!("[name=\"{}\"]", name),
        }
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Locator::Css(s) => write!(f, "css '{}'", s),
            Locator::XPath(s) => write!(f, "xpath '{}'", s),
            Locator::Text(s) => write!(f, "text '{}'", s),
            Locator::Id(s) => write!(f, "#{}", s),
            Locator::Name(s) => write!(f, "[name={}]", s),
        }
    }
}

/// Browser capabilities used by step definitions
///
/// All methods act on the single page owned by the session.
#[async_trait]
pub trait Browser: Send + Sync {
    /// Engine name (chromium, firefox, webkit, ...)
    fn name(&self) -> &str;

    // ============ Navigation ============

    async fn navigate(&self, url: &str) -> Result<()>;

    async fn current_url(&self) -> Result<String>;

    async fn title(&self) -> Result<String>;

    async fn reload(&self) -> Result<()> {
        let url = self.current_url().await?;
        self.navigate(&url).await
    }

    // ============ Elements ============

    async fn count(&self, locator: &Locator) -> Result<usize>;

    async fn exists(&self, locator: &Locator) -> Result<bool> {
        Ok(self.count(locator).await? > 0)
    }

    async fn is_visible(&self, locator: &Locator) -> Result<bool>;

    async fn click(&self, locator: &Locator) -> Result<()>;

    /// Replace the value of an input element.
    async fn fill(&self, locator: &Locator, text: &str) -> Result<()>;

    /// Choose an option of a `<select>` by its value.
    async fn select_option(&self, _locator: &Locator, _value: &str) -> Result<()> {
        Err(anyhow::anyhow!("select_option not implemented for {}", self.name()))
    }

    /// Visible text (or form value) of the first match.
    async fn text(&self, locator: &Locator) -> Result<String>;

    async fn attribute(&self, locator: &Locator, name: &str) -> Result<Option<String>>;

    async fn scroll_into_view(&self, locator: &Locator) -> Result<()>;

    /// Wait until an element is attached and visible. Returns false on timeout.
    async fn wait_for(&self, locator: &Locator, timeout_ms: u64) -> Result<bool>;

    // ============ Page ============

    /// Evaluate a JavaScript expression or function and return its JSON value.
    async fn execute_script(&self, script: &str) -> Result<Value>;

    async fn page_source(&self) -> Result<String>;

    async fn body_text(&self) -> Result<String> {
        self.text(&Locator::css("body")).await
    }

    async fn ready_state(&self) -> Result<String> {
        let state = self.execute_script("() => document.readyState").await?;
        Ok(state.as_str().unwrap_or_default().to_string())
    }

    async fn set_viewport(&self, width: u32, height: u32) -> Result<()>;

    async fn clear_cookies(&self) -> Result<()>;

    async fn close(&self) -> Result<()>;
}
