//! Waiting and lookup helpers shared by the step definitions.

use anyhow::Result;
use std::sync::Arc;

use crate::driver::common::{wait_until, PollConfig};
use crate::driver::traits::{Browser, Locator};
use crate::error::StepError;
use crate::runner::context::StepContext;

/// Wait for `document.readyState == "complete"`. Returns false on timeout.
pub async fn wait_for_ready(browser: &Arc<dyn Browser>, timeout_ms: u64) -> bool {
    let browser = browser.clone();
    wait_until(
        move || {
            let browser = browser.clone();
            async move { matches!(browser.ready_state().await.as_deref(), Ok("complete")) }
        },
        PollConfig::with_timeout(timeout_ms),
    )
    .await
}

/// Like [`wait_for_ready`] but a timeout is an error.
pub async fn ensure_ready(browser: &Arc<dyn Browser>, timeout_ms: u64) -> Result<()> {
    if wait_for_ready(browser, timeout_ms).await {
        Ok(())
    } else {
        Err(StepError::Timeout {
            what: "document ready state".to_string(),
            timeout_ms,
        }
        .into())
    }
}

/// Poll the current URL and lowercased body text until `check` accepts them.
pub async fn wait_for_page<F>(browser: &Arc<dyn Browser>, timeout_ms: u64, check: F) -> bool
where
    F: Fn(&str, &str) -> bool + Send + Sync + 'static,
{
    let browser = browser.clone();
    let check = Arc::new(check);
    wait_until(
        move || {
            let browser = browser.clone();
            let check = check.clone();
            async move {
                match page_snapshot(&browser).await {
                    Ok((url, body)) => check(&url, &body),
                    Err(_) => false,
                }
            }
        },
        PollConfig::with_timeout(timeout_ms),
    )
    .await
}

/// Current URL and lowercased body text.
pub async fn page_snapshot(browser: &Arc<dyn Browser>) -> Result<(String, String)> {
    let url = browser.current_url().await?;
    let body = browser.body_text().await?.to_lowercase();
    Ok((url, body))
}

/// First candidate that becomes visible within the timeout.
pub async fn first_visible(
    browser: &Arc<dyn Browser>,
    candidates: &[Locator],
    timeout_ms: u64,
) -> Option<Locator> {
    let found = Arc::new(std::sync::Mutex::new(None));
    let slot = found.clone();
    let browser = browser.clone();
    let candidates = candidates.to_vec();

    wait_until(
        move || {
            let browser = browser.clone();
            let candidates = candidates.clone();
            let slot = slot.clone();
            async move {
                for candidate in candidates {
                    if browser.is_visible(&candidate).await.unwrap_or(false) {
                        if let Ok(mut slot) = slot.lock() {
                            *slot = Some(candidate);
                        }
                        return true;
                    }
                }
                false
            }
        },
        PollConfig::with_timeout(timeout_ms),
    )
    .await;

    let result = found.lock().ok().and_then(|mut slot| slot.take());
    result
}

/// Wait for an element to be visible, bring it into view and click it.
pub async fn click_visible(ctx: &StepContext, locator: &Locator, timeout_ms: u64) -> Result<()> {
    if !ctx.browser.wait_for(locator, timeout_ms).await? {
        return Err(StepError::ElementNotFound(locator.to_string()).into());
    }
    ctx.browser.scroll_into_view(locator).await?;
    ctx.browser.click(locator).await
}

/// Click the first of `candidates` that becomes visible.
pub async fn click_first(
    ctx: &StepContext,
    candidates: &[Locator],
    timeout_ms: u64,
    what: &str,
) -> Result<Locator> {
    let locator = first_visible(&ctx.browser, candidates, timeout_ms)
        .await
        .ok_or_else(|| StepError::ElementNotFound(what.to_string()))?;
    ctx.browser.scroll_into_view(&locator).await?;
    ctx.browser.click(&locator).await?;
    Ok(locator)
}

/// Wait for an input, bring it into view and replace its value.
pub async fn fill_visible(
    ctx: &StepContext,
    locator: &Locator,
    text: &str,
    timeout_ms: u64,
) -> Result<()> {
    if !ctx.browser.wait_for(locator, timeout_ms).await? {
        return Err(StepError::ElementNotFound(locator.to_string()).into());
    }
    ctx.browser.scroll_into_view(locator).await?;
    ctx.browser.fill(locator, text).await
}

/// XPath matching any element whose own text contains `text`.
pub fn contains_text(text: &str) -> Locator {
    Locator::xpath(format!("//*[contains(text(),{})]", xpath_literal(text)))
}

/// Quote a string for use inside an XPath expression.
pub fn xpath_literal(text: &str) -> String {
    if !text.contains('\'') {
        format!("'{}'", text)
    } else if !text.contains('"') {
        format!("\"{}\"", text)
    } else {
        let parts: Vec<String> = text.split('\'').map(|p| format!("'{}'", p)).collect();
        format!("concat({})", parts.join(", \"'\", "))
    }
}

/// Everything up to the last `/` of an XPath, or None for a root-level path.
pub fn parent_xpath(xpath: &str) -> Option<&str> {
    xpath
        .rfind('/')
        .map(|i| xpath[..i].trim_end_matches('/'))
        .filter(|p| !p.is_empty())
}
