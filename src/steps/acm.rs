//! Account credit management (ACM) navigation and page refresh (ARefresh) steps.

use anyhow::Result;
use std::sync::Arc;

use super::support::{click_first, page_snapshot, wait_for_ready};
use crate::driver::common::{wait_until, PollConfig};
use crate::driver::traits::{Browser, Locator};
use crate::error::ensure;
use crate::runner::category::ReportCategory;
use crate::runner::context::StepContext;
use crate::runner::state::ActionType;
use crate::utils::clock::now_millis;

pub const NEW_PAGE_RESULT: &str = "ACM Test - New Page Load Verification";
pub const CLICK_FAILED_RESULT: &str = "ACM Test - Element Click Failed";
pub const SELECT_FAILED_RESULT: &str = "ACM Test - Element Selection Failed";
pub const REFRESH_RESULT: &str = "ARefresh Test - Page Refresh Verification";

const DROPDOWN_TRIGGER: &str = "button[data-slot='dropdown-menu-trigger']";
const ALLOCATE_CREDITS: &str = "//button[contains(., 'Allocate Credits')]";
const TRANSFER_CREDITS: &str = "//div[@role='menuitem' and contains(., 'Transfer Credits')]";
const TRANSFER_CREDITS_ITEM: &str =
    "div[role='menuitem'][data-slot='dropdown-menu-item']:has-text('Transfer Credits')";
const RADIX_READY_JS: &str = "() => document.querySelectorAll('[id^=\"radix-\"]').length > 0";

/// Rendered pages shorter than this are treated as still loading
const MIN_CONTENT_CHARS: usize = 100;

fn elapsed_since(started_at: i64) -> u64 {
    (now_millis() - started_at).max(0) as u64
}

/// Wait for the dropdown primitives to mount. Returns false on timeout.
async fn wait_for_radix(browser: &Arc<dyn Browser>, timeout_ms: u64) -> bool {
    let browser = browser.clone();
    wait_until(
        move || {
            let browser = browser.clone();
            async move {
                browser
                    .execute_script(RADIX_READY_JS)
                    .await
                    .map(|v| v.as_bool().unwrap_or(false))
                    .unwrap_or(false)
            }
        },
        PollConfig::with_timeout(timeout_ms),
    )
    .await
}

pub async fn click_navigation_link(ctx: &mut StepContext, xpath: &str) -> Result<()> {
    if ctx.state.initial_url.is_none() {
        ctx.state.initial_url = Some(ctx.browser.current_url().await?);
    }

    let timer = ctx.start_step(
        &format!("Click ACM navigation link: {}", xpath),
        "Clicks the ACM navigation link",
        ActionType::Navigation,
    );
    let ctx = &*ctx;
    let outcome = async {
        let link = Locator::xpath(xpath);
        click_first(ctx, &[link], 20_000_u64.min(ctx.config.extended_timeout_ms), xpath).await?;
        let response = ctx.responded(&timer);
        ctx.pause(2000).await;
        wait_for_ready(&ctx.browser, ctx.config.extended_timeout_ms).await;
        ctx.pause(2000).await;
        if !wait_for_radix(&ctx.browser, ctx.config.default_timeout_ms).await {
            log::debug!("No dropdown primitives mounted after navigating to {}", xpath);
        }
        Ok(response)
    }
    .await;
    ctx.finish(timer, outcome)
}

/// Open the credits dropdown. Tries the trigger slot, the button text, then `xpath`.
pub async fn click_element(ctx: &StepContext, xpath: &str) -> Result<()> {
    let timer = ctx.start_step(
        &format!("Click ACM element: {}", xpath),
        "Clicks an ACM element (dropdown trigger button)",
        ActionType::Click,
    );
    ctx.pause(2000).await;

    let candidates = [
        Locator::css(DROPDOWN_TRIGGER),
        Locator::xpath(ALLOCATE_CREDITS),
        Locator::xpath(xpath),
    ];
    let timeout = 40_000_u64.min(ctx.config.extended_timeout_ms);
    if let Err(e) = click_first(ctx, &candidates, timeout, "Allocate Credits button").await {
        let buttons = ctx
            .browser
            .count(&Locator::css("button[data-slot]"))
            .await
            .unwrap_or(0);
        log::error!("ACM element not found; {} data-slot buttons on the page", buttons);
        ctx.record_result(
            CLICK_FAILED_RESULT,
            false,
            elapsed_since(timer.started_at),
            ReportCategory::Acm.label(),
            &format!(
                "Failed to find ACM element (Allocate Credits button). Tried: data-slot, text content, and XPath. Error: {:#}",
                e
            ),
        );
        return ctx.finish(timer, Err(e));
    }

    let response = ctx.responded(&timer);
    ctx.pause(2000).await;
    wait_for_ready(&ctx.browser, ctx.config.extended_timeout_ms).await;
    ctx.finish(timer, Ok(response))
}

/// Pick the transfer menu item and remember the URLs around the selection.
pub async fn select_element(ctx: &mut StepContext, xpath: &str) -> Result<()> {
    let timer = ctx.start_step(
        &format!("Select ACM element: {}", xpath),
        "Selects an ACM element (Transfer Credits menu item)",
        ActionType::Click,
    );
    ctx.state.url_before_selection = Some(ctx.browser.current_url().await?);
    ctx.pause(1000).await;

    let candidates = [
        Locator::xpath(TRANSFER_CREDITS),
        Locator::css(TRANSFER_CREDITS_ITEM),
        Locator::xpath(xpath),
    ];
    let timeout = 30_000_u64.min(ctx.config.extended_timeout_ms);
    if let Err(e) = click_first(ctx, &candidates, timeout, "Transfer Credits menu item").await {
        ctx.record_result(
            SELECT_FAILED_RESULT,
            false,
            elapsed_since(timer.started_at),
            ReportCategory::Acm.label(),
            &format!(
                "Failed to find ACM menu item (Transfer Credits). Tried: text content, data-slot, and XPath. Error: {:#}",
                e
            ),
        );
        return ctx.finish(timer, Err(e));
    }

    let response = ctx.responded(&timer);
    ctx.pause(3000).await;
    wait_for_ready(&ctx.browser, ctx.config.extended_timeout_ms).await;
    ctx.state.url_after_selection = Some(ctx.browser.current_url().await?);
    ctx.finish(timer, Ok(response))
}

/// Whether the browser ended up on a page other than the one the selection started from.
fn landed_on_new_page(
    current: &str,
    before: &str,
    after_selection: Option<&str>,
    body_chars: usize,
) -> bool {
    let url_changed = current != before && Some(current) != after_selection;
    let content_changed = body_chars > MIN_CONTENT_CHARS;
    url_changed
        || after_selection.is_some_and(|after| current != after)
        || (content_changed && current != before)
}

pub async fn new_page_loaded(ctx: &StepContext) -> Result<()> {
    let timer = ctx.start_step(
        "Verify new page loaded for ACM test",
        "Verifies that a new page loaded after the ACM selection",
        ActionType::Verification,
    );
    ctx.pause(3000).await;
    if !wait_for_ready(&ctx.browser, 10_000_u64.min(ctx.config.default_timeout_ms)).await {
        log::warn!("Page not fully ready, checking navigation anyway");
    }

    let outcome = async {
        let (current, body) = page_snapshot(&ctx.browser).await?;
        let before = ctx
            .state
            .url_before_selection
            .clone()
            .or_else(|| ctx.state.initial_url.clone())
            .unwrap_or_default();
        let loaded = landed_on_new_page(
            &current,
            &before,
            ctx.state.url_after_selection.as_deref(),
            body.chars().count(),
        );

        let detail = if loaded {
            format!(
                "New page loaded successfully. URL changed from '{}' to '{}'",
                before, current
            )
        } else {
            format!(
                "FAILED: New page did not load after clicking Transfer Credits. URL before selection: '{}', Current URL: '{}'. The page did not navigate to a new page as expected.",
                before, current
            )
        };
        ctx.record_result(
            NEW_PAGE_RESULT,
            loaded,
            elapsed_since(timer.started_at),
            ReportCategory::Acm.label(),
            &detail,
        );
        ensure(loaded, detail)?;
        Ok(())
    }
    .await;
    ctx.finish_check(timer, outcome)
}

pub async fn click_refresh(ctx: &StepContext) -> Result<()> {
    let timer = ctx.start_step(
        "Click refresh button",
        "Clicks the refresh button to reload the page",
        ActionType::Refresh,
    );
    let outcome = async {
        let candidates = [
            Locator::xpath("//button[@data-slot='button' and contains(., 'Refresh')]"),
            Locator::xpath("//button[contains(., 'Refresh')]"),
            Locator::css("button[data-slot='button']:has-text('Refresh')"),
        ];
        let timeout = 30_000_u64.min(ctx.config.extended_timeout_ms);
        click_first(ctx, &candidates, timeout, "Refresh button").await?;
        let response = ctx.responded(&timer);
        ctx.pause(500).await;
        wait_for_ready(&ctx.browser, ctx.config.extended_timeout_ms).await;
        ctx.pause(2000).await;
        Ok(response)
    }
    .await;
    ctx.finish(timer, outcome)
}

pub async fn refresh_loaded(ctx: &StepContext) -> Result<()> {
    let timer = ctx.start_step(
        "Verify page refresh and loading time",
        "Verifies that the page refreshed and finished loading",
        ActionType::Verification,
    );
    let ready = wait_for_ready(&ctx.browser, 10_000_u64.min(ctx.config.default_timeout_ms)).await;

    let outcome = async {
        let (url, body) = page_snapshot(&ctx.browser).await?;
        let loaded = ready && body.chars().count() > MIN_CONTENT_CHARS;
        let detail = if loaded {
            format!("Page refreshed and loaded successfully. URL: {}", url)
        } else {
            format!("Page did not refresh or load properly. URL: {}", url)
        };
        ctx.record_result(
            REFRESH_RESULT,
            loaded,
            elapsed_since(timer.started_at),
            ReportCategory::ARefresh.label(),
            &detail,
        );
        ensure(loaded, detail)?;
        Ok(())
    }
    .await;
    ctx.finish_check(timer, outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::fake::FakeBrowser;
    use crate::runner::context::tests::context;
    use crate::runner::state::Status;

    const DASHBOARD: &str = "https://yubanow.com/dashboard";
    const CREDITS: &str = "https://yubanow.com/credits";
    const TRANSFER: &str = "https://yubanow.com/credits/transfer";
    const NAV_LINK: &str = "//nav//a[@href='/credits']";
    const TRIGGER_XPATH: &str = "/html/body/main/div/button";
    const ITEM_XPATH: &str = "/html/body/div[3]/div[2]";

    fn long_body(prefix: &str) -> String {
        format!("{} {}", prefix, "credit balance ".repeat(10))
    }

    fn credits_site() -> FakeBrowser {
        FakeBrowser::new()
            .with_page(DASHBOARD, "Dashboard", &long_body("Dashboard"))
            .with_page(CREDITS, "Credits", &long_body("Credits"))
            .with_page(TRANSFER, "Transfer", &long_body("Transfer credits"))
            .with_element(Locator::xpath(NAV_LINK), "Credits")
            .on_click(Locator::xpath(NAV_LINK), CREDITS)
            .with_element(Locator::xpath(ALLOCATE_CREDITS), "Allocate Credits")
            .with_element(Locator::xpath(TRANSFER_CREDITS), "Transfer Credits")
            .on_click(Locator::xpath(TRANSFER_CREDITS), TRANSFER)
            .with_script("radix-", serde_json::Value::Bool(true))
    }

    #[test]
    fn test_landed_on_new_page() {
        assert!(landed_on_new_page(TRANSFER, CREDITS, Some(CREDITS), 10));
        assert!(!landed_on_new_page(CREDITS, CREDITS, Some(CREDITS), 500));
        assert!(!landed_on_new_page(CREDITS, CREDITS, None, 500));
        assert!(landed_on_new_page(TRANSFER, CREDITS, None, 10));
    }

    #[tokio::test]
    async fn test_acm_flow_records_new_page() {
        let (mut ctx, browser) = context(credits_site(), Some("ACM"));
        browser.navigate(DASHBOARD).await.unwrap();

        click_navigation_link(&mut ctx, NAV_LINK).await.unwrap();
        assert_eq!(ctx.state.initial_url.as_deref(), Some(DASHBOARD));

        click_element(&ctx, TRIGGER_XPATH).await.unwrap();
        assert_eq!(browser.clicks()[1], Locator::xpath(ALLOCATE_CREDITS));

        select_element(&mut ctx, ITEM_XPATH).await.unwrap();
        assert_eq!(ctx.state.url_before_selection.as_deref(), Some(CREDITS));
        assert_eq!(ctx.state.url_after_selection.as_deref(), Some(TRANSFER));

        new_page_loaded(&ctx).await.unwrap();
        let result = ctx.results.get(NEW_PAGE_RESULT).unwrap();
        assert_eq!(result.status, Status::Passed);
        assert_eq!(
            result.detail,
            format!(
                "New page loaded successfully. URL changed from '{}' to '{}'",
                CREDITS, TRANSFER
            )
        );
        assert!(ctx.metrics.ordered_metrics().iter().all(|m| m.in_category("ACM")));
    }

    #[tokio::test]
    async fn test_missing_trigger_records_click_failure() {
        let (ctx, _) = context(FakeBrowser::new(), Some("ACM"));
        assert!(click_element(&ctx, TRIGGER_XPATH).await.is_err());

        let result = ctx.results.get(CLICK_FAILED_RESULT).unwrap();
        assert_eq!(result.status, Status::Failed);
        assert!(result.detail.starts_with("Failed to find ACM element"));
        assert_eq!(ctx.metrics.ordered_metrics()[0].status, Status::Failed);
    }

    #[tokio::test]
    async fn test_selection_without_navigation_fails_verification() {
        let browser = FakeBrowser::new()
            .with_page(CREDITS, "Credits", &long_body("Credits"))
            .with_element(Locator::xpath(ITEM_XPATH), "Transfer Credits");
        let (mut ctx, browser) = context(browser, Some("ACM"));
        browser.navigate(CREDITS).await.unwrap();

        select_element(&mut ctx, ITEM_XPATH).await.unwrap();
        let err = new_page_loaded(&ctx).await.unwrap_err();
        assert!(err.to_string().contains("New page did not load"));
        assert_eq!(
            ctx.results.get(NEW_PAGE_RESULT).unwrap().status,
            Status::Failed
        );
    }

    #[tokio::test]
    async fn test_refresh_records_arefresh_result() {
        let refresh = Locator::xpath("//button[contains(., 'Refresh')]");
        let browser = FakeBrowser::new()
            .with_page(CREDITS, "Credits", &long_body("Credits"))
            .with_element(refresh.clone(), "Refresh")
            .on_click(refresh.clone(), CREDITS);
        let (ctx, browser) = context(browser, Some("ARefresh"));
        browser.navigate(CREDITS).await.unwrap();

        click_refresh(&ctx).await.unwrap();
        assert_eq!(browser.clicks(), vec![refresh]);

        refresh_loaded(&ctx).await.unwrap();
        let result = ctx.results.get(REFRESH_RESULT).unwrap();
        assert_eq!(result.status, Status::Passed);
        assert_eq!(result.category.as_deref(), Some("ARefresh"));
    }

    #[tokio::test]
    async fn test_refresh_on_empty_page_fails() {
        let (ctx, _) = context(FakeBrowser::new(), Some("ARefresh"));
        assert!(refresh_loaded(&ctx).await.is_err());
        assert_eq!(
            ctx.results.get(REFRESH_RESULT).unwrap().status,
            Status::Failed
        );
    }
}
