//! Form submission round trip against the public Selenium web form.

use anyhow::Result;

use super::support::{click_visible, fill_visible};
use crate::driver::common::{wait_until, PollConfig};
use crate::driver::traits::Locator;
use crate::error::{ensure, StepError};
use crate::runner::context::StepContext;

const PAGE_TITLE: &str = "Web form";
const CONFIRMATION: &str = "Received!";

pub async fn open(ctx: &StepContext) -> Result<()> {
    ctx.browser.navigate(&ctx.config.web_form_url).await?;

    let timeout_ms = 5000_u64.min(ctx.config.default_timeout_ms);
    let browser = ctx.browser.clone();
    let loaded = wait_until(
        move || {
            let browser = browser.clone();
            async move { matches!(browser.title().await.as_deref(), Ok(PAGE_TITLE)) }
        },
        PollConfig::with_timeout(timeout_ms),
    )
    .await;
    if !loaded {
        return Err(StepError::Timeout {
            what: format!("page title '{}'", PAGE_TITLE),
            timeout_ms,
        }
        .into());
    }
    Ok(())
}

pub async fn fill_details(ctx: &StepContext) -> Result<()> {
    let timeout = ctx.config.default_timeout_ms;
    fill_visible(ctx, &Locator::id("my-text-id"), "Cursor Bot", timeout).await?;
    fill_visible(
        ctx,
        &Locator::name("my-textarea"),
        "Exploring automated tests",
        timeout,
    )
    .await?;
    ctx.browser
        .select_option(&Locator::name("my-select"), "2")
        .await?;
    click_visible(ctx, &Locator::css("input[type='checkbox']"), timeout).await?;
    click_visible(ctx, &Locator::css("input[type='radio'][value='option2']"), timeout).await?;
    fill_visible(ctx, &Locator::name("my-date"), "04142025", timeout).await?;
    Ok(())
}

pub async fn submit(ctx: &StepContext) -> Result<()> {
    click_visible(ctx, &Locator::css("button"), ctx.config.default_timeout_ms).await
}

pub async fn confirmation_shown(ctx: &StepContext) -> Result<()> {
    let message = Locator::id("message");
    if !ctx
        .browser
        .wait_for(&message, ctx.config.default_timeout_ms)
        .await?
    {
        return Err(StepError::ElementNotFound(message.to_string()).into());
    }
    let text = ctx.browser.text(&message).await?;
    ensure(
        text.trim() == CONFIRMATION,
        format!("confirmation should read '{}' but was '{}'", CONFIRMATION, text),
    )?;
    Ok(())
}
