//! Workspace selection and user invitation (SIM) steps.

use anyhow::Result;

use super::support::{
    click_visible, ensure_ready, fill_visible, page_snapshot, parent_xpath, wait_for_page,
    wait_for_ready,
};
use crate::driver::traits::Locator;
use crate::error::StepError;
use crate::runner::category::ReportCategory;
use crate::runner::context::StepContext;
use crate::runner::state::ActionType;
use crate::utils::clock::now_millis;

const CHOOSE_WORKSPACE_PATH: &str = "choose-workspace";
const INDIVIDUAL_EMAIL_FIELD: &str = "//*[@id='individual-email']";
pub const INVITATION_RESULT: &str = "SIM Test - Complete User Invitation Verification";

fn left_sign_in(url: &str, initial: &str) -> bool {
    !url.contains("sign") && !url.contains("login") && !url.contains("auth") && url != initial
}

fn workspace_ready(body: &str) -> bool {
    let has_content = body.contains("choose your workspace")
        || body.contains("select a workspace")
        || body.contains("workspace")
        || body.contains("continue");
    (has_content && !body.contains("loading your workspaces")) || body.len() > 200
}

pub async fn wait_for_choose_workspace(ctx: &StepContext) -> Result<()> {
    let timer = ctx.start_step(
        "Wait for navigation to choose workspace page",
        "Waits for navigation to workspace selection page",
        ActionType::Navigation,
    );
    let timeout = ctx.config.extended_timeout_ms;
    let target = ctx.config.site_url(CHOOSE_WORKSPACE_PATH);
    let initial = ctx.browser.current_url().await?;

    let arrived = {
        let target = target.clone();
        wait_for_page(&ctx.browser, timeout, move |url, _| {
            left_sign_in(url, &initial) || url.contains(CHOOSE_WORKSPACE_PATH) || url == target
        })
        .await
    };

    if !arrived {
        let (url, body) = page_snapshot(&ctx.browser).await?;
        log::error!(
            "Timed out waiting for the choose-workspace page at {}. Body preview: {}",
            url,
            body.chars().take(500).collect::<String>()
        );
        return ctx.finish(
            timer,
            Err(StepError::Assertion(format!(
                "Failed to navigate to choose-workspace page. Current URL: {}",
                url
            ))
            .into()),
        );
    }

    let url = ctx.browser.current_url().await?;
    if !(url.contains(CHOOSE_WORKSPACE_PATH) || url == target) {
        // Navigated somewhere else: nothing left to wait for
        return ctx.finish_check(timer, Ok(()));
    }

    let outcome = async {
        if !wait_for_page(&ctx.browser, timeout, |_, body| workspace_ready(body)).await {
            return Err(StepError::Timeout {
                what: "workspace list".to_string(),
                timeout_ms: timeout,
            }
            .into());
        }
        ensure_ready(&ctx.browser, timeout).await?;
        ctx.pause(1000).await;
        Ok(ctx.responded(&timer))
    }
    .await;
    ctx.finish(timer, outcome)
}

/// Untracked click used to pick a workspace.
pub async fn select_element(ctx: &StepContext, xpath: &str) -> Result<()> {
    click_visible(ctx, &Locator::xpath(xpath), ctx.config.default_timeout_ms).await?;
    wait_for_ready(&ctx.browser, ctx.config.default_timeout_ms).await;
    ctx.settle().await;
    Ok(())
}

pub async fn click_element(ctx: &StepContext, xpath: &str) -> Result<()> {
    let timer = ctx.start_step(
        &format!("Click element: {}", xpath),
        "Clicks an element by XPath",
        ActionType::Click,
    );
    let outcome = async {
        click_visible(ctx, &Locator::xpath(xpath), ctx.config.extended_timeout_ms).await?;
        let response = ctx.responded(&timer);
        wait_for_ready(&ctx.browser, ctx.config.extended_timeout_ms).await;
        ctx.settle().await;
        Ok(response)
    }
    .await;
    ctx.finish(timer, outcome)
}

pub async fn click_button(ctx: &StepContext, xpath: &str) -> Result<()> {
    let timer = ctx.start_step(
        &format!("Click button: {}", xpath),
        "Clicks a button by XPath",
        ActionType::Click,
    );
    let outcome = async {
        let button = Locator::xpath(xpath);
        match click_visible(ctx, &button, ctx.config.extended_timeout_ms).await {
            Ok(()) => {
                let response = ctx.responded(&timer);
                ctx.pause(1000).await;
                Ok(response)
            }
            Err(e) => {
                // The layout shifts after a selection; try the first button under the same parent
                let parent = parent_xpath(xpath).ok_or(e)?;
                let fallback = Locator::xpath(format!("({}//button)[1]", parent));
                log::warn!("Button {} not found, trying {}", button, fallback);
                click_visible(ctx, &fallback, ctx.config.default_timeout_ms)
                    .await
                    .map_err(|_| {
                        StepError::ElementNotFound(format!(
                            "button at {} (page structure may have changed after selection)",
                            xpath
                        ))
                    })?;
                Ok(ctx.responded(&timer))
            }
        }
    }
    .await;
    ctx.finish(timer, outcome)
}

pub async fn click_navigation_link(ctx: &StepContext, xpath: &str) -> Result<()> {
    let timer = ctx.start_step(
        &format!("Click navigation link: {}", xpath),
        "Clicks a navigation link by XPath",
        ActionType::Navigation,
    );
    let outcome = async {
        click_visible(ctx, &Locator::xpath(xpath), ctx.config.extended_timeout_ms).await?;
        let response = ctx.responded(&timer);
        ctx.pause(1500).await;
        wait_for_ready(&ctx.browser, ctx.config.extended_timeout_ms).await;
        Ok(response)
    }
    .await;
    ctx.finish(timer, outcome)
}

pub async fn enter_invitation_email(ctx: &StepContext, email: &str) -> Result<()> {
    let timer = ctx.start_step(
        "Enter email in individual email field",
        "Enters email address in the individual email input field",
        ActionType::Input,
    );
    let outcome = async {
        fill_visible(
            ctx,
            &Locator::xpath(INDIVIDUAL_EMAIL_FIELD),
            email,
            ctx.config.default_timeout_ms,
        )
        .await?;
        let response = ctx.responded(&timer);
        ctx.pause(500).await;
        Ok(response)
    }
    .await;
    ctx.finish(timer, outcome)
}

pub async fn submit_form(ctx: &StepContext, xpath: &str) -> Result<()> {
    let timer = ctx.start_step(
        &format!("Click form submit button: {}", xpath),
        "Submits the form by clicking the submit button",
        ActionType::Submit,
    );
    let started_at = timer.started_at;
    let outcome = async {
        click_visible(ctx, &Locator::xpath(xpath), ctx.config.default_timeout_ms).await?;
        let response = ctx.responded(&timer);
        ctx.settle().await;
        wait_for_ready(&ctx.browser, ctx.config.default_timeout_ms).await;
        Ok(response)
    }
    .await;

    let elapsed = (now_millis() - started_at).max(0) as u64;
    let detail = match &outcome {
        Ok(_) => "Invitation form submitted and page settled".to_string(),
        Err(e) => format!("Invitation form could not be submitted: {:#}", e),
    };
    ctx.record_result(
        INVITATION_RESULT,
        outcome.is_ok(),
        elapsed,
        ReportCategory::Sim.label(),
        &detail,
    );
    ctx.finish(timer, outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::fake::FakeBrowser;
    use crate::driver::traits::Browser;
    use crate::runner::context::tests::context;
    use crate::runner::state::Status;

    const SIGN_IN: &str = "https://yubanow.com/sign-in";
    const WORKSPACE: &str = "https://yubanow.com/choose-workspace";
    const SUBMIT: &str = "/html/body/div[2]/form/button";

    #[tokio::test]
    async fn test_choose_workspace_wait() {
        let browser = FakeBrowser::new()
            .with_page(WORKSPACE, "Yuba", "Choose your workspace. Continue");
        let (ctx, browser) = context(browser, Some("SIM"));
        browser.navigate(WORKSPACE).await.unwrap();

        wait_for_choose_workspace(&ctx).await.unwrap();
        let record = &ctx.metrics.ordered_metrics()[0];
        assert_eq!(record.status, Status::Passed);
        assert!(record.in_category("SIM"));
    }

    #[tokio::test]
    async fn test_choose_workspace_timeout_fails_step() {
        let browser = FakeBrowser::new().with_page(SIGN_IN, "Sign in", "Sign in");
        let (ctx, browser) = context(browser, Some("SIM"));
        browser.navigate(SIGN_IN).await.unwrap();

        let err = wait_for_choose_workspace(&ctx).await.unwrap_err();
        assert!(err.to_string().contains("choose-workspace"));
        assert_eq!(ctx.metrics.ordered_metrics()[0].status, Status::Failed);
    }

    #[tokio::test]
    async fn test_click_button_falls_back_to_sibling() {
        let browser = FakeBrowser::new()
            .with_element(Locator::xpath("(/html/body/div[2]/form//button)[1]"), "Invite");
        let (ctx, browser) = context(browser, Some("SIM"));

        click_button(&ctx, SUBMIT).await.unwrap();
        assert_eq!(
            browser.clicks(),
            vec![Locator::xpath("(/html/body/div[2]/form//button)[1]")]
        );
    }

    #[tokio::test]
    async fn test_submit_records_invitation_result() {
        let browser = FakeBrowser::new().with_element(Locator::xpath(SUBMIT), "Send");
        let (ctx, _) = context(browser, Some("SIM"));
        submit_form(&ctx, SUBMIT).await.unwrap();

        let result = ctx.results.get(INVITATION_RESULT).unwrap();
        assert_eq!(result.status, Status::Passed);
        assert_eq!(result.category.as_deref(), Some("SIM"));

        let (ctx, _) = context(FakeBrowser::new(), Some("SIM"));
        assert!(submit_form(&ctx, SUBMIT).await.is_err());
        assert_eq!(
            ctx.results.get(INVITATION_RESULT).unwrap().status,
            Status::Failed
        );
    }
}
