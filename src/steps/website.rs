//! Public website content checks.

use anyhow::Result;

use super::support::{contains_text, first_visible, xpath_literal};
use crate::driver::traits::Locator;
use crate::error::{ensure, StepError};
use crate::runner::context::StepContext;

/// Fragments of the hero heading, which the site splits across elements
const MAIN_HEADING_PARTS: [&str; 3] = ["Sounding Board", "Early Stage", "African Entrepreneurs"];

pub async fn open_homepage(ctx: &StepContext) -> Result<()> {
    ctx.browser.navigate(&ctx.config.base_url).await?;
    ctx.browser
        .wait_for(&Locator::css("body"), ctx.config.default_timeout_ms)
        .await?;
    ctx.settle().await;
    Ok(())
}

pub async fn title_contains(ctx: &StepContext, expected: &str) -> Result<()> {
    let title = ctx.browser.title().await?;
    ensure(
        title.to_lowercase().contains(&expected.to_lowercase()),
        format!("page title '{}' should contain '{}'", title, expected),
    )?;
    Ok(())
}

pub async fn main_heading(ctx: &StepContext, heading: &str) -> Result<()> {
    let body = ctx.browser.body_text().await?.to_lowercase();
    if body.contains(&heading.to_lowercase()) {
        return Ok(());
    }
    for part in MAIN_HEADING_PARTS {
        ensure(
            body.contains(&part.to_lowercase()),
            format!("main heading '{}' not found (missing '{}')", heading, part),
        )?;
    }
    Ok(())
}

/// Wait for the first visible match among `candidates`.
async fn expect_visible(ctx: &StepContext, candidates: &[Locator], what: &str) -> Result<Locator> {
    first_visible(&ctx.browser, candidates, ctx.config.default_timeout_ms)
        .await
        .ok_or_else(|| StepError::ElementNotFound(what.to_string()).into())
}

pub async fn button_visible(ctx: &StepContext, text: &str) -> Result<()> {
    let t = xpath_literal(text);
    let candidates = [
        Locator::xpath(format!("//button[contains(text(),{})]", t)),
        Locator::xpath(format!("//a[contains(text(),{})]", t)),
        contains_text(text),
    ];
    expect_visible(ctx, &candidates, &format!("'{}' button", text)).await?;
    Ok(())
}

pub async fn link_visible(ctx: &StepContext, text: &str) -> Result<()> {
    let link = Locator::xpath(format!("//a[contains(text(),{})]", xpath_literal(text)));
    expect_visible(ctx, &[link], &format!("'{}' link", text)).await?;
    Ok(())
}

pub async fn click_navigation(ctx: &StepContext, item: &str) -> Result<()> {
    let t = xpath_literal(item);
    let candidates = [
        Locator::xpath(format!("//nav//a[contains(text(),{})]", t)),
        Locator::xpath(format!("//*[contains(@class,'nav')]//a[contains(text(),{})]", t)),
    ];
    let link = expect_visible(ctx, &candidates, &format!("navigation item '{}'", item)).await?;
    ctx.browser.scroll_into_view(&link).await?;
    ctx.browser.click(&link).await?;
    ctx.pause(1000).await;
    Ok(())
}

/// Any element whose text contains `text` is visible, scrolled into view.
pub async fn text_visible(ctx: &StepContext, text: &str) -> Result<()> {
    let element = expect_visible(ctx, &[contains_text(text)], &format!("'{}'", text)).await?;
    ctx.browser.scroll_into_view(&element).await?;
    Ok(())
}

/// Scroll to the first element mentioning any of `texts`.
pub async fn scroll_to_text(ctx: &StepContext, texts: &[&str]) -> Result<()> {
    let candidates: Vec<Locator> = texts.iter().map(|t| contains_text(t)).collect();
    let element = expect_visible(ctx, &candidates, &texts.join(" / ")).await?;
    ctx.browser.scroll_into_view(&element).await?;
    ctx.pause(1500).await;
    Ok(())
}

pub async fn heading_visible(ctx: &StepContext, text: &str) -> Result<()> {
    let t = xpath_literal(text);
    let candidates = [
        Locator::xpath(format!("//h1[contains(text(),{})]", t)),
        Locator::xpath(format!("//h2[contains(text(),{})]", t)),
        Locator::xpath(format!("//h3[contains(text(),{})]", t)),
        Locator::xpath(format!(
            "//*[contains(@class,'heading') and contains(text(),{})]",
            t
        )),
    ];
    expect_visible(ctx, &candidates, &format!("'{}' heading", text)).await?;
    Ok(())
}

/// The page body mentions every one of `expected` (case-insensitive).
pub async fn body_mentions_all(ctx: &StepContext, expected: &[String]) -> Result<()> {
    let body = ctx.browser.body_text().await?.to_lowercase();
    let missing: Vec<&str> = expected
        .iter()
        .filter(|e| !body.contains(&e.to_lowercase()))
        .map(String::as_str)
        .collect();
    ensure(
        missing.is_empty(),
        format!("page should mention {}", missing.join(", ")),
    )?;
    Ok(())
}

/// The page body mentions at least one of `any_of` (case-insensitive).
pub async fn body_mentions_any(ctx: &StepContext, any_of: &[&str], what: &str) -> Result<()> {
    let body = ctx.browser.body_text().await?.to_lowercase();
    ensure(
        any_of.iter().any(|term| body.contains(term)),
        format!("page should show {}", what),
    )?;
    Ok(())
}

pub async fn partner_logos(ctx: &StepContext) -> Result<()> {
    let images = ctx.browser.count(&Locator::css("img")).await?;
    ensure(images > 0, "partner logos should be displayed")?;
    Ok(())
}

pub async fn open_faqs(ctx: &StepContext) -> Result<()> {
    let link = Locator::xpath("//a[contains(text(),'FAQ')]");
    if ctx
        .browser
        .wait_for(&link, ctx.config.default_timeout_ms)
        .await?
    {
        ctx.browser.scroll_into_view(&link).await?;
        if ctx.browser.click(&link).await.is_ok() {
            ctx.pause(1000).await;
            return Ok(());
        }
    }
    log::debug!("FAQ link not clickable, scrolling to the FAQ section instead");
    scroll_to_text(ctx, &["Frequently Asked", "FAQ"]).await
}

pub async fn scroll_to_footer(ctx: &StepContext) -> Result<()> {
    ctx.browser
        .execute_script("() => window.scrollTo(0, document.body.scrollHeight)")
        .await?;
    ctx.pause(1500).await;
    Ok(())
}

pub async fn contact_email(ctx: &StepContext, email: &str) -> Result<()> {
    let candidates = [
        contains_text(email),
        Locator::xpath("//a[contains(@href,'mailto:')]"),
    ];
    expect_visible(ctx, &candidates, &format!("contact email '{}'", email)).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::fake::FakeBrowser;
    use crate::runner::context::tests::context;

    const HOME: &str = "https://yubanow.com/";

    fn site() -> FakeBrowser {
        FakeBrowser::new()
            .with_page(
                HOME,
                "Yuba | Sounding Board",
                "The Sounding Board for Early Stage African Entrepreneurs. Fintech Agritech. \u{a9} 2025 Yuba",
            )
            .with_element(contains_text("Get Started"), "Get Started")
            .with_element(Locator::css("img"), "")
            .with_element(
                Locator::xpath("//nav//a[contains(text(),'About')]"),
                "About",
            )
    }

    #[tokio::test]
    async fn test_homepage_content() {
        let (ctx, browser) = context(site(), None);
        open_homepage(&ctx).await.unwrap();
        assert_eq!(browser.navigations(), vec![HOME.to_string()]);

        title_contains(&ctx, "yuba").await.unwrap();
        assert!(title_contains(&ctx, "Welcome").await.is_err());

        main_heading(&ctx, "The Sounding Board for Early Stage African Entrepreneurs")
            .await
            .unwrap();
        button_visible(&ctx, "Get Started").await.unwrap();
        partner_logos(&ctx).await.unwrap();
        body_mentions_any(&ctx, &["\u{a9}", "copyright", "yuba"], "copyright information")
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_body_mentions_all_reports_missing_terms() {
        let (ctx, _) = context(site(), None);
        open_homepage(&ctx).await.unwrap();
        let err = body_mentions_all(
            &ctx,
            &["fintech".to_string(), "Healthtech".to_string(), "Edtech".to_string()],
        )
        .await
        .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Assertion failed: page should mention Healthtech, Edtech"
        );
    }

    #[tokio::test]
    async fn test_navigation_click_and_missing_link() {
        let (ctx, browser) = context(site(), None);
        click_navigation(&ctx, "About").await.unwrap();
        assert_eq!(browser.clicks().len(), 1);

        let err = link_visible(&ctx, "Careers").await.unwrap_err();
        assert!(err.to_string().contains("'Careers' link"));
    }
}
