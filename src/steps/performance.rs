//! Page load, availability and desktop compatibility checks.

use anyhow::{Context, Result};
use std::time::Duration;

use super::support::{ensure_ready, page_snapshot};
use crate::driver::traits::Locator;
use crate::error::ensure;
use crate::runner::category::PERFORMANCE;
use crate::runner::context::StepContext;
use crate::runner::state::ActionType;
use crate::utils::clock::now_millis;

const DESKTOP_WIDTH: u32 = 1920;
const DESKTOP_HEIGHT: u32 = 1080;
const MIN_DESKTOP_WIDTH: i64 = 1024;
/// Allowed overflow before the page counts as horizontally scrolling
const SCROLL_TOLERANCE_PX: i64 = 5;
const MAIN_COMPONENTS: [&str; 5] = ["body", "nav", "header", "main", "footer"];

const NAVIGATION_TIMING_JS: &str = "() => { const t = window.performance && window.performance.timing; \
    return t && t.loadEventEnd > 0 ? (t.loadEventEnd - t.navigationStart) : 0; }";

/// How the browser should be prepared before navigating
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Viewport {
    Current,
    Desktop,
}

pub async fn navigate(ctx: &mut StepContext, viewport: Viewport, browser: Option<&str>) -> Result<()> {
    if let Some(requested) = browser {
        if !requested.eq_ignore_ascii_case(ctx.browser.name()) {
            log::info!(
                "Scenario asks for {}, session runs {}",
                requested,
                ctx.browser.name()
            );
        }
    }
    if viewport == Viewport::Desktop {
        ctx.browser
            .set_viewport(DESKTOP_WIDTH, DESKTOP_HEIGHT)
            .await?;
    }

    let timer = ctx.start_step(
        "Navigate to Yuba website",
        "Opens the Yuba website for load measurements",
        ActionType::Navigation,
    );
    ctx.state.page_load_started_at = Some(timer.started_at);
    ctx.state.page_load_ended_at = None;
    let outcome = async {
        ctx.browser.navigate(&ctx.config.base_url).await?;
        Ok(ctx.responded(&timer))
    }
    .await;
    ctx.finish(timer, outcome)
}

pub async fn page_loads(ctx: &mut StepContext, completely: bool) -> Result<()> {
    let timeout = ctx.config.default_timeout_ms;
    ctx.browser.wait_for(&Locator::css("body"), timeout).await?;
    ensure_ready(&ctx.browser, timeout).await?;
    if completely {
        ctx.settle().await;
    }
    ctx.state.page_load_ended_at = Some(now_millis());
    Ok(())
}

pub async fn loaded_successfully(ctx: &StepContext) -> Result<()> {
    let (url, body) = page_snapshot(&ctx.browser).await?;
    let host = site_host(&ctx.config.base_url);
    ensure(
        url.contains(host),
        format!("website should load at {}, got {}", host, url),
    )?;
    ensure(!body.trim().is_empty(), "page should have content")?;
    Ok(())
}

fn site_host(url: &str) -> &str {
    let rest = url.split_once("://").map(|(_, r)| r).unwrap_or(url);
    rest.split('/').next().unwrap_or(rest)
}

pub async fn http_ok(ctx: &StepContext) -> Result<()> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(5))
        .build()?;
    let response = client
        .get(&ctx.config.base_url)
        .send()
        .await
        .context("Failed to check HTTP status code")?;
    let status = response.status();
    ensure(
        status == reqwest::StatusCode::OK,
        format!("HTTP status code should be 200 OK, but got: {}", status.as_u16()),
    )?;
    Ok(())
}

/// Error page detection over the URL, page source and body text (all lowercase).
pub fn error_page(url: &str, source: &str, body: &str) -> Option<&'static str> {
    for code in ["404", "403", "500", "502", "503", "error"] {
        if url.contains(code) {
            return Some("URL carries an error indicator");
        }
    }
    let checks: [(bool, &'static str); 8] = [
        (source.contains("404") && body.contains("not found"), "404 not found"),
        (source.contains("403") && body.contains("forbidden"), "403 forbidden"),
        (
            source.contains("500") && body.contains("internal server error"),
            "500 internal server error",
        ),
        (source.contains("502") && body.contains("bad gateway"), "502 bad gateway"),
        (
            source.contains("503") && body.contains("service unavailable"),
            "503 service unavailable",
        ),
        (body.contains("error 404"), "error 404"),
        (body.contains("error 403"), "error 403"),
        (body.contains("error 500"), "error 500"),
    ];
    checks
        .into_iter()
        .find(|(hit, _)| *hit)
        .map(|(_, reason)| reason)
}

pub async fn no_server_errors(ctx: &StepContext) -> Result<()> {
    let (url, body) = page_snapshot(&ctx.browser).await?;
    let source = ctx.browser.page_source().await?.to_lowercase();
    if let Some(reason) = error_page(&url.to_lowercase(), &source, &body) {
        ensure(false, format!("page should not be an error page ({})", reason))?;
    }
    Ok(())
}

pub async fn load_time_below(ctx: &StepContext, limit_secs: u64) -> Result<()> {
    let measured = ctx
        .browser
        .execute_script(NAVIGATION_TIMING_JS)
        .await
        .ok()
        .and_then(|v| v.as_f64())
        .filter(|ms| *ms > 0.0)
        .map(|ms| ms as i64);

    let load_ms = match measured {
        Some(ms) => ms,
        None => {
            let started = ctx.state.page_load_started_at.unwrap_or_else(now_millis);
            let ended = ctx.state.page_load_ended_at.unwrap_or_else(now_millis);
            ended - started
        }
    }
    .max(0);
    let load_secs = load_ms as f64 / 1000.0;
    let passed = load_secs < limit_secs as f64;

    ctx.record_result(
        "Page Load Time",
        passed,
        load_ms as u64,
        ctx.category.as_deref().unwrap_or(PERFORMANCE),
        &format!("Page loaded in {:.2}s (limit {}s)", load_secs, limit_secs),
    );
    ensure(
        passed,
        format!(
            "page load time should be less than {} seconds, but was: {} seconds",
            limit_secs, load_secs
        ),
    )?;
    Ok(())
}

async fn script_i64(ctx: &StepContext, script: &str) -> Result<Option<i64>> {
    Ok(ctx.browser.execute_script(script).await?.as_i64())
}

pub async fn desktop_layout(ctx: &StepContext) -> Result<()> {
    let width = script_i64(ctx, "() => window.innerWidth")
        .await?
        .unwrap_or(ctx.config.browser.viewport_width as i64);
    ensure(
        width >= MIN_DESKTOP_WIDTH,
        format!(
            "desktop viewport width should be at least {}px, got {}px",
            MIN_DESKTOP_WIDTH, width
        ),
    )?;
    ensure(
        ctx.browser.is_visible(&Locator::css("body")).await?,
        "main content should be visible",
    )?;
    Ok(())
}

/// Informational only: nested and floating elements overlap on any real page.
pub async fn layout_alignment(ctx: &StepContext) -> Result<()> {
    let overflowing = script_i64(
        ctx,
        "() => Array.from(document.querySelectorAll('body *')).filter(el => { \
         const r = el.getBoundingClientRect(); \
         return r.width > 0 && r.right > document.documentElement.clientWidth + 5; }).length",
    )
    .await?
    .unwrap_or(0);
    log::debug!("{} element(s) extend past the viewport edge", overflowing);
    Ok(())
}

pub async fn no_horizontal_scroll(ctx: &StepContext) -> Result<()> {
    let scroll_width = script_i64(ctx, "() => document.documentElement.scrollWidth")
        .await?
        .unwrap_or(0);
    let client_width = script_i64(ctx, "() => document.documentElement.clientWidth")
        .await?
        .unwrap_or(0);
    ensure(
        scroll_width <= client_width + SCROLL_TOLERANCE_PX,
        format!(
            "page should not have horizontal scrolling. Scroll width: {}, Client width: {}",
            scroll_width, client_width
        ),
    )?;
    Ok(())
}

pub async fn main_components_visible(ctx: &StepContext) -> Result<()> {
    for component in MAIN_COMPONENTS {
        let locator = Locator::css(component);
        // Not every page has every landmark
        if ctx.browser.exists(&locator).await? {
            ensure(
                ctx.browser.is_visible(&locator).await?,
                format!("main UI component '{}' should be visible", component),
            )?;
        }
    }
    ensure(
        ctx.browser.is_visible(&Locator::css("body")).await?,
        "body element should be visible",
    )?;
    ensure(
        !ctx.browser.body_text().await?.trim().is_empty(),
        "body should have content",
    )?;
    Ok(())
}

pub async fn renders_without_errors(ctx: &StepContext) -> Result<()> {
    let source = ctx.browser.page_source().await?.to_lowercase();
    let body = ctx.browser.body_text().await?.to_lowercase();
    let script_error =
        source.contains("error") && (source.contains("javascript") || body.contains("script error"));
    let rendering_error = body.contains("failed to load") || body.contains("cannot be displayed");
    ensure(
        !(script_error && rendering_error),
        "page should render without critical errors",
    )?;
    Ok(())
}
