//! Dashboard, detailed and timeline pages, regenerated from the snapshot on every run.

use super::format::{format_duration, html_escape, percent, secs};
use super::html::{page, suite_footer};
use super::types::ReportData;
use crate::runner::results::group_by_category;
use crate::runner::state::Status;
use crate::utils::clock::format_time_of_day;

pub const DASHBOARD_FILE: &str = "dashboard.html";
pub const DETAILED_FILE: &str = "detailed.html";
pub const TIMELINE_FILE: &str = "timeline.html";

fn nav() -> &'static str {
    r#"
        <nav class="pages">
            <a href="dashboard.html">Dashboard</a>
            <a href="detailed.html">Detailed Results</a>
            <a href="timeline.html">Timeline</a>
        </nav>"#
}

fn header(eyebrow: &str, title: &str) -> String {
    format!(
        r#"
        <header>
            <div>
                <div class="eyebrow">{}</div>
                <h1>{}</h1>
            </div>
        </header>{}"#,
        eyebrow,
        title,
        nav()
    )
}

pub fn render_dashboard(data: &ReportData) -> String {
    let summary = data.summary();
    let metrics = data.metric_summary();

    let mut category_rows = String::new();
    for (label, bucket) in group_by_category(&data.results) {
        category_rows.push_str(&format!(
            r#"
                <tr><td>{}</td><td>{}</td><td class="status-passed">{}</td><td class="status-failed">{}</td><td class="mono">{:.1}s</td><td>{}</td></tr>"#,
            html_escape(&label),
            bucket.summary.total,
            bucket.summary.passed,
            bucket.summary.failed,
            bucket.summary.total_duration_secs(),
            percent(bucket.summary.success_rate())
        ));
    }
    if category_rows.is_empty() {
        category_rows.push_str(
            r#"
                <tr><td colspan="6" class="empty">No test results available. Run tests to see results.</td></tr>"#,
        );
    }

    let body = format!(
        r#"{header}
        <div class="summary">
            <div class="stat"><div class="stat-value">{total}</div><div class="stat-label">Total Tests</div></div>
            <div class="stat passed"><div class="stat-value">{passed}</div><div class="stat-label">Passed</div></div>
            <div class="stat failed"><div class="stat-value">{failed}</div><div class="stat-label">Failed</div></div>
            <div class="stat"><div class="stat-value">{rate}</div><div class="stat-label">Success Rate</div></div>
            <div class="stat"><div class="stat-value">{duration:.1}s</div><div class="stat-label">Total Duration</div></div>
            <div class="stat"><div class="stat-value">{steps}</div><div class="stat-label">Tracked Steps</div></div>
        </div>

        <h2>By Category</h2>
        <table>
            <thead>
                <tr><th>Category</th><th>Tests</th><th>Passed</th><th>Failed</th><th>Duration</th><th>Success</th></tr>
            </thead>
            <tbody>{category_rows}
            </tbody>
        </table>
{footer}"#,
        header = header("Yuba End-to-End Suite", "Dashboard"),
        total = summary.total,
        passed = summary.passed,
        failed = summary.failed,
        rate = percent(summary.success_rate()),
        duration = summary.total_duration_secs(),
        steps = metrics.count,
        category_rows = category_rows,
        footer = suite_footer(data)
    );

    page("Yuba Test Dashboard", "", &body)
}

pub fn render_detailed(data: &ReportData) -> String {
    let mut result_rows = String::new();
    for result in &data.results {
        let (status_class, status_icon) = result.status.badge();
        result_rows.push_str(&format!(
            r#"
                <tr><td>{}</td><td>{}</td><td class="{}">{} {}</td><td class="mono">{}s</td><td class="mono">{}s</td><td class="mono">{}s</td><td>{}</td></tr>"#,
            html_escape(&result.name),
            html_escape(result.category_label()),
            status_class,
            status_icon,
            result.status,
            secs(result.response_time_ms as i64, 3),
            secs(result.load_time_ms as i64, 3),
            secs(result.duration_ms as i64, 3),
            html_escape(&result.detail)
        ));
    }
    if result_rows.is_empty() {
        result_rows.push_str(
            r#"
                <tr><td colspan="7" class="empty">No test results available. Run tests to see results.</td></tr>"#,
        );
    }

    let mut metric_rows = String::new();
    for metric in &data.metrics {
        let (status_class, status_icon) = metric.status.badge();
        metric_rows.push_str(&format!(
            r#"
                <tr><td>{}</td><td>{}</td><td><span class="action action-{action}">{action}</span></td><td>{}</td><td class="mono">{}</td><td class="{}">{} {}</td></tr>"#,
            html_escape(&metric.step_name),
            html_escape(&metric.description),
            html_escape(metric.category.as_deref().unwrap_or("-")),
            format_duration(metric.total_time_ms),
            status_class,
            status_icon,
            metric.status,
            action = metric.action
        ));
    }
    if metric_rows.is_empty() {
        metric_rows.push_str(
            r#"
                <tr><td colspan="6" class="empty">No performance data available.</td></tr>"#,
        );
    }

    let body = format!(
        r#"{header}
        <h2>Test Results</h2>
        <table>
            <thead>
                <tr><th>Test</th><th>Category</th><th>Status</th><th>Response</th><th>Load</th><th>Total</th><th>Details</th></tr>
            </thead>
            <tbody>{result_rows}
            </tbody>
        </table>

        <h2>Tracked Steps</h2>
        <table>
            <thead>
                <tr><th>Step</th><th>Description</th><th>Action</th><th>Category</th><th>Total</th><th>Status</th></tr>
            </thead>
            <tbody>{metric_rows}
            </tbody>
        </table>
{footer}"#,
        header = header("Yuba End-to-End Suite", "Detailed Results"),
        result_rows = result_rows,
        metric_rows = metric_rows,
        footer = suite_footer(data)
    );

    page("Yuba Detailed Results", "", &body)
}

/// One entry on the timeline.
struct Moment<'a> {
    at_ms: i64,
    title: &'a str,
    subtitle: String,
    status: Status,
}

pub fn render_timeline(data: &ReportData) -> String {
    let mut moments: Vec<Moment> = data
        .metrics
        .iter()
        .map(|m| Moment {
            at_ms: m.timestamp_ms,
            title: &m.step_name,
            subtitle: format!("{} · {}", m.action, format_duration(m.total_time_ms)),
            status: m.status,
        })
        .chain(data.results.iter().map(|r| Moment {
            at_ms: r.timestamp_ms,
            title: &r.name,
            subtitle: format!(
                "result · {} · {}s",
                r.category_label(),
                secs(r.duration_ms as i64, 3)
            ),
            status: r.status,
        }))
        .collect();
    // Stable sort keeps metric-before-result order for equal timestamps.
    moments.sort_by_key(|m| m.at_ms);

    let mut items = String::new();
    for moment in &moments {
        let (status_class, status_icon) = moment.status.badge();
        items.push_str(&format!(
            r#"
            <div class="timeline-item">
                <div class="when">{}</div>
                <div><span class="{}">{}</span> {}</div>
                <div class="stat-label" style="text-transform: none;">{}</div>
            </div>"#,
            format_time_of_day(moment.at_ms),
            status_class,
            status_icon,
            html_escape(moment.title),
            html_escape(&moment.subtitle)
        ));
    }
    if items.is_empty() {
        items.push_str(
            r#"
            <div class="timeline-item">No activity recorded.</div>"#,
        );
    }

    let body = format!(
        r#"{header}
        <h2>Execution Timeline</h2>
        <div class="timeline">{items}
        </div>
{footer}"#,
        header = header("Yuba End-to-End Suite", "Timeline"),
        items = items,
        footer = suite_footer(data)
    );

    page("Yuba Execution Timeline", "", &body)
}
