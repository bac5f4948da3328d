use super::format::{format_elapsed, html_escape, percent, secs};
use super::types::ReportData;
use crate::runner::results::group_by_category;
use crate::utils::clock::format_timestamp;

/// File name of the general summary report
pub const SUMMARY_FILE: &str = "yuba-test-report.html";

/// Theme shared by every generated page.
pub(crate) const BASE_CSS: &str = r#"
        :root {
            --bg-primary: #0a0f1d;
            --bg-secondary: #141b2d;
            --bg-tertiary: #1f2937;
            --border: #374151;
            --text-primary: #f9fafb;
            --text-secondary: #9ca3af;
            --green: #10b981;
            --red: #ef4444;
            --yellow: #f59e0b;
            --blue: #3b82f6;
            --purple: #8b5cf6;
            --glass: rgba(255, 255, 255, 0.03);
        }

        * {
            margin: 0;
            padding: 0;
            box-sizing: border-box;
        }

        body {
            font-family: 'Inter', system-ui, -apple-system, sans-serif;
            background: var(--bg-primary);
            color: var(--text-primary);
            line-height: 1.5;
            padding: 3rem 1rem;
        }

        .container {
            max-width: 1100px;
            margin: 0 auto;
        }

        header {
            margin-bottom: 3rem;
            display: flex;
            justify-content: space-between;
            align-items: flex-end;
        }

        .eyebrow {
            font-size: 0.875rem;
            font-weight: 600;
            color: var(--purple);
            text-transform: uppercase;
            letter-spacing: 0.1em;
            margin-bottom: 0.5rem;
        }

        h1 {
            font-size: 2.25rem;
            font-weight: 800;
            letter-spacing: -0.025em;
            background: linear-gradient(135deg, #fff 0%, #94a3b8 100%);
            -webkit-background-clip: text;
            -webkit-text-fill-color: transparent;
        }

        h2 {
            font-size: 1.25rem;
            font-weight: 700;
            margin: 2.5rem 0 1rem;
        }

        nav.pages {
            display: flex;
            gap: 1rem;
            margin-bottom: 2rem;
        }

        nav.pages a {
            color: var(--blue);
            font-weight: 600;
            text-decoration: none;
        }

        .summary {
            display: grid;
            grid-template-columns: repeat(auto-fit, minmax(180px, 1fr));
            gap: 1.5rem;
            margin-bottom: 3rem;
        }

        .stat {
            background: var(--bg-secondary);
            border: 1px solid var(--border);
            padding: 1.5rem;
            border-radius: 1rem;
        }

        .stat-value {
            font-size: 2.25rem;
            font-weight: 800;
            margin-bottom: 0.25rem;
        }

        .stat-label {
            color: var(--text-secondary);
            font-size: 0.875rem;
            font-weight: 500;
            text-transform: uppercase;
            letter-spacing: 0.05em;
        }

        .stat.passed .stat-value { color: var(--green); }
        .stat.failed .stat-value { color: var(--red); }
        .stat.skipped .stat-value { color: var(--yellow); }

        .progress-container {
            margin-bottom: 3rem;
        }

        .progress-bar {
            background: var(--bg-secondary);
            height: 12px;
            border-radius: 6px;
            overflow: hidden;
            display: flex;
            border: 1px solid var(--border);
        }

        .progress-fill {
            height: 100%;
            background: linear-gradient(90deg, var(--green), #34d399);
        }

        .categories {
            display: grid;
            grid-template-columns: repeat(auto-fit, minmax(220px, 1fr));
            gap: 1rem;
        }

        .category-card {
            background: var(--bg-secondary);
            border: 1px solid var(--border);
            border-radius: 1rem;
            padding: 1.25rem;
        }

        .category-card h3 {
            font-size: 1rem;
            margin-bottom: 0.5rem;
        }

        .category-card .counts {
            color: var(--text-secondary);
            font-size: 0.875rem;
        }

        table {
            width: 100%;
            border-collapse: collapse;
            background: var(--bg-secondary);
            border: 1px solid var(--border);
            border-radius: 1rem;
            overflow: hidden;
        }

        th, td {
            padding: 0.75rem 1rem;
            text-align: left;
            border-bottom: 1px solid var(--border);
            font-size: 0.875rem;
        }

        th {
            background: var(--glass);
            color: var(--text-secondary);
            text-transform: uppercase;
            font-size: 0.75rem;
            letter-spacing: 0.05em;
        }

        td.mono {
            font-family: 'JetBrains Mono', monospace;
        }

        td.empty {
            text-align: center;
            color: var(--text-secondary);
            padding: 2rem;
        }

        .status-passed { color: var(--green); font-weight: 600; }
        .status-failed { color: var(--red); font-weight: 600; }
        .status-skipped { color: var(--yellow); font-weight: 600; }

        .action {
            padding: 0.125rem 0.5rem;
            border-radius: 9999px;
            font-size: 0.75rem;
            font-weight: 600;
            background: var(--bg-tertiary);
        }

        .action-navigation { color: var(--blue); }
        .action-click { color: var(--purple); }
        .action-input { color: #22d3ee; }
        .action-submit { color: var(--green); }
        .action-wait { color: var(--text-secondary); }
        .action-verification { color: var(--yellow); }
        .action-refresh { color: #f472b6; }

        .chart-box {
            background: var(--bg-secondary);
            border: 1px solid var(--border);
            border-radius: 1rem;
            padding: 1.5rem;
            margin-bottom: 1.5rem;
        }

        .timeline {
            border-left: 2px solid var(--border);
            padding-left: 1.5rem;
        }

        .timeline-item {
            margin-bottom: 1.25rem;
        }

        .timeline-item .when {
            color: var(--text-secondary);
            font-size: 0.75rem;
            font-family: 'JetBrains Mono', monospace;
        }

        .meta {
            margin-top: 4rem;
            padding-top: 2rem;
            border-top: 1px solid var(--border);
            color: var(--text-secondary);
            font-size: 0.875rem;
            text-align: center;
            display: flex;
            flex-wrap: wrap;
            justify-content: center;
            gap: 2rem;
        }
"#;

/// Wrap a body in the shared page shell.
pub(crate) fn page(title: &str, head_extra: &str, body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{title}</title>
    <link rel="preconnect" href="https://fonts.googleapis.com">
    <link rel="preconnect" href="https://fonts.gstatic.com" crossorigin>
    <link href="https://fonts.googleapis.com/css2?family=Inter:wght@400;500;600;700;800&family=JetBrains+Mono:wght@400;500&display=swap" rel="stylesheet">
    <style>{css}</style>
    {head_extra}
</head>
<body>
    <div class="container">
{body}
    </div>
</body>
</html>
"#,
        title = html_escape(title),
        css = BASE_CSS,
        head_extra = head_extra,
        body = body
    )
}

/// Footer with the suite execution period.
pub(crate) fn suite_footer(data: &ReportData) -> String {
    let started = data
        .suite_started_ms
        .map(format_timestamp)
        .unwrap_or_else(|| "N/A".to_string());
    let ended = data
        .suite_ended_ms
        .map(format_timestamp)
        .unwrap_or_else(|| "N/A".to_string());
    let duration = data
        .suite_duration_secs()
        .map(format_elapsed)
        .unwrap_or_else(|| "N/A".to_string());

    format!(
        r#"
        <div class="meta">
            <span>Session: {}</span>
            <span>Suite started: {}</span>
            <span>Suite ended: {}</span>
            <span>Execution time: {}</span>
            <span>Generated: {}</span>
        </div>"#,
        html_escape(&data.session_id),
        started,
        ended,
        duration,
        html_escape(&data.generated_at)
    )
}

/// Render the general summary report over all results.
pub fn render_summary(data: &ReportData) -> String {
    let summary = data.summary();
    let metrics = data.metric_summary();

    let mut categories_html = String::new();
    for (label, bucket) in group_by_category(&data.results) {
        categories_html.push_str(&format!(
            r#"
            <div class="category-card">
                <h3>{}</h3>
                <div class="counts">Total: {} &middot; <span class="status-passed">Passed: {}</span> &middot; <span class="status-failed">Failed: {}</span></div>
                <div class="counts">Duration: {:.1}s</div>
            </div>"#,
            html_escape(&label),
            bucket.summary.total,
            bucket.summary.passed,
            bucket.summary.failed,
            bucket.summary.total_duration_secs()
        ));
    }

    let mut rows_html = String::new();
    for (i, result) in data.results.iter().enumerate() {
        let (status_class, status_icon) = result.status.badge();
        rows_html.push_str(&format!(
            r#"
                <tr>
                    <td>{}</td>
                    <td>{}</td>
                    <td>{}</td>
                    <td class="{status_class}">{status_icon} {}</td>
                    <td class="mono">{}s</td>
                    <td>{}</td>
                </tr>"#,
            i + 1,
            html_escape(&result.name),
            html_escape(result.category_label()),
            result.status,
            secs(result.duration_ms as i64, 3),
            html_escape(&result.detail),
            status_class = status_class,
            status_icon = status_icon
        ));
    }
    if rows_html.is_empty() {
        rows_html.push_str(
            r#"
                <tr><td colspan="6" class="empty">No test results available. Run tests to see results.</td></tr>"#,
        );
    }

    let body = format!(
        r#"
        <header>
            <div>
                <div class="eyebrow">Yuba End-to-End Suite</div>
                <h1>Test Execution Report</h1>
            </div>
            <div style="text-align: right;">
                <div style="font-size: 0.875rem; color: var(--text-secondary);">Total Duration</div>
                <div style="font-size: 1.25rem; font-weight: 700;">{total_duration:.1}s</div>
            </div>
        </header>

        <div class="summary">
            <div class="stat">
                <div class="stat-value">{total}</div>
                <div class="stat-label">Total Tests</div>
            </div>
            <div class="stat passed">
                <div class="stat-value">{passed}</div>
                <div class="stat-label">Passed</div>
            </div>
            <div class="stat failed">
                <div class="stat-value">{failed}</div>
                <div class="stat-label">Failed</div>
            </div>
            <div class="stat skipped">
                <div class="stat-value">{skipped}</div>
                <div class="stat-label">Skipped</div>
            </div>
            <div class="stat">
                <div class="stat-value">{average:.2}s</div>
                <div class="stat-label">Average Duration</div>
            </div>
        </div>

        <div class="progress-container">
            <div style="display: flex; justify-content: space-between; margin-bottom: 0.75rem;">
                <span style="font-weight: 600; font-size: 0.875rem;">Success Rate</span>
                <span style="font-weight: 700; color: var(--green);">{rate}</span>
            </div>
            <div class="progress-bar">
                <div class="progress-fill" style="width: {rate}"></div>
            </div>
        </div>

        <h2>Categories</h2>
        <div class="categories">{categories_html}
        </div>

        <h2>Step Timings</h2>
        <div class="summary">
            <div class="stat">
                <div class="stat-value">{steps}</div>
                <div class="stat-label">Tracked Steps</div>
            </div>
            <div class="stat">
                <div class="stat-value">{avg_response:.3}s</div>
                <div class="stat-label">Avg Response</div>
            </div>
            <div class="stat">
                <div class="stat-value">{avg_load:.3}s</div>
                <div class="stat-label">Avg Load</div>
            </div>
            <div class="stat">
                <div class="stat-value">{span:.1}s</div>
                <div class="stat-label">Step Span</div>
            </div>
        </div>

        <h2>Test Results</h2>
        <table>
            <thead>
                <tr><th>#</th><th>Test Name</th><th>Category</th><th>Status</th><th>Duration</th><th>Details</th></tr>
            </thead>
            <tbody>{rows_html}
            </tbody>
        </table>
{footer}"#,
        total_duration = summary.total_duration_secs(),
        total = summary.total,
        passed = summary.passed,
        failed = summary.failed,
        skipped = summary.skipped,
        average = summary.average_duration_secs(),
        rate = percent(summary.success_rate()),
        categories_html = categories_html,
        steps = metrics.count,
        avg_response = metrics.average_response,
        avg_load = metrics.average_load,
        span = metrics.total_execution_secs(),
        rows_html = rows_html,
        footer = suite_footer(data)
    );

    page("Yuba Test Report", "", &body)
}
