//! Category reports: per-category results, step timing table and, for SIM, charts.

use serde_json::json;

use super::format::{format_duration, html_escape, percent, secs};
use super::html::{page, suite_footer};
use super::types::ReportData;
use crate::runner::category::ReportCategory;
use crate::runner::state::PerformanceRecord;

pub const CHART_JS_CDN: &str = "https://cdn.jsdelivr.net/npm/chart.js@4.4.0/dist/chart.umd.min.js";

/// Serialize chart series for embedding in a `<script>` block.
fn chart_data(metrics: &[PerformanceRecord]) -> String {
    let to_secs = |ms: i64| ms as f64 / 1000.0;
    let data = json!({
        "stepLabels": (1..=metrics.len()).map(|i| format!("Step {}", i)).collect::<Vec<_>>(),
        "stepNames": metrics.iter().map(|m| m.step_name.as_str()).collect::<Vec<_>>(),
        "responseTimes": metrics.iter().map(|m| to_secs(m.response_time_ms)).collect::<Vec<_>>(),
        "loadTimes": metrics.iter().map(|m| to_secs(m.load_time_ms)).collect::<Vec<_>>(),
        "totalTimes": metrics.iter().map(|m| to_secs(m.total_time_ms)).collect::<Vec<_>>(),
    });
    data.to_string().replace("</", "<\\/")
}

fn charts_section(metrics: &[PerformanceRecord]) -> String {
    if metrics.is_empty() {
        return String::new();
    }
    format!(
        r#"
        <h2>Timing Charts</h2>
        <div class="chart-box"><canvas id="phaseChart" height="110"></canvas></div>
        <div class="chart-box"><canvas id="totalChart" height="90"></canvas></div>
        <script>
            const perfData = {data};
            new Chart(document.getElementById('phaseChart'), {{
                type: 'bar',
                data: {{
                    labels: perfData.stepLabels,
                    datasets: [
                        {{ label: 'Response (s)', data: perfData.responseTimes, backgroundColor: '#3b82f6' }},
                        {{ label: 'Load (s)', data: perfData.loadTimes, backgroundColor: '#8b5cf6' }}
                    ]
                }},
                options: {{
                    responsive: true,
                    scales: {{ x: {{ stacked: true }}, y: {{ stacked: true, beginAtZero: true }} }},
                    plugins: {{
                        tooltip: {{ callbacks: {{ title: (items) => perfData.stepNames[items[0].dataIndex] }} }}
                    }}
                }}
            }});
            new Chart(document.getElementById('totalChart'), {{
                type: 'line',
                data: {{
                    labels: perfData.stepLabels,
                    datasets: [
                        {{ label: 'Total (s)', data: perfData.totalTimes, borderColor: '#10b981', tension: 0.3 }}
                    ]
                }},
                options: {{ responsive: true, scales: {{ y: {{ beginAtZero: true }} }} }}
            }});
        </script>"#,
        data = chart_data(metrics)
    )
}

fn metric_rows(category: ReportCategory, metrics: &[PerformanceRecord]) -> String {
    if metrics.is_empty() {
        return format!(
            r#"
                <tr><td colspan="7" class="empty">No performance data available. Run the {} scenarios to collect step timings.</td></tr>"#,
            category.label()
        );
    }

    let mut rows = String::new();
    for (i, metric) in metrics.iter().enumerate() {
        let (status_class, status_icon) = metric.status.badge();
        rows.push_str(&format!(
            r#"
                <tr>
                    <td>{}</td>
                    <td>{}<div class="stat-label" style="text-transform: none;">{}</div></td>
                    <td><span class="action action-{action}">{action}</span></td>
                    <td class="mono">{}s</td>
                    <td class="mono">{}s</td>
                    <td class="mono">{}s</td>
                    <td class="{status_class}">{status_icon} {}</td>
                </tr>"#,
            i + 1,
            html_escape(&metric.step_name),
            html_escape(&metric.description),
            secs(metric.response_time_ms, 3),
            secs(metric.load_time_ms, 3),
            secs(metric.total_time_ms, 3),
            metric.status,
            action = metric.action,
            status_class = status_class,
            status_icon = status_icon
        ));
    }
    rows
}

/// Render the report for one category from the full snapshot.
pub fn render_category_report(category: ReportCategory, data: &ReportData) -> String {
    let scoped = data.filtered(category.label());
    let results = scoped.summary();
    let metrics = scoped.metric_summary();

    let mut result_rows = String::new();
    for result in &scoped.results {
        let (status_class, status_icon) = result.status.badge();
        result_rows.push_str(&format!(
            r#"
                <tr>
                    <td>{}</td>
                    <td class="{status_class}">{status_icon} {}</td>
                    <td class="mono">{}s</td>
                    <td class="mono">{}s</td>
                    <td class="mono">{}s</td>
                    <td>{}</td>
                </tr>"#,
            html_escape(&result.name),
            result.status,
            secs(result.response_time_ms as i64, 3),
            secs(result.load_time_ms as i64, 3),
            secs(result.duration_ms as i64, 3),
            html_escape(&result.detail),
            status_class = status_class,
            status_icon = status_icon
        ));
    }
    if result_rows.is_empty() {
        result_rows.push_str(
            r#"
                <tr><td colspan="6" class="empty">No test results recorded for this category.</td></tr>"#,
        );
    }

    let (head_extra, charts) = if category.has_charts() {
        (
            format!(r#"<script src="{}"></script>"#, CHART_JS_CDN),
            charts_section(&scoped.metrics),
        )
    } else {
        (String::new(), String::new())
    };

    let body = format!(
        r#"
        <header>
            <div>
                <div class="eyebrow">{label} Category</div>
                <h1>{title}</h1>
            </div>
            <div style="text-align: right;">
                <div style="font-size: 0.875rem; color: var(--text-secondary);">Total Execution</div>
                <div style="font-size: 1.25rem; font-weight: 700;">{total_exec:.2}s</div>
            </div>
        </header>

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
                <div class="stat-value">{span}</div>
                <div class="stat-label">Step Span</div>
            </div>
            <div class="stat passed">
                <div class="stat-value">{passed}/{total}</div>
                <div class="stat-label">Tests Passed ({rate})</div>
            </div>
        </div>
{charts}
        <h2>Test Results</h2>
        <table>
            <thead>
                <tr><th>Test</th><th>Status</th><th>Response</th><th>Load</th><th>Total</th><th>Details</th></tr>
            </thead>
            <tbody>{result_rows}
            </tbody>
        </table>

        <h2>Step Timings</h2>
        <table>
            <thead>
                <tr><th>#</th><th>Step</th><th>Action</th><th>Response</th><th>Load</th><th>Total</th><th>Status</th></tr>
            </thead>
            <tbody>{metric_rows}
            </tbody>
        </table>
{footer}"#,
        label = category.label(),
        title = category.title(),
        total_exec = metrics.total_execution_secs(),
        steps = metrics.count,
        avg_response = metrics.average_response,
        avg_load = metrics.average_load,
        span = format_duration(metrics.total_execution_ms),
        passed = results.passed,
        total = results.total,
        rate = percent(results.success_rate()),
        charts = charts,
        result_rows = result_rows,
        metric_rows = metric_rows(category, &scoped.metrics),
        footer = suite_footer(data)
    );

    page(category.title(), &head_extra, &body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::state::{ActionType, Status, TestResult};

    fn metric(name: &str, category: &str, ts: i64, response: i64, load: i64) -> PerformanceRecord {
        let mut record = PerformanceRecord::new(
            format!("{}_{}", name, ts),
            name,
            "desc",
            ActionType::Submit,
            Some(category.to_string()),
            ts,
        );
        record.response_time_ms = response;
        record.load_time_ms = load;
        record.total_time_ms = response + load;
        record
    }

    fn data() -> ReportData {
        ReportData {
            session_id: "s".to_string(),
            results: vec![TestResult {
                name: "SIM Test - Complete User Invitation Verification".to_string(),
                status: Status::Passed,
                duration_ms: 1500,
                category: Some("SIM".to_string()),
                detail: "Invitation sent".to_string(),
                timestamp_ms: 0,
                response_time_ms: 500,
                load_time_ms: 1000,
            }],
            metrics: vec![
                metric("Click form submit button", "SIM", 1_000, 500, 1000),
                metric("Click ACM link", "ACM", 2_000, 100, 100),
            ],
            suite_started_ms: None,
            suite_ended_ms: None,
            generated_at: "now".to_string(),
        }
    }

    #[test]
    fn test_sim_report_has_charts_and_only_sim_rows() {
        let html = render_category_report(ReportCategory::Sim, &data());
        assert!(html.contains(CHART_JS_CDN));
        assert!(html.contains(r#""stepLabels":["Step 1"]"#));
        assert!(html.contains(r#""responseTimes":[0.5]"#));
        assert!(html.contains("Click form submit button"));
        assert!(!html.contains("Click ACM link"));
        assert!(html.contains(r#"<span class="action action-submit">submit</span>"#));
        assert!(html.contains("1.500s"));
        assert!(html.contains("1/1"));
        assert!(html.contains("100%"));
    }

    #[test]
    fn test_acm_report_has_no_charts() {
        let html = render_category_report(ReportCategory::Acm, &data());
        assert!(!html.contains(CHART_JS_CDN));
        assert!(html.contains("Click ACM link"));
        assert!(html.contains("No test results recorded for this category."));
    }

    #[test]
    fn test_empty_category_report() {
        let html = render_category_report(ReportCategory::ARefresh, &data());
        assert!(html.contains(r#"colspan="7""#));
        assert!(html.contains("No performance data available."));
        assert!(html.contains("0%"));
    }

    #[test]
    fn test_chart_data_cannot_close_script() {
        let mut records = vec![metric("</script><b>x", "SIM", 1, 1, 1)];
        records[0].step_name = "</script><b>x".to_string();
        let json = chart_data(&records);
        assert!(!json.contains("</script>"));
    }
}
