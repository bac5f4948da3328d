//! Formatting shared by the HTML renderers.

/// Escape text for HTML body and attribute positions.
pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

/// Compact duration: `850ms`, `12.50s`, `2m 5s`.
pub fn format_duration(ms: i64) -> String {
    if ms < 1000 {
        format!("{}ms", ms)
    } else if ms < 60000 {
        format!("{:.2}s", ms as f64 / 1000.0)
    } else {
        let minutes = ms / 60000;
        let seconds = (ms % 60000) / 1000;
        format!("{}m {}s", minutes, seconds)
    }
}

/// Suite wall-clock duration: `1h 2m 3s`, `2m 3s` or `3s`.
pub fn format_elapsed(total_secs: i64) -> String {
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let seconds = total_secs % 60;
    if hours > 0 {
        format!("{}h {}m {}s", hours, minutes, seconds)
    } else if minutes > 0 {
        format!("{}m {}s", minutes, seconds)
    } else {
        format!("{}s", seconds)
    }
}

/// Milliseconds as seconds with fixed decimal places.
pub fn secs(ms: i64, places: usize) -> String {
    format!("{:.*}", places, ms as f64 / 1000.0)
}

/// Rounded percentage, `0%` for an empty run.
pub fn percent(rate: f64) -> String {
    format!("{}%", rate.round() as i64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_html_escape() {
        assert_eq!(
            html_escape(r#"<a href="x">Tom & Jerry's</a>"#),
            "&lt;a href=&quot;x&quot;&gt;Tom &amp; Jerry&#39;s&lt;/a&gt;"
        );
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(850), "850ms");
        assert_eq!(format_duration(12_500), "12.50s");
        assert_eq!(format_duration(125_000), "2m 5s");
    }

    #[test]
    fn test_format_elapsed() {
        assert_eq!(format_elapsed(3723), "1h 2m 3s");
        assert_eq!(format_elapsed(125), "2m 5s");
        assert_eq!(format_elapsed(7), "7s");
    }

    #[test]
    fn test_secs_and_percent() {
        assert_eq!(secs(3000, 1), "3.0");
        assert_eq!(secs(1234, 3), "1.234");
        assert_eq!(percent(66.666), "67%");
        assert_eq!(percent(0.0), "0%");
    }
}
