use super::types::ReportData;
use crate::runner::results::group_by_category;
use crate::runner::state::{Status, TestResult};
use anyhow::Result;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use std::io::Cursor;

pub const JUNIT_FILE: &str = "junit.xml";

fn seconds(ms: u64) -> String {
    (ms as f64 / 1000.0).to_string()
}

/// Generate JUnit XML with one `<testsuite>` per category.
pub fn generate_junit_xml(data: &ReportData) -> Result<String> {
    let mut writer = Writer::new(Cursor::new(Vec::new()));

    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;

    let summary = data.summary();

    // <testsuites>
    let mut suites_start = BytesStart::new("testsuites");
    suites_start.push_attribute(("name", "yuba-e2e-run"));
    suites_start.push_attribute(("tests", summary.total.to_string().as_str()));
    suites_start.push_attribute(("failures", summary.failed.to_string().as_str()));
    suites_start.push_attribute(("skipped", summary.skipped.to_string().as_str()));
    suites_start.push_attribute(("time", seconds(summary.total_duration_ms).as_str()));
    writer.write_event(Event::Start(suites_start))?;

    for (label, bucket) in group_by_category(&data.results) {
        let mut suite_start = BytesStart::new("testsuite");
        suite_start.push_attribute(("name", label.as_str()));
        suite_start.push_attribute(("tests", bucket.summary.total.to_string().as_str()));
        suite_start.push_attribute(("failures", bucket.summary.failed.to_string().as_str()));
        suite_start.push_attribute(("skipped", bucket.summary.skipped.to_string().as_str()));
        suite_start.push_attribute(("id", data.session_id.as_str()));
        suite_start.push_attribute(("time", seconds(bucket.summary.total_duration_ms).as_str()));
        suite_start.push_attribute(("timestamp", data.generated_at.as_str()));
        writer.write_event(Event::Start(suite_start))?;

        for result in &bucket.results {
            write_test_case(&mut writer, &label, result)?;
        }

        writer.write_event(Event::End(BytesEnd::new("testsuite")))?;
    }

    writer.write_event(Event::End(BytesEnd::new("testsuites")))?;

    let result = writer.into_inner().into_inner();
    let xml = String::from_utf8(result)?;
    Ok(xml)
}

fn write_test_case<W: std::io::Write>(
    writer: &mut Writer<W>,
    category: &str,
    result: &TestResult,
) -> Result<()> {
    let mut case_start = BytesStart::new("testcase");
    let classname = format!("yuba.{}", category);

    case_start.push_attribute(("name", result.name.as_str()));
    case_start.push_attribute(("classname", classname.as_str()));
    case_start.push_attribute(("time", seconds(result.duration_ms).as_str()));

    writer.write_event(Event::Start(case_start))?;

    match result.status {
        Status::Failed => {
            let message = if result.detail.is_empty() {
                "Unknown error"
            } else {
                result.detail.as_str()
            };
            let mut fail_start = BytesStart::new("failure");
            fail_start.push_attribute(("message", message));
            fail_start.push_attribute(("type", "AssertionError"));
            writer.write_event(Event::Start(fail_start))?;
            writer.write_event(Event::Text(BytesText::new(message)))?;
            writer.write_event(Event::End(BytesEnd::new("failure")))?;
        }
        Status::Skipped => {
            writer.write_event(Event::Empty(BytesStart::new("skipped")))?;
        }
        Status::Passed => {}
    }

    writer.write_event(Event::End(BytesEnd::new("testcase")))?;
    Ok(())
}
