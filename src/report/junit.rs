use crate::report::report_model::SuiteReport;

// ============================================================================
// JUnit XML reporter: standard CI integration format
// ============================================================================

/// Generate a JUnit XML report for CI systems.
///
/// ```xml
/// <?xml version="1.0" encoding="UTF-8"?>
/// <testsuite name="..." tests="2" failures="1" time="1.234">
///   <testcase name="Scenario 1" classname="locatorless" />
///   <testcase name="Scenario 2" classname="locatorless">
///     <failure message="not_found" type="StepFailure">Step 1: ...</failure>
///   </testcase>
/// </testsuite>
/// ```
pub fn generate_junit_xml(report: &SuiteReport) -> String {
    let time_attr = report
        .duration_ms
        .map(|ms| format!(" time=\"{:.3}\"", ms as f64 / 1000.0))
        .unwrap_or_default();

    let mut cases = String::new();
    for result in &report.results {
        if result.passed {
            cases.push_str(&format!(
                "  <testcase name=\"{}\" classname=\"locatorless\" />\n",
                escape_xml(&result.name)
            ));
            continue;
        }

        let failed_steps: Vec<String> = result
            .failed_steps()
            .map(|o| {
                let msg = o.message.as_deref().unwrap_or("step failed");
                format!("Step {}: {}", o.index, msg)
            })
            .collect();

        let failure_message = result
            .failed_steps()
            .last()
            .and_then(|o| o.error_kind.clone())
            .unwrap_or_else(|| "execution error".to_string());

        let mut body_parts = failed_steps;
        if body_parts.is_empty() {
            if let Some(e) = &result.error {
                body_parts.push(format!("Error: {}", e));
            }
        }
        let failure_body = body_parts.join("\n");

        cases.push_str(&format!(
            "  <testcase name=\"{name}\" classname=\"locatorless\">\n    <failure message=\"{message}\" type=\"StepFailure\">{body}</failure>\n  </testcase>\n",
            name = escape_xml(&result.name),
            message = escape_xml(&failure_message),
            body = escape_xml(&failure_body),
        ));
    }

    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<testsuite name=\"{name}\" tests=\"{tests}\" failures=\"{failures}\"{time}>\n{cases}</testsuite>\n",
        name = escape_xml(&report.suite_name),
        tests = report.total,
        failures = report.failed,
        time = time_attr,
        cases = cases,
    )
}

/// Escape XML special characters.
pub fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
