use locatorless::component::registry::KindRegistry;
use locatorless::locate::strategy::Strategy;
use locatorless::page::pattern_index::PatternIndex;
use locatorless::report::console::{format_console_report, format_index_summary};
use locatorless::report::junit::{escape_xml, generate_junit_xml};
use locatorless::report::report_model::SuiteReport;
use locatorless::report::summary::IndexSummary;
use locatorless::scenario::scenario_model::{ScenarioResult, StepOutcome, StepVerb};

use crate::common::utils::{button, checkbox, disabled, hidden, marked, switch};

mod common;

// ============================================================================
// Helper builders
// ============================================================================

fn passing_result(name: &str) -> ScenarioResult {
    ScenarioResult {
        name: name.to_string(),
        passed: true,
        steps_run: 2,
        outcomes: vec![StepOutcome {
            index: 0,
            action: StepVerb::TurnOn,
            passed: true,
            strategy: Some(Strategy::ExactLabel),
            mutating_calls: 1,
            error_kind: None,
            message: None,
        }],
        error: None,
    }
}

fn failing_result(name: &str) -> ScenarioResult {
    ScenarioResult {
        name: name.to_string(),
        passed: false,
        steps_run: 2,
        outcomes: vec![
            StepOutcome {
                index: 0,
                action: StepVerb::Identify,
                passed: true,
                strategy: Some(Strategy::Marker),
                mutating_calls: 0,
                error_kind: None,
                message: None,
            },
            StepOutcome {
                index: 1,
                action: StepVerb::Select,
                passed: false,
                strategy: None,
                mutating_calls: 0,
                error_kind: Some("not_found".into()),
                message: Some("no element found: kind=dropdown identifier='<City>'".into()),
            },
        ],
        error: Some("Step 1 failed".into()),
    }
}

// ============================================================================
// Suite report
// ============================================================================

#[test]
fn suite_report_counts() {
    let report = SuiteReport::from_results(
        "suite",
        vec![passing_result("a"), failing_result("b"), passing_result("c")],
    );
    assert_eq!(report.total, 3);
    assert_eq!(report.passed, 2);
    assert_eq!(report.failed, 1);
    assert_eq!(report.steps_run, 6);
    assert_eq!(report.mutating_calls, 2);
    assert!(!report.all_passed());
    assert_eq!(report.results[1].failed_steps().count(), 1);
    assert!(report.duration_ms.is_none());
}

// ============================================================================
// Console reporter
// ============================================================================

#[test]
fn console_report_lists_failed_steps() {
    let report = SuiteReport::from_results("checkout", vec![passing_result("Toggle"), failing_result("Pick city")])
        .with_duration(1500);
    let out = format_console_report(&report);

    assert!(out.contains("=== Suite: checkout ==="));
    assert!(out.contains("\u{2713} PASS  Toggle (2 steps)"));
    assert!(out.contains("\u{2717} FAIL  Pick city (2 steps)"));
    assert!(out.contains("[FAIL] Step 1 (Select): not_found:"));
    assert!(out.contains("1 passed, 1 failed (2 total), 4 step(s), 1 driver call(s) in 1.5s"));
}

#[test]
fn console_report_falls_back_to_scenario_error() {
    let mut result = failing_result("Start failed");
    result.outcomes.clear();
    result.error = Some("Failed to navigate to start_url".into());
    let out = format_console_report(&SuiteReport::from_results("s", vec![result]));

    assert!(out.contains("[ERROR] Failed to navigate to start_url"));
}

// ============================================================================
// JUnit reporter
// ============================================================================

#[test]
fn junit_xml_marks_failures_and_escapes() {
    let report = SuiteReport::from_results("nightly & smoke", vec![passing_result("ok"), failing_result("bad")])
        .with_duration(2345);
    let xml = generate_junit_xml(&report);

    assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>"));
    assert!(xml.contains("<testsuite name=\"nightly &amp; smoke\" tests=\"2\" failures=\"1\" time=\"2.345\">"));
    assert!(xml.contains("<testcase name=\"ok\" classname=\"locatorless\" />"));
    assert!(xml.contains("<failure message=\"not_found\" type=\"StepFailure\">"));
    assert!(xml.contains("identifier=&apos;&lt;City&gt;&apos;"));
}

#[test]
fn escape_xml_handles_all_special_characters() {
    assert_eq!(escape_xml(r#"<a href="x">&'</a>"#), "&lt;a href=&quot;x&quot;&gt;&amp;&apos;&lt;/a&gt;");
}

// ============================================================================
// Discovery summary
// ============================================================================

#[test]
fn index_summary_counts_by_kind_and_state() {
    let registry = KindRegistry::builtin();
    let page = vec![
        marked(button("b1", "Save"), "dup"),
        marked(disabled(button("b2", "Delete")), "dup"),
        hidden(button("b3", "Hidden")),
        switch("s1", "Wifi", true),
        switch("s2", "Bluetooth", false),
        checkbox("c1", "Terms", false),
    ];
    let index = PatternIndex::build(2, page, &registry, None);
    let summary = IndexSummary::build(&index, &registry);

    assert_eq!(summary.generation, 2);
    assert_eq!(summary.total, 6);
    assert_eq!(summary.count("button"), 3);
    assert_eq!(summary.count("table"), 0);

    let buttons = &summary.by_kind["button"];
    assert_eq!(buttons.visible, 2);
    assert_eq!(buttons.disabled, 1);
    assert_eq!(buttons.checked, None, "buttons do not model checked");

    assert_eq!(summary.by_kind["switch"].checked, Some(1));
    assert_eq!(summary.by_kind["checkbox"].checked, Some(0));
    assert_eq!(summary.duplicate_markers, vec!["dup".to_string()]);
}

#[test]
fn index_summary_formats_for_the_console() {
    let registry = KindRegistry::builtin();
    let page = vec![switch("s1", "Wifi", true), disabled(button("b1", "Save"))];
    let summary = IndexSummary::build(&PatternIndex::build(0, page, &registry, None), &registry);
    let out = format_index_summary(&summary);

    assert!(out.contains("=== Generation 0: 2 element(s) ==="));
    assert!(out.contains("\"Wifi\""));
    assert!(out.contains("checked"));
    assert!(out.contains("disabled"));
}

#[test]
fn index_summary_serializes_to_json() {
    let registry = KindRegistry::builtin();
    let summary = IndexSummary::build(
        &PatternIndex::build(0, vec![switch("s1", "Wifi", true)], &registry, None),
        &registry,
    );
    let json = serde_json::to_value(&summary).unwrap();

    assert_eq!(json["by_kind"]["switch"]["total"], 1);
    assert_eq!(json["elements"][0]["state"]["checked"], true);
}
