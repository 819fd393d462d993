use locatorless::context::element_context::ElementContext;
use locatorless::locate::request::IdentifierType;
use locatorless::locate::strategy::Strategy;
use locatorless::scenario::runner::ScenarioRunner;
use locatorless::scenario::scenario_model::{Scenario, StateExpectation, StepVerb};
use locatorless::trace::logger::TraceLogger;

use crate::common::{
    fake_page::FakePage,
    utils::{
        button, checkbox, engine, grouped, marked, multi_dropdown, option, radio, switch, table,
        text_input,
    },
};

mod common;

const SETTINGS_YAML: &str = r#"
name: Settings page
start_url: https://app.test/settings
steps:
  - action: identify
    identifier_type: data_attr_id
    identifier: settings--switch--dark-mode
    component: switch
    context_key: dark
  - action: turn_on
    use_context: dark
    expect:
      checked: true
  - action: set_value
    identifier_type: semantic
    identifier: Display name
    component: input
    value: Ada
    expect:
      value: Ada
  - action: click
    identifier: Publish
    component: button
    expect_error: not_found
"#;

fn settings_page() -> FakePage {
    let page = vec![
        marked(switch("s", "Dark mode", false), "settings--switch--dark-mode"),
        text_input("name", "Display name"),
        checkbox("c", "Newsletter", true),
        button("save", "Save"),
    ];
    FakePage::new(Vec::new()).with_page("https://app.test/settings", page)
}

fn temp_path(name: &str) -> String {
    let dir = std::env::temp_dir().join(format!("locatorless-{}-{}", name, std::process::id()));
    dir.to_string_lossy().into_owned()
}

// =========================================================================
// Scenario model
// =========================================================================

#[test]
fn scenario_parses_with_identifier_type_aliases() {
    let scenario: Scenario = serde_yaml::from_str(SETTINGS_YAML).expect("valid scenario");

    assert_eq!(scenario.name, "Settings page");
    assert_eq!(scenario.steps.len(), 4);
    assert_eq!(scenario.steps[0].action, StepVerb::Identify);
    assert_eq!(scenario.steps[0].identifier_type, IdentifierType::Marker);
    assert_eq!(scenario.steps[2].identifier_type, IdentifierType::Label);
    assert_eq!(scenario.steps[3].identifier_type, IdentifierType::Auto, "defaults to auto");
    assert_eq!(scenario.steps[3].component, "button");
}

#[test]
fn step_defaults_to_any_component() {
    let scenario: Scenario = serde_yaml::from_str(
        "name: Minimal\nsteps:\n  - action: click\n    identifier: Save\n",
    )
    .expect("valid scenario");
    let request = scenario.steps[0].request();

    assert_eq!(request.component_kind, "any");
    assert_eq!(request.raw_identifier, "Save");
}

#[test]
fn identifier_type_accepts_aliases_from_strings() {
    assert_eq!("data-attr-id".parse::<IdentifierType>(), Ok(IdentifierType::Marker));
    assert_eq!("TEXT".parse::<IdentifierType>(), Ok(IdentifierType::Label));
    assert_eq!("index".parse::<IdentifierType>(), Ok(IdentifierType::Position));
    assert!("xpath".parse::<IdentifierType>().is_err());
}

#[test]
fn state_expectation_lists_every_miss() {
    let expect = StateExpectation {
        checked: Some(true),
        disabled: Some(true),
        ..StateExpectation::default()
    };
    let mut engine = engine(FakePage::new(vec![switch("s", "Wifi", false)]));
    let index = engine.discover(None);
    let state = engine.describe(&index.candidates()[0], "switch");

    let misses = expect.evaluate(&state);
    assert_eq!(misses.len(), 2, "{misses:?}");
    assert!(misses[0].starts_with("checked"));
}

// =========================================================================
// Runner
// =========================================================================

#[test]
fn settings_scenario_passes_end_to_end() {
    let scenario: Scenario = serde_yaml::from_str(SETTINGS_YAML).expect("valid scenario");
    let mut engine = engine(settings_page());
    let mut ctx = ElementContext::new();

    let result = ScenarioRunner::run(&scenario, &mut engine, &mut ctx, &TraceLogger::disabled());

    assert!(result.passed, "{:?}", result.error);
    assert_eq!(result.steps_run, 4);
    assert_eq!(result.outcomes[0].strategy, Some(Strategy::Marker));
    assert_eq!(result.outcomes[1].strategy, Some(Strategy::Context));
    assert_eq!(result.outcomes[1].mutating_calls, 1);
    assert_eq!(result.outcomes[3].error_kind.as_deref(), Some("not_found"));
    assert!(ctx.contains("dark"));
}

const MEMBERS_YAML: &str = r#"
name: Members page
steps:
  - action: check
    identifier: "Yes"
    component: radio
    group: Accept terms
    expect:
      checked: true
  - action: select_many
    identifier: Tags
    component: dropdown
    values: [Red, Blue]
    expect:
      selected: Blue
  - action: read_cell
    identifier_type: position
    identifier: "1"
    component: table
    row: 1
    column: Role
    value: Editor
  - action: find_row
    identifier_type: position
    identifier: "1"
    component: table
    column: Name
    value: Ada
    row: 0
"#;

fn members_page() -> FakePage {
    FakePage::new(vec![
        grouped(radio("news-yes", "Yes", false), "Newsletter"),
        grouped(radio("terms-yes", "Yes", false), "Accept terms"),
        multi_dropdown("tags", "Tags"),
        table("t", &["Name", "Role"], &[&["Ada", "Admin"], &["Grace", "Editor"]]),
    ])
    .with_popup("tags", vec![option("red", "Red"), option("blue", "Blue")])
}

#[test]
fn grouped_multi_select_and_table_steps_run_end_to_end() {
    let scenario: Scenario = serde_yaml::from_str(MEMBERS_YAML).expect("valid scenario");
    assert_eq!(scenario.steps[0].scope.as_deref(), Some("Accept terms"));
    assert_eq!(scenario.steps[1].action, StepVerb::SelectMany);

    let mut engine = engine(members_page());
    let result = ScenarioRunner::run(&scenario, &mut engine, &mut ElementContext::new(), &TraceLogger::disabled());

    assert!(result.passed, "{:?}", result.error);
    assert_eq!(result.outcomes[1].mutating_calls, 3, "open once, two options");
    let page = engine.into_driver();
    assert_eq!(page.clicks_on("terms-yes"), 1);
    assert_eq!(page.clicks_on("news-yes"), 0);
}

#[test]
fn wrong_cell_text_fails_the_read_step() {
    let scenario: Scenario = serde_yaml::from_str(
        r#"
name: Wrong role
steps:
  - action: read_cell
    identifier_type: position
    identifier: "1"
    component: table
    row: 0
    column: Role
    value: Editor
"#,
    )
    .expect("valid scenario");

    let mut engine = engine(members_page());
    let result = ScenarioRunner::run(&scenario, &mut engine, &mut ElementContext::new(), &TraceLogger::disabled());

    assert!(!result.passed);
    let message = result.outcomes[0].message.as_deref().unwrap_or_default();
    assert!(message.contains("cell: expected \"Editor\", got \"Admin\""), "{message}");
}

#[test]
fn runner_stops_at_first_failing_step() {
    let scenario: Scenario = serde_yaml::from_str(
        r#"
name: Broken
steps:
  - action: click
    identifier: Missing
    component: button
  - action: click
    identifier: Save
    component: button
"#,
    )
    .expect("valid scenario");
    let mut engine = engine(FakePage::new(vec![button("save", "Save")]));
    let mut ctx = ElementContext::new();

    let result = ScenarioRunner::run(&scenario, &mut engine, &mut ctx, &TraceLogger::disabled());

    assert!(!result.passed);
    assert_eq!(result.steps_run, 1);
    assert_eq!(result.outcomes[0].error_kind.as_deref(), Some("not_found"));
    assert!(result.error.as_deref().is_some_and(|e| e.contains("Step 0")));
    assert_eq!(engine.driver().clicks(), 0);
}

#[test]
fn unmet_expectation_fails_the_step() {
    let scenario: Scenario = serde_yaml::from_str(
        r#"
name: Wrong expectation
steps:
  - action: query
    identifier: Newsletter
    component: checkbox
    expect:
      checked: false
"#,
    )
    .expect("valid scenario");
    let mut engine = engine(FakePage::new(vec![checkbox("c", "Newsletter", true)]));
    let mut ctx = ElementContext::new();

    let result = ScenarioRunner::run(&scenario, &mut engine, &mut ctx, &TraceLogger::disabled());

    assert!(!result.passed);
    let message = result.outcomes[0].message.clone().unwrap_or_default();
    assert!(message.contains("checked"), "{message}");
}

#[test]
fn unexpected_success_fails_an_expect_error_step() {
    let scenario: Scenario = serde_yaml::from_str(
        "name: Should fail\nsteps:\n  - action: click\n    identifier: Save\n    expect_error: not_found\n",
    )
    .expect("valid scenario");
    let mut engine = engine(FakePage::new(vec![button("save", "Save")]));
    let mut ctx = ElementContext::new();

    let result = ScenarioRunner::run(&scenario, &mut engine, &mut ctx, &TraceLogger::disabled());
    assert!(!result.passed);
}

#[test]
fn context_does_not_leak_between_scenarios() {
    let first: Scenario = serde_yaml::from_str(
        "name: First\nsteps:\n  - action: identify\n    identifier: Save\n    context_key: save\n",
    )
    .expect("valid scenario");
    let second: Scenario = serde_yaml::from_str(
        "name: Second\nsteps:\n  - action: click\n    use_context: save\n    expect_error: not_found\n",
    )
    .expect("valid scenario");

    let mut engine = engine(FakePage::new(vec![button("save", "Save")]));
    let mut ctx = ElementContext::new();
    let tracer = TraceLogger::disabled();

    assert!(ScenarioRunner::run(&first, &mut engine, &mut ctx, &tracer).passed);
    let result = ScenarioRunner::run(&second, &mut engine, &mut ctx, &tracer);

    assert!(result.passed, "{:?}", result.error);
    assert_eq!(engine.driver().clicks(), 0);
}

#[test]
fn trace_logger_writes_one_line_per_step() {
    let path = temp_path("trace.jsonl");
    let _ = std::fs::remove_file(&path);

    let scenario: Scenario = serde_yaml::from_str(SETTINGS_YAML).expect("valid scenario");
    let mut engine = engine(settings_page());
    let mut ctx = ElementContext::new();
    let tracer = TraceLogger::new(&path);
    assert!(tracer.is_enabled());

    ScenarioRunner::run(&scenario, &mut engine, &mut ctx, &tracer);

    let content = std::fs::read_to_string(&path).expect("trace written");
    let lines: Vec<serde_json::Value> = content
        .lines()
        .map(|l| serde_json::from_str(l).expect("valid JSON line"))
        .collect();
    assert_eq!(lines.len(), 4);
    assert_eq!(lines[0]["scenario"], "Settings page");
    assert_eq!(lines[0]["strategy"], "marker");
    assert_eq!(lines[1]["outcome"], "pass");
    assert_eq!(lines[0]["request"]["identifier_type"], "marker");

    let _ = std::fs::remove_file(&path);
}
