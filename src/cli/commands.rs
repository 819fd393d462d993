use std::path::Path;

use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use crate::action::handler::Engine;
use crate::browser::session::BrowserSession;
use crate::cli::config::AppConfig;
use crate::component::registry::KindRegistry;
use crate::context::element_context::ElementContext;
use crate::report::console::{format_console_report, format_index_summary};
use crate::report::junit::generate_junit_xml;
use crate::report::report_model::SuiteReport;
use crate::scenario::runner::ScenarioRunner;
use crate::scenario::scenario_model::Scenario;
use crate::trace::logger::TraceLogger;

// ============================================================================
// Logging
// ============================================================================

/// Install the global tracing subscriber. `RUST_LOG` wins over `verbose`.
pub fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("locatorless={level}")));

    // A subscriber may already be installed (tests, embedding); keep it.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

// ============================================================================
// run subcommand
// ============================================================================

/// Run scenarios and return whether all passed.
pub fn cmd_run(
    scenario_path: &str,
    format: &str,
    output: Option<&str>,
    trace_path: Option<&str>,
    config: &AppConfig,
) -> Result<bool, Box<dyn std::error::Error>> {
    let scenarios = load_scenarios(scenario_path)?;

    if scenarios.is_empty() {
        warn!(path = scenario_path, "no scenarios found");
        return Ok(true);
    }

    info!(count = scenarios.len(), "running scenarios");

    let session = BrowserSession::launch(config.driver.clone())?;
    let mut engine = Engine::new(session, KindRegistry::builtin(), config.engine.clone());
    let mut ctx = ElementContext::new();
    let tracer = match trace_path {
        Some(path) => TraceLogger::new(path),
        None => TraceLogger::disabled(),
    };
    let start = std::time::Instant::now();

    let mut results = Vec::new();
    for scenario in &scenarios {
        debug!(scenario = %scenario.name, "running");
        results.push(ScenarioRunner::run(scenario, &mut engine, &mut ctx, &tracer));
    }

    let duration = start.elapsed().as_millis();
    engine.into_driver().quit()?;

    let report = SuiteReport::from_results("CLI Run", results).with_duration(duration);
    let all_passed = report.all_passed();

    let output_content = match format {
        "junit" => generate_junit_xml(&report),
        _ => format_console_report(&report),
    };

    match output {
        Some(path) => std::fs::write(path, &output_content)?,
        None => print!("{}", output_content),
    }

    Ok(all_passed)
}

/// Load scenarios from a single YAML file or a directory of YAML files.
pub fn load_scenarios(path: &str) -> Result<Vec<Scenario>, Box<dyn std::error::Error>> {
    let metadata = std::fs::metadata(path)?;
    if metadata.is_dir() {
        let mut scenarios = Vec::new();
        for entry in std::fs::read_dir(path)? {
            let p = entry?.path();
            if is_yaml(&p) {
                let content = std::fs::read_to_string(&p)?;
                scenarios.push(serde_yaml::from_str::<Scenario>(&content)?);
            }
        }
        // Sort by name for deterministic order
        scenarios.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(scenarios)
    } else {
        let content = std::fs::read_to_string(path)?;
        Ok(vec![serde_yaml::from_str(&content)?])
    }
}

fn is_yaml(path: &Path) -> bool {
    path.extension().is_some_and(|e| e == "yaml" || e == "yml")
}

// ============================================================================
// discover subcommand
// ============================================================================

pub fn cmd_discover(
    url: &str,
    kind: Option<&str>,
    json: bool,
    config: &AppConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let session = BrowserSession::launch(config.driver.clone())?;
    let mut engine = Engine::new(session, KindRegistry::builtin(), config.engine.clone());

    engine.navigate(url)?;
    let summary = engine.summarize(kind);

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print!("{}", format_index_summary(&summary));
    }

    engine.into_driver().quit()?;
    Ok(())
}
