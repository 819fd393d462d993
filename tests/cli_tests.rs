use clap::Parser;
use locatorless::action::retry::DelayPolicy;
use locatorless::cli::commands::load_scenarios;
use locatorless::cli::config::{AppConfig, Cli, Commands, load_config, read_config};
use locatorless::error::ConfigError;

// ============================================================================
// CLI Argument Parsing Tests
// ============================================================================

#[test]
fn cli_parse_run_minimal() {
    let cli = Cli::parse_from(["locatorless", "run", "--scenario", "scenarios/"]);
    match cli.command {
        Commands::Run {
            scenario,
            format,
            output,
        } => {
            assert_eq!(scenario, "scenarios/");
            assert!(format.is_none());
            assert!(output.is_none());
        }
        _ => panic!("Expected Run command"),
    }
    assert!(cli.trace.is_none());
}

#[test]
fn cli_parse_run_with_format_and_trace() {
    let cli = Cli::parse_from([
        "locatorless",
        "run",
        "--scenario",
        "login.yaml",
        "--format",
        "junit",
        "-o",
        "report.xml",
        "--trace",
        "trace.jsonl",
    ]);
    match cli.command {
        Commands::Run { format, output, .. } => {
            assert_eq!(format.as_deref(), Some("junit"));
            assert_eq!(output.as_deref(), Some("report.xml"));
        }
        _ => panic!("Expected Run command"),
    }
    assert_eq!(cli.trace.as_deref(), Some("trace.jsonl"));
}

#[test]
fn cli_parse_discover() {
    let cli = Cli::parse_from([
        "locatorless",
        "discover",
        "--url",
        "https://example.com",
        "--kind",
        "switch",
        "--json",
    ]);
    match cli.command {
        Commands::Discover { url, kind, json } => {
            assert_eq!(url, "https://example.com");
            assert_eq!(kind.as_deref(), Some("switch"));
            assert!(json);
        }
        _ => panic!("Expected Discover command"),
    }
}

#[test]
fn cli_parse_global_verbose_and_config() {
    let cli = Cli::parse_from([
        "locatorless",
        "-vv",
        "--config",
        "ci.yaml",
        "discover",
        "--url",
        "https://example.com",
    ]);
    assert_eq!(cli.verbose, 2);
    assert_eq!(cli.config.as_deref(), Some("ci.yaml"));
}

// ============================================================================
// Config File Tests
// ============================================================================

#[test]
fn config_load_missing_file() {
    let config = load_config(Some("nonexistent_file_that_does_not_exist.yaml"));
    // Should return defaults without error
    assert_eq!(config, AppConfig::default());
}

#[test]
fn config_default_values() {
    let config = AppConfig::default();
    assert_eq!(config.engine.precondition_timeout_ms, 10_000);
    assert_eq!(config.engine.retry_attempts, 3);
    assert_eq!(config.engine.retry_delay, DelayPolicy::Fixed { delay_ms: 500 });
    assert_eq!(config.driver.marker_attributes, vec!["data-attr-id", "data-atr-id"]);
    assert!(config.driver.headless);
    assert_eq!(config.run.format, "console");
    assert!(config.run.output.is_none());
}

#[test]
fn config_partial_yaml() {
    let yaml = r#"
engine:
  retry_attempts: 5
  retry_delay:
    kind: backoff
    initial_ms: 100
    factor: 2
    max_ms: 800
driver:
  marker_attributes: ["data-testid"]
"#;
    let config: AppConfig = serde_yaml::from_str(yaml).unwrap();
    assert_eq!(config.engine.retry_attempts, 5);
    // Other engine fields get defaults
    assert_eq!(config.engine.poll_interval_ms, 100);
    assert_eq!(config.driver.marker_attributes, vec!["data-testid"]);
    assert_eq!(config.driver.node, "node");
    // Run gets full defaults
    assert_eq!(config.run.format, "console");
}

#[test]
fn read_config_reports_bad_yaml() {
    let dir = std::env::temp_dir().join(format!("locatorless_cfg_{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("broken.yaml");
    std::fs::write(&path, "engine: [not, a, map").unwrap();

    let err = read_config(path.to_str().unwrap()).unwrap_err();
    assert!(matches!(err, ConfigError::Parse { .. }));
    assert!(err.to_string().contains("broken.yaml"));

    // A broken file still yields a usable config
    assert_eq!(load_config(path.to_str()), AppConfig::default());

    std::fs::remove_dir_all(&dir).ok();
}

// ============================================================================
// Scenario Loading Tests
// ============================================================================

#[test]
fn load_scenarios_from_directory_sorted_by_name() {
    let dir = std::env::temp_dir().join(format!("locatorless_scenarios_{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();

    std::fs::write(
        dir.join("a.yaml"),
        "name: Zeta\nsteps:\n  - action: click\n    identifier: Save\n",
    )
    .unwrap();
    std::fs::write(
        dir.join("b.yml"),
        "name: Alpha\nsteps:\n  - action: reload\n",
    )
    .unwrap();
    std::fs::write(dir.join("notes.txt"), "not a scenario").unwrap();

    let scenarios = load_scenarios(dir.to_str().unwrap()).unwrap();
    let names: Vec<&str> = scenarios.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["Alpha", "Zeta"]);

    let single = load_scenarios(dir.join("a.yaml").to_str().unwrap()).unwrap();
    assert_eq!(single.len(), 1);

    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn load_scenarios_missing_path_is_an_error() {
    assert!(load_scenarios("definitely/not/here.yaml").is_err());
}
