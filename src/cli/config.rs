use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::action::config::EngineConfig;
use crate::browser::session::DriverConfig;
use crate::error::ConfigError;

// ============================================================================
// CLI Argument Parsing (clap derive)
// ============================================================================

#[derive(Parser, Debug)]
#[command(
    name = "locatorless",
    version,
    about = "Locator-less UI component resolution and interaction"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to config file (default: locatorless.yaml in current dir)
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// JSONL file receiving one trace line per step
    #[arg(long, global = true)]
    pub trace: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run scenarios from YAML files
    Run {
        /// Path to a scenario YAML file or a directory of YAML files
        #[arg(long)]
        scenario: String,

        /// Output format: console, junit
        #[arg(long)]
        format: Option<String>,

        /// Output file path (default: stdout)
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Print the components found on a page
    Discover {
        /// URL of the page to inspect
        #[arg(long)]
        url: String,

        /// Only list this component kind
        #[arg(long)]
        kind: Option<String>,

        /// Print JSON instead of a table
        #[arg(long, default_value_t = false)]
        json: bool,
    },
}

// ============================================================================
// Config File Model (optional YAML)
// ============================================================================

/// Optional YAML config file: `locatorless.yaml`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub driver: DriverConfig,
    #[serde(default)]
    pub run: RunConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    #[serde(default = "default_console")]
    pub format: String,

    pub output: Option<String>,

    pub trace: Option<String>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            format: "console".to_string(),
            output: None,
            trace: None,
        }
    }
}

fn default_console() -> String { "console".to_string() }

pub const DEFAULT_CONFIG_PATH: &str = "locatorless.yaml";

// ============================================================================
// Config File Loading
// ============================================================================

/// Read and parse a config file.
pub fn read_config(path: &str) -> Result<AppConfig, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_string(),
        source,
    })?;
    serde_yaml::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.to_string(),
        source,
    })
}

/// Load config from a YAML file. Returns defaults if the file is missing or
/// malformed.
pub fn load_config(path: Option<&str>) -> AppConfig {
    let config_path = path.unwrap_or(DEFAULT_CONFIG_PATH);
    match read_config(config_path) {
        Ok(config) => config,
        Err(ConfigError::Read { .. }) if path.is_none() => AppConfig::default(),
        Err(e) => {
            warn!(error = %e, "using default configuration");
            AppConfig::default()
        }
    }
}
