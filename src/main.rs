use clap::Parser;
use locatorless::cli::commands::{cmd_discover, cmd_run, init_tracing};
use locatorless::cli::config::{Cli, Commands, load_config};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let config = load_config(cli.config.as_deref());

    match cli.command {
        Commands::Run {
            scenario,
            format,
            output,
        } => {
            // CLI > config file > defaults
            let format = format.unwrap_or_else(|| config.run.format.clone());
            let output = output.or_else(|| config.run.output.clone());
            let trace = cli.trace.clone().or_else(|| config.run.trace.clone());

            let all_passed = cmd_run(
                &scenario,
                &format,
                output.as_deref(),
                trace.as_deref(),
                &config,
            )?;
            if !all_passed {
                std::process::exit(1);
            }
        }
        Commands::Discover { url, kind, json } => {
            cmd_discover(&url, kind.as_deref(), json, &config)?;
        }
    }

    Ok(())
}
