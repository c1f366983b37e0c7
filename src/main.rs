mod artifacts;
mod cli;
mod config;
mod convert;
mod correct_cmd;
mod forecast_cmd;
mod logging;
mod probability_cmd;
mod reanalysis_cmd;
mod skill_cmd;
mod tables;

use std::process;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use crate::cli::{Cli, Command, StageArgs};
use crate::config::HindcastConfig;
use crate::convert::Settings;

fn main() {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    if let Err(e) = run(&cli.command) {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

/// Read and validate the configuration, then make sure the output
/// directory exists.
fn load_settings(args: &StageArgs) -> Result<Settings> {
    let toml_str = std::fs::read_to_string(&args.config)
        .with_context(|| format!("failed to read config file: {}", args.config.display()))?;
    let config: HindcastConfig = toml::from_str(&toml_str).context("failed to parse TOML config")?;
    let settings = convert::build_settings(&config, args.output_dir.as_deref())?;

    let dir = settings.artifacts.dir();
    std::fs::create_dir_all(dir)
        .with_context(|| format!("failed to create output directory: {}", dir.display()))?;
    info!(
        config = %args.config.display(),
        output_dir = %dir.display(),
        granularities = ?settings.granularities,
        "configuration loaded"
    );
    Ok(settings)
}

fn run(command: &Command) -> Result<()> {
    let settings = load_settings(command.args())?;
    match command {
        Command::Run(_) => {
            forecast_cmd::run(&settings)?;
            reanalysis_cmd::run(&settings)?;
            correct_cmd::run(&settings)?;
            probability_cmd::run(&settings)?;
            skill_cmd::run(&settings)
        }
        Command::Forecast(_) => forecast_cmd::run(&settings),
        Command::Reanalysis(_) => reanalysis_cmd::run(&settings),
        Command::Correct(_) => correct_cmd::run(&settings),
        Command::Probability(_) => probability_cmd::run(&settings),
        Command::Skill(_) => skill_cmd::run(&settings),
    }
}
