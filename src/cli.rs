use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Seasonal precipitation hindcast pipeline.
#[derive(Parser)]
#[command(
    name = "hindcast",
    version,
    about = "Bias-correct seasonal precipitation hindcasts and score them against reanalysis"
)]
pub struct Cli {
    /// Increase verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Subcommand to run.
    #[command(subcommand)]
    pub command: Command,
}

/// Available subcommands. Each stage reads the artifacts of the previous
/// one from the output directory.
#[derive(Subcommand)]
pub enum Command {
    /// Run every stage in order.
    Run(StageArgs),
    /// Load the forecast ensemble, build the reference grid and aggregate.
    Forecast(StageArgs),
    /// Load and regrid the reanalysis, compute climatology and outcomes.
    Reanalysis(StageArgs),
    /// Bias-correct the aggregated forecast.
    Correct(StageArgs),
    /// Compute ensemble probabilities for every configured series.
    Probability(StageArgs),
    /// Score probabilities against reanalysis outcomes.
    Skill(StageArgs),
}

impl Command {
    pub fn args(&self) -> &StageArgs {
        match self {
            Command::Run(a)
            | Command::Forecast(a)
            | Command::Reanalysis(a)
            | Command::Correct(a)
            | Command::Probability(a)
            | Command::Skill(a) => a,
        }
    }
}

/// Arguments shared by every stage.
#[derive(clap::Args)]
pub struct StageArgs {
    /// Path to TOML configuration file.
    #[arg(short, long, default_value = "hindcast.toml")]
    pub config: PathBuf,

    /// Override the output directory from config.
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,
}
