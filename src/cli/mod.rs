//! CLI interface for poly-odds
//!
//! Provides subcommands for:
//! - `run`: Fetch, resample, and write artifacts for matching markets
//! - `config`: Show the effective configuration

mod run;

pub use run::RunArgs;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "poly-odds")]
#[command(about = "Fetch and resample prediction-market win-probability history")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    pub config: String,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Fetch matching markets, resample their history, write artifacts
    Run(RunArgs),
    /// Show the effective configuration
    Config,
}
