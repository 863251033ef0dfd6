//! CLI command definitions
//!
//! Defines the clap commands for the case tester CLI.

use clap::{Args, Subcommand};
use std::path::PathBuf;

use crate::verify::HeaderMode;

#[derive(Subcommand)]
pub enum Commands {
    /// Run a case suite against a server
    Run(RunArgs),

    /// Decode a case suite without executing it
    Check {
        /// Path to the JSON case suite
        cases: PathBuf,
    },
}

/// Options for `run`; each one overrides the configuration file
#[derive(Args, Debug, Default)]
pub struct RunArgs {
    /// Configuration file (YAML or TOML)
    #[arg(long, short)]
    pub config: Option<PathBuf>,

    /// Path to the JSON case suite
    #[arg(long)]
    pub cases: Option<PathBuf>,

    /// Base address of the server under test
    #[arg(long)]
    pub server: Option<String>,

    /// SQLite fixture database (or ":memory:")
    #[arg(long)]
    pub database: Option<PathBuf>,

    /// Number of cases decoded ahead of execution
    #[arg(long)]
    pub queue_capacity: Option<usize>,

    /// Additional header to leave out of the comparison (repeatable)
    #[arg(long = "exclude-header", value_name = "NAME")]
    pub exclude_headers: Vec<String>,

    /// Header matching: exact or subset
    #[arg(long, value_parser = parse_header_mode)]
    pub header_mode: Option<HeaderMode>,

    /// Treat response mismatches as case errors
    #[arg(long)]
    pub strict: bool,

    /// Continue past case errors and report them all at the end
    #[arg(long)]
    pub keep_going: bool,

    /// Print full bodies on mismatch
    #[arg(long, short)]
    pub verbose: bool,
}

fn parse_header_mode(value: &str) -> Result<HeaderMode, String> {
    match value {
        "exact" => Ok(HeaderMode::Exact),
        "subset" => Ok(HeaderMode::Subset),
        other => Err(format!("unknown header mode '{}', expected 'exact' or 'subset'", other)),
    }
}
