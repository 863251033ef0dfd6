//! casetest - declarative end-to-end tests for HTTP services
//!
//! Streams a JSON suite of cases, prepares the database for each one, calls
//! the server and compares the response with the expectation.

use std::path::PathBuf;

use casetest::{cli, commands::Commands, common::logging};
use clap::Parser;

#[derive(Parser)]
#[command(name = "casetest", about = "Declarative end-to-end tests for HTTP services")]
#[command(version, long_about = None)]
struct Cli {
    /// Also write logs to this file
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Keeps the file writer alive until exit
    let _log_guard = logging::init_cli(cli.log_file.as_deref());

    if let Err(e) = cli::dispatch(cli.command).await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
