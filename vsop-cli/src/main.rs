//! vsop CLI
//!
//! Command-line interface for running the VirSorter2 / CheckV pipeline with
//! checkpoint-based resume.

mod commands;
mod config;
mod logging;

use clap::Parser;
use colored::*;
use commands::{Commands, handle_command};
use vsop_core::PipelineError;

#[derive(Parser, Debug)]
#[command(name = "vsop")]
#[command(version, about = "VirSorter2 + CheckV viral detection pipeline", long_about = None)]
struct Cli {
    /// Print debug output on the console
    #[arg(long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let run_log = logging::init(cli.verbose);

    if let Err(e) = handle_command(cli.command, cli.verbose, &run_log).await {
        eprintln!("{} {:#}", "error:".red().bold(), e);
        std::process::exit(exit_code(&e));
    }
}

/// Exit status for a failed command
///
/// A tool's own non-zero status is passed through, an interrupted stage
/// exits with 130 and everything else with 1.
fn exit_code(err: &anyhow::Error) -> i32 {
    err.chain()
        .find_map(|cause| cause.downcast_ref::<PipelineError>())
        .map(PipelineError::exit_code)
        .unwrap_or(1)
}
