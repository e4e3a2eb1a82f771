//! Commands module
//!
//! Defines all CLI commands and their handlers.

mod run;
mod status;

use anyhow::Result;
use clap::Subcommand;
use std::path::PathBuf;

use crate::config::RunArgs;
use crate::logging::RunLog;

/// Top-level CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the pipeline
    Run(RunArgs),
    /// Resume a run from its last confirmed checkpoint
    Resume {
        /// Output directory of the run
        #[arg(short = 'o', long = "out-dir", value_name = "DIR")]
        out_dir: Option<PathBuf>,
    },
    /// Show the checkpoint progress of a run
    Status {
        /// Output directory of the run
        #[arg(short = 'o', long = "out-dir", value_name = "DIR")]
        out_dir: Option<PathBuf>,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
}

/// Handle a CLI command
///
/// Routes the command to the appropriate handler module.
pub async fn handle_command(command: Commands, verbose: bool, run_log: &RunLog) -> Result<()> {
    match command {
        Commands::Run(args) => run::handle_run(args, verbose, run_log).await,
        Commands::Resume { out_dir } => run::handle_resume(out_dir, verbose, run_log).await,
        Commands::Status { out_dir, json } => status::handle_status(out_dir, json),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct Harness {
        #[command(subcommand)]
        command: Commands,
    }

    #[test]
    fn test_resume_takes_only_out_dir() {
        let harness = Harness::try_parse_from(["vsop", "resume", "-o", "out"]).unwrap();
        match harness.command {
            Commands::Resume { out_dir } => assert_eq!(out_dir, Some(PathBuf::from("out"))),
            other => panic!("unexpected command: {:?}", other),
        }

        assert!(Harness::try_parse_from(["vsop", "resume", "-o", "out", "--min-score", "0.3"]).is_err());
    }

    #[test]
    fn test_run_continue_flag() {
        let harness =
            Harness::try_parse_from(["vsop", "run", "-i", "c.fa", "-o", "out", "--continue"]).unwrap();
        match harness.command {
            Commands::Run(args) => {
                assert!(args.continue_run);
                assert_eq!(args.input, Some(PathBuf::from("c.fa")));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }
}
