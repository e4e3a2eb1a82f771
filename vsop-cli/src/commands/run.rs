//! Run and resume command handlers

use anyhow::{Context, Result};
use colored::*;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;
use vsop_core::{PipelineError, StageFailure};
use vsop_core::domain::config::RunOptions;
use vsop_runner::{
    Interrupt, LaunchMode, PipelineOrchestrator, RunSummary, StandardProcessService, ToolConfig,
    open_run, pipeline_stamp, standard_pipeline,
};

use crate::config::RunArgs;
use crate::logging::RunLog;

/// Handle `vsop run`
pub async fn handle_run(args: RunArgs, verbose: bool, run_log: &RunLog) -> Result<()> {
    let mode = if args.continue_run {
        LaunchMode::Continue
    } else {
        LaunchMode::Fresh
    };
    let options = args.to_options(verbose)?;
    execute(options, mode, run_log).await
}

/// Handle `vsop resume`
pub async fn handle_resume(out_dir: Option<PathBuf>, verbose: bool, run_log: &RunLog) -> Result<()> {
    let options = RunOptions {
        out_dir,
        verbose,
        ..Default::default()
    };
    execute(options, LaunchMode::Resume, run_log).await
}

async fn execute(options: RunOptions, mode: LaunchMode, run_log: &RunLog) -> Result<()> {
    let tools = ToolConfig::from_env().context("Invalid tool configuration")?;
    let interrupt = Interrupt::listen().context("Failed to install signal handlers")?;

    let stages = standard_pipeline();
    let declared = pipeline_stamp(&stages);
    let run = open_run(options, mode, &declared)?;
    let config = run.config().clone();

    run_log
        .attach(&config.log_file())
        .with_context(|| format!("Failed to open log file {}", config.log_file().display()))?;

    info!("vsop {}", env!("CARGO_PKG_VERSION"));
    info!("Output directory: {}", config.out_dir.display());

    let orchestrator = PipelineOrchestrator::new(
        run,
        stages,
        Arc::new(tools),
        Arc::new(StandardProcessService::new(interrupt.clone())),
    )
    .with_interrupt(interrupt);

    match orchestrator.run().await {
        Ok(summary) => {
            print_summary(&summary, &config.out_dir);
            Ok(())
        }
        Err(e) => {
            print_failure(&e, &config.out_dir);
            Err(e.into())
        }
    }
}

fn print_summary(summary: &RunSummary, out_dir: &Path) {
    println!(
        "{} Pipeline finished in {:.1?}",
        "✓".green().bold(),
        summary.elapsed
    );
    if !summary.skipped.is_empty() {
        println!(
            "  Passed checkpoints: {}",
            summary.skipped.join(", ").dimmed()
        );
    }
    println!("  Executed:           {}", summary.executed.join(", "));
    println!("  Results:            {}", out_dir.display());
}

fn print_failure(err: &PipelineError, out_dir: &Path) {
    if let Some(stage) = err.stage() {
        eprintln!(
            "{} Stage {} failed: {}",
            "✗".red().bold(),
            stage.bold(),
            failure_cause(err)
        );
    }

    if err.is_resumable() {
        eprintln!(
            "{}",
            format!(
                "  Completed stages are kept. Run `vsop resume -o {}` (or `vsop run --continue -o {}`) to continue from the last checkpoint.",
                out_dir.display(),
                out_dir.display()
            )
            .yellow()
        );
    }
}

/// Short description of why a stage stopped
fn failure_cause(err: &PipelineError) -> String {
    match err {
        PipelineError::StageExecutionFailed { source, .. } => match source {
            StageFailure::NonZeroExit { exit_code, .. } => format!("exit status {}", exit_code),
            StageFailure::Signaled { .. } => "terminated by signal".to_string(),
            StageFailure::Spawn { source, .. } => format!("could not be started ({})", source),
            StageFailure::MissingArtifact { path } => {
                format!("missing artifact {}", path.display())
            }
            StageFailure::Interrupted { .. } => "interrupted".to_string(),
            StageFailure::Io { context, .. } => format!("I/O error while {}", context),
        },
        PipelineError::InterruptedExternally { .. } => "interrupted".to_string(),
        other => other.to_string(),
    }
}
