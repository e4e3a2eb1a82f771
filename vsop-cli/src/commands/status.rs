//! Status command handler

use anyhow::Result;
use colored::*;
use std::path::PathBuf;
use vsop_runner::{RunStatus, inspect, resolve_out_dir};

/// Handle `vsop status`
pub fn handle_status(out_dir: Option<PathBuf>, json: bool) -> Result<()> {
    let out_dir = resolve_out_dir(out_dir.as_deref())?;
    let status = inspect(&out_dir)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&status)?);
    } else {
        print_status(&status);
    }

    Ok(())
}

fn print_status(status: &RunStatus) {
    println!("{}", format!("Run {}", status.run_id).bold());
    println!("  Output:   {}", status.out_dir.display());
    println!("  Pipeline: v{}", status.pipeline_version);

    let state = if status.finished {
        "finished".green()
    } else {
        "incomplete".yellow()
    };
    println!("  State:    {}", state);
    println!();

    for stage in &status.stages {
        let mark = if stage.confirmed {
            "done".green()
        } else {
            "pending".dimmed()
        };
        println!("  {:>2}  {:<24} {}", stage.index, stage.name, mark);
    }
}
